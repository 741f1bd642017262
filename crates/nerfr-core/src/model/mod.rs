pub mod artifact;
pub mod crf;
pub mod labeler;
pub mod linear;
pub mod logreg;

pub use artifact::{ModelArtifact, ModelKind};
pub use crf::CrfModel;
pub use labeler::Labeler;
pub use linear::LinearScorer;
pub use logreg::TokenClassifier;
