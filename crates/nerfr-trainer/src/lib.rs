//! # nerfr trainer
//!
//! Offline tooling around the recognizer: CoNLL corpus loading, averaged
//! perceptron training for both labeler families and entity-level
//! evaluation. The `train` and `evaluate` binaries wrap these.

pub mod conll;
pub mod evaluate;
pub mod trainer;

pub use conll::{Corpus, parse_conll, read_conll, split_path};
pub use evaluate::{ClassMetrics, EvaluationReport, evaluate, score};
pub use trainer::{EpochStats, Trainer, TrainerConfig};
