//! # nerfr Core
//!
//! The sequence-labeling pipeline behind the French NER service: a regex
//! tokenizer, per-token lexical features, a linear labeler (per-token
//! classifier or linear-chain CRF), BIO entity reconstruction and per-type
//! statistics.
//!
//! ## Quick Start
//!
//! ```rust
//! use nerfr_core::{Recognizer, RecognizerConfig};
//!
//! // Without a trained artifact every token is tagged `O`.
//! let recognizer = Recognizer::new(RecognizerConfig::new().without_model()).unwrap();
//! let analysis = recognizer.analyze("Emmanuel Macron est président.").unwrap();
//!
//! assert_eq!(analysis.tokens.len(), 5);
//! assert!(recognizer.is_degraded());
//! ```
pub mod error;
pub mod model;
pub mod pipeline;
pub mod types;

// Re-export primary API
pub use error::{NerError, Result};
pub use model::{CrfModel, Labeler, ModelArtifact, ModelKind, TokenClassifier};
pub use pipeline::{
    EntitySpan, FeatureMap, FeatureValue, Recognizer, RecognizerConfig, Tag, Token, Tokenizer,
    ViterbiDecoder, reconstruct, sentence_features,
};
pub use types::{Analysis, BasicPrediction, StatisticsSummary, TypeStatistics, summarize};
