use thiserror::Error;

/// Errors that can occur while loading or running the NER pipeline.
#[derive(Debug, Error)]
pub enum NerError {
    /// A label string is not `O`, `B-<TYPE>` or `I-<TYPE>`.
    #[error("invalid BIO tag: {0:?}")]
    InvalidTag(String),

    /// A model family name is not one of the supported families.
    #[error("unknown model kind {0:?} (expected \"crf\" or \"logreg\")")]
    UnknownModelKind(String),

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// The model artifact could not be read from disk.
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    /// The model artifact is not valid JSON.
    #[error("failed to decode model artifact: {0}")]
    Json(#[from] serde_json::Error),

    /// The model artifact decoded but its dimensions are inconsistent.
    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    /// The artifact was trained for a different family than the one configured.
    #[error("model kind mismatch: configured {expected}, artifact is {found}")]
    ModelKindMismatch {
        /// Family requested by configuration.
        expected: String,
        /// Family declared by the artifact.
        found: String,
    },

    /// The model inference failed.
    #[error("inference error: {0}")]
    Inference(String),
}

/// Result type alias for NER operations.
pub type Result<T> = std::result::Result<T, NerError>;
