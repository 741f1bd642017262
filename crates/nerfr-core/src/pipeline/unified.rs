//! # Recognizer
//!
//! Ties the pipeline together: tokenize, featurize, label, reconstruct
//! entities, summarise. Built once at startup and shared read-only.

use std::path::PathBuf;

use tracing::debug;

use crate::error::Result;
use crate::model::{Labeler, ModelKind};
use crate::pipeline::bio_tags::Tag;
use crate::pipeline::entities::reconstruct;
use crate::pipeline::features::sentence_features;
use crate::pipeline::tokenizer::Tokenizer;
use crate::types::{Analysis, BasicPrediction, summarize};

/// Default location of the trained model artifact.
pub const DEFAULT_MODEL_PATH: &str = "models/ner_model.json";

/// Configuration for the recognizer.
#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    /// Which labeler family the artifact must be
    pub model_kind: ModelKind,
    /// Where to load the artifact from; `None` runs without a model
    pub model_path: Option<PathBuf>,
    /// Restrict CRF decoding to well-formed BIO sequences
    pub constrained_decoding: bool,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            model_kind: ModelKind::Crf,
            model_path: Some(PathBuf::from(DEFAULT_MODEL_PATH)),
            constrained_decoding: false,
        }
    }
}

impl RecognizerConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the labeler family.
    pub fn with_model_kind(mut self, kind: ModelKind) -> Self {
        self.model_kind = kind;
        self
    }

    /// Set the artifact path.
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Run without a model (every token tagged `O`).
    pub fn without_model(mut self) -> Self {
        self.model_path = None;
        self
    }

    /// Enable or disable constrained CRF decoding.
    pub fn with_constrained_decoding(mut self, enabled: bool) -> Self {
        self.constrained_decoding = enabled;
        self
    }
}

/// The NER pipeline with its loaded model.
#[derive(Debug, Clone)]
pub struct Recognizer {
    config: RecognizerConfig,
    tokenizer: Tokenizer,
    labeler: Labeler,
}

impl Recognizer {
    /// Build a recognizer, loading the configured artifact if it exists.
    ///
    /// A missing artifact leaves the recognizer in degraded mode; an artifact
    /// that exists but cannot be used is an error.
    pub fn new(config: RecognizerConfig) -> Result<Self> {
        let labeler = match &config.model_path {
            Some(path) => Labeler::load_or_unavailable(
                path,
                config.model_kind,
                config.constrained_decoding,
            )?,
            None => Labeler::Unavailable,
        };
        Self::with_labeler(config, labeler)
    }

    /// Build a recognizer around an already constructed labeler.
    pub fn with_labeler(config: RecognizerConfig, labeler: Labeler) -> Result<Self> {
        Ok(Self {
            config,
            tokenizer: Tokenizer::new()?,
            labeler,
        })
    }

    /// Get the recognizer configuration.
    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn labeler(&self) -> &Labeler {
        &self.labeler
    }

    /// Returns `true` when no model is loaded and all tokens come back `O`.
    pub fn is_degraded(&self) -> bool {
        !self.labeler.is_available()
    }

    /// Tag a batch of pre-tokenized sentences.
    pub fn label_batch<S: AsRef<str>>(&self, sentences: &[Vec<S>]) -> Result<Vec<Vec<Tag>>> {
        let batch: Vec<_> = sentences.iter().map(|s| sentence_features(s)).collect();
        self.labeler.predict(&batch)
    }

    /// Tag one pre-tokenized sentence.
    pub fn label_tokens(&self, tokens: Vec<String>) -> Result<BasicPrediction> {
        let labels = self.labeler.predict_one(sentence_features(&tokens))?;
        Ok(BasicPrediction { tokens, labels })
    }

    /// Run the full pipeline over raw text.
    ///
    /// # Examples
    /// ```
    /// use nerfr_core::{Recognizer, RecognizerConfig};
    ///
    /// let recognizer = Recognizer::new(RecognizerConfig::new().without_model()).unwrap();
    /// let analysis = recognizer.analyze("Paris.").unwrap();
    ///
    /// assert_eq!(analysis.tokens, ["Paris", "."]);
    /// assert!(analysis.statistics.is_none());
    /// ```
    pub fn analyze(&self, text: &str) -> Result<Analysis> {
        let tokens = self.tokenizer.tokenize_words(text);
        self.analyze_tokens(tokens)
    }

    /// Run labeling, reconstruction and statistics over a pre-tokenized
    /// sentence.
    pub fn analyze_tokens(&self, tokens: Vec<String>) -> Result<Analysis> {
        if tokens.is_empty() {
            return Ok(Analysis::empty());
        }

        let BasicPrediction { tokens, labels } = self.label_tokens(tokens)?;
        let entities = reconstruct(&tokens, &labels);
        let statistics = summarize(&entities, tokens.len());
        debug!(
            tokens = tokens.len(),
            entities = entities.len(),
            "analyzed sentence"
        );

        Ok(Analysis {
            tokens,
            labels,
            entities,
            statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelArtifact;

    fn crf_recognizer() -> Recognizer {
        let mut artifact = ModelArtifact::zeroed(
            ModelKind::Crf,
            vec![Tag::Outside, Tag::begin("PER"), Tag::inside("PER")],
        );
        artifact.weights.insert("bias".into(), vec![0.5, 0.0, 0.0]);
        artifact.weights.insert("word.istitle".into(), vec![0.0, 1.0, 0.9]);
        artifact.transitions[1][2] = 1.0;
        artifact.transitions[2][1] = -1.0;
        let labeler = Labeler::from_artifact(artifact, ModelKind::Crf, false).unwrap();
        Recognizer::with_labeler(RecognizerConfig::new(), labeler).unwrap()
    }

    #[test]
    fn test_recognizer_config() {
        let config = RecognizerConfig::new()
            .with_model_kind(ModelKind::LogReg)
            .with_model_path("custom/model.json")
            .with_constrained_decoding(true);

        assert_eq!(config.model_kind, ModelKind::LogReg);
        assert_eq!(config.model_path, Some(PathBuf::from("custom/model.json")));
        assert!(config.constrained_decoding);
        assert!(config.clone().without_model().model_path.is_none());
    }

    #[test]
    fn test_analyze_person() {
        let recognizer = crf_recognizer();
        let analysis = recognizer.analyze("Emmanuel Macron est président").unwrap();

        assert_eq!(analysis.entities.len(), 1);
        let entity = &analysis.entities[0];
        assert_eq!(entity.text, "Emmanuel Macron");
        assert_eq!(entity.label, "PER");
        assert_eq!((entity.start, entity.end), (0, 1));

        let stats = analysis.statistics.unwrap();
        assert_eq!(stats.total_entities, 1);
        assert_eq!(stats.entity_density, 25.0);
    }

    #[test]
    fn test_analyze_empty_text() {
        let recognizer = crf_recognizer();
        assert_eq!(recognizer.analyze("").unwrap(), Analysis::empty());
        assert_eq!(recognizer.analyze("   ").unwrap(), Analysis::empty());
    }

    #[test]
    fn test_degraded_mode() {
        let recognizer = Recognizer::new(RecognizerConfig::new().without_model()).unwrap();
        assert!(recognizer.is_degraded());

        let analysis = recognizer.analyze("Emmanuel Macron est président.").unwrap();
        assert_eq!(analysis.labels.len(), analysis.tokens.len());
        assert!(analysis.labels.iter().all(Tag::is_outside));
        assert!(analysis.entities.is_empty());
        assert!(analysis.statistics.is_none());
    }

    #[test]
    fn test_label_tokens_keeps_input() {
        let recognizer = crf_recognizer();
        let tokens = vec!["Emmanuel".to_string(), "Macron".to_string()];
        let prediction = recognizer.label_tokens(tokens.clone()).unwrap();

        assert_eq!(prediction.tokens, tokens);
        assert_eq!(prediction.labels, vec![Tag::begin("PER"), Tag::inside("PER")]);
    }

    #[test]
    fn test_label_batch() {
        let recognizer = crf_recognizer();
        let sentences = vec![vec!["Paris"], vec![], vec!["il", "dort"]];
        let tags = recognizer.label_batch(&sentences).unwrap();

        let lengths: Vec<usize> = tags.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![1, 0, 2]);
    }

    #[test]
    fn test_tokenize_featurize_lengths_agree() {
        let recognizer = crf_recognizer();
        for text in ["", "Paris.", "Il habite à Paris, en France !", "l'ONU"] {
            let tokens = recognizer.tokenizer().tokenize_words(text);
            assert_eq!(sentence_features(&tokens).len(), tokens.len());
        }
    }
}
