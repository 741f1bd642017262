//! # Sequence Labeler
//!
//! One interface over the two model families. They differ only in batching
//! granularity: the per-token classifier sees a flat list of feature maps,
//! the CRF sees one feature sequence per sentence. Without a model the
//! labeler answers `O` for every token.

use std::path::Path;

use tracing::{info, warn};

use crate::error::{NerError, Result};
use crate::model::artifact::{ModelArtifact, ModelKind};
use crate::model::crf::CrfModel;
use crate::model::logreg::TokenClassifier;
use crate::pipeline::bio_tags::Tag;
use crate::pipeline::features::FeatureMap;

#[derive(Debug, Clone)]
pub enum Labeler {
    /// No trained model is loaded; every token is tagged `O`.
    Unavailable,
    /// Independent per-token classification.
    PerToken(TokenClassifier),
    /// Structured per-sentence decoding.
    PerSequence(CrfModel),
}

impl Labeler {
    /// Build the labeler for `kind` from an artifact.
    ///
    /// The artifact must have been trained for the configured family.
    pub fn from_artifact(
        artifact: ModelArtifact,
        kind: ModelKind,
        constrained: bool,
    ) -> Result<Self> {
        if artifact.kind != kind {
            return Err(NerError::ModelKindMismatch {
                expected: kind.to_string(),
                found: artifact.kind.to_string(),
            });
        }
        match kind {
            ModelKind::LogReg => Ok(Self::PerToken(TokenClassifier::from_artifact(artifact)?)),
            ModelKind::Crf => Ok(Self::PerSequence(CrfModel::from_artifact(
                artifact,
                constrained,
            )?)),
        }
    }

    /// Load the artifact at `path`, or fall back to [`Labeler::Unavailable`]
    /// if no file exists there.
    ///
    /// # Errors
    ///
    /// An existing file that cannot be read, decoded or validated is an error.
    pub fn load_or_unavailable(
        path: impl AsRef<Path>,
        kind: ModelKind,
        constrained: bool,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                path = %path.display(),
                "model artifact not found, every token will be tagged O"
            );
            return Ok(Self::Unavailable);
        }

        let artifact = ModelArtifact::load(path)?;
        let labeler = Self::from_artifact(artifact, kind, constrained)?;
        info!(path = %path.display(), kind = %kind, "model loaded");
        Ok(labeler)
    }

    /// Returns `true` if a trained model backs this labeler.
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }

    /// The loaded model family, if any.
    pub fn kind(&self) -> Option<ModelKind> {
        match self {
            Self::Unavailable => None,
            Self::PerToken(_) => Some(ModelKind::LogReg),
            Self::PerSequence(_) => Some(ModelKind::Crf),
        }
    }

    /// The label set of the loaded model.
    pub fn labels(&self) -> &[Tag] {
        match self {
            Self::Unavailable => &[],
            Self::PerToken(clf) => clf.labels(),
            Self::PerSequence(crf) => crf.labels(),
        }
    }

    /// Tag a batch of sentences.
    ///
    /// The output has one tag sequence per input sentence, in order, each as
    /// long as its sentence.
    pub fn predict(&self, batch: &[Vec<FeatureMap>]) -> Result<Vec<Vec<Tag>>> {
        let predictions: Vec<Vec<Tag>> = match self {
            Self::Unavailable => batch
                .iter()
                .map(|sentence| vec![Tag::Outside; sentence.len()])
                .collect(),
            Self::PerToken(clf) => {
                let flat: Vec<&FeatureMap> = batch.iter().flatten().collect();
                let tags = clf.predict_flat(&flat)?;
                let lengths: Vec<usize> = batch.iter().map(Vec::len).collect();
                resegment(tags, &lengths)?
            }
            Self::PerSequence(crf) => batch
                .iter()
                .map(|sentence| crf.predict_sequence(sentence))
                .collect::<Result<Vec<_>>>()?,
        };

        for (sentence, tags) in batch.iter().zip(&predictions) {
            if sentence.len() != tags.len() {
                return Err(NerError::Inference(format!(
                    "labeler returned {} tags for {} tokens",
                    tags.len(),
                    sentence.len()
                )));
            }
        }
        Ok(predictions)
    }

    /// Tag a single sentence.
    pub fn predict_one(&self, sentence: Vec<FeatureMap>) -> Result<Vec<Tag>> {
        self.predict(&[sentence])?
            .pop()
            .ok_or_else(|| NerError::Inference("labeler returned no sentence".into()))
    }
}

/// Split a flat tag list back into chunks of the given lengths.
pub fn resegment(flat: Vec<Tag>, lengths: &[usize]) -> Result<Vec<Vec<Tag>>> {
    let expected: usize = lengths.iter().sum();
    if flat.len() != expected {
        return Err(NerError::Inference(format!(
            "expected {expected} flat predictions, got {}",
            flat.len()
        )));
    }

    let mut rest = flat.into_iter();
    Ok(lengths
        .iter()
        .map(|&len| rest.by_ref().take(len).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::features::sentence_features;

    fn logreg_labeler() -> Labeler {
        let mut artifact =
            ModelArtifact::zeroed(ModelKind::LogReg, vec![Tag::Outside, Tag::begin("LOC")]);
        artifact.intercepts = vec![0.5, 0.0];
        artifact
            .weights
            .insert("word.istitle".into(), vec![0.0, 1.0]);
        Labeler::from_artifact(artifact, ModelKind::LogReg, false).unwrap()
    }

    fn crf_labeler() -> Labeler {
        let mut artifact =
            ModelArtifact::zeroed(ModelKind::Crf, vec![Tag::Outside, Tag::begin("LOC")]);
        artifact.weights.insert("bias".into(), vec![0.5, 0.0]);
        artifact
            .weights
            .insert("word.istitle".into(), vec![0.0, 1.0]);
        Labeler::from_artifact(artifact, ModelKind::Crf, false).unwrap()
    }

    #[test]
    fn test_unavailable_tags_everything_outside() {
        let labeler = Labeler::Unavailable;
        let batch = vec![sentence_features(&["Paris", "."]), sentence_features(&["Lyon"])];

        let tags = labeler.predict(&batch).unwrap();
        assert_eq!(tags, vec![vec![Tag::Outside; 2], vec![Tag::Outside]]);
        assert!(!labeler.is_available());
        assert_eq!(labeler.kind(), None);
    }

    #[test]
    fn test_per_token_resegments_in_order() {
        let labeler = logreg_labeler();
        let batch = vec![
            sentence_features(&["à", "Paris"]),
            Vec::new(),
            sentence_features(&["Lyon", "et", "Nice"]),
        ];

        let tags = labeler.predict(&batch).unwrap();
        let loc = Tag::begin("LOC");
        assert_eq!(
            tags,
            vec![
                vec![Tag::Outside, loc.clone()],
                vec![],
                vec![loc.clone(), Tag::Outside, loc],
            ]
        );
        assert_eq!(labeler.kind(), Some(ModelKind::LogReg));
    }

    #[test]
    fn test_per_sequence_matches_lengths() {
        let labeler = crf_labeler();
        let batch = vec![sentence_features(&["Paris", "."]), sentence_features(&["x"])];

        let tags = labeler.predict(&batch).unwrap();
        assert_eq!(tags[0], vec![Tag::begin("LOC"), Tag::Outside]);
        assert_eq!(tags[1], vec![Tag::Outside]);
    }

    #[test]
    fn test_single_token_yields_single_tag() {
        for labeler in [Labeler::Unavailable, logreg_labeler(), crf_labeler()] {
            let tags = labeler.predict_one(sentence_features(&["Bordeaux"])).unwrap();
            assert_eq!(tags.len(), 1);
        }
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let artifact = ModelArtifact::zeroed(ModelKind::Crf, vec![Tag::Outside]);
        let err = Labeler::from_artifact(artifact, ModelKind::LogReg, false).unwrap_err();
        assert!(matches!(err, NerError::ModelKindMismatch { .. }));
    }

    #[test]
    fn test_missing_artifact_degrades() {
        let labeler =
            Labeler::load_or_unavailable("/nonexistent/nerfr/model.json", ModelKind::Crf, false)
                .unwrap();
        assert!(!labeler.is_available());
    }

    #[test]
    fn test_resegment_length_mismatch() {
        assert!(resegment(vec![Tag::Outside], &[2]).is_err());
        assert_eq!(resegment(vec![], &[0, 0]).unwrap(), vec![vec![], vec![]]);
    }
}
