//! Per-token linear classifier.
//!
//! Each token is classified on its own feature map; context only enters
//! through the neighbour features. The decision rule is the argmax of the
//! linear scores, which is what a multinomial logistic regression predicts.

use crate::error::{NerError, Result};
use crate::model::artifact::{ModelArtifact, ModelKind};
use crate::model::linear::{LinearScorer, argmax};
use crate::pipeline::bio_tags::Tag;
use crate::pipeline::features::FeatureMap;

#[derive(Debug, Clone)]
pub struct TokenClassifier {
    labels: Vec<Tag>,
    scorer: LinearScorer,
    intercepts: Vec<f32>,
}

impl TokenClassifier {
    /// Build a classifier from a validated `logreg` artifact.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        if artifact.kind != ModelKind::LogReg {
            return Err(NerError::ModelKindMismatch {
                expected: ModelKind::LogReg.to_string(),
                found: artifact.kind.to_string(),
            });
        }
        artifact.validate()?;

        let n = artifact.num_labels();
        let intercepts = if artifact.intercepts.is_empty() {
            vec![0.0; n]
        } else {
            artifact.intercepts
        };

        Ok(Self {
            scorer: LinearScorer::new(n, artifact.weights),
            labels: artifact.labels,
            intercepts,
        })
    }

    pub fn labels(&self) -> &[Tag] {
        &self.labels
    }

    /// Label scores for one token, intercepts included.
    pub fn decision_function(&self, features: &FeatureMap) -> Vec<f32> {
        let mut scores = self.scorer.score(features);
        for (score, intercept) in scores.iter_mut().zip(&self.intercepts) {
            *score += intercept;
        }
        scores
    }

    /// Predict the tag of one token.
    pub fn predict_token(&self, features: &FeatureMap) -> Result<Tag> {
        let scores = self.decision_function(features);
        argmax(&scores)
            .and_then(|idx| self.labels.get(idx).cloned())
            .ok_or_else(|| NerError::Inference("classifier has no labels".into()))
    }

    /// Predict tags for a flat list of tokens.
    pub fn predict_flat(&self, features: &[&FeatureMap]) -> Result<Vec<Tag>> {
        features.iter().map(|f| self.predict_token(f)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::features::sentence_features;

    fn classifier() -> TokenClassifier {
        let mut artifact = ModelArtifact::zeroed(
            ModelKind::LogReg,
            vec![Tag::Outside, Tag::begin("LOC")],
        );
        artifact.intercepts = vec![0.5, 0.0];
        artifact
            .weights
            .insert("word.istitle".into(), vec![0.0, 1.0]);
        TokenClassifier::from_artifact(artifact).unwrap()
    }

    #[test]
    fn test_predict_tokens() {
        let clf = classifier();
        let features = sentence_features(&["à", "Paris"]);
        let refs: Vec<&FeatureMap> = features.iter().collect();

        let tags = clf.predict_flat(&refs).unwrap();
        assert_eq!(tags, vec![Tag::Outside, Tag::begin("LOC")]);
    }

    #[test]
    fn test_rejects_crf_artifact() {
        let artifact = ModelArtifact::zeroed(ModelKind::Crf, vec![Tag::Outside]);
        assert!(matches!(
            TokenClassifier::from_artifact(artifact),
            Err(NerError::ModelKindMismatch { .. })
        ));
    }
}
