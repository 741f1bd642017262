//! Linear-chain CRF tagger.
//!
//! Emission scores come from the sparse state weights; the label-to-label
//! transition matrix links neighbouring positions. Decoding is Viterbi over
//! the whole sentence.

use crate::error::{NerError, Result};
use crate::model::artifact::{ModelArtifact, ModelKind};
use crate::model::linear::LinearScorer;
use crate::pipeline::bio_tags::Tag;
use crate::pipeline::features::FeatureMap;
use crate::pipeline::viterbi::ViterbiDecoder;

#[derive(Debug, Clone)]
pub struct CrfModel {
    labels: Vec<Tag>,
    scorer: LinearScorer,
    transitions: Vec<Vec<f32>>,
    viterbi: ViterbiDecoder,
    constrained: bool,
}

impl CrfModel {
    /// Build a CRF from a validated `crf` artifact.
    ///
    /// With `constrained` set, decoding never produces an `I-X` tag that does
    /// not continue an `X` entity.
    pub fn from_artifact(artifact: ModelArtifact, constrained: bool) -> Result<Self> {
        if artifact.kind != ModelKind::Crf {
            return Err(NerError::ModelKindMismatch {
                expected: ModelKind::Crf.to_string(),
                found: artifact.kind.to_string(),
            });
        }
        artifact.validate()?;

        let n = artifact.num_labels();
        Ok(Self {
            scorer: LinearScorer::new(n, artifact.weights),
            labels: artifact.labels,
            transitions: artifact.transitions,
            viterbi: ViterbiDecoder::new(n),
            constrained,
        })
    }

    pub fn labels(&self) -> &[Tag] {
        &self.labels
    }

    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    /// Emission score matrix `[seq_len][num_labels]` for a sentence.
    pub fn emissions(&self, sentence: &[FeatureMap]) -> Vec<Vec<f32>> {
        sentence.iter().map(|f| self.scorer.score(f)).collect()
    }

    /// Decode the best tag sequence for one sentence.
    pub fn predict_sequence(&self, sentence: &[FeatureMap]) -> Result<Vec<Tag>> {
        let emissions = self.emissions(sentence);
        let path = if self.constrained {
            self.viterbi
                .decode_constrained(&emissions, &self.transitions, &self.labels)?
        } else {
            self.viterbi.decode(&emissions, &self.transitions)?
        };

        path.into_iter()
            .map(|idx| {
                self.labels.get(idx).cloned().ok_or_else(|| {
                    NerError::Inference(format!("decoded label index {idx} out of range"))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::features::sentence_features;

    /// O, B-PER, I-PER with title-case pushing towards PER and a strong
    /// B-PER -> I-PER transition.
    fn model(constrained: bool) -> CrfModel {
        let mut artifact = ModelArtifact::zeroed(
            ModelKind::Crf,
            vec![Tag::Outside, Tag::begin("PER"), Tag::inside("PER")],
        );
        artifact.weights.insert("bias".into(), vec![0.5, 0.0, 0.0]);
        artifact.weights.insert("word.istitle".into(), vec![0.0, 1.0, 0.9]);
        artifact.transitions[1][2] = 1.0;
        artifact.transitions[2][1] = -1.0;
        CrfModel::from_artifact(artifact, constrained).unwrap()
    }

    #[test]
    fn test_predict_person() {
        let crf = model(false);
        let features = sentence_features(&["Emmanuel", "Macron", "est", "président"]);
        let tags = crf.predict_sequence(&features).unwrap();

        assert_eq!(
            tags,
            vec![Tag::begin("PER"), Tag::inside("PER"), Tag::Outside, Tag::Outside]
        );
    }

    #[test]
    fn test_predict_empty_sentence() {
        let crf = model(false);
        assert!(crf.predict_sequence(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_one_tag_per_token() {
        let crf = model(true);
        let features = sentence_features(&["Paris"]);
        assert_eq!(crf.predict_sequence(&features).unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_logreg_artifact() {
        let artifact = ModelArtifact::zeroed(ModelKind::LogReg, vec![Tag::Outside]);
        assert!(CrfModel::from_artifact(artifact, false).is_err());
    }
}
