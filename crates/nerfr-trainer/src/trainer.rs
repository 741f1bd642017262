//! Averaged perceptron training for both labeler families.
//!
//! The per-token family updates one multiclass perceptron per mistaken token.
//! The CRF family decodes the whole sentence with Viterbi and updates emission
//! and transition weights with the difference between the gold and predicted
//! paths. Final weights are averaged over every update step.

use std::collections::HashMap;

use anyhow::{Result, bail};
use nerfr_core::model::linear::argmax;
use nerfr_core::{FeatureMap, ModelArtifact, ModelKind, Tag, ViterbiDecoder, sentence_features};
use tracing::{debug, info};

use crate::conll::Corpus;

/// Training hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainerConfig {
    pub kind: ModelKind,
    pub epochs: usize,
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::Crf,
            epochs: 10,
            seed: 42,
        }
    }
}

/// A parameter vector with lazily tracked running average.
#[derive(Debug, Clone)]
struct Averaged {
    current: Vec<f32>,
    // sum of step * delta over every update
    shadow: Vec<f32>,
}

impl Averaged {
    fn zeros(len: usize) -> Self {
        Self {
            current: vec![0.0; len],
            shadow: vec![0.0; len],
        }
    }

    fn update(&mut self, idx: usize, delta: f32, step: u64) {
        self.current[idx] += delta;
        self.shadow[idx] += step as f32 * delta;
    }

    fn averaged(&self, step: u64) -> Vec<f32> {
        let step = step as f32;
        self.current
            .iter()
            .zip(&self.shadow)
            .map(|(w, s)| w - s / step)
            .collect()
    }
}

/// Mutable model state during training.
struct Parameters {
    num_labels: usize,
    weights: HashMap<String, Averaged>,
    intercepts: Averaged,
    // flattened [from * n + to]
    transitions: Averaged,
    step: u64,
}

impl Parameters {
    fn new(num_labels: usize) -> Self {
        Self {
            num_labels,
            weights: HashMap::new(),
            intercepts: Averaged::zeros(num_labels),
            transitions: Averaged::zeros(num_labels * num_labels),
            step: 1,
        }
    }

    fn scores(&self, attributes: &[(String, f32)], with_intercepts: bool) -> Vec<f32> {
        let mut scores = if with_intercepts {
            self.intercepts.current.clone()
        } else {
            vec![0.0; self.num_labels]
        };
        for (attr, value) in attributes {
            if let Some(row) = self.weights.get(attr) {
                for (score, w) in scores.iter_mut().zip(&row.current) {
                    *score += w * value;
                }
            }
        }
        scores
    }

    fn transition_matrix(&self) -> Vec<Vec<f32>> {
        self.transitions
            .current
            .chunks(self.num_labels)
            .map(<[f32]>::to_vec)
            .collect()
    }

    fn reward(&mut self, attributes: &[(String, f32)], gold: usize, pred: usize) {
        let n = self.num_labels;
        let step = self.step;
        for (attr, value) in attributes {
            let row = self
                .weights
                .entry(attr.clone())
                .or_insert_with(|| Averaged::zeros(n));
            row.update(gold, *value, step);
            row.update(pred, -value, step);
        }
    }

    fn reward_transition(&mut self, from: usize, to: usize, delta: f32) {
        let idx = from * self.num_labels + to;
        self.transitions.update(idx, delta, self.step);
    }

    fn into_artifact(self, kind: ModelKind, labels: Vec<Tag>) -> ModelArtifact {
        let step = self.step;
        let mut artifact = ModelArtifact::zeroed(kind, labels);
        artifact.weights = self
            .weights
            .into_iter()
            .map(|(attr, row)| (attr, row.averaged(step)))
            .filter(|(_, row)| row.iter().any(|w| *w != 0.0))
            .collect();
        match kind {
            ModelKind::LogReg => artifact.intercepts = self.intercepts.averaged(step),
            ModelKind::Crf => {
                artifact.transitions = self
                    .transitions
                    .averaged(step)
                    .chunks(self.num_labels)
                    .map(<[f32]>::to_vec)
                    .collect();
            }
        }
        artifact
    }
}

/// Per-epoch training summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochStats {
    pub epoch: usize,
    pub mistakes: usize,
    pub tokens: usize,
}

impl EpochStats {
    /// Token accuracy of the online predictions made during the epoch.
    pub fn accuracy(&self) -> f32 {
        if self.tokens == 0 {
            0.0
        } else {
            1.0 - self.mistakes as f32 / self.tokens as f32
        }
    }
}

pub struct Trainer {
    config: TrainerConfig,
    labels: Vec<Tag>,
    label_index: HashMap<Tag, usize>,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            labels: Vec::new(),
            label_index: HashMap::new(),
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fit a model on `corpus` and return the averaged artifact.
    pub fn fit(&mut self, corpus: &Corpus) -> Result<ModelArtifact> {
        Ok(self.fit_with_history(corpus)?.0)
    }

    /// Like [`Trainer::fit`], also returning per-epoch statistics.
    pub fn fit_with_history(&mut self, corpus: &Corpus) -> Result<(ModelArtifact, Vec<EpochStats>)> {
        if corpus.is_empty() {
            bail!("training corpus is empty");
        }
        if self.config.epochs == 0 {
            bail!("epochs must be at least 1");
        }

        self.labels = corpus.label_set();
        self.label_index = self
            .labels
            .iter()
            .enumerate()
            .map(|(i, tag)| (tag.clone(), i))
            .collect();

        let features: Vec<Vec<FeatureMap>> =
            corpus.sentences.iter().map(|s| sentence_features(s)).collect();
        let gold: Vec<Vec<usize>> = corpus
            .labels
            .iter()
            .map(|tags| tags.iter().map(|t| self.label_index[t]).collect())
            .collect();

        info!(
            kind = %self.config.kind,
            sentences = corpus.len(),
            tokens = corpus.token_count(),
            labels = self.labels.len(),
            epochs = self.config.epochs,
            "starting training"
        );

        let mut params = Parameters::new(self.labels.len());
        let mut rng = oorandom::Rand64::new(u128::from(self.config.seed));
        let mut order: Vec<usize> = (0..corpus.len()).collect();
        let mut history = Vec::with_capacity(self.config.epochs);

        for epoch in 1..=self.config.epochs {
            shuffle(&mut order, &mut rng);

            let mut stats = EpochStats {
                epoch,
                mistakes: 0,
                tokens: 0,
            };
            for &idx in &order {
                let (sentence, gold) = (&features[idx], &gold[idx]);
                if sentence.is_empty() {
                    continue;
                }
                stats.tokens += sentence.len();
                stats.mistakes += match self.config.kind {
                    ModelKind::LogReg => train_tokens(&mut params, sentence, gold),
                    ModelKind::Crf => train_sequence(&mut params, sentence, gold)?,
                };
            }

            info!(
                epoch,
                epochs = self.config.epochs,
                mistakes = stats.mistakes,
                accuracy = format_args!("{:.2}%", stats.accuracy() * 100.0),
                "epoch complete"
            );
            history.push(stats);
        }

        let artifact = params.into_artifact(self.config.kind, self.labels.clone());
        debug!(attributes = artifact.weights.len(), "averaged weights");
        Ok((artifact, history))
    }
}

/// One multiclass perceptron step per token. Returns the number of mistakes.
fn train_tokens(params: &mut Parameters, sentence: &[FeatureMap], gold: &[usize]) -> usize {
    let mut mistakes = 0;
    for (features, &gold) in sentence.iter().zip(gold) {
        let attributes = features.attributes();
        let pred = argmax(&params.scores(&attributes, true)).unwrap_or(gold);
        if pred != gold {
            mistakes += 1;
            params.reward(&attributes, gold, pred);
            let step = params.step;
            params.intercepts.update(gold, 1.0, step);
            params.intercepts.update(pred, -1.0, step);
        }
        params.step += 1;
    }
    mistakes
}

/// One structured perceptron step per sentence. Returns the number of
/// mistaken positions.
fn train_sequence(params: &mut Parameters, sentence: &[FeatureMap], gold: &[usize]) -> Result<usize> {
    let attributes: Vec<Vec<(String, f32)>> = sentence.iter().map(FeatureMap::attributes).collect();
    let emissions: Vec<Vec<f32>> = attributes.iter().map(|a| params.scores(a, false)).collect();
    let pred = ViterbiDecoder::new(params.num_labels).decode(&emissions, &params.transition_matrix())?;

    let mut mistakes = 0;
    for (i, attrs) in attributes.iter().enumerate() {
        if pred[i] != gold[i] {
            mistakes += 1;
            params.reward(attrs, gold[i], pred[i]);
        }
    }
    if mistakes > 0 {
        for i in 1..gold.len() {
            params.reward_transition(gold[i - 1], gold[i], 1.0);
            params.reward_transition(pred[i - 1], pred[i], -1.0);
        }
    }
    params.step += 1;
    Ok(mistakes)
}

/// Fisher-Yates shuffle driven by a seeded generator.
fn shuffle(items: &mut [usize], rng: &mut oorandom::Rand64) {
    for i in (1..items.len()).rev() {
        let j = rng.rand_range(0..(i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conll::parse_conll;
    use nerfr_core::{Labeler, Recognizer, RecognizerConfig};

    const TRAIN: &str = "\
Emmanuel B-PER
Macron I-PER
visite O
Paris B-LOC
. O

Marie B-PER
habite O
à O
Lyon B-LOC
. O

Le O
président O
Jacques B-PER
Chirac I-PER
dort O
. O

Il O
aime O
Marseille B-LOC
. O
";

    fn corpus() -> Corpus {
        parse_conll(TRAIN.as_bytes()).unwrap()
    }

    fn token_accuracy(predicted: &[Vec<Tag>], gold: &[Vec<Tag>]) -> f32 {
        let pairs: Vec<_> = predicted.iter().flatten().zip(gold.iter().flatten()).collect();
        let correct = pairs.iter().filter(|(p, g)| p == g).count();
        correct as f32 / pairs.len() as f32
    }

    fn recognizer(artifact: ModelArtifact) -> Recognizer {
        let kind = artifact.kind;
        let labeler = Labeler::from_artifact(artifact, kind, false).unwrap();
        Recognizer::with_labeler(RecognizerConfig::new().with_model_kind(kind), labeler).unwrap()
    }

    #[test]
    fn test_crf_fits_training_data() {
        let corpus = corpus();
        let mut trainer = Trainer::new(TrainerConfig {
            kind: ModelKind::Crf,
            epochs: 20,
            seed: 7,
        });
        let artifact = trainer.fit(&corpus).unwrap();

        assert_eq!(artifact.kind, ModelKind::Crf);
        assert!(artifact.validate().is_ok());

        let recognizer = recognizer(artifact);
        let predicted = recognizer.label_batch(&corpus.sentences).unwrap();
        assert!(token_accuracy(&predicted, &corpus.labels) >= 0.9);
    }

    #[test]
    fn test_logreg_fits_training_data() {
        let corpus = corpus();
        let mut trainer = Trainer::new(TrainerConfig {
            kind: ModelKind::LogReg,
            epochs: 20,
            seed: 7,
        });
        let artifact = trainer.fit(&corpus).unwrap();

        assert_eq!(artifact.kind, ModelKind::LogReg);
        assert_eq!(artifact.intercepts.len(), artifact.labels.len());

        let recognizer = recognizer(artifact);
        let predicted = recognizer.label_batch(&corpus.sentences).unwrap();
        assert!(token_accuracy(&predicted, &corpus.labels) >= 0.9);
    }

    #[test]
    fn test_same_seed_same_model() {
        let corpus = corpus();
        let config = TrainerConfig {
            kind: ModelKind::Crf,
            epochs: 3,
            seed: 11,
        };
        let a = Trainer::new(config).fit(&corpus).unwrap();
        let b = Trainer::new(config).fit(&corpus).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_history_has_one_entry_per_epoch() {
        let mut trainer = Trainer::new(TrainerConfig {
            epochs: 4,
            ..TrainerConfig::default()
        });
        let (_, history) = trainer.fit_with_history(&corpus()).unwrap();
        assert_eq!(history.len(), 4);
        assert!(history.iter().all(|s| s.tokens == 20));
    }

    #[test]
    fn test_empty_corpus_rejected() {
        let mut trainer = Trainer::new(TrainerConfig::default());
        assert!(trainer.fit(&Corpus::default()).is_err());
    }

    #[test]
    fn test_averaged_weights() {
        let mut p = Averaged::zeros(1);
        // +1 at step 1, then stays for steps 2 and 3
        p.update(0, 1.0, 1);
        assert_eq!(p.averaged(1), vec![0.0]);
        assert!((p.averaged(4)[0] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = oorandom::Rand64::new(3);
        let mut items: Vec<usize> = (0..50).collect();
        shuffle(&mut items, &mut rng);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }
}
