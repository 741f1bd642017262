//! Sparse linear scoring shared by both labeler families.

use std::collections::HashMap;

use crate::pipeline::features::FeatureMap;

/// Per-attribute weight vectors over a fixed label set.
#[derive(Debug, Clone)]
pub struct LinearScorer {
    num_labels: usize,
    weights: HashMap<String, Vec<f32>>,
}

impl LinearScorer {
    pub fn new(num_labels: usize, weights: HashMap<String, Vec<f32>>) -> Self {
        Self {
            num_labels,
            weights,
        }
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Score every label for one token. Unknown attributes contribute nothing.
    pub fn score(&self, features: &FeatureMap) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.num_labels];
        for (attr, value) in features.attributes() {
            if let Some(row) = self.weights.get(&attr) {
                for (score, weight) in scores.iter_mut().zip(row) {
                    *score += weight * value;
                }
            }
        }
        scores
    }
}

/// Index of the highest score; the first one wins ties.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
}
