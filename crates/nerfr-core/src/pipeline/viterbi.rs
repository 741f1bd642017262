//! # Viterbi Decoding for CRF
//!
//! Finds the highest-scoring tag sequence given per-position emission scores
//! and a label-to-label transition matrix.

use crate::error::{NerError, Result};
use crate::pipeline::bio_tags::Tag;

/// Viterbi decoder for linear-chain CRF tag sequences.
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    num_tags: usize,
}

impl ViterbiDecoder {
    /// Create a new Viterbi decoder over `num_tags` labels.
    pub fn new(num_tags: usize) -> Self {
        Self { num_tags }
    }

    pub fn num_tags(&self) -> usize {
        self.num_tags
    }

    /// Decode the optimal tag sequence.
    ///
    /// # Arguments
    /// * `emission_scores` - Matrix of shape [seq_len, num_tags]
    /// * `transition_matrix` - Matrix of shape [num_tags, num_tags], indexed `[from][to]`
    ///
    /// # Returns
    /// The optimal tag sequence as label indices.
    pub fn decode(
        &self,
        emission_scores: &[Vec<f32>],
        transition_matrix: &[Vec<f32>],
    ) -> Result<Vec<usize>> {
        let allowed = vec![vec![true; self.num_tags]; self.num_tags];
        let starts = vec![true; self.num_tags];
        self.run(emission_scores, transition_matrix, &allowed, &starts)
    }

    /// Decode with hard BIO constraints: `I-X` may only follow `B-X`/`I-X`
    /// and a sequence may not start with `I-X`.
    ///
    /// `labels` gives the tag for each label index.
    pub fn decode_constrained(
        &self,
        emission_scores: &[Vec<f32>],
        transition_matrix: &[Vec<f32>],
        labels: &[Tag],
    ) -> Result<Vec<usize>> {
        if labels.len() != self.num_tags {
            return Err(NerError::Inference(format!(
                "label set size mismatch: expected {}, got {}",
                self.num_tags,
                labels.len()
            )));
        }

        let allowed: Vec<Vec<bool>> = labels
            .iter()
            .map(|from| {
                labels
                    .iter()
                    .map(|to| Tag::is_valid_transition(from, to))
                    .collect()
            })
            .collect();
        let starts: Vec<bool> = labels.iter().map(Tag::is_valid_start).collect();

        self.run(emission_scores, transition_matrix, &allowed, &starts)
    }

    fn run(
        &self,
        emission_scores: &[Vec<f32>],
        transition_matrix: &[Vec<f32>],
        allowed: &[Vec<bool>],
        starts: &[bool],
    ) -> Result<Vec<usize>> {
        let seq_len = emission_scores.len();
        if seq_len == 0 {
            return Ok(Vec::new());
        }

        // Validate dimensions
        if let Some(row) = emission_scores.iter().find(|r| r.len() != self.num_tags) {
            return Err(NerError::Inference(format!(
                "emission score dimension mismatch: expected {}, got {}",
                self.num_tags,
                row.len()
            )));
        }
        if transition_matrix.len() != self.num_tags
            || transition_matrix.iter().any(|r| r.len() != self.num_tags)
        {
            return Err(NerError::Inference(format!(
                "transition matrix must be {n}x{n}",
                n = self.num_tags
            )));
        }

        // DP table
        let mut dp: Vec<Vec<f32>> = vec![vec![f32::NEG_INFINITY; self.num_tags]; seq_len];
        let mut backptr: Vec<Vec<Option<usize>>> = vec![vec![None; self.num_tags]; seq_len];

        // Initialize
        for tag in 0..self.num_tags {
            if starts[tag] {
                dp[0][tag] = emission_scores[0][tag];
            }
        }

        // Forward pass
        for pos in 1..seq_len {
            for curr_tag in 0..self.num_tags {
                let mut best_score = f32::NEG_INFINITY;
                let mut best_prev = None;

                for prev_tag in 0..self.num_tags {
                    if !allowed[prev_tag][curr_tag] || dp[pos - 1][prev_tag] == f32::NEG_INFINITY
                    {
                        continue;
                    }

                    let score = dp[pos - 1][prev_tag]
                        + transition_matrix[prev_tag][curr_tag]
                        + emission_scores[pos][curr_tag];

                    if best_prev.is_none() || score > best_score {
                        best_score = score;
                        best_prev = Some(prev_tag);
                    }
                }

                dp[pos][curr_tag] = best_score;
                backptr[pos][curr_tag] = best_prev;
            }
        }

        // Best final tag
        let mut best_final_tag = None;
        let mut best_final_score = f32::NEG_INFINITY;
        for tag in 0..self.num_tags {
            let reachable = pos_reachable(&dp, &backptr, seq_len - 1, tag);
            if reachable && (best_final_tag.is_none() || dp[seq_len - 1][tag] > best_final_score) {
                best_final_score = dp[seq_len - 1][tag];
                best_final_tag = Some(tag);
            }
        }
        let best_final_tag = best_final_tag.ok_or_else(|| {
            NerError::Inference("no admissible tag sequence under the transition constraints".into())
        })?;

        // Backtrack
        let mut path = vec![best_final_tag];
        let mut curr_tag = best_final_tag;
        for pos in (1..seq_len).rev() {
            curr_tag = backptr[pos][curr_tag].ok_or_else(|| {
                NerError::Inference(format!("broken backpointer at position {pos}"))
            })?;
            path.push(curr_tag);
        }

        path.reverse();
        Ok(path)
    }
}

/// A cell is reachable if it was seeded (position 0) or has a backpointer.
fn pos_reachable(
    dp: &[Vec<f32>],
    backptr: &[Vec<Option<usize>>],
    pos: usize,
    tag: usize,
) -> bool {
    if pos == 0 {
        dp[0][tag] != f32::NEG_INFINITY
    } else {
        backptr[pos][tag].is_some()
    }
}
