//! Entity-level evaluation.
//!
//! Chunking follows the lenient seqeval rules: any `B-X`, or an `I-X` that
//! does not continue a chunk of type `X`, opens a new entity. This accepts
//! IOB1 gold files and counts stray `I-` predictions as entities. A
//! predicted entity is correct only when its type, start and end all match.

use std::collections::HashSet;
use std::fmt;

use anyhow::{Result, anyhow, bail};
use nerfr_core::{Recognizer, Tag};
use rusev::{Average, DefaultRusevConfig, classification_report_conf};
use serde::Serialize;

use crate::conll::Corpus;

const MICRO_LABEL: &str = "micro avg";

/// Metrics for a single entity type, or the micro average.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub class: String,
    pub precision: f32,
    pub recall: f32,
    pub fscore: f32,
    /// Number of gold entities of this class.
    pub support: usize,
}

impl ClassMetrics {
    fn empty(class: impl Into<String>) -> Self {
        ClassMetrics {
            class: class.into(),
            precision: 0.0,
            recall: 0.0,
            fscore: 0.0,
            support: 0,
        }
    }
}

impl From<rusev::ClassMetrics> for ClassMetrics {
    fn from(row: rusev::ClassMetrics) -> Self {
        ClassMetrics {
            class: row.class,
            precision: row.precision,
            recall: row.recall,
            fscore: row.fscore,
            support: row.support,
        }
    }
}

fn ratio(num: usize, denom: usize) -> f32 {
    if denom == 0 {
        0.0
    } else {
        num as f32 / denom as f32
    }
}

/// Result of scoring a set of predictions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Micro-averaged entity metrics.
    pub micro: ClassMetrics,
    /// Per-type metrics, sorted by type name.
    pub classes: Vec<ClassMetrics>,
    pub token_accuracy: f32,
    pub sentences: usize,
    pub tokens: usize,
}

impl EvaluationReport {
    pub fn f1(&self) -> f32 {
        self.micro.fscore
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<16} {:>9} {:>9} {:>9} {:>9}",
            "class", "precision", "recall", "f1-score", "support"
        )?;
        for row in self.classes.iter().chain(std::iter::once(&self.micro)) {
            writeln!(
                f,
                "{:<16} {:>9.4} {:>9.4} {:>9.4} {:>9}",
                row.class, row.precision, row.recall, row.fscore, row.support
            )?;
        }
        write!(
            f,
            "token accuracy {:.4} over {} tokens in {} sentences",
            self.token_accuracy, self.tokens, self.sentences
        )
    }
}

/// Score predicted tag sequences against gold ones.
pub fn score(gold: &[Vec<Tag>], predicted: &[Vec<Tag>]) -> Result<EvaluationReport> {
    if gold.len() != predicted.len() {
        bail!(
            "got {} predicted sentences for {} gold sentences",
            predicted.len(),
            gold.len()
        );
    }

    let mut correct_tokens = 0;
    let mut tokens = 0;
    for (i, (gold_tags, pred_tags)) in gold.iter().zip(predicted).enumerate() {
        if gold_tags.len() != pred_tags.len() {
            bail!(
                "sentence {i}: {} predicted tags for {} tokens",
                pred_tags.len(),
                gold_tags.len()
            );
        }
        tokens += gold_tags.len();
        correct_tokens += gold_tags.iter().zip(pred_tags).filter(|(g, p)| g == p).count();
    }

    let (micro, classes) = entity_metrics(gold, predicted)?;

    Ok(EvaluationReport {
        micro,
        classes,
        token_accuracy: ratio(correct_tokens, tokens),
        sentences: gold.len(),
        tokens,
    })
}

fn entity_metrics(
    gold: &[Vec<Tag>],
    predicted: &[Vec<Tag>],
) -> Result<(ClassMetrics, Vec<ClassMetrics>)> {
    // The averaged rows are undefined without a single chunk on either side.
    let has_entities = gold
        .iter()
        .chain(predicted)
        .flatten()
        .any(|tag| *tag != Tag::Outside);
    if !has_entities {
        return Ok((ClassMetrics::empty(MICRO_LABEL), Vec::new()));
    }

    let gold = as_strings(gold);
    let predicted = as_strings(predicted);
    let report = classification_report_conf(
        borrowed(&gold),
        borrowed(&predicted),
        DefaultRusevConfig::default(),
    )
    .map_err(|e| anyhow!("computing entity metrics: {e}"))?;

    let mut micro = ClassMetrics::empty(MICRO_LABEL);
    let mut classes = Vec::new();
    for row in HashSet::<rusev::ClassMetrics>::from(report) {
        match row.average {
            Average::None => classes.push(ClassMetrics::from(row)),
            Average::Micro => {
                micro = ClassMetrics {
                    class: MICRO_LABEL.to_string(),
                    ..ClassMetrics::from(row)
                }
            }
            _ => {}
        }
    }
    classes.sort_by(|a, b| a.class.cmp(&b.class));

    Ok((micro, classes))
}

fn as_strings(sequences: &[Vec<Tag>]) -> Vec<Vec<String>> {
    sequences
        .iter()
        .map(|tags| tags.iter().map(Tag::to_string).collect())
        .collect()
}

fn borrowed(sequences: &[Vec<String>]) -> Vec<Vec<&str>> {
    sequences
        .iter()
        .map(|tags| tags.iter().map(String::as_str).collect())
        .collect()
}

/// Run `recognizer` over every sentence of `corpus` and score the result.
pub fn evaluate(recognizer: &Recognizer, corpus: &Corpus) -> Result<EvaluationReport> {
    let predicted = recognizer.label_batch(&corpus.sentences)?;
    score(&corpus.labels, &predicted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nerfr_core::pipeline::parse_tags;

    fn tags(labels: &[&str]) -> Vec<Tag> {
        parse_tags(labels).unwrap()
    }

    #[test]
    fn test_perfect_prediction() {
        let gold = vec![tags(&["B-PER", "I-PER", "O", "B-LOC"])];
        let report = score(&gold, &gold).unwrap();

        assert_eq!(report.f1(), 1.0);
        assert_eq!(report.token_accuracy, 1.0);
        assert_eq!(report.classes.len(), 2);
        assert_eq!(report.micro.support, 2);
    }

    #[test]
    fn test_partial_span_is_wrong() {
        let gold = vec![tags(&["B-PER", "I-PER", "O"])];
        let pred = vec![tags(&["B-PER", "O", "O"])];
        let report = score(&gold, &pred).unwrap();

        assert_eq!(report.micro.precision, 0.0);
        assert_eq!(report.micro.recall, 0.0);
        assert_eq!(report.f1(), 0.0);
        assert!((report.token_accuracy - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_per_class_metrics() {
        let gold = vec![
            tags(&["B-PER", "O", "B-LOC"]),
            tags(&["B-LOC", "O"]),
        ];
        let pred = vec![
            tags(&["B-PER", "O", "B-ORG"]),
            tags(&["B-LOC", "O"]),
        ];
        let report = score(&gold, &pred).unwrap();

        let loc = &report.classes[0];
        assert_eq!(loc.class, "LOC");
        assert_eq!(loc.precision, 1.0);
        assert_eq!(loc.recall, 0.5);
        assert_eq!(loc.support, 2);

        let org = &report.classes[1];
        assert_eq!(org.class, "ORG");
        assert_eq!(org.precision, 0.0);
        assert_eq!(org.support, 0);

        assert!((report.micro.precision - 2.0 / 3.0).abs() < 1e-6);
        assert!((report.micro.recall - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_iob1_gold_is_chunked() {
        let gold = vec![tags(&["I-PER", "I-PER", "O", "I-LOC"])];
        let report = score(&gold, &gold).unwrap();

        assert_eq!(report.micro.support, 2);
        assert_eq!(report.f1(), 1.0);
        assert_eq!(report.classes.len(), 2);
    }

    #[test]
    fn test_stray_inside_counts_as_false_positive() {
        let gold = vec![tags(&["O", "O", "B-LOC"])];
        let pred = vec![tags(&["O", "I-PER", "B-LOC"])];
        let report = score(&gold, &pred).unwrap();

        assert!((report.micro.precision - 0.5).abs() < 1e-6);
        assert_eq!(report.micro.recall, 1.0);

        let per = report.classes.iter().find(|c| c.class == "PER").unwrap();
        assert_eq!(per.precision, 0.0);
        assert_eq!(per.support, 0);
    }

    #[test]
    fn test_no_entities() {
        let gold = vec![tags(&["O", "O"])];
        let report = score(&gold, &gold).unwrap();

        assert!(report.classes.is_empty());
        assert_eq!(report.f1(), 0.0);
        assert_eq!(report.micro.class, "micro avg");
        assert_eq!(report.token_accuracy, 1.0);
    }

    #[test]
    fn test_length_mismatch() {
        let gold = vec![tags(&["O", "O"])];
        let pred = vec![tags(&["O"])];
        assert!(score(&gold, &pred).is_err());
        assert!(score(&gold, &[]).is_err());
    }

    #[test]
    fn test_report_display() {
        let gold = vec![tags(&["B-MISC"])];
        let text = score(&gold, &gold).unwrap().to_string();
        assert!(text.contains("MISC"));
        assert!(text.contains("micro avg"));
        assert!(text.contains("token accuracy 1.0000"));
    }
}
