//! Data loading for CoNLL-style BIO files.
//!
//! One token per line, whitespace-separated columns, token first and label
//! last. Blank lines separate sentences and `#` lines are comments.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use nerfr_core::Tag;

/// Parallel token and tag sequences, one entry per sentence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub sentences: Vec<Vec<String>>,
    pub labels: Vec<Vec<Tag>>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(Vec::len).sum()
    }

    /// Every distinct tag in the corpus, `O` first then sorted.
    pub fn label_set(&self) -> Vec<Tag> {
        let mut labels: Vec<Tag> = self.labels.iter().flatten().cloned().collect();
        labels.push(Tag::Outside);
        labels.sort();
        labels.dedup();
        labels
    }

    fn push(&mut self, tokens: Vec<String>, tags: Vec<Tag>) {
        self.sentences.push(tokens);
        self.labels.push(tags);
    }
}

/// Path of a split file, `<data_dir>/fr_<split>.conll`.
pub fn split_path(data_dir: &Path, split: &str) -> PathBuf {
    data_dir.join(format!("fr_{split}.conll"))
}

/// Load a corpus from a CoNLL file.
pub fn read_conll<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_conll(BufReader::new(file)).with_context(|| format!("reading {}", path.display()))
}

/// Parse CoNLL lines from any reader.
pub fn parse_conll<R: BufRead>(reader: R) -> Result<Corpus> {
    let mut corpus = Corpus::default();
    let mut current_tokens = Vec::new();
    let mut current_labels = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            if !current_tokens.is_empty() {
                corpus.push(
                    std::mem::take(&mut current_tokens),
                    std::mem::take(&mut current_labels),
                );
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let [token, .., label] = parts.as_slice() else {
            bail!("line {}: expected at least 2 columns, got {line:?}", line_no + 1);
        };

        let tag: Tag = label
            .parse()
            .with_context(|| format!("line {}", line_no + 1))?;
        current_tokens.push(token.to_string());
        current_labels.push(tag);
    }

    // Don't forget the last sentence
    if !current_tokens.is_empty() {
        corpus.push(current_tokens, current_labels);
    }

    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# id 1
Emmanuel\tNNP\tB-PER
Macron\tNNP\tI-PER
est\tVB\tO

# id 2
Paris B-LOC
. O
";

    #[test]
    fn test_parse_sentences() {
        let corpus = parse_conll(SAMPLE.as_bytes()).unwrap();

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.sentences[0], vec!["Emmanuel", "Macron", "est"]);
        assert_eq!(
            corpus.labels[0],
            vec![Tag::begin("PER"), Tag::inside("PER"), Tag::Outside]
        );
        assert_eq!(corpus.sentences[1], vec!["Paris", "."]);
        assert_eq!(corpus.token_count(), 5);
    }

    #[test]
    fn test_trailing_sentence_without_blank_line() {
        let corpus = parse_conll("Lyon B-LOC".as_bytes()).unwrap();
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_multiple_blank_lines() {
        let corpus = parse_conll("a O\n\n\n\nb O\n".as_bytes()).unwrap();
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn test_invalid_label_is_reported() {
        let err = parse_conll("Paris X-LOC\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 1"));
    }

    #[test]
    fn test_single_column_rejected() {
        let err = parse_conll("Lyon B-LOC\n\nParis\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_label_set() {
        let corpus = parse_conll(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            corpus.label_set(),
            vec![
                Tag::Outside,
                Tag::begin("LOC"),
                Tag::begin("PER"),
                Tag::inside("PER")
            ]
        );
    }

    #[test]
    fn test_split_path() {
        assert_eq!(
            split_path(Path::new("data"), "dev"),
            PathBuf::from("data/fr_dev.conll")
        );
    }
}
