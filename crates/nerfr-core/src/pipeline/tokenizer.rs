//! # Tokenizer
//!
//! Splits raw text into word and punctuation tokens for sequence labeling.
//! A token is either a maximal run of Unicode word characters or a single
//! character that is neither a word character nor whitespace.

use regex::Regex;

use crate::error::Result;

/// Word runs, or any single non-space, non-word character.
const TOKEN_PATTERN: &str = r"\w+|[^\w\s]";

/// A token extracted from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token text content, exactly as it appears in the input
    pub text: String,
    /// Token index in the sentence
    pub index: usize,
}

/// Regex-driven tokenizer shared across requests.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
}

impl Tokenizer {
    /// Create a new tokenizer instance.
    ///
    /// # Errors
    ///
    /// Returns `NerError::RegexError` if the token pattern fails to compile
    /// (should never happen with the static pattern defined here).
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(TOKEN_PATTERN)?,
        })
    }

    /// Tokenize a text into a sequence of tokens.
    ///
    /// Leading and trailing whitespace is ignored; whitespace-only input
    /// yields no tokens.
    ///
    /// # Examples
    /// ```
    /// use nerfr_core::pipeline::tokenizer::Tokenizer;
    ///
    /// let tokenizer = Tokenizer::new().unwrap();
    /// let tokens = tokenizer.tokenize("Paris.");
    /// let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
    /// assert_eq!(texts, ["Paris", "."]);
    /// ```
    pub fn tokenize(&self, input: &str) -> Vec<Token> {
        if input.trim().is_empty() {
            return Vec::new();
        }

        self.pattern
            .find_iter(input)
            .enumerate()
            .map(|(index, m)| Token {
                text: m.as_str().to_string(),
                index,
            })
            .collect()
    }

    /// Tokenize and keep only the token texts.
    pub fn tokenize_words(&self, input: &str) -> Vec<String> {
        self.tokenize(input).into_iter().map(|t| t.text).collect()
    }
}
