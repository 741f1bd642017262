//! # Feature Extraction
//!
//! Turns each token of a sentence into a small map of lexical cues: its
//! lower-cased form, case shape, affixes, and the same cues for its immediate
//! neighbours. The maps are consumed by the labeler as sparse attribute sets.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single feature value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Str(String),
    Float(f32),
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<f32> for FeatureValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

/// Feature names, keyed by what they describe.
pub mod keys {
    pub const BIAS: &str = "bias";
    pub const WORD_LOWER: &str = "word.lower";
    pub const WORD_ISUPPER: &str = "word.isupper";
    pub const WORD_ISTITLE: &str = "word.istitle";
    pub const WORD_ISDIGIT: &str = "word.isdigit";
    pub const SUFFIX_3: &str = "suffix-3";
    pub const SUFFIX_2: &str = "suffix-2";
    pub const PREFIX_1: &str = "prefix-1";
    pub const PREFIX_2: &str = "prefix-2";
    pub const PREFIX_3: &str = "prefix-3";
    pub const PREV_WORD_LOWER: &str = "-1:word.lower";
    pub const PREV_WORD_ISTITLE: &str = "-1:word.istitle";
    pub const PREV_WORD_ISUPPER: &str = "-1:word.isupper";
    pub const NEXT_WORD_LOWER: &str = "+1:word.lower";
    pub const NEXT_WORD_ISTITLE: &str = "+1:word.istitle";
    pub const NEXT_WORD_ISUPPER: &str = "+1:word.isupper";
    pub const BOS: &str = "BOS";
    pub const EOS: &str = "EOS";
}

/// The features of one token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMap {
    features: BTreeMap<String, FeatureValue>,
}

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<FeatureValue>) {
        self.features.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FeatureValue> {
        self.features.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.features.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.features.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Project the map onto weighted model attributes.
    ///
    /// Strings become `key=value` with weight 1, `true` becomes `key` with
    /// weight 1, floats become `key` weighted by the value. `false` flags
    /// contribute nothing and are skipped.
    pub fn attributes(&self) -> Vec<(String, f32)> {
        self.features
            .iter()
            .filter_map(|(key, value)| match value {
                FeatureValue::Str(s) => Some((format!("{key}={s}"), 1.0)),
                FeatureValue::Bool(true) => Some((key.clone(), 1.0)),
                FeatureValue::Bool(false) => None,
                FeatureValue::Float(x) => Some((key.clone(), *x)),
            })
            .collect()
    }
}

impl fmt::Display for FeatureMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .features
            .iter()
            .map(|(k, v)| match v {
                FeatureValue::Bool(b) => format!("{k}={b}"),
                FeatureValue::Str(s) => format!("{k}={s:?}"),
                FeatureValue::Float(x) => format!("{k}={x}"),
            })
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Extract the features of token `index` in `sentence`.
///
/// # Panics
///
/// Panics if `index` is out of bounds.
pub fn token_features<S: AsRef<str>>(sentence: &[S], index: usize) -> FeatureMap {
    let word = sentence[index].as_ref();
    let mut features = FeatureMap::new();

    features.insert(keys::BIAS, 1.0f32);
    features.insert(keys::WORD_LOWER, word.to_lowercase());
    features.insert(keys::WORD_ISUPPER, is_upper(word));
    features.insert(keys::WORD_ISTITLE, is_title(word));
    features.insert(keys::WORD_ISDIGIT, is_digit(word));
    features.insert(keys::SUFFIX_3, suffix(word, 3).to_lowercase());
    features.insert(keys::SUFFIX_2, suffix(word, 2).to_lowercase());
    features.insert(keys::PREFIX_1, prefix(word, 1).to_lowercase());
    features.insert(keys::PREFIX_2, prefix(word, 2).to_lowercase());
    features.insert(keys::PREFIX_3, prefix(word, 3).to_lowercase());

    if index > 0 {
        let prev = sentence[index - 1].as_ref();
        features.insert(keys::PREV_WORD_LOWER, prev.to_lowercase());
        features.insert(keys::PREV_WORD_ISTITLE, is_title(prev));
        features.insert(keys::PREV_WORD_ISUPPER, is_upper(prev));
    } else {
        features.insert(keys::BOS, true);
    }

    if index + 1 < sentence.len() {
        let next = sentence[index + 1].as_ref();
        features.insert(keys::NEXT_WORD_LOWER, next.to_lowercase());
        features.insert(keys::NEXT_WORD_ISTITLE, is_title(next));
        features.insert(keys::NEXT_WORD_ISUPPER, is_upper(next));
    } else {
        features.insert(keys::EOS, true);
    }

    features
}

/// Extract features for every token of a sentence, in order.
pub fn sentence_features<S: AsRef<str>>(sentence: &[S]) -> Vec<FeatureMap> {
    (0..sentence.len())
        .map(|i| token_features(sentence, i))
        .collect()
}

/// At least one cased character and no lower-case one.
pub fn is_upper(word: &str) -> bool {
    let mut cased = false;
    for c in word.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Title case: upper-case characters only start a cased run, lower-case
/// characters only continue one, and at least one character is cased.
pub fn is_title(word: &str) -> bool {
    let mut cased = false;
    let mut previous_cased = false;
    for c in word.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else {
            previous_cased = false;
        }
    }
    cased
}

/// Decimal digits in any script. Fractions and numeral letters such as
/// `½` or `Ⅻ` are numeric but not digits.
static DIGITS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\p{Nd}+$").ok());

/// Non-empty and made only of decimal digits.
pub fn is_digit(word: &str) -> bool {
    DIGITS.as_ref().is_some_and(|digits| digits.is_match(word))
}

fn prefix(word: &str, n: usize) -> &str {
    match word.char_indices().nth(n) {
        Some((idx, _)) => &word[..idx],
        None => word,
    }
}

fn suffix(word: &str, n: usize) -> &str {
    let count = word.chars().count();
    if count <= n {
        return word;
    }
    match word.char_indices().nth(count - n) {
        Some((idx, _)) => &word[idx..],
        None => word,
    }
}
