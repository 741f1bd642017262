//! # BIO Tags for Named Entity Recognition
//!
//! Tags follow the BIO (Begin-Inside-Outside) scheme. Entity types are open
//! strings (`PER`, `LOC`, `ORG`, ...) defined by the trained model's label
//! space rather than by this crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NerError;

/// A BIO tag: `O`, `B-<TYPE>` or `I-<TYPE>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Tag {
    /// Outside any entity.
    Outside,
    /// First token of an entity of the given type.
    Begin(String),
    /// Continuation token of an entity of the given type.
    Inside(String),
}

impl Tag {
    pub fn begin(entity_type: impl Into<String>) -> Self {
        Self::Begin(entity_type.into())
    }

    pub fn inside(entity_type: impl Into<String>) -> Self {
        Self::Inside(entity_type.into())
    }

    /// Check if this is a "Begin" tag.
    pub fn is_begin(&self) -> bool {
        matches!(self, Self::Begin(_))
    }

    /// Check if this is an "Inside" tag.
    pub fn is_inside(&self) -> bool {
        matches!(self, Self::Inside(_))
    }

    /// Check if this is the "Outside" tag.
    pub fn is_outside(&self) -> bool {
        matches!(self, Self::Outside)
    }

    /// Get the entity type for this tag.
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            Self::Begin(t) | Self::Inside(t) => Some(t),
            Self::Outside => None,
        }
    }

    /// Check if transitioning from `from` tag to `to` tag is well-formed BIO.
    ///
    /// `I-X` may only follow `B-X` or `I-X`; every other transition is allowed.
    pub fn is_valid_transition(from: &Tag, to: &Tag) -> bool {
        match to {
            Self::Inside(to_type) => from.entity_type() == Some(to_type.as_str()),
            _ => true,
        }
    }

    /// Check if a sequence may start with this tag.
    pub fn is_valid_start(&self) -> bool {
        !self.is_inside()
    }
}

impl FromStr for Tag {
    type Err = NerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "O" {
            return Ok(Self::Outside);
        }
        let (prefix, entity_type) = s
            .split_once('-')
            .ok_or_else(|| NerError::InvalidTag(s.to_string()))?;
        if entity_type.is_empty() {
            return Err(NerError::InvalidTag(s.to_string()));
        }
        match prefix {
            "B" => Ok(Self::Begin(entity_type.to_string())),
            "I" => Ok(Self::Inside(entity_type.to_string())),
            _ => Err(NerError::InvalidTag(s.to_string())),
        }
    }
}

impl TryFrom<String> for Tag {
    type Error = NerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.to_string()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outside => write!(f, "O"),
            Self::Begin(t) => write!(f, "B-{t}"),
            Self::Inside(t) => write!(f, "I-{t}"),
        }
    }
}

/// Parse a sequence of label strings into tags.
pub fn parse_tags<S: AsRef<str>>(labels: &[S]) -> Result<Vec<Tag>, NerError> {
    labels.iter().map(|l| l.as_ref().parse()).collect()
}
