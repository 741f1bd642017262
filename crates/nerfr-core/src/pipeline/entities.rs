//! # Entity Reconstruction
//!
//! Groups a BIO tag sequence back into contiguous typed entity spans.
//!
//! An `I-X` tag that does not continue an open `X` entity closes whatever is
//! open and is then dropped: it never starts an entity of its own. Labelers
//! without transition constraints do emit such sequences, and they are
//! tolerated rather than rejected.

use serde::{Deserialize, Serialize};

use crate::pipeline::bio_tags::Tag;

/// A contiguous run of tokens forming one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Surface text, tokens joined by a single space.
    pub text: String,
    /// Entity type, e.g. `PER`.
    pub label: String,
    /// Index of the first token (inclusive).
    pub start: usize,
    /// Index of the last token (inclusive).
    pub end: usize,
    /// The constituent tokens.
    pub tokens: Vec<String>,
}

impl EntitySpan {
    fn open(label: &str, index: usize, token: &str) -> Self {
        Self {
            text: token.to_string(),
            label: label.to_string(),
            start: index,
            end: index,
            tokens: vec![token.to_string()],
        }
    }

    fn extend(&mut self, index: usize, token: &str) {
        self.end = index;
        self.text.push(' ');
        self.text.push_str(token);
        self.tokens.push(token.to_string());
    }

    /// Number of tokens covered by the span.
    pub fn token_count(&self) -> usize {
        self.end - self.start + 1
    }

    /// Tags reproducing this span, `B-X` followed by `I-X`.
    pub fn to_tags(&self) -> Vec<Tag> {
        (self.start..=self.end)
            .map(|i| {
                if i == self.start {
                    Tag::begin(self.label.as_str())
                } else {
                    Tag::inside(self.label.as_str())
                }
            })
            .collect()
    }
}

/// Reconstruct entities from parallel token and tag sequences, in order of
/// appearance.
///
/// Extra elements of the longer sequence are ignored; callers keep both
/// sequences the same length.
pub fn reconstruct<S: AsRef<str>>(tokens: &[S], tags: &[Tag]) -> Vec<EntitySpan> {
    let mut entities = Vec::new();
    let mut current: Option<EntitySpan> = None;

    for (index, (token, tag)) in tokens.iter().zip(tags).enumerate() {
        let token = token.as_ref();
        match tag {
            Tag::Begin(label) => {
                entities.extend(current.take());
                current = Some(EntitySpan::open(label, index, token));
            }
            Tag::Inside(label) => match current.as_mut() {
                Some(open) if open.label == *label => open.extend(index, token),
                _ => entities.extend(current.take()),
            },
            Tag::Outside => entities.extend(current.take()),
        }
    }

    entities.extend(current);
    entities
}

/// Rebuild a tag sequence of length `len` from entity spans.
///
/// Positions not covered by any span are `O`. Spans reaching past `len` are
/// clipped.
pub fn spans_to_tags(entities: &[EntitySpan], len: usize) -> Vec<Tag> {
    let mut tags = vec![Tag::Outside; len];
    for entity in entities {
        for (offset, tag) in entity.to_tags().into_iter().enumerate() {
            if let Some(slot) = tags.get_mut(entity.start + offset) {
                *slot = tag;
            }
        }
    }
    tags
}
