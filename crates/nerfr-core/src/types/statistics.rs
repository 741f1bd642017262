//! Per-type aggregates over recognised entities.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::pipeline::entities::EntitySpan;

/// Aggregate statistics for one entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeStatistics {
    pub label: String,
    pub count: usize,
    /// Share of all entities, in percent.
    pub percentage: f64,
    /// Share of all tokens covered by entities of this type, in percent.
    pub token_percentage: f64,
}

/// Statistics over the entities of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub total_entities: usize,
    pub total_tokens: usize,
    /// Entities per hundred tokens.
    pub entity_density: f64,
    /// Ordered by descending count, ties by first appearance.
    pub by_type: Vec<TypeStatistics>,
}

/// Summarise `entities` found in a sentence of `total_tokens` tokens.
///
/// Returns `None` when there are no entities; callers report that as "no
/// statistics" rather than zero-filled counts.
pub fn summarize(entities: &[EntitySpan], total_tokens: usize) -> Option<StatisticsSummary> {
    if entities.is_empty() {
        return None;
    }

    // (label, entity count, token count), in first-appearance order
    let mut order: Vec<(&str, usize, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for entity in entities {
        let slot = *index.entry(entity.label.as_str()).or_insert_with(|| {
            order.push((entity.label.as_str(), 0, 0));
            order.len() - 1
        });
        order[slot].1 += 1;
        order[slot].2 += entity.token_count();
    }
    // stable: ties keep first-appearance order
    order.sort_by(|a, b| b.1.cmp(&a.1));

    let total_entities = entities.len();
    let by_type = order
        .into_iter()
        .map(|(label, count, tokens)| TypeStatistics {
            label: label.to_string(),
            count,
            percentage: percent(count, total_entities),
            token_percentage: percent(tokens, total_tokens),
        })
        .collect();

    Some(StatisticsSummary {
        total_entities,
        total_tokens,
        entity_density: percent(total_entities, total_tokens),
        by_type,
    })
}

/// `part / whole * 100` rounded to one decimal; 0 when `whole` is 0.
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
