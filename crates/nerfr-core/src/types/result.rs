use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::pipeline::bio_tags::Tag;
use crate::pipeline::entities::EntitySpan;
use crate::types::statistics::StatisticsSummary;

/// Token/label pairs without entity grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicPrediction {
    pub tokens: Vec<String>,
    pub labels: Vec<Tag>,
}

/// The full output of the recognizer for one sentence.
///
/// `statistics` serialises as `{}` when no entity was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub tokens: Vec<String>,
    pub labels: Vec<Tag>,
    pub entities: Vec<EntitySpan>,
    #[serde(
        serialize_with = "serialize_statistics",
        deserialize_with = "deserialize_statistics"
    )]
    pub statistics: Option<StatisticsSummary>,
}

impl Analysis {
    /// An analysis with no tokens.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tokens: Vec::new(),
            labels: Vec::new(),
            entities: Vec::new(),
            statistics: None,
        }
    }

    /// Returns `true` if at least one entity was recognised.
    #[must_use]
    pub fn has_entities(&self) -> bool {
        !self.entities.is_empty()
    }

    /// Drop entities and statistics.
    #[must_use]
    pub fn into_basic(self) -> BasicPrediction {
        BasicPrediction {
            tokens: self.tokens,
            labels: self.labels,
        }
    }
}

impl std::fmt::Display for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Analysis(tokens={}", self.tokens.len())?;
        for entity in &self.entities {
            write!(f, ", {}={:?}", entity.label, entity.text)?;
        }
        write!(f, ")")
    }
}

#[derive(Serialize, Deserialize)]
struct NoStatistics {}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeStatistics {
    Summary(StatisticsSummary),
    Empty(NoStatistics),
}

fn serialize_statistics<S: Serializer>(
    value: &Option<StatisticsSummary>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(summary) => summary.serialize(serializer),
        None => NoStatistics {}.serialize(serializer),
    }
}

fn deserialize_statistics<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<StatisticsSummary>, D::Error> {
    Ok(match MaybeStatistics::deserialize(deserializer)? {
        MaybeStatistics::Summary(summary) => Some(summary),
        MaybeStatistics::Empty(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::statistics::summarize;

    #[test]
    fn empty_analysis_serialises_statistics_as_empty_object() {
        let json = serde_json::to_value(Analysis::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "tokens": [],
                "labels": [],
                "entities": [],
                "statistics": {}
            })
        );
    }

    #[test]
    fn analysis_json_shape() {
        let tokens = vec!["Paris".to_string(), ".".to_string()];
        let labels = vec![Tag::begin("LOC"), Tag::Outside];
        let entities = crate::pipeline::entities::reconstruct(&tokens, &labels);
        let statistics = summarize(&entities, tokens.len());
        let analysis = Analysis {
            tokens,
            labels,
            entities,
            statistics,
        };

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["labels"], serde_json::json!(["B-LOC", "O"]));
        assert_eq!(json["entities"][0]["text"], "Paris");
        assert_eq!(json["entities"][0]["start"], 0);
        assert_eq!(json["statistics"]["total_entities"], 1);
        assert_eq!(json["statistics"]["entity_density"], 50.0);
        assert_eq!(json["statistics"]["by_type"][0]["label"], "LOC");

        let back: Analysis = serde_json::from_value(json).unwrap();
        assert_eq!(back, analysis);
    }

    #[test]
    fn analysis_display() {
        let mut analysis = Analysis::empty();
        analysis.tokens = vec!["Lyon".into()];
        analysis.entities = crate::pipeline::entities::reconstruct(&analysis.tokens, &[Tag::begin("LOC")]);
        let display = analysis.to_string();
        assert!(display.contains("LOC=\"Lyon\""));
    }
}
