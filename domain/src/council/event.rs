//! Stream events: the ordered progress protocol of a council turn.
//!
//! Every event serializes with a `type` discriminator:
//!
//! | type | payload |
//! |------|---------|
//! | `stage1_start` | – |
//! | `stage1_complete` | `data: [{model, response}]` |
//! | `stage2_start` | – |
//! | `stage2_complete` | `data: [{model, ranking, parsed_ranking}]`, `metadata` (below) |
//! | `stage3_start` | – |
//! | `stage3_complete` | `data: {model, response}` |
//! | `title_complete` | `data: {title}` |
//! | `complete` | – |
//! | `error` | `message` |
//!
//! `metadata` carries `label_to_model`, `aggregate_rankings` and
//! `web_search_used`, plus `search_context` when a search ran.
//! Stage 1 and Stage 3 payloads gain `images` when a model generated any.
//!
//! Both producers and consumers match on [`CouncilEvent`] exhaustively.

use crate::council::aggregate::AggregateRankingEntry;
use crate::council::label::LabelMap;
use crate::council::ranking::RankingSubmission;
use crate::council::turn::Stage;
use crate::council::value_objects::{FinalResponse, ModelResponse};
use serde::{Deserialize, Serialize};

/// De-anonymization data released with `stage2_complete`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage2Metadata {
    pub label_to_model: LabelMap,
    pub aggregate_rankings: Vec<AggregateRankingEntry>,
    /// Whether Stage 1 was augmented with web search results
    #[serde(default)]
    pub web_search_used: bool,
    /// The search context shown to the council, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_context: Option<String>,
}

impl Stage2Metadata {
    pub fn new(label_to_model: LabelMap, aggregate_rankings: Vec<AggregateRankingEntry>) -> Self {
        Self {
            label_to_model,
            aggregate_rankings,
            web_search_used: false,
            search_context: None,
        }
    }

    /// Record the web search context Stage 1 was given
    pub fn with_search_context(mut self, context: Option<String>) -> Self {
        self.web_search_used = context.is_some();
        self.search_context = context;
        self
    }
}

/// Payload of `title_complete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitlePayload {
    pub title: String,
}

/// One unit of turn progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouncilEvent {
    Stage1Start,
    Stage1Complete {
        data: Vec<ModelResponse>,
    },
    Stage2Start,
    Stage2Complete {
        data: Vec<RankingSubmission>,
        metadata: Stage2Metadata,
    },
    Stage3Start,
    Stage3Complete {
        data: FinalResponse,
    },
    TitleComplete {
        data: TitlePayload,
    },
    Complete,
    Error {
        message: String,
    },
}

impl CouncilEvent {
    /// Wire discriminator of this event
    pub fn event_type(&self) -> &'static str {
        match self {
            CouncilEvent::Stage1Start => "stage1_start",
            CouncilEvent::Stage1Complete { .. } => "stage1_complete",
            CouncilEvent::Stage2Start => "stage2_start",
            CouncilEvent::Stage2Complete { .. } => "stage2_complete",
            CouncilEvent::Stage3Start => "stage3_start",
            CouncilEvent::Stage3Complete { .. } => "stage3_complete",
            CouncilEvent::TitleComplete { .. } => "title_complete",
            CouncilEvent::Complete => "complete",
            CouncilEvent::Error { .. } => "error",
        }
    }

    /// The stage this event belongs to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CouncilEvent::Stage1Start | CouncilEvent::Stage1Complete { .. } => {
                Some(Stage::Responses)
            }
            CouncilEvent::Stage2Start | CouncilEvent::Stage2Complete { .. } => {
                Some(Stage::Rankings)
            }
            CouncilEvent::Stage3Start | CouncilEvent::Stage3Complete { .. } => {
                Some(Stage::Synthesis)
            }
            CouncilEvent::TitleComplete { .. }
            | CouncilEvent::Complete
            | CouncilEvent::Error { .. } => None,
        }
    }

    /// `complete` and `error` end the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, CouncilEvent::Complete | CouncilEvent::Error { .. })
    }

    pub fn error(message: impl Into<String>) -> Self {
        CouncilEvent::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Model;
    use crate::council::label::Label;
    use std::time::Duration;

    #[test]
    fn test_unit_events_serialize_as_bare_type() {
        assert_eq!(
            serde_json::to_string(&CouncilEvent::Stage1Start).unwrap(),
            r#"{"type":"stage1_start"}"#
        );
        assert_eq!(
            serde_json::to_string(&CouncilEvent::Complete).unwrap(),
            r#"{"type":"complete"}"#
        );
    }

    #[test]
    fn test_type_matches_serialized_discriminator() {
        let events = vec![
            CouncilEvent::Stage1Start,
            CouncilEvent::Stage1Complete { data: vec![] },
            CouncilEvent::Stage2Start,
            CouncilEvent::Stage2Complete {
                data: vec![],
                metadata: Stage2Metadata::new(LabelMap::default(), vec![]),
            },
            CouncilEvent::Stage3Start,
            CouncilEvent::Stage3Complete {
                data: FinalResponse::new(Model::Gpt51, "done"),
            },
            CouncilEvent::TitleComplete {
                data: TitlePayload {
                    title: "Rust".to_string(),
                },
            },
            CouncilEvent::Complete,
            CouncilEvent::error("boom"),
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
            let back: CouncilEvent = serde_json::from_value(json).unwrap();
            assert_eq!(back.event_type(), event.event_type());
        }
    }

    #[test]
    fn test_stage2_complete_wire_shape() {
        let a = Label::from_index(0).unwrap();
        let event = CouncilEvent::Stage2Complete {
            data: vec![RankingSubmission {
                model: Model::Grok4,
                ranking: "FINAL RANKING:\n1. Response A".to_string(),
                parsed_ranking: vec![a],
            }],
            metadata: Stage2Metadata::new(
                LabelMap::from_pairs([(a, Model::Gpt51)]).unwrap(),
                vec![AggregateRankingEntry {
                    model: Model::Gpt51,
                    average_rank: 1.0,
                    votes_count: 1,
                }],
            ),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["data"][0]["parsed_ranking"][0], "Response A");
        assert_eq!(json["metadata"]["label_to_model"]["Response A"], "openai/gpt-5.1");
        assert_eq!(json["metadata"]["aggregate_rankings"][0]["rankings_count"], 1);
        assert_eq!(json["metadata"]["web_search_used"], false);
        assert!(json["metadata"].get("search_context").is_none());
    }

    #[test]
    fn test_search_context_marks_search_used() {
        let metadata = Stage2Metadata::new(LabelMap::default(), vec![])
            .with_search_context(Some("**Quick Answer:** 42".to_string()));
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["web_search_used"], true);
        assert_eq!(json["search_context"], "**Quick Answer:** 42");
    }

    #[test]
    fn test_stage1_complete_hides_latency() {
        let event = CouncilEvent::Stage1Complete {
            data: vec![ModelResponse::success(Model::Gpt51, "hi", Duration::from_secs(2))],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "stage1_complete",
                "data": [{"model": "openai/gpt-5.1", "response": "hi"}]
            })
        );
    }

    #[test]
    fn test_terminal_and_stage() {
        assert!(CouncilEvent::Complete.is_terminal());
        assert!(CouncilEvent::error("x").is_terminal());
        assert!(!CouncilEvent::Stage3Start.is_terminal());
        assert_eq!(CouncilEvent::Stage2Start.stage(), Some(Stage::Rankings));
        assert_eq!(CouncilEvent::Complete.stage(), None);
    }
}
