//! Rank aggregation - consensus standing of each council model.
//!
//! For every model `m`, collect its 1-indexed position in each evaluator's
//! parsed order that mentions it:
//!
//! - `average_rank(m)` is the mean of those positions
//! - `rankings_count(m)` is how many evaluators mentioned it
//!
//! Models nobody mentioned are left out rather than given a worst-rank
//! default. Entries sort by average rank ascending, then votes descending,
//! then model identifier, so identical input always yields identical output.

use crate::core::model::Model;
use crate::council::label::LabelMap;
use crate::council::ranking::RankingSubmission;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Consensus standing of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRankingEntry {
    pub model: Model,
    /// Mean 1-indexed position (lower is better); sent rounded to 2 decimals
    #[serde(serialize_with = "serialize_rounded")]
    pub average_rank: f64,
    /// Number of evaluators whose order includes this model
    #[serde(rename = "rankings_count")]
    pub votes_count: usize,
}

impl AggregateRankingEntry {
    fn consensus_order(&self, other: &Self) -> Ordering {
        self.average_rank
            .total_cmp(&other.average_rank)
            .then_with(|| other.votes_count.cmp(&self.votes_count))
            .then_with(|| self.model.cmp(&other.model))
    }
}

/// Combine every evaluator's parsed order into one consensus ranking.
pub fn aggregate_rankings(
    submissions: &[RankingSubmission],
    labels: &LabelMap,
) -> Vec<AggregateRankingEntry> {
    let mut positions: BTreeMap<&Model, Vec<usize>> = BTreeMap::new();

    for submission in submissions {
        for (index, label) in submission.parsed_ranking.iter().enumerate() {
            if let Some(model) = labels.model_for(label) {
                positions.entry(model).or_default().push(index + 1);
            }
        }
    }

    let mut aggregate: Vec<AggregateRankingEntry> = positions
        .into_iter()
        .map(|(model, ranks)| AggregateRankingEntry {
            model: model.clone(),
            average_rank: ranks.iter().sum::<usize>() as f64 / ranks.len() as f64,
            votes_count: ranks.len(),
        })
        .collect();

    aggregate.sort_by(AggregateRankingEntry::consensus_order);
    aggregate
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 100.0).round() / 100.0)
}

/// Human-readable summary used in the chairman prompt
pub fn format_aggregate(aggregate: &[AggregateRankingEntry]) -> String {
    if aggregate.is_empty() {
        return "No usable peer rankings were produced.".to_string();
    }
    aggregate
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{}. {} (average rank {:.2} across {} evaluation{})",
                i + 1,
                entry.model,
                entry.average_rank,
                entry.votes_count,
                if entry.votes_count == 1 { "" } else { "s" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::council::label::Label;

    fn label(c: char) -> Label {
        Label::from_letter(c).unwrap()
    }

    fn labels() -> LabelMap {
        LabelMap::from_pairs([
            (label('A'), Model::from("a/one")),
            (label('B'), Model::from("b/two")),
            (label('C'), Model::from("c/three")),
        ])
        .unwrap()
    }

    fn submission(evaluator: &str, order: &[char]) -> RankingSubmission {
        RankingSubmission {
            model: Model::from(evaluator),
            ranking: String::new(),
            parsed_ranking: order.iter().map(|c| label(*c)).collect(),
        }
    }

    #[test]
    fn test_full_rankings_are_averaged_and_sorted() {
        let submissions = vec![
            submission("a/one", &['C', 'A', 'B']),
            submission("b/two", &['C', 'B', 'A']),
            submission("c/three", &['A', 'C', 'B']),
        ];
        let aggregate = aggregate_rankings(&submissions, &labels());

        assert_eq!(aggregate.len(), 3);
        assert_eq!(aggregate[0].model, Model::from("c/three"));
        assert!((aggregate[0].average_rank - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(aggregate[1].model, Model::from("a/one"));
        assert!((aggregate[1].average_rank - 2.0).abs() < 1e-12);
        assert_eq!(aggregate[2].model, Model::from("b/two"));
        assert!((aggregate[2].average_rank - 8.0 / 3.0).abs() < 1e-12);
        assert!(aggregate.iter().all(|e| e.votes_count == 3));
    }

    #[test]
    fn test_wire_average_is_rounded() {
        let submissions = vec![
            submission("a/one", &['C', 'A', 'B']),
            submission("b/two", &['C', 'B', 'A']),
            submission("c/three", &['A', 'C', 'B']),
        ];
        let aggregate = aggregate_rankings(&submissions, &labels());
        let json = serde_json::to_value(&aggregate).unwrap();

        assert_eq!(json[0]["average_rank"], serde_json::json!(1.33));
        assert_eq!(json[1]["average_rank"], serde_json::json!(2.0));
        assert_eq!(json[2]["average_rank"], serde_json::json!(2.67));
        // Ordering still uses the exact mean
        assert!((aggregate[0].average_rank - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_unmentioned_model_is_absent() {
        let submissions = vec![
            submission("a/one", &['A', 'B']),
            submission("b/two", &['B']),
        ];
        let aggregate = aggregate_rankings(&submissions, &labels());
        assert_eq!(aggregate.len(), 2);
        assert!(aggregate.iter().all(|e| e.model != Model::from("c/three")));
        let b = aggregate
            .iter()
            .find(|e| e.model == Model::from("b/two"))
            .unwrap();
        // positions 2 and 1
        assert_eq!(b.votes_count, 2);
        assert!((b.average_rank - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_submission_contributes_nothing() {
        let submissions = vec![
            submission("a/one", &['B', 'A', 'C']),
            submission("b/two", &[]),
        ];
        let aggregate = aggregate_rankings(&submissions, &labels());
        assert_eq!(aggregate.len(), 3);
        assert!(aggregate.iter().all(|e| e.votes_count == 1));
        assert_eq!(aggregate[0].model, Model::from("b/two"));
    }

    #[test]
    fn test_ties_break_on_votes_then_identifier() {
        // c/three: [1, 1] -> 1.0; a/one: [1, 2] and b/two: [2, 1] tie at 1.5 with 2 votes
        let submissions = vec![
            submission("x/e1", &['C']),
            submission("x/e2", &['C']),
            submission("x/e3", &['A', 'B']),
            submission("x/e4", &['B', 'A']),
        ];
        let aggregate = aggregate_rankings(&submissions, &labels());
        let order: Vec<&str> = aggregate.iter().map(|e| e.model.as_str()).collect();
        assert_eq!(order, vec!["c/three", "a/one", "b/two"]);
    }

    #[test]
    fn test_equal_average_prefers_more_votes() {
        let submissions = vec![
            submission("x/e1", &['A']),
            submission("x/e2", &['C']),
            submission("x/e3", &['C']),
        ];
        let aggregate = aggregate_rankings(&submissions, &labels());
        assert_eq!(aggregate[0].model, Model::from("c/three"));
        assert_eq!(aggregate[0].votes_count, 2);
        assert_eq!(aggregate[1].model, Model::from("a/one"));
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let submissions = vec![
            submission("x/e1", &['B', 'A']),
            submission("x/e2", &['A', 'B']),
            submission("x/e3", &['C']),
        ];
        let first = aggregate_rankings(&submissions, &labels());
        let second = aggregate_rankings(&submissions, &labels());
        assert_eq!(first, second);
    }

    #[test]
    fn test_wire_field_names() {
        let entry = AggregateRankingEntry {
            model: Model::Gpt51,
            average_rank: 1.5,
            votes_count: 2,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "openai/gpt-5.1", "average_rank": 1.5, "rankings_count": 2})
        );
    }

    #[test]
    fn test_format_aggregate() {
        assert!(format_aggregate(&[]).contains("No usable"));
        let text = format_aggregate(&[AggregateRankingEntry {
            model: Model::Grok4,
            average_rank: 1.0,
            votes_count: 1,
        }]);
        assert_eq!(text, "1. x-ai/grok-4 (average rank 1.00 across 1 evaluation)");
    }
}
