//! Stage 2 peer rankings and the free-text ranking parser.
//!
//! Evaluators answer in prose and are asked to finish with a block like
//!
//! ```text
//! FINAL RANKING:
//! 1. Response C
//! 2. Response A
//! 3. Response B
//! ```
//!
//! Models do not always comply, so [`parse_ranking`] is tolerant: it never
//! fails, it only reports which known labels it could find and in what order.

use crate::core::model::Model;
use crate::council::label::{Label, LabelMap};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Marker that introduces the structured ranking block
pub const FINAL_RANKING_MARKER: &str = "FINAL RANKING:";

static LABEL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bResponse ([A-Z])\b").expect("valid label regex"));

static NUMBERED_LABEL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\s*Response ([A-Z])\b").expect("valid numbered regex"));

/// Outcome of parsing one evaluator's ranking text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankingParse {
    /// Known labels, best first, each at most once
    Ranked(Vec<Label>),
    /// The text mentioned no label of this turn
    NoLabelsFound,
}

impl RankingParse {
    /// The parsed order, empty when nothing was found
    pub fn into_labels(self) -> Vec<Label> {
        match self {
            RankingParse::Ranked(labels) => labels,
            RankingParse::NoLabelsFound => Vec::new(),
        }
    }
}

/// Extract an ordered, de-duplicated list of known labels from free text.
///
/// When the text contains [`FINAL_RANKING_MARKER`], only what follows its
/// first occurrence is scanned, and numbered entries (`1. Response C`) win
/// over bare mentions. Otherwise every `Response X` token in the text counts.
/// Tokens not present in `labels` are dropped, as are repeats.
pub fn parse_ranking(text: &str, labels: &LabelMap) -> RankingParse {
    let section = text
        .split_once(FINAL_RANKING_MARKER)
        .map(|(_, after)| after);

    let letters: Vec<char> = match section {
        Some(section) => {
            let numbered = capture_letters(&NUMBERED_LABEL_TOKEN, section, labels);
            if numbered.is_empty() {
                capture_letters(&LABEL_TOKEN, section, labels)
            } else {
                numbered
            }
        }
        None => capture_letters(&LABEL_TOKEN, text, labels),
    };

    let mut order: Vec<Label> = Vec::with_capacity(letters.len());
    for label in letters.into_iter().filter_map(Label::from_letter) {
        if !order.contains(&label) {
            order.push(label);
        }
    }

    if order.is_empty() {
        RankingParse::NoLabelsFound
    } else {
        RankingParse::Ranked(order)
    }
}

fn capture_letters(pattern: &Regex, text: &str, labels: &LabelMap) -> Vec<char> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().chars().next())
        .filter(|letter| Label::from_letter(*letter).is_some_and(|l| labels.contains(&l)))
        .collect()
}

/// One evaluator's peer ranking (Stage 2)
///
/// Serializes to `{model, ranking, parsed_ranking}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingSubmission {
    /// The evaluating model
    pub model: Model,
    /// Raw evaluation text, kept for display even when unparseable
    pub ranking: String,
    /// Labels in the evaluator's order (may be partial or empty)
    pub parsed_ranking: Vec<Label>,
}

impl RankingSubmission {
    /// Parse `raw` against this turn's labels and keep both forms
    pub fn parse(model: Model, raw: impl Into<String>, labels: &LabelMap) -> Self {
        let ranking = raw.into();
        let parsed_ranking = parse_ranking(&ranking, labels).into_labels();
        Self {
            model,
            ranking,
            parsed_ranking,
        }
    }

    /// True when the evaluator's text yielded no usable order
    pub fn is_unparsed(&self) -> bool {
        self.parsed_ranking.is_empty()
    }
}
