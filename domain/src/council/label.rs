//! Anonymization labels and the turn-scoped label map.
//!
//! During Stage 2 evaluators must not learn which model wrote which answer.
//! Each successful Stage 1 response gets an opaque [`Label`] (`Response A`,
//! `Response B`, ...) through a random permutation, and the [`LabelMap`]
//! keeps the bijection so rankings can be de-anonymized afterwards.
//!
//! A `LabelMap` is built once per turn and passed by value/reference through
//! the later stages. It is never stored globally or reused across turns.

use crate::core::error::DomainError;
use crate::core::model::Model;
use crate::council::value_objects::ModelResponse;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// Opaque, turn-scoped alias for a council member's response
///
/// Labels are drawn from the fixed ordered alphabet `A..=Z` and render as
/// `Response X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(char);

impl Label {
    /// Text that precedes the letter in the rendered token
    pub const PREFIX: &'static str = "Response ";

    /// Number of available labels
    pub const CAPACITY: usize = 26;

    /// The label at position `index` of the alphabet (`0 -> A`)
    pub fn from_index(index: usize) -> Option<Label> {
        if index < Self::CAPACITY {
            Some(Label((b'A' + index as u8) as char))
        } else {
            None
        }
    }

    /// The label for an uppercase ASCII letter
    pub fn from_letter(letter: char) -> Option<Label> {
        letter.is_ascii_uppercase().then_some(Label(letter))
    }

    pub fn letter(&self) -> char {
        self.0
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl std::str::FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| format!("not a label: {s}"))?
            .chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => {
                Label::from_letter(letter).ok_or_else(|| format!("not a label: {s}"))
            }
            _ => Err(format!("not a label: {s}")),
        }
    }
}

impl Serialize for Label {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Bijection between labels and council models for one turn
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelMap {
    by_label: BTreeMap<Label, Model>,
    by_model: HashMap<Model, Label>,
}

impl LabelMap {
    /// Anonymize the successful Stage 1 responses.
    ///
    /// Models are shuffled with `rng` before labels are handed out in
    /// alphabet order, so the assignment is independent of arrival order and
    /// of the configured roster order. Failed responses are ignored, as are
    /// repeated entries for a model that already has a label.
    pub fn anonymize<R: Rng + ?Sized>(
        responses: &[ModelResponse],
        rng: &mut R,
    ) -> Result<Self, DomainError> {
        let mut models: Vec<&Model> = Vec::with_capacity(responses.len());
        for response in responses.iter().filter(|r| r.is_success()) {
            if !models.contains(&&response.model) {
                models.push(&response.model);
            }
        }
        if models.len() > Label::CAPACITY {
            return Err(DomainError::TooManyResponses(models.len()));
        }

        models.shuffle(rng);

        Self::from_pairs(
            models
                .into_iter()
                .enumerate()
                .filter_map(|(i, model)| Label::from_index(i).map(|label| (label, model.clone()))),
        )
    }

    /// Build a map from explicit pairs, rejecting anything that breaks the bijection
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (Label, Model)>,
    ) -> Result<Self, DomainError> {
        let mut map = LabelMap::default();
        for (label, model) in pairs {
            if map.by_label.contains_key(&label) || map.by_model.contains_key(&model) {
                return Err(DomainError::InvalidLabelMap(format!(
                    "{label} -> {model} is not unique"
                )));
            }
            map.by_model.insert(model.clone(), label);
            map.by_label.insert(label, model);
        }
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.by_label.contains_key(label)
    }

    /// De-anonymize a label
    pub fn model_for(&self, label: &Label) -> Option<&Model> {
        self.by_label.get(label)
    }

    /// Anonymize a model
    pub fn label_for(&self, model: &Model) -> Option<Label> {
        self.by_model.get(model).copied()
    }

    /// Pairs in label order
    pub fn iter(&self) -> impl Iterator<Item = (Label, &Model)> {
        self.by_label.iter().map(|(label, model)| (*label, model))
    }

    /// The anonymized bundle shown to evaluators, in label order.
    pub fn bundle<'a>(&self, responses: &'a [ModelResponse]) -> Vec<(Label, &'a ModelResponse)> {
        self.iter()
            .filter_map(|(label, model)| {
                responses
                    .iter()
                    .find(|r| r.is_success() && &r.model == model)
                    .map(|r| (label, r))
            })
            .collect()
    }
}

impl Serialize for LabelMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.by_label.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LabelMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs = BTreeMap::<Label, Model>::deserialize(deserializer)?;
        LabelMap::from_pairs(pairs).map_err(serde::de::Error::custom)
    }
}
