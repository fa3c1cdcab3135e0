// src/grading.rs

//! Answer grading engine.
//!
//! Grading is total: an unanswered item, a malformed submission, or a
//! canonical answer that does not parse for its format all resolve to a
//! failed item, never to an error. The last case is a data-integrity bug
//! upstream in authoring, not something grading can recover from.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::models::item::Item;

/// Answer-input modality of an item.
///
/// The integer codes (1, 2, 3) are the storage and wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerFormat {
    FreeText,
    SingleChoice,
    MultiChoice,
}

impl AnswerFormat {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(AnswerFormat::FreeText),
            2 => Some(AnswerFormat::SingleChoice),
            3 => Some(AnswerFormat::MultiChoice),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            AnswerFormat::FreeText => 1,
            AnswerFormat::SingleChoice => 2,
            AnswerFormat::MultiChoice => 3,
        }
    }
}

/// A canonical answer in its typed form, one variant per format, so grading
/// never guesses at the shape of the stored string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerKey {
    /// Trimmed expected text.
    FreeText(String),
    /// 1-based index of the correct choice.
    SingleChoice(usize),
    /// Set of 1-based indices of the correct choices, with the item's
    /// choice count so submissions are bounds-checked the same way.
    MultiChoice {
        indices: BTreeSet<usize>,
        choice_count: usize,
    },
}

impl AnswerKey {
    /// Parses an item's canonical answer. Returns None when the stored
    /// encoding is invalid for the item's format (unknown format code,
    /// blank free text, out-of-range index, duplicated indices).
    pub fn parse(item: &Item) -> Option<Self> {
        match AnswerFormat::from_code(item.format)? {
            AnswerFormat::FreeText => {
                let text = item.answer.trim();
                (!text.is_empty()).then(|| AnswerKey::FreeText(text.to_string()))
            }
            AnswerFormat::SingleChoice => {
                let index: usize = item.answer.trim().parse().ok()?;
                (1..=item.choice_count())
                    .contains(&index)
                    .then_some(AnswerKey::SingleChoice(index))
            }
            AnswerFormat::MultiChoice => {
                let choice_count = item.choice_count();
                let indices = parse_index_set(&item.answer, choice_count)?;
                Some(AnswerKey::MultiChoice {
                    indices,
                    choice_count,
                })
            }
        }
    }

    /// Compares a learner's raw submission against this key.
    ///
    /// * Free text: trimmed, case-sensitive equality.
    /// * Single choice: the submitted string must equal the decimal
    ///   rendering of the canonical index.
    /// * Multi choice: set equality of the parsed index sets, so "3,1"
    ///   passes against a canonical "1,3".
    pub fn matches(&self, submitted: &str) -> bool {
        match self {
            AnswerKey::FreeText(expected) => expected == submitted.trim(),
            AnswerKey::SingleChoice(index) => submitted.trim() == index.to_string(),
            AnswerKey::MultiChoice {
                indices,
                choice_count,
            } => parse_index_set(submitted, *choice_count).is_some_and(|given| given == *indices),
        }
    }
}

/// Parses a comma-separated list of 1-based choice indices into a set.
///
/// Rejects blank input, non-numeric tokens, indices outside
/// `1..=choice_count`, and duplicates. Token order is irrelevant.
pub fn parse_index_set(encoded: &str, choice_count: usize) -> Option<BTreeSet<usize>> {
    if encoded.trim().is_empty() {
        return None;
    }

    let mut indices = BTreeSet::new();
    for part in encoded.split(',') {
        let index: usize = part.trim().parse().ok()?;
        if !(1..=choice_count).contains(&index) || !indices.insert(index) {
            return None;
        }
    }
    Some(indices)
}

/// Grades one submitted answer against the item's canonical answer.
pub fn grade_item(item: &Item, submitted: Option<&str>) -> bool {
    let submitted = match submitted {
        Some(s) if !s.trim().is_empty() => s,
        _ => return false,
    };

    AnswerKey::parse(item).is_some_and(|key| key.matches(submitted))
}

/// One graded answer record, in item order.
#[derive(Debug, Serialize)]
pub struct GradedAnswer {
    pub item_id: i64,
    pub answer: String,
    pub pass: bool,
}

/// Aggregate result of grading one full submission.
#[derive(Debug, Serialize)]
pub struct GradedSubmission {
    pub correct_count: i32,
    pub answers: Vec<GradedAnswer>,
}

/// Grades a full submission against a quiz's items.
///
/// `submitted` is keyed by item id; items missing from the map are recorded
/// as unanswered with an empty answer string. Pure and idempotent: the same
/// items and submission always produce the same result.
pub fn grade_submission(items: &[Item], submitted: &HashMap<i64, String>) -> GradedSubmission {
    let mut answers = Vec::with_capacity(items.len());
    let mut correct_count = 0;

    for item in items {
        let given = submitted.get(&item.id).map(String::as_str);
        let pass = grade_item(item, given);
        if pass {
            correct_count += 1;
        }
        answers.push(GradedAnswer {
            item_id: item.id,
            answer: given.unwrap_or("").to_string(),
            pass,
        });
    }

    GradedSubmission {
        correct_count,
        answers,
    }
}
