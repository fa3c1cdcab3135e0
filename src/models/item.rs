// src/models/item.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::{Validate, ValidationError};

use crate::config::{MAX_CHOICE_COUNT, MIN_CHOICE_COUNT};
use crate::grading::{AnswerFormat, parse_index_set};
use crate::models::validation_error;

/// Represents the 'items' table: one question within a quiz.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub quiz_id: i64,

    /// 1-based position of the item, unique within its quiz. Defines both
    /// display and grading order.
    pub question_number: i32,

    /// Answer format code, see [`AnswerFormat`].
    pub format: i32,

    /// The text prompt shown to the learner.
    pub question: String,

    pub choice1: Option<String>,
    pub choice2: Option<String>,
    pub choice3: Option<String>,
    pub choice4: Option<String>,

    /// Canonical correct answer. Raw text for free text, a 1-based index
    /// string for single choice, ascending comma-separated 1-based indices
    /// for multi choice.
    pub answer: String,
}

impl Item {
    /// The contiguous run of non-empty choices starting at `choice1`.
    pub fn choices(&self) -> Vec<&str> {
        [&self.choice1, &self.choice2, &self.choice3, &self.choice4]
            .into_iter()
            .map_while(|choice| choice.as_deref().filter(|c| !c.is_empty()))
            .collect()
    }

    pub fn choice_count(&self) -> usize {
        self.choices().len()
    }
}

/// DTO for sending an item to a learner (excludes the canonical answer).
#[derive(Debug, Serialize, FromRow)]
pub struct PublicItem {
    pub id: i64,
    pub question_number: i32,
    pub format: i32,
    pub question: String,
    pub choice1: Option<String>,
    pub choice2: Option<String>,
    pub choice3: Option<String>,
    pub choice4: Option<String>,
}

impl From<Item> for PublicItem {
    fn from(item: Item) -> Self {
        PublicItem {
            id: item.id,
            question_number: item.question_number,
            format: item.format,
            question: item.question,
            choice1: item.choice1,
            choice2: item.choice2,
            choice3: item.choice3,
            choice4: item.choice4,
        }
    }
}

/// DTO for one item within a quiz create/edit payload.
///
/// Field-level rules are checked first, then the format-conditional rules
/// in `validate_item_payload`. `skip_on_field_errors = false` so a batch
/// failure reports every broken rule at once.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = validate_item_payload, skip_on_field_errors = false))]
pub struct ItemPayload {
    #[validate(range(min = 1, message = "Question number must be positive."))]
    pub question_number: i32,
    pub format: i32,
    #[validate(length(min = 1, max = 1000, message = "Question text is required."))]
    pub question: String,
    pub choice1: Option<String>,
    pub choice2: Option<String>,
    pub choice3: Option<String>,
    pub choice4: Option<String>,
    #[validate(length(min = 1, max = 500, message = "An answer is required."))]
    pub answer: String,
}

impl ItemPayload {
    /// The contiguous run of non-empty choices starting at `choice1`.
    pub fn choices(&self) -> Vec<&str> {
        [&self.choice1, &self.choice2, &self.choice3, &self.choice4]
            .into_iter()
            .map_while(|choice| choice.as_deref().filter(|c| !c.is_empty()))
            .collect()
    }

    /// True when a later choice is filled while an earlier one is blank.
    fn has_choice_gap(&self) -> bool {
        let present = [&self.choice1, &self.choice2, &self.choice3, &self.choice4]
            .map(|choice| choice.as_deref().is_some_and(|c| !c.is_empty()));
        let prefix = present.iter().take_while(|&&p| p).count();
        present[prefix..].iter().any(|&p| p)
    }
}

fn validate_item_payload(item: &ItemPayload) -> Result<(), ValidationError> {
    let Some(format) = AnswerFormat::from_code(item.format) else {
        return Err(validation_error("format", "Unknown answer format code."));
    };

    match format {
        AnswerFormat::FreeText => {
            if item.answer.trim().is_empty() {
                return Err(validation_error(
                    "answer",
                    "A free-text answer is required.",
                ));
            }
        }
        AnswerFormat::SingleChoice | AnswerFormat::MultiChoice => {
            if item.has_choice_gap() {
                return Err(validation_error(
                    "choices",
                    "Choices must be filled in order, starting from the first.",
                ));
            }

            let choice_count = item.choices().len();
            if !(MIN_CHOICE_COUNT..=MAX_CHOICE_COUNT).contains(&choice_count) {
                return Err(validation_error(
                    "choices",
                    "Choice-based items carry between 2 and 4 choices.",
                ));
            }

            if format == AnswerFormat::SingleChoice {
                match item.answer.trim().parse::<usize>() {
                    Ok(index) if (1..=choice_count).contains(&index) => {}
                    _ => {
                        return Err(validation_error(
                            "answer",
                            "The answer must be the 1-based index of one choice.",
                        ));
                    }
                }
            } else {
                if parse_index_set(&item.answer, choice_count).is_none() {
                    return Err(validation_error(
                        "answer",
                        "At least one choice index must be selected, without duplicates.",
                    ));
                }
                if !is_ascending_encoding(&item.answer) {
                    return Err(validation_error(
                        "answer",
                        "Multi-choice answer indices must be in ascending order.",
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Checks that the comma-separated indices are strictly ascending.
fn is_ascending_encoding(encoded: &str) -> bool {
    let mut previous = 0usize;
    for part in encoded.split(',') {
        match part.trim().parse::<usize>() {
            Ok(index) if index > previous => previous = index,
            _ => return false,
        }
    }
    true
}
