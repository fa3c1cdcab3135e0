// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use url::Url;
use validator::{Validate, ValidationError};

use crate::config::MAX_QUIZ_ITEMS;
use crate::models::item::{ItemPayload, PublicItem};
use crate::models::validation_error;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub user_id: i64,
    pub genre_id: i64,
    pub title: String,
    pub description: String,

    /// Optional cover image, stored as an opaque string (a filename or a
    /// data URL, whichever the client supplied).
    pub image: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregated row for quiz listings, joined with genre and author.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub genre_id: i64,
    pub genre_name: String,
    pub author_id: i64,
    pub author_name: String,
    pub item_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Full quiz view for answering: metadata plus items with answers hidden.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub summary: QuizSummary,
    pub items: Vec<PublicItem>,
}

/// Query parameters for listing quizzes.
#[derive(Debug, Deserialize)]
pub struct QuizListParams {
    pub genre_id: Option<i64>,
    pub user_id: Option<i64>,
    pub q: Option<String>,
}

/// DTO for creating a quiz or replacing one on edit.
///
/// An edit reuses this payload wholesale: the item list always replaces the
/// previous one, there is no per-item patching.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_quiz_payload, skip_on_field_errors = false))]
pub struct QuizPayload {
    #[validate(length(min = 1, max = 100, message = "A title is required."))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "A description is required."))]
    pub description: String,
    #[validate(range(min = 1, message = "A genre is required."))]
    pub genre_id: i64,
    #[validate(custom(function = validate_image))]
    pub image: Option<String>,
    #[validate(nested)]
    pub items: Vec<ItemPayload>,
}

fn validate_quiz_payload(quiz: &QuizPayload) -> Result<(), ValidationError> {
    if quiz.items.is_empty() || quiz.items.len() > MAX_QUIZ_ITEMS {
        return Err(validation_error(
            "items",
            "A quiz carries between 1 and 10 items.",
        ));
    }
    Ok(())
}

/// The image field accepts any URL, including data URLs.
fn validate_image(image: &str) -> Result<(), ValidationError> {
    if image.is_empty() {
        return Ok(());
    }
    if Url::parse(image).is_err() {
        return Err(ValidationError::new("invalid_url"));
    }
    Ok(())
}
