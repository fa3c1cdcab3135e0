// src/models/grade.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::grading::GradedAnswer;

/// Represents the 'grades' table: one immutable answer attempt at a quiz.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Grade {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub correct_count: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for submitting a quiz attempt.
///
/// Answers are raw strings keyed by item id. Pass/fail and the correct
/// count are recomputed server-side; the client has no say in them.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: HashMap<i64, String>,
}

/// Response for a freshly graded submission.
#[derive(Debug, Serialize)]
pub struct GradeResponse {
    pub id: i64,
    pub quiz_id: i64,
    pub correct_count: i32,
    pub item_count: usize,
    pub answers: Vec<GradedAnswer>,
}

/// One answer record joined with its item, for result rendering.
#[derive(Debug, Serialize, FromRow)]
pub struct AnswerRecordDetail {
    pub item_id: i64,
    pub answer: String,
    pub pass: bool,
    pub question_number: i32,
    pub format: i32,
    pub question: String,
    pub choice1: Option<String>,
    pub choice2: Option<String>,
    pub choice3: Option<String>,
    pub choice4: Option<String>,
    pub correct_answer: String,
}

/// Full grade read model: the aggregate plus per-item records.
///
/// Records whose item was replaced by a later quiz edit are gone with the
/// item; `correct_count` still reflects the attempt as graded.
#[derive(Debug, Serialize)]
pub struct GradeDetail {
    pub id: i64,
    pub quiz_id: i64,
    pub correct_count: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub answers: Vec<AnswerRecordDetail>,
}
