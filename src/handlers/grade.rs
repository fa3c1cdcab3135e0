// src/handlers/grade.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    grading,
    models::{
        grade::{AnswerRecordDetail, Grade, GradeDetail, GradeResponse, SubmitAnswersRequest},
        item::Item,
    },
    utils::jwt::Claims,
};

/// Submits a user's answers to a quiz.
///
/// The grade is computed here, from the stored canonical answers. The
/// request shape only carries raw answer strings, so a client cannot claim
/// its own pass/fail or count. The Grade row and its answer records are
/// written in one transaction and are immutable afterwards; re-submitting
/// creates a new Grade.
pub async fn submit_answers(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(quiz_id): Path<i64>,
    Json(req): Json<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let items = sqlx::query_as::<_, Item>(
        r#"
        SELECT id, quiz_id, question_number, format, question,
               choice1, choice2, choice3, choice4, answer
        FROM items
        WHERE quiz_id = $1
        ORDER BY question_number
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&pool)
    .await?;

    if items.is_empty() {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    let graded = grading::grade_submission(&items, &req.answers);
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let grade_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO grades (quiz_id, user_id, correct_count)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(user_id)
    .bind(graded.correct_count)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert grade: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    for record in &graded.answers {
        sqlx::query(
            r#"
            INSERT INTO answer_records (grade_id, item_id, answer, pass)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(grade_id)
        .bind(record.item_id)
        .bind(&record.answer)
        .bind(record.pass)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(GradeResponse {
            id: grade_id,
            quiz_id,
            correct_count: graded.correct_count,
            item_count: items.len(),
            answers: graded.answers,
        }),
    ))
}

/// Lists the current user's attempts at a quiz, newest first.
pub async fn list_my_grades(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let grades = sqlx::query_as::<_, Grade>(
        r#"
        SELECT id, quiz_id, user_id, correct_count, created_at
        FROM grades
        WHERE quiz_id = $1 AND user_id = $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(quiz_id)
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(grades))
}

/// Retrieves one graded attempt with its per-item records, including the
/// item prompt, choices, and canonical answer for result rendering.
pub async fn get_grade(
    State(pool): State<PgPool>,
    claims: Claims,
    Path((quiz_id, grade_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let grade = sqlx::query_as::<_, Grade>(
        r#"
        SELECT id, quiz_id, user_id, correct_count, created_at
        FROM grades
        WHERE id = $1 AND quiz_id = $2 AND user_id = $3
        "#,
    )
    .bind(grade_id)
    .bind(quiz_id)
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Grade not found".to_string()))?;

    let answers = sqlx::query_as::<_, AnswerRecordDetail>(
        r#"
        SELECT ar.item_id, ar.answer, ar.pass,
               i.question_number, i.format, i.question,
               i.choice1, i.choice2, i.choice3, i.choice4,
               i.answer AS correct_answer
        FROM answer_records ar
        JOIN items i ON i.id = ar.item_id
        WHERE ar.grade_id = $1
        ORDER BY i.question_number
        "#,
    )
    .bind(grade.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(GradeDetail {
        id: grade.id,
        quiz_id: grade.quiz_id,
        correct_count: grade.correct_count,
        created_at: grade.created_at,
        answers,
    }))
}
