// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, Transaction};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        item::{ItemPayload, PublicItem},
        quiz::{QuizDetail, QuizListParams, QuizPayload, QuizSummary},
    },
    utils::{html::sanitize_text, jwt::Claims},
};

const QUIZ_SUMMARY_SELECT: &str = r#"
    SELECT
        q.id, q.title, q.description, q.image,
        q.genre_id, g.name AS genre_name,
        q.user_id AS author_id, u.name AS author_name,
        (SELECT COUNT(*) FROM items i WHERE i.quiz_id = q.id) AS item_count,
        q.created_at
    FROM quizzes q
    JOIN genres g ON g.id = q.genre_id
    JOIN users u ON u.id = q.user_id
"#;

/// Lists quizzes, newest first, optionally filtered by genre, author, and
/// title search keyword.
pub async fn list_quizzes(
    State(pool): State<PgPool>,
    Query(params): Query<QuizListParams>,
) -> Result<impl IntoResponse, AppError> {
    // Prepare search pattern
    let search_pattern = params.q.map(|k| format!("%{}%", k));

    let sql = format!(
        r#"
        {QUIZ_SUMMARY_SELECT}
        WHERE ($1::BIGINT IS NULL OR q.genre_id = $1)
          AND ($2::BIGINT IS NULL OR q.user_id = $2)
          AND ($3::TEXT IS NULL OR q.title ILIKE $3)
        ORDER BY q.created_at DESC
        "#
    );

    let quizzes = sqlx::query_as::<_, QuizSummary>(&sql)
        .bind(params.genre_id)
        .bind(params.user_id)
        .bind(search_pattern)
        .fetch_all(&pool)
        .await?;

    Ok(Json(quizzes))
}

/// Retrieves a single quiz with its items.
///
/// Items are mapped to `PublicItem` so canonical answers never reach a
/// learner about to answer the quiz.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let sql = format!("{QUIZ_SUMMARY_SELECT} WHERE q.id = $1");

    let summary = sqlx::query_as::<_, QuizSummary>(&sql)
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let items = sqlx::query_as::<_, PublicItem>(
        r#"
        SELECT id, question_number, format, question, choice1, choice2, choice3, choice4
        FROM items
        WHERE quiz_id = $1
        ORDER BY question_number
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(QuizDetail { summary, items }))
}

/// Creates a new quiz with its items in one transaction.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    claims: Claims,
    Json(payload): Json<QuizPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let quiz_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes (user_id, genre_id, title, description, image)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(payload.genre_id)
    .bind(sanitize_text(&payload.title))
    .bind(sanitize_text(&payload.description))
    .bind(&payload.image)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_quiz_insert_error)?;

    insert_items(&mut tx, quiz_id, &payload.items).await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": quiz_id}))))
}

/// Replaces a quiz wholesale: metadata update, delete of all prior items,
/// and insert of the new list run in one transaction, so a failure partway
/// (for instance a duplicate question number) leaves the quiz untouched.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(id): Path<i64>,
    Json(payload): Json<QuizPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    check_quiz_owner(&pool, id, claims.user_id()).await?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE quizzes
        SET genre_id = $1, title = $2, description = $3, image = $4, updated_at = NOW()
        WHERE id = $5
        "#,
    )
    .bind(payload.genre_id)
    .bind(sanitize_text(&payload.title))
    .bind(sanitize_text(&payload.description))
    .bind(&payload.image)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(map_quiz_insert_error)?;

    sqlx::query("DELETE FROM items WHERE quiz_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    insert_items(&mut tx, id, &payload.items).await?;

    tx.commit().await?;

    Ok(StatusCode::OK)
}

/// Deletes a quiz by ID. Items, grades, and answer records cascade.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    check_quiz_owner(&pool, id, claims.user_id()).await?;

    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Inserts a full item list for a quiz inside the caller's transaction.
/// Prompt and choice text is sanitized; the canonical answer is stored
/// verbatim because grading compares it exactly.
async fn insert_items(
    tx: &mut Transaction<'_, Postgres>,
    quiz_id: i64,
    items: &[ItemPayload],
) -> Result<(), AppError> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO items
            (quiz_id, question_number, format, question, choice1, choice2, choice3, choice4, answer)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(quiz_id)
        .bind(item.question_number)
        .bind(item.format)
        .bind(sanitize_text(&item.question))
        .bind(item.choice1.as_deref().map(sanitize_text))
        .bind(item.choice2.as_deref().map(sanitize_text))
        .bind(item.choice3.as_deref().map(sanitize_text))
        .bind(item.choice4.as_deref().map(sanitize_text))
        .bind(&item.answer)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if e.to_string().contains("uq_items_quiz_question_number") {
                AppError::Conflict(format!(
                    "Duplicate question number {} within the quiz",
                    item.question_number
                ))
            } else {
                tracing::error!("Failed to insert quiz item: {:?}", e);
                AppError::InternalServerError(e.to_string())
            }
        })?;
    }
    Ok(())
}

/// Ensures the quiz exists and belongs to `user_id`.
async fn check_quiz_owner(pool: &PgPool, quiz_id: i64, user_id: i64) -> Result<(), AppError> {
    let owner: Option<i64> = sqlx::query_scalar("SELECT user_id FROM quizzes WHERE id = $1")
        .bind(quiz_id)
        .fetch_optional(pool)
        .await?;

    let owner = owner.ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if owner != user_id {
        return Err(AppError::AuthError(
            "Only the quiz author can modify this quiz".to_string(),
        ));
    }

    Ok(())
}

fn map_quiz_insert_error(e: sqlx::Error) -> AppError {
    if e.to_string().contains("foreign key constraint") {
        AppError::BadRequest("Unknown genre".to_string())
    } else {
        tracing::error!("Failed to write quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    }
}
