// src/handlers/genre.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{error::AppError, models::genre::GenreSummary};

/// Lists all genres with the number of quizzes filed under each, for the
/// genre navigation sidebar.
pub async fn list_genres(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let genres = sqlx::query_as::<_, GenreSummary>(
        r#"
        SELECT g.id, g.name, COUNT(q.id) AS quiz_count
        FROM genres g
        LEFT JOIN quizzes q ON q.genre_id = g.id
        GROUP BY g.id, g.name
        ORDER BY g.id
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list genres: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(genres))
}
