use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::user::{ProfileResponse, PublicUser},
    utils::jwt::Claims,
};

/// Get current user's profile and statistics.
pub async fn get_profile(
    State(pool): State<PgPool>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    // Subquery counts are cheap given the indexes on user_id.
    let profile = sqlx::query_as::<_, ProfileResponse>(
        r#"
        SELECT
            u.id, u.name, u.email, u.image, u.created_at,
            (SELECT COUNT(*) FROM quizzes WHERE user_id = u.id) AS quiz_count,
            (SELECT COUNT(*) FROM grades WHERE user_id = u.id) AS grade_count
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}

/// Public view of a user, for dashboard pages: name, avatar, and how many
/// quizzes they have authored.
pub async fn get_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, PublicUser>(
        r#"
        SELECT
            u.id, u.name, u.image,
            (SELECT COUNT(*) FROM quizzes WHERE user_id = u.id) AS quiz_count
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
