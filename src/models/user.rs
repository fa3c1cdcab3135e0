// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique email address, used for login.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Optional avatar image.
    pub image: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 1,
        max = 50,
        message = "Name length must be between 1 and 50 characters."
    ))]
    pub name: String,
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize, FromRow)]
pub struct ProfileResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub quiz_count: i64,
    pub grade_count: i64,
}

/// Public view of a user for dashboard pages.
#[derive(Debug, Serialize, FromRow)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub quiz_count: i64,
}
