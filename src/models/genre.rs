// src/models/genre.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'genres' lookup table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Genre with the number of quizzes filed under it.
#[derive(Debug, Serialize, FromRow)]
pub struct GenreSummary {
    pub id: i64,
    pub name: String,
    pub quiz_count: i64,
}
