// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, genre, grade, profile, quiz},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, genres, users, quizzes).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
///
/// Write routes take a `Claims` extractor argument and are thereby
/// login-protected; browsing stays public.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let genre_routes = Router::new().route("/", get(genre::list_genres));

    let user_routes = Router::new().route("/{id}", get(profile::get_user));

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes).post(quiz::create_quiz))
        .route(
            "/{id}",
            get(quiz::get_quiz)
                .put(quiz::update_quiz)
                .delete(quiz::delete_quiz),
        )
        .route("/{id}/answers", post(grade::submit_answers))
        .route("/{id}/grades", get(grade::list_my_grades))
        .route("/{id}/grades/{grade_id}", get(grade::get_grade));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/genres", genre_routes)
        .nest("/api/users", user_routes)
        .nest("/api/quizzes", quiz_routes)
        .route("/api/profile", get(profile::get_profile))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
