// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{meta, quiz, ranking, submission, tag, user},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (quizzes, tags, users, rankings).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool).
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes).post(quiz::create_quiz))
        .route("/{id}", get(quiz::get_quiz))
        .route("/{id}/submit", post(submission::submit_quiz))
        .route("/{id}/rankings", get(ranking::quiz_rankings));

    let tag_routes = Router::new().route("/", get(tag::list_tags).post(tag::create_tag));

    let user_routes = Router::new()
        .route("/", post(user::create_user))
        .route("/{id}", get(user::get_user).put(user::update_user));

    let ranking_routes = Router::new().route("/quizzes", get(ranking::popular_quizzes));

    Router::new()
        .route("/", get(meta::health_check))
        .route("/api", get(meta::api_info))
        .route("/api/seed", post(meta::seed))
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/tags", tag_routes)
        .nest("/api/users", user_routes)
        .nest("/api/rankings", ranking_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Browser clients are served from another origin. With no configured
/// origins every origin is allowed.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}
