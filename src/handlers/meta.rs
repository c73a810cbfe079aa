// src/handlers/meta.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    seed::{SeedOutcome, seed_demo_data},
};

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "Oshi Quiz API is running"
    }))
}

/// Describes the API and its main entry points.
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "Oshi Quiz API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "quizzes": "/api/quizzes",
            "tags": "/api/tags",
            "users": "/api/users",
            "rankings": "/api/rankings/quizzes",
            "seed": "/api/seed (POST)"
        }
    }))
}

/// Loads the demo data set once; later calls are skipped.
pub async fn seed(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let body = match seed_demo_data(&pool).await? {
        SeedOutcome::Seeded(count) => json!({
            "status": "success",
            "message": "Demo data seeded",
            "count": count
        }),
        SeedOutcome::Skipped(count) => json!({
            "status": "skipped",
            "message": format!("{} quizzes already exist", count),
            "count": count
        }),
    };

    Ok(Json(body))
}
