// src/handlers/user.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{UpsertUserRequest, User},
    utils::html::plain_text,
};

fn normalized(mut payload: UpsertUserRequest) -> Result<UpsertUserRequest, AppError> {
    payload.username = plain_text(&payload.username);
    payload.validate()?;
    Ok(payload)
}

/// Creates a player identity.
/// Returns 201 Created and the user (its `id` is what clients persist).
pub async fn create_user(
    State(pool): State<SqlitePool>,
    Json(payload): Json<UpsertUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = normalized(payload)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, created_at)
        VALUES (?, ?)
        RETURNING id, username, created_at
        "#,
    )
    .bind(&payload.username)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create user: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!("User {} created", user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Renames an existing player identity.
pub async fn update_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpsertUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = normalized(payload)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET username = ?
        WHERE id = ?
        RETURNING id, username, created_at
        "#,
    )
    .bind(&payload.username)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Retrieves a player identity by ID.
pub async fn get_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT id, username, created_at FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
