// src/handlers/tag.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::tag::{CreateTagRequest, OshiTag},
    utils::html::{clean_markup, plain_text},
};

/// Lists all tags for the authoring form.
pub async fn list_tags(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let tags = sqlx::query_as::<_, OshiTag>(
        "SELECT id, name, category, description FROM oshi_tags ORDER BY id",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(tags))
}

/// Creates a tag. Tag names are unique (409 on duplicates).
pub async fn create_tag(
    State(pool): State<SqlitePool>,
    Json(mut payload): Json<CreateTagRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.name = plain_text(&payload.name);
    payload.description = payload.description.as_deref().map(clean_markup);
    payload.validate()?;

    let mut conn = pool.acquire().await?;
    let tag = insert_tag(&mut conn, &payload).await?;

    Ok((StatusCode::CREATED, Json(tag)))
}

pub(crate) async fn insert_tag(
    conn: &mut SqliteConnection,
    req: &CreateTagRequest,
) -> Result<OshiTag, AppError> {
    sqlx::query_as::<_, OshiTag>(
        r#"
        INSERT INTO oshi_tags (name, category, description, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, name, category, description
        "#,
    )
    .bind(&req.name)
    .bind(req.category)
    .bind(&req.description)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        let duplicate = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if duplicate {
            AppError::Conflict(format!("Tag '{}' already exists", req.name))
        } else {
            tracing::error!("Failed to create tag: {:?}", e);
            AppError::from(e)
        }
    })
}
