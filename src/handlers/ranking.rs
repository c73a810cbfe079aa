// src/handlers/ranking.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    config::{POPULAR_QUIZ_LIMIT, RANKING_LIMIT},
    error::AppError,
    handlers::quiz::QUIZ_SELECT,
    models::{
        quiz::{Quiz, QuizRow},
        ranking::{QuizRankings, RankingRow},
    },
};

/// Retrieves the leaderboard of a quiz.
///
/// Highest score first; equal scores are ordered by the shorter time,
/// then by the earlier attempt. Anonymous attempts are listed as "Guest".
pub async fn quiz_rankings(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_title = sqlx::query_scalar::<_, String>("SELECT title FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let rows = sqlx::query_as::<_, RankingRow>(
        r#"
        SELECT
            a.id AS attempt_id,
            COALESCE(u.username, 'Guest') AS player_name,
            a.score,
            a.total_questions,
            a.time_taken,
            a.rank AS rank_grade
        FROM quiz_attempts a
        LEFT JOIN users u ON u.id = a.user_id
        WHERE a.quiz_id = ?
        ORDER BY a.score DESC, a.time_taken ASC, a.id ASC
        LIMIT ?
        "#,
    )
    .bind(quiz_id)
    .bind(RANKING_LIMIT)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch rankings: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let rankings = rows
        .into_iter()
        .zip(1..)
        .map(|(row, position)| row.into_entry(position))
        .collect();

    Ok(Json(QuizRankings {
        quiz_id,
        quiz_title,
        rankings,
    }))
}

/// Retrieves the most played public quizzes.
pub async fn popular_quizzes(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let sql = format!(
        "{} WHERE q.is_public = 1 ORDER BY q.play_count DESC, q.id ASC LIMIT ?",
        QUIZ_SELECT
    );

    let quizzes: Vec<Quiz> = sqlx::query_as::<_, QuizRow>(&sql)
        .bind(POPULAR_QUIZ_LIMIT)
        .fetch_all(&pool)
        .await?
        .into_iter()
        .map(|row| row.into_quiz(None))
        .collect();

    Ok(Json(quizzes))
}
