// src/handlers/submission.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::quiz::{fetch_question_bank, fetch_quiz_row},
    models::attempt::{Grade, SubmissionResult, SubmitQuizRequest},
    utils::scoring::{grade_submission, percentage},
};

/// Grades a quiz attempt and records it.
///
/// * Checks the answers cover exactly the quiz's questions.
/// * Scores against the stored answer key (one point per correct choice).
/// * Assigns the letter grade from the percentage.
/// * Stores the attempt and its answers, then refreshes the quiz's
///   play count and average score, all in one transaction.
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    // Reads first, on their own connection; the quiz content is immutable.
    let (graded, user_id) = {
        let mut conn = pool.acquire().await?;
        fetch_quiz_row(&mut conn, quiz_id).await?;
        let bank = fetch_question_bank(&mut conn, quiz_id).await?;
        let graded = grade_submission(&bank, &req.answers)?;
        let user_id = resolve_player(&mut conn, req.user_id).await?;
        (graded, user_id)
    };

    let percentage = percentage(graded.score, graded.total_questions);
    let grade = Grade::from_percentage(percentage);
    let completed_at = Utc::now();

    let mut tx = pool.begin().await?;

    let attempt_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quiz_attempts (user_id, quiz_id, score, total_questions, time_taken, rank, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(quiz_id)
    .bind(graded.score)
    .bind(graded.total_questions)
    .bind(req.time_taken)
    .bind(grade)
    .bind(completed_at)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert attempt: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    for detail in &graded.answers {
        sqlx::query(
            r#"
            INSERT INTO user_answers (attempt_id, question_id, selected_choice_id, is_correct)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(attempt_id)
        .bind(detail.question_id)
        .bind(detail.selected_choice_id)
        .bind(detail.is_correct)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        UPDATE quizzes SET
            play_count = play_count + 1,
            average_score = (
                SELECT COALESCE(SUM(score) * 100.0 / NULLIF(SUM(total_questions), 0), 0.0)
                FROM quiz_attempts
                WHERE quiz_id = ?
            ),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(quiz_id)
    .bind(completed_at)
    .bind(quiz_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update quiz statistics: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tx.commit().await?;

    tracing::info!(
        "Attempt {} on quiz {}: {}/{} ({})",
        attempt_id,
        quiz_id,
        graded.score,
        graded.total_questions,
        percentage
    );

    let result = SubmissionResult {
        id: attempt_id,
        user_id,
        quiz_id,
        score: graded.score,
        total_questions: graded.total_questions,
        percentage,
        time_taken: req.time_taken,
        rank: grade,
        completed_at,
        answers: graded.answers,
    };

    Ok((StatusCode::CREATED, Json(result)))
}

/// Keeps the submitted user id only if it names an existing user.
/// Unknown ids are recorded as anonymous rather than rejected.
async fn resolve_player(
    conn: &mut SqliteConnection,
    user_id: Option<i64>,
) -> Result<Option<i64>, AppError> {
    let Some(id) = user_id else {
        return Ok(None);
    };

    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .is_some();

    if !exists {
        tracing::warn!("Submission for unknown user {}, recording as anonymous", id);
        return Ok(None);
    }

    Ok(Some(id))
}
