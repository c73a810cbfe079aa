// src/seed.rs

use std::collections::HashMap;

use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::{quiz::insert_quiz, tag::insert_tag},
    models::{
        question::CreateQuestionRequest,
        quiz::{CreateQuizRequest, Difficulty},
        tag::CreateTagRequest,
    },
};

const DEMO_DATA: &str = include_str!("../seed/demo.json");

const DEMO_AUTHOR: &str = "admin";

#[derive(Debug, Deserialize)]
struct DemoData {
    tags: Vec<CreateTagRequest>,
    quizzes: Vec<DemoQuiz>,
}

/// A quiz of the demo set; `tag` refers to a tag by name.
#[derive(Debug, Deserialize)]
struct DemoQuiz {
    tag: String,
    title: String,
    description: Option<String>,
    difficulty: Difficulty,
    questions: Vec<CreateQuestionRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Demo data inserted; number of quizzes afterwards.
    Seeded(i64),
    /// Quizzes already present; their number.
    Skipped(i64),
}

/// Loads the embedded demo data set, but only into a database without quizzes.
pub async fn seed_demo_data(pool: &SqlitePool) -> Result<SeedOutcome, AppError> {
    let existing = count_quizzes(pool).await?;
    if existing > 0 {
        return Ok(SeedOutcome::Skipped(existing));
    }

    let data: DemoData = serde_json::from_str(DEMO_DATA)
        .map_err(|e| AppError::InternalServerError(format!("Invalid demo data: {}", e)))?;

    let mut tx = pool.begin().await?;

    let author_id: i64 = match sqlx::query_scalar::<_, i64>(
        "SELECT id FROM users WHERE username = ? ORDER BY id LIMIT 1",
    )
    .bind(DEMO_AUTHOR)
    .fetch_optional(&mut *tx)
    .await?
    {
        Some(id) => id,
        None => {
            sqlx::query_scalar("INSERT INTO users (username, created_at) VALUES (?, ?) RETURNING id")
                .bind(DEMO_AUTHOR)
                .bind(chrono::Utc::now())
                .fetch_one(&mut *tx)
                .await?
        }
    };

    let mut tag_ids = HashMap::new();
    for tag in &data.tags {
        let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM oshi_tags WHERE name = ?")
            .bind(&tag.name)
            .fetch_optional(&mut *tx)
            .await?;
        let id = match existing {
            Some(id) => id,
            None => insert_tag(&mut tx, tag).await?.id,
        };
        tag_ids.insert(tag.name.clone(), id);
    }

    for quiz in data.quizzes {
        let oshi_tag_id = *tag_ids.get(&quiz.tag).ok_or_else(|| {
            AppError::InternalServerError(format!("Demo quiz refers to unknown tag '{}'", quiz.tag))
        })?;

        let mut req = CreateQuizRequest {
            creator_id: Some(author_id),
            title: quiz.title,
            description: quiz.description,
            oshi_tag_id,
            difficulty: quiz.difficulty,
            questions: quiz.questions,
        };
        req.sanitize();
        req.check()?;
        insert_quiz(&mut tx, &req).await?;
    }

    tx.commit().await?;

    let count = count_quizzes(pool).await?;
    tracing::info!("Demo data seeded: {} quizzes", count);

    Ok(SeedOutcome::Seeded(count))
}

async fn count_quizzes(pool: &SqlitePool) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
        .fetch_one(pool)
        .await?)
}
