// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::{
    error::AppError,
    models::{
        question::{Choice, Question, QuestionWithChoices},
        quiz::{CreateQuizRequest, Quiz, QuizFilter, QuizRow},
    },
};

/// Shared SELECT for quiz rows: the quiz, its tag and its question count.
pub(crate) const QUIZ_SELECT: &str = r#"
    SELECT
        q.id,
        q.creator_id,
        q.title,
        q.description,
        q.oshi_tag_id,
        t.name AS tag_name,
        t.category AS tag_category,
        q.difficulty,
        q.play_count,
        q.average_score,
        q.rating,
        q.rating_count,
        q.created_at,
        (SELECT COUNT(*) FROM questions qs WHERE qs.quiz_id = q.id) AS question_count
    FROM quizzes q
    LEFT JOIN oshi_tags t ON t.id = q.oshi_tag_id
"#;

/// Query parameters for the quiz detail endpoint.
#[derive(Debug, Deserialize)]
pub struct DetailParams {
    #[serde(default)]
    pub include_questions: bool,
}

/// Lists public quizzes, newest first.
/// Optional filters: tag `category`, `difficulty`, `tag_id`.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    Query(filter): Query<QuizFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut query_builder = QueryBuilder::<Sqlite>::new(QUIZ_SELECT);
    query_builder.push(" WHERE q.is_public = 1");

    if let Some(category) = filter.category {
        query_builder.push(" AND t.category = ").push_bind(category);
    }
    if let Some(difficulty) = filter.difficulty {
        query_builder.push(" AND q.difficulty = ").push_bind(difficulty);
    }
    if let Some(tag_id) = filter.tag_id {
        query_builder.push(" AND q.oshi_tag_id = ").push_bind(tag_id);
    }
    query_builder.push(" ORDER BY q.created_at DESC, q.id DESC");

    let quizzes: Vec<Quiz> = query_builder
        .build_query_as::<QuizRow>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quizzes: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .into_iter()
        .map(|row| row.into_quiz(None))
        .collect();

    Ok(Json(quizzes))
}

/// Retrieves a single quiz. With `include_questions=true` the ordered
/// questions and choices are attached, without the answer key.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Query(params): Query<DetailParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let quiz = load_quiz(&mut conn, id, params.include_questions).await?;

    Ok(Json(quiz))
}

/// Creates a quiz with its questions and choices in one transaction.
///
/// Text is sanitized before validation; returns 201 and the created quiz
/// including its public questions.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Json(mut payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.sanitize();
    payload.check()?;

    let mut tx = pool.begin().await?;
    let quiz_id = insert_quiz(&mut tx, &payload).await?;
    let quiz = load_quiz(&mut tx, quiz_id, true).await?;
    tx.commit().await?;

    tracing::info!(
        "Quiz {} created with {} questions",
        quiz_id,
        payload.questions.len()
    );

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Loads a quiz row, optionally with its public questions.
pub(crate) async fn load_quiz(
    conn: &mut SqliteConnection,
    id: i64,
    include_questions: bool,
) -> Result<Quiz, AppError> {
    let row = fetch_quiz_row(&mut *conn, id).await?;

    let questions = if include_questions {
        let bank = fetch_question_bank(&mut *conn, id).await?;
        Some(bank.iter().map(QuestionWithChoices::to_public).collect())
    } else {
        None
    };

    Ok(row.into_quiz(questions))
}

pub(crate) async fn fetch_quiz_row(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<QuizRow, AppError> {
    let sql = format!("{} WHERE q.id = ?", QUIZ_SELECT);

    sqlx::query_as::<_, QuizRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Loads the full answer key of a quiz: questions in quiz order, each with
/// its ordered choices.
pub(crate) async fn fetch_question_bank(
    conn: &mut SqliteConnection,
    quiz_id: i64,
) -> Result<Vec<QuestionWithChoices>, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, question_text, question_type, order_index, explanation
        FROM questions
        WHERE quiz_id = ?
        ORDER BY order_index, id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&mut *conn)
    .await?;

    let choices = sqlx::query_as::<_, Choice>(
        r#"
        SELECT c.id, c.question_id, c.choice_text, c.is_correct, c.order_index
        FROM choices c
        JOIN questions q ON q.id = c.question_id
        WHERE q.quiz_id = ?
        ORDER BY c.question_id, c.order_index, c.id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_question: HashMap<i64, Vec<Choice>> = HashMap::new();
    for choice in choices {
        by_question.entry(choice.question_id).or_default().push(choice);
    }

    Ok(questions
        .into_iter()
        .map(|question| QuestionWithChoices {
            choices: by_question.remove(&question.id).unwrap_or_default(),
            question,
        })
        .collect())
}

/// Inserts a validated quiz and its children. Returns the new quiz id.
///
/// The tag must exist; a `creator_id`, when given, must name a user.
pub(crate) async fn insert_quiz(
    conn: &mut SqliteConnection,
    req: &CreateQuizRequest,
) -> Result<i64, AppError> {
    let tag_exists = sqlx::query_scalar::<_, i64>("SELECT id FROM oshi_tags WHERE id = ?")
        .bind(req.oshi_tag_id)
        .fetch_optional(&mut *conn)
        .await?
        .is_some();
    if !tag_exists {
        return Err(AppError::BadRequest(format!(
            "Tag {} does not exist",
            req.oshi_tag_id
        )));
    }

    if let Some(creator_id) = req.creator_id {
        let creator_exists = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
            .bind(creator_id)
            .fetch_optional(&mut *conn)
            .await?
            .is_some();
        if !creator_exists {
            return Err(AppError::BadRequest(format!(
                "User {} does not exist",
                creator_id
            )));
        }
    }

    let now = Utc::now();
    let quiz_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes (creator_id, title, description, oshi_tag_id, difficulty, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(req.creator_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.oshi_tag_id)
    .bind(req.difficulty)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    for (position, question) in req.questions.iter().enumerate() {
        let question_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions (quiz_id, question_text, question_type, order_index, explanation)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(quiz_id)
        .bind(&question.question_text)
        .bind(question.question_type)
        .bind(question.order_index.unwrap_or(position as i64))
        .bind(&question.explanation)
        .fetch_one(&mut *conn)
        .await?;

        for (choice_position, choice) in question.choices.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO choices (question_id, choice_text, is_correct, order_index)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(question_id)
            .bind(&choice.choice_text)
            .bind(choice.is_correct)
            .bind(choice.order_index.unwrap_or(choice_position as i64))
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(quiz_id)
}
