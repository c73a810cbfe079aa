// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    models::{
        question::{CreateQuestionRequest, PublicQuestion},
        tag::{TagCategory, TagSummary},
    },
    utils::html::{clean_markup, plain_text},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Mania,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Mania,
    ];
}

/// Row shape of the quiz listing query: `quizzes` joined with its tag
/// plus the question count.
#[derive(Debug, Clone, FromRow)]
pub struct QuizRow {
    pub id: i64,
    pub creator_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub oshi_tag_id: i64,
    pub tag_name: Option<String>,
    pub tag_category: Option<TagCategory>,
    pub difficulty: Difficulty,
    pub play_count: i64,
    pub average_score: f64,
    pub rating: f64,
    pub rating_count: i64,
    pub created_at: DateTime<Utc>,
    pub question_count: i64,
}

impl QuizRow {
    pub fn into_quiz(self, questions: Option<Vec<PublicQuestion>>) -> Quiz {
        let oshi_tag = match (self.tag_name, self.tag_category) {
            (Some(name), Some(category)) => Some(TagSummary {
                id: self.oshi_tag_id,
                name,
                category,
            }),
            _ => None,
        };

        Quiz {
            id: self.id,
            creator_id: self.creator_id,
            title: self.title,
            description: self.description,
            oshi_tag,
            difficulty: self.difficulty,
            play_count: self.play_count,
            average_score: self.average_score,
            rating: self.rating,
            rating_count: self.rating_count,
            created_at: self.created_at,
            question_count: self.question_count,
            questions,
        }
    }
}

/// Quiz as exchanged over the API.
///
/// `questions` is present only when the caller asked for it, and never
/// carries the answer key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quiz {
    pub id: i64,
    pub creator_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub oshi_tag: Option<TagSummary>,
    pub difficulty: Difficulty,
    pub play_count: i64,
    /// Mean percentage over all attempts.
    pub average_score: f64,
    pub rating: f64,
    pub rating_count: i64,
    pub created_at: DateTime<Utc>,
    pub question_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<PublicQuestion>>,
}

/// Listing filters, shared by the handler's query extractor and the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TagCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<i64>,
}

/// DTO for authoring a quiz with its questions and choices.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub oshi_tag_id: i64,
    pub difficulty: Difficulty,
    #[validate(length(min = 1, max = 200), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

impl CreateQuizRequest {
    pub fn sanitize(&mut self) {
        self.title = plain_text(&self.title);
        self.description = self.description.as_deref().map(clean_markup);
        for question in &mut self.questions {
            question.sanitize();
        }
    }

    /// Field validation plus the per-question answer key checks.
    pub fn check(&self) -> Result<(), crate::error::AppError> {
        self.validate()?;
        for question in &self.questions {
            question
                .check_answer_key()
                .map_err(crate::error::AppError::BadRequest)?;
        }
        Ok(())
    }
}
