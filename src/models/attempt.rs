// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Letter grade assigned to an attempt from its percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
}

impl Grade {
    /// S ≥ 90, A ≥ 75, B ≥ 60, C ≥ 40, otherwise D.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Grade::S
        } else if percentage >= 75.0 {
            Grade::A
        } else if percentage >= 60.0 {
            Grade::B
        } else if percentage >= 40.0 {
            Grade::C
        } else {
            Grade::D
        }
    }

    /// Result-screen message for the grade.
    pub fn headline(&self) -> &'static str {
        match self {
            Grade::S => "Perfect! A true oshi master!",
            Grade::A => "Excellent! Your love for your oshi shows.",
            Grade::B => "Well done!",
            Grade::C => "Keep at it!",
            Grade::D => "Time to dig deeper into your oshi.",
        }
    }
}

/// One entry of a submission. `selected_choice_id` is `None` for an
/// unanswered question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub selected_choice_id: Option<i64>,
}

/// Body of `POST /api/quizzes/{id}/submit`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct SubmitQuizRequest {
    /// Absent for players without an identity; the attempt is then anonymous.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// One entry per question, in quiz order.
    pub answers: Vec<AnswerSubmission>,
    /// Whole seconds between session start and submission.
    #[validate(range(min = 0))]
    #[serde(default)]
    pub time_taken: i64,
}

/// Graded detail for one question, revealed after submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerDetail {
    pub question_id: i64,
    pub question_text: String,
    pub selected_choice_id: Option<i64>,
    pub selected_choice_text: Option<String>,
    pub correct_choice_id: Option<i64>,
    pub correct_choice_text: Option<String>,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Graded attempt returned by the submit endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionResult {
    /// Attempt id; also the key used to find the attempt on the leaderboard.
    pub id: i64,
    pub user_id: Option<i64>,
    pub quiz_id: i64,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: f64,
    pub time_taken: i64,
    pub rank: Grade,
    pub completed_at: DateTime<Utc>,
    pub answers: Vec<AnswerDetail>,
}
