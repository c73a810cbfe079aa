// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::html::{clean_markup, plain_text};

/// Question format. Stored as TEXT in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub question_text: String,
    pub question_type: QuestionType,

    /// Position inside the quiz. Questions are served ordered by this, then by id.
    pub order_index: i64,

    /// Shown to the player only after grading.
    pub explanation: Option<String>,
}

/// Represents the 'choices' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub choice_text: String,

    /// The answer key. Never serialized to a client before grading.
    pub is_correct: bool,
    pub order_index: i64,
}

/// A question with its ordered choices: the server-side answer key for one question.
#[derive(Debug, Clone)]
pub struct QuestionWithChoices {
    pub question: Question,
    pub choices: Vec<Choice>,
}

impl QuestionWithChoices {
    pub fn choice(&self, choice_id: i64) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    pub fn correct_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.is_correct)
    }

    /// Strips correctness and explanation.
    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.question.id,
            question_text: self.question.question_text.clone(),
            question_type: self.question.question_type,
            order_index: self.question.order_index,
            choices: self
                .choices
                .iter()
                .map(|c| PublicChoice {
                    id: c.id,
                    choice_text: c.choice_text.clone(),
                    order_index: c.order_index,
                })
                .collect(),
        }
    }
}

/// DTO for sending a question to the client (excludes answer key and explanation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub order_index: i64,
    pub choices: Vec<PublicChoice>,
}

impl PublicQuestion {
    pub fn has_choice(&self, choice_id: i64) -> bool {
        self.choices.iter().any(|c| c.id == choice_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicChoice {
    pub id: i64,
    pub choice_text: String,
    pub order_index: i64,
}

/// DTO for one authored question, nested in a quiz creation request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question_text: String,
    pub question_type: QuestionType,
    /// Defaults to the position in the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
    #[validate(length(max = 2000))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[validate(length(min = 2, max = 10), nested)]
    pub choices: Vec<CreateChoiceRequest>,
}

impl CreateQuestionRequest {
    pub fn sanitize(&mut self) {
        self.question_text = plain_text(&self.question_text);
        self.explanation = self
            .explanation
            .as_deref()
            .map(clean_markup)
            .filter(|e| !e.is_empty());
        for choice in &mut self.choices {
            choice.choice_text = plain_text(&choice.choice_text);
        }
    }

    /// Checks the answer key shape: exactly one correct choice,
    /// and exactly two choices for a true/false question.
    pub fn check_answer_key(&self) -> Result<(), String> {
        let correct = self.choices.iter().filter(|c| c.is_correct).count();
        if correct != 1 {
            return Err(format!(
                "Question '{}' must have exactly one correct choice (found {})",
                self.question_text, correct
            ));
        }
        if self.question_type == QuestionType::TrueFalse && self.choices.len() != 2 {
            return Err(format!(
                "True/false question '{}' must have exactly two choices",
                self.question_text
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateChoiceRequest {
    #[validate(length(min = 1, max = 255))]
    pub choice_text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
}
