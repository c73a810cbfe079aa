// src/utils/scoring.rs

use std::collections::{HashMap, hash_map::Entry};

use crate::{
    error::AppError,
    models::{
        attempt::{AnswerDetail, AnswerSubmission},
        question::QuestionWithChoices,
    },
};

/// Outcome of grading one submission against a quiz's answer key.
#[derive(Debug)]
pub struct GradedSubmission {
    pub score: i64,
    pub total_questions: i64,
    /// One detail per quiz question, in quiz order.
    pub answers: Vec<AnswerDetail>,
}

/// `score / total * 100`, rounded to one decimal. Zero for an empty quiz.
pub fn percentage(score: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = score as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Grades a submission.
///
/// The submission must name every question of the quiz exactly once and
/// nothing else; a selected choice must belong to its question.
/// Unanswered questions count as incorrect.
pub fn grade_submission(
    bank: &[QuestionWithChoices],
    answers: &[AnswerSubmission],
) -> Result<GradedSubmission, AppError> {
    let mut selected: HashMap<i64, Option<i64>> = HashMap::with_capacity(answers.len());
    for answer in answers {
        match selected.entry(answer.question_id) {
            Entry::Occupied(_) => {
                return Err(AppError::BadRequest(format!(
                    "Question {} answered more than once",
                    answer.question_id
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(answer.selected_choice_id);
            }
        }
    }

    let mut score = 0;
    let mut details = Vec::with_capacity(bank.len());

    for entry in bank {
        let question = &entry.question;
        let choice_id = selected.remove(&question.id).ok_or_else(|| {
            AppError::BadRequest(format!("Missing answer entry for question {}", question.id))
        })?;

        let choice = match choice_id {
            Some(id) => Some(entry.choice(id).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Choice {} does not belong to question {}",
                    id, question.id
                ))
            })?),
            None => None,
        };

        let is_correct = choice.is_some_and(|c| c.is_correct);
        if is_correct {
            score += 1;
        }

        let correct = entry.correct_choice();
        details.push(AnswerDetail {
            question_id: question.id,
            question_text: question.question_text.clone(),
            selected_choice_id: choice.map(|c| c.id),
            selected_choice_text: choice.map(|c| c.choice_text.clone()),
            correct_choice_id: correct.map(|c| c.id),
            correct_choice_text: correct.map(|c| c.choice_text.clone()),
            is_correct,
            explanation: question.explanation.clone(),
        });
    }

    // Anything left over is not part of this quiz.
    if let Some(foreign) = selected.keys().min() {
        return Err(AppError::BadRequest(format!(
            "Question {} does not belong to this quiz",
            foreign
        )));
    }

    Ok(GradedSubmission {
        score,
        total_questions: bank.len() as i64,
        answers: details,
    })
}
