// src/client/catalog.rs

//! Helpers for the quiz catalog screen.

use std::collections::BTreeMap;

use crate::models::quiz::{Difficulty, Quiz};

/// Quizzes of one difficulty, or all of them for `None`, in list order.
pub fn filter_by_difficulty(quizzes: &[Quiz], difficulty: Option<Difficulty>) -> Vec<&Quiz> {
    quizzes
        .iter()
        .filter(|q| difficulty.is_none_or(|d| q.difficulty == d))
        .collect()
}

/// Count per difficulty. Every difficulty has an entry, zero included,
/// so the counts always sum to `quizzes.len()`.
pub fn difficulty_counts(quizzes: &[Quiz]) -> BTreeMap<Difficulty, usize> {
    let mut counts: BTreeMap<Difficulty, usize> =
        Difficulty::ALL.iter().map(|d| (*d, 0)).collect();
    for quiz in quizzes {
        *counts.entry(quiz.difficulty).or_default() += 1;
    }
    counts
}
