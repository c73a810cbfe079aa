// src/models/ranking.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{models::attempt::Grade, utils::scoring::percentage};

/// Row of the leaderboard query, `quiz_attempts` joined with `users`.
#[derive(Debug, FromRow)]
pub struct RankingRow {
    pub attempt_id: i64,
    pub player_name: String,
    pub score: i64,
    pub total_questions: i64,
    pub time_taken: i64,
    pub rank_grade: Grade,
}

impl RankingRow {
    pub fn into_entry(self, rank: i64) -> RankingEntry {
        RankingEntry {
            rank,
            attempt_id: self.attempt_id,
            player_name: self.player_name,
            score: self.score,
            total_questions: self.total_questions,
            percentage: percentage(self.score, self.total_questions),
            time_taken: self.time_taken,
            rank_grade: self.rank_grade,
        }
    }
}

/// One leaderboard line. `rank` is the 1-based position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingEntry {
    pub rank: i64,
    pub attempt_id: i64,
    pub player_name: String,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: f64,
    pub time_taken: i64,
    pub rank_grade: Grade,
}

/// Body of `GET /api/quizzes/{id}/rankings`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizRankings {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub rankings: Vec<RankingEntry>,
}
