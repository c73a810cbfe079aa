// src/client/ranking.rs

use crate::{
    client::{api::QuizBackend, error::ClientError},
    models::ranking::{QuizRankings, RankingEntry},
};

/// Fetches the quiz leaderboard and returns the entry for `attempt_id`,
/// or `None` when the attempt is not on it.
pub async fn locate_placement(
    backend: &dyn QuizBackend,
    quiz_id: i64,
    attempt_id: i64,
) -> Result<Option<RankingEntry>, ClientError> {
    let rankings = backend.fetch_rankings(quiz_id).await?;
    Ok(find_attempt(&rankings, attempt_id).cloned())
}

pub fn find_attempt(rankings: &QuizRankings, attempt_id: i64) -> Option<&RankingEntry> {
    rankings.rankings.iter().find(|e| e.attempt_id == attempt_id)
}
