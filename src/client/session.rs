// src/client/session.rs

//! One player's run through a quiz, as an explicit state machine.
//!
//! ```text
//! Loading ──load()──▶ InProgress(0) ──advance()──▶ … InProgress(n-1) ──advance()──▶ Submitting
//!    │                                                                                  │ submit()
//!    ▼                                                                                  ▼
//! LoadFailed ──load()──▶ …                                    Completed ◀──────┬──── Failed
//!                                                                               └─ retry() ─┘
//! any non-terminal state ──cancel()──▶ Cancelled
//! ```

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::{
    client::{api::QuizBackend, error::ClientError},
    models::{
        attempt::{AnswerSubmission, SubmissionResult, SubmitQuizRequest},
        question::PublicQuestion,
        quiz::Quiz,
        ranking::RankingEntry,
    },
};

/// Source of wall-clock time for elapsed-time measurement.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Quiz and questions not fetched yet.
    Loading,
    /// Fetch failed or the quiz has no questions; `load()` may be retried.
    LoadFailed { reason: String },
    /// Answering the question at `index`.
    InProgress { index: usize },
    /// All questions passed; the submission is (about to be) in flight.
    Submitting { finished_at: DateTime<Utc> },
    Completed { result: Box<SubmissionResult> },
    /// Submission failed; `retry()` sends it again.
    Failed { reason: String, finished_at: DateTime<Utc> },
    /// Torn down before completion; all answers discarded.
    Cancelled,
}

/// Result of [`QuizSession::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the question at this index.
    Moved(usize),
    /// Left the last question; the session is now `Submitting`.
    ReadyToSubmit,
    /// Not in progress; nothing changed.
    Ignored,
}

/// Cancels a session from outside, e.g. when the player navigates away
/// while a request is in flight.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<watch::Sender<bool>>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

pub struct QuizSession {
    backend: Arc<dyn QuizBackend>,
    clock: Arc<dyn Clock>,
    quiz_id: i64,
    user_id: Option<i64>,
    request_timeout: Duration,
    quiz: Option<Quiz>,
    questions: Vec<PublicQuestion>,
    /// question id → selected choice id
    answers: HashMap<i64, i64>,
    started_at: Option<DateTime<Utc>>,
    state: SessionState,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl QuizSession {
    pub fn new(backend: Arc<dyn QuizBackend>, quiz_id: i64) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            backend,
            clock: Arc::new(SystemClock),
            quiz_id,
            user_id: None,
            request_timeout: Duration::from_secs(15),
            quiz: None,
            questions: Vec::new(),
            answers: HashMap::new(),
            started_at: None,
            state: SessionState::Loading,
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
        }
    }

    /// Attributes the attempt to a player. Without one the submission is anonymous.
    pub fn attributed_to(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bound for each backend call made by the session.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn quiz_id(&self) -> i64 {
        self.quiz_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn questions(&self) -> &[PublicQuestion] {
        &self.questions
    }

    /// Selections so far, keyed by question id. Kept after completion for
    /// rendering the answer review.
    pub fn answers(&self) -> &HashMap<i64, i64> {
        &self.answers
    }

    pub fn selected_choice(&self, question_id: i64) -> Option<i64> {
        self.answers.get(&question_id).copied()
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            SessionState::InProgress { index } => Some(index),
            _ => None,
        }
    }

    pub fn current_question(&self) -> Option<&PublicQuestion> {
        self.current_index().and_then(|i| self.questions.get(i))
    }

    /// Whether the current question has a selection; UIs gate "next" on it.
    pub fn is_current_answered(&self) -> bool {
        self.current_question()
            .is_some_and(|q| self.answers.contains_key(&q.id))
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        match &self.state {
            SessionState::Completed { result } => Some(result),
            _ => None,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancel_tx))
    }

    /// Fetches the quiz with its questions and starts the clock.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        self.observe_cancellation()?;
        if !matches!(
            self.state,
            SessionState::Loading | SessionState::LoadFailed { .. }
        ) {
            return Err(ClientError::InvalidState(
                "quiz already loaded".to_string(),
            ));
        }
        self.state = SessionState::Loading;

        let outcome = self
            .guarded(self.backend.fetch_quiz(self.quiz_id, true))
            .await;

        let mut quiz = match outcome {
            Ok(quiz) => quiz,
            Err(ClientError::Cancelled) => {
                self.discard();
                return Err(ClientError::Cancelled);
            }
            Err(e) => {
                tracing::warn!("Failed to load quiz {}: {}", self.quiz_id, e);
                self.state = SessionState::LoadFailed {
                    reason: e.to_string(),
                };
                return Err(e);
            }
        };

        let questions = quiz.questions.take().unwrap_or_default();
        if questions.is_empty() {
            let reason = format!("quiz {} has no questions", self.quiz_id);
            self.state = SessionState::LoadFailed {
                reason: reason.clone(),
            };
            return Err(ClientError::InvalidState(reason));
        }

        self.quiz = Some(quiz);
        self.questions = questions;
        self.answers.clear();
        self.started_at = Some(self.clock.now());
        self.state = SessionState::InProgress { index: 0 };
        Ok(())
    }

    /// Records a selection, replacing any earlier one for the same question.
    ///
    /// The question need not be the current one. Unknown question ids and
    /// choices that do not belong to the question are ignored. Returns
    /// whether the selection was recorded.
    pub fn select_choice(&mut self, question_id: i64, choice_id: i64) -> bool {
        if self.observe_cancellation().is_err() {
            return false;
        }
        if !matches!(self.state, SessionState::InProgress { .. }) {
            return false;
        }

        let known = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .is_some_and(|q| q.has_choice(choice_id));
        if !known {
            tracing::debug!(
                "Ignoring selection of choice {} for question {}",
                choice_id,
                question_id
            );
            return false;
        }

        self.answers.insert(question_id, choice_id);
        true
    }

    /// Moves to the next question, or into `Submitting` after the last one.
    /// A no-op outside `InProgress`.
    pub fn advance(&mut self) -> Advance {
        if self.observe_cancellation().is_err() {
            return Advance::Ignored;
        }
        let SessionState::InProgress { index } = self.state else {
            return Advance::Ignored;
        };

        if index + 1 < self.questions.len() {
            self.state = SessionState::InProgress { index: index + 1 };
            Advance::Moved(index + 1)
        } else {
            self.state = SessionState::Submitting {
                finished_at: self.clock.now(),
            };
            Advance::ReadyToSubmit
        }
    }

    /// The request `submit()` sends: one entry per question in quiz order,
    /// unanswered questions with no choice. Available once submitting.
    pub fn build_submission(&self) -> Option<SubmitQuizRequest> {
        let finished_at = match &self.state {
            SessionState::Submitting { finished_at } | SessionState::Failed { finished_at, .. } => {
                *finished_at
            }
            _ => return None,
        };

        let answers = self
            .questions
            .iter()
            .map(|q| AnswerSubmission {
                question_id: q.id,
                selected_choice_id: self.answers.get(&q.id).copied(),
            })
            .collect();

        Some(SubmitQuizRequest {
            user_id: self.user_id,
            answers,
            time_taken: self.elapsed_seconds_until(finished_at),
        })
    }

    /// Whole seconds since the session started, never negative.
    pub fn elapsed_seconds(&self) -> i64 {
        let until = match &self.state {
            SessionState::Submitting { finished_at } | SessionState::Failed { finished_at, .. } => {
                *finished_at
            }
            _ => self.clock.now(),
        };
        self.elapsed_seconds_until(until)
    }

    fn elapsed_seconds_until(&self, until: DateTime<Utc>) -> i64 {
        self.started_at
            .map(|started| (until - started).num_seconds().max(0))
            .unwrap_or(0)
    }

    /// Sends the submission. Only valid in `Submitting`.
    ///
    /// Success moves to `Completed`; a network/server error or timeout moves
    /// to `Failed` (no automatic retry).
    pub async fn submit(&mut self) -> Result<SubmissionResult, ClientError> {
        self.observe_cancellation()?;
        let SessionState::Submitting { finished_at } = self.state else {
            return Err(ClientError::InvalidState(
                "submit is only possible after the last question".to_string(),
            ));
        };
        let request = self.build_submission().ok_or_else(|| {
            ClientError::InvalidState("nothing to submit".to_string())
        })?;

        let outcome = self
            .guarded(self.backend.submit_answers(self.quiz_id, &request))
            .await;

        match outcome {
            Ok(result) => {
                tracing::info!(
                    "Quiz {} submitted: {}/{} ({})",
                    self.quiz_id,
                    result.score,
                    result.total_questions,
                    result.percentage
                );
                self.state = SessionState::Completed {
                    result: Box::new(result.clone()),
                };
                Ok(result)
            }
            Err(ClientError::Cancelled) => {
                self.discard();
                Err(ClientError::Cancelled)
            }
            Err(e) => {
                tracing::warn!("Submission for quiz {} failed: {}", self.quiz_id, e);
                self.state = SessionState::Failed {
                    reason: e.to_string(),
                    finished_at,
                };
                Err(e)
            }
        }
    }

    /// Re-sends a failed submission with the same answers and time.
    pub async fn retry(&mut self) -> Result<SubmissionResult, ClientError> {
        self.observe_cancellation()?;
        let SessionState::Failed { finished_at, .. } = self.state else {
            return Err(ClientError::InvalidState(
                "only a failed submission can be retried".to_string(),
            ));
        };
        self.state = SessionState::Submitting { finished_at };
        self.submit().await
    }

    /// Looks the submitted attempt up on the quiz leaderboard.
    /// `None` when the attempt did not make the list.
    pub async fn locate_placement(&self) -> Result<Option<RankingEntry>, ClientError> {
        let result = self.result().ok_or_else(|| {
            ClientError::InvalidState("no completed submission".to_string())
        })?;
        crate::client::ranking::locate_placement(self.backend.as_ref(), self.quiz_id, result.id)
            .await
    }

    /// Abandons the attempt and discards everything accumulated.
    /// No effect once completed.
    pub fn cancel(&mut self) {
        self.cancel_tx.send_replace(true);
        self.observe_cancellation().ok();
    }

    fn observe_cancellation(&mut self) -> Result<(), ClientError> {
        if matches!(self.state, SessionState::Cancelled) {
            return Err(ClientError::Cancelled);
        }
        if *self.cancel_rx.borrow() && !matches!(self.state, SessionState::Completed { .. }) {
            self.discard();
            return Err(ClientError::Cancelled);
        }
        Ok(())
    }

    fn discard(&mut self) {
        tracing::debug!("Quiz session {} discarded", self.quiz_id);
        self.answers.clear();
        self.questions.clear();
        self.quiz = None;
        self.started_at = None;
        self.state = SessionState::Cancelled;
    }

    /// Runs a backend call bounded by the timeout and abandoned on cancellation.
    async fn guarded<T, F>(&self, call: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let mut cancel_rx = self.cancel_rx.clone();
        tokio::select! {
            biased;
            _ = cancel_rx.wait_for(|cancelled| *cancelled) => Err(ClientError::Cancelled),
            outcome = tokio::time::timeout(self.request_timeout, call) => {
                outcome.map_err(|_| ClientError::Timeout)?
            }
        }
    }
}
