// src/client/testing.rs

//! In-process stand-ins for the backend and the clock.

use std::sync::{
    Mutex,
    atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
    client::{api::QuizBackend, error::ClientError, session::Clock},
    models::{
        attempt::{Grade, SubmissionResult, SubmitQuizRequest},
        question::{PublicChoice, PublicQuestion, QuestionType},
        quiz::{Difficulty, Quiz},
        ranking::{QuizRankings, RankingEntry},
        user::User,
    },
    utils::scoring::percentage,
};

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()),
        }
    }
}

impl ManualClock {
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// A quiz whose question `k` (1-based) has id `10k` and choices
/// `100k`, `100k + 1`, `100k + 2`; the first choice is the correct one.
pub fn sample_quiz(id: i64, question_count: i64) -> Quiz {
    let questions = (1..=question_count)
        .map(|k| PublicQuestion {
            id: 10 * k,
            question_text: format!("Question {}", k),
            question_type: QuestionType::MultipleChoice,
            order_index: k - 1,
            choices: (0..3)
                .map(|c| PublicChoice {
                    id: 100 * k + c,
                    choice_text: format!("Choice {}", c),
                    order_index: c,
                })
                .collect(),
        })
        .collect();

    Quiz {
        id,
        creator_id: None,
        title: format!("Quiz {}", id),
        description: None,
        oshi_tag: None,
        difficulty: Difficulty::Beginner,
        play_count: 0,
        average_score: 0.0,
        rating: 0.0,
        rating_count: 0,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        question_count,
        questions: Some(questions),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBehavior {
    Succeed,
    /// Answer 503 on the first call, then succeed.
    FailOnce,
    /// Never answer.
    Hang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCall {
    Create(String),
    Update(i64, String),
}

/// Backend serving one quiz, grading with "first choice is correct" and
/// keeping every graded attempt on its leaderboard.
pub struct ScriptedBackend {
    quiz: Quiz,
    submit_behavior: Mutex<SubmitBehavior>,
    submissions: Mutex<Vec<SubmitQuizRequest>>,
    results: Mutex<Vec<SubmissionResult>>,
    user_calls: Mutex<Vec<UserCall>>,
    /// Ids the backend no longer knows; `update_user` answers 404 for them.
    unknown_users: Mutex<Vec<i64>>,
    users_down: Mutex<bool>,
    next_id: AtomicI64,
}

impl ScriptedBackend {
    pub fn new(quiz: Quiz) -> Self {
        Self {
            quiz,
            submit_behavior: Mutex::new(SubmitBehavior::Succeed),
            submissions: Mutex::new(Vec::new()),
            results: Mutex::new(Vec::new()),
            user_calls: Mutex::new(Vec::new()),
            unknown_users: Mutex::new(Vec::new()),
            users_down: Mutex::new(false),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn set_submit_behavior(&self, behavior: SubmitBehavior) {
        *self.submit_behavior.lock().unwrap() = behavior;
    }

    pub fn forget_user(&self, user_id: i64) {
        self.unknown_users.lock().unwrap().push(user_id);
    }

    pub fn set_users_down(&self, down: bool) {
        *self.users_down.lock().unwrap() = down;
    }

    pub fn submissions(&self) -> Vec<SubmitQuizRequest> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn user_calls(&self) -> Vec<UserCall> {
        self.user_calls.lock().unwrap().clone()
    }

    fn user(&self, id: i64, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn users_unavailable(&self) -> Result<(), ClientError> {
        if *self.users_down.lock().unwrap() {
            return Err(ClientError::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl QuizBackend for ScriptedBackend {
    async fn fetch_quiz(&self, quiz_id: i64, include_questions: bool) -> Result<Quiz, ClientError> {
        if quiz_id != self.quiz.id {
            return Err(ClientError::Status {
                status: 404,
                message: "Quiz not found".to_string(),
            });
        }
        let mut quiz = self.quiz.clone();
        if !include_questions {
            quiz.questions = None;
        }
        Ok(quiz)
    }

    async fn submit_answers(
        &self,
        quiz_id: i64,
        request: &SubmitQuizRequest,
    ) -> Result<SubmissionResult, ClientError> {
        self.submissions.lock().unwrap().push(request.clone());

        let behavior = *self.submit_behavior.lock().unwrap();
        match behavior {
            SubmitBehavior::Hang => std::future::pending::<()>().await,
            SubmitBehavior::FailOnce => {
                self.set_submit_behavior(SubmitBehavior::Succeed);
                return Err(ClientError::Status {
                    status: 503,
                    message: "try again".to_string(),
                });
            }
            SubmitBehavior::Succeed => {}
        }

        let score = request
            .answers
            .iter()
            .filter(|a| a.selected_choice_id == Some(100 * (a.question_id / 10)))
            .count() as i64;
        let total = request.answers.len() as i64;
        let pct = percentage(score, total);

        let result = SubmissionResult {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id: request.user_id,
            quiz_id,
            score,
            total_questions: total,
            percentage: pct,
            time_taken: request.time_taken,
            rank: Grade::from_percentage(pct),
            completed_at: Utc::now(),
            answers: Vec::new(),
        };
        self.results.lock().unwrap().push(result.clone());
        Ok(result)
    }

    async fn fetch_rankings(&self, quiz_id: i64) -> Result<QuizRankings, ClientError> {
        let mut results = self.results.lock().unwrap().clone();
        results.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.time_taken.cmp(&b.time_taken))
                .then(a.id.cmp(&b.id))
        });

        let rankings = results
            .into_iter()
            .take(10)
            .zip(1..)
            .map(|(r, rank)| RankingEntry {
                rank,
                attempt_id: r.id,
                player_name: "Guest".to_string(),
                score: r.score,
                total_questions: r.total_questions,
                percentage: r.percentage,
                time_taken: r.time_taken,
                rank_grade: r.rank,
            })
            .collect();

        Ok(QuizRankings {
            quiz_id,
            quiz_title: self.quiz.title.clone(),
            rankings,
        })
    }

    async fn create_user(&self, username: &str) -> Result<User, ClientError> {
        self.user_calls
            .lock()
            .unwrap()
            .push(UserCall::Create(username.to_string()));
        self.users_unavailable()?;
        Ok(self.user(1000 + self.next_id.fetch_add(1, Ordering::SeqCst), username))
    }

    async fn update_user(&self, user_id: i64, username: &str) -> Result<User, ClientError> {
        self.user_calls
            .lock()
            .unwrap()
            .push(UserCall::Update(user_id, username.to_string()));
        self.users_unavailable()?;
        if self.unknown_users.lock().unwrap().contains(&user_id) {
            return Err(ClientError::Status {
                status: 404,
                message: "User not found".to_string(),
            });
        }
        Ok(self.user(user_id, username))
    }
}
