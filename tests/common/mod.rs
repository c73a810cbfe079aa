// tests/common/mod.rs

use oshi_quiz::{config::Config, routes, state::AppState};
use serde_json::{Value, json};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

#[allow(dead_code)]
pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port backed by a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    // An in-memory database lives as long as its connection; keep exactly one.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        allowed_origins: Vec::new(),
        seed_demo_data: false,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        client: reqwest::Client::new(),
    }
}

#[allow(dead_code)]
impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_tag(&self, name: &str, category: &str) -> i64 {
        let response = self
            .client
            .post(self.url("/api/tags"))
            .json(&json!({ "name": name, "category": category }))
            .send()
            .await
            .expect("Failed to create tag");
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    pub async fn create_user(&self, username: &str) -> i64 {
        let response = self
            .client
            .post(self.url("/api/users"))
            .json(&json!({ "username": username }))
            .send()
            .await
            .expect("Failed to create user");
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    /// Creates a quiz with `question_count` three-choice questions whose
    /// second choice ("Right k") is correct. Returns the created quiz body.
    pub async fn create_quiz(&self, tag_id: i64, difficulty: &str, question_count: usize) -> Value {
        let questions: Vec<Value> = (1..=question_count)
            .map(|k| {
                json!({
                    "question_text": format!("Question {}", k),
                    "question_type": "multiple_choice",
                    "explanation": format!("Because of {}", k),
                    "choices": [
                        { "choice_text": format!("Wrong {}", k), "is_correct": false },
                        { "choice_text": format!("Right {}", k), "is_correct": true },
                        { "choice_text": format!("Other {}", k), "is_correct": false }
                    ]
                })
            })
            .collect();

        let response = self
            .client
            .post(self.url("/api/quizzes"))
            .json(&json!({
                "title": format!("{} quiz", difficulty),
                "description": "For true fans",
                "oshi_tag_id": tag_id,
                "difficulty": difficulty,
                "questions": questions
            }))
            .send()
            .await
            .expect("Failed to create quiz");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    pub async fn submit(&self, quiz_id: i64, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/quizzes/{}/submit", quiz_id)))
            .json(body)
            .send()
            .await
            .expect("Failed to submit")
    }
}

/// Answers for a quiz body from `create_quiz`: the first `correct` questions
/// answered right, the rest answered wrong.
#[allow(dead_code)]
pub fn answers_with_correct(quiz: &Value, correct: usize) -> Vec<Value> {
    quiz["questions"]
        .as_array()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let choices = q["choices"].as_array().unwrap();
            let pick = if i < correct { &choices[1] } else { &choices[0] };
            json!({ "question_id": q["id"], "selected_choice_id": pick["id"] })
        })
        .collect()
}
