// src/config.rs

use std::{env, net::SocketAddr, time::Duration};
use dotenvy::dotenv;

/// Number of attempts shown on a quiz leaderboard.
pub const RANKING_LIMIT: i64 = 10;

/// Number of quizzes in the popularity ranking.
pub const POPULAR_QUIZ_LIMIT: i64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    /// Allowed CORS origins. Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://quiz.db?mode=rwc".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 5000)));

        let allowed_origins = env::var("CORS_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let seed_demo_data = env::var("SEED_DEMO_DATA")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            database_url,
            rust_log,
            bind_addr,
            allowed_origins,
            seed_demo_data,
        }
    }
}

/// Settings for [`crate::client::ApiClient`] and the sessions built on it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    /// Upper bound for a whole submission round trip before the session fails.
    pub submit_timeout: Duration,
    /// Extra attempts for idempotent reads after a transport error or 5xx.
    pub read_retries: u32,
    pub retry_backoff: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(10),
            submit_timeout: Duration::from_secs(15),
            read_retries: 2,
            retry_backoff: Duration::from_millis(200),
        }
    }

    pub fn from_env() -> Self {
        dotenv().ok();

        let base_url = env::var("QUIZ_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:5000/".to_string());

        let mut config = Self::new(base_url);

        if let Some(secs) = env_number::<u64>("QUIZ_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_number::<u64>("QUIZ_SUBMIT_TIMEOUT_SECS") {
            config.submit_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = env_number::<u32>("QUIZ_READ_RETRIES") {
            config.read_retries = retries;
        }

        config
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
