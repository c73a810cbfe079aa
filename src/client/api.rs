// src/client/api.rs

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::{
    client::error::ClientError,
    config::ClientConfig,
    models::{
        attempt::{SubmissionResult, SubmitQuizRequest},
        quiz::{CreateQuizRequest, Quiz, QuizFilter},
        ranking::QuizRankings,
        tag::{CreateTagRequest, OshiTag},
        user::{UpsertUserRequest, User},
    },
};

/// The backend calls a quiz session, identity upsert and placement lookup
/// depend on. [`ApiClient`] is the HTTP implementation.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// `GET /api/quizzes/{id}[?include_questions=true]`
    async fn fetch_quiz(&self, quiz_id: i64, include_questions: bool) -> Result<Quiz, ClientError>;

    /// `POST /api/quizzes/{id}/submit`
    async fn submit_answers(
        &self,
        quiz_id: i64,
        request: &SubmitQuizRequest,
    ) -> Result<SubmissionResult, ClientError>;

    /// `GET /api/quizzes/{id}/rankings`
    async fn fetch_rankings(&self, quiz_id: i64) -> Result<QuizRankings, ClientError>;

    /// `POST /api/users`
    async fn create_user(&self, username: &str) -> Result<User, ClientError>;

    /// `PUT /api/users/{id}`
    async fn update_user(&self, user_id: i64, username: &str) -> Result<User, ClientError>;
}

/// REST client for the quiz API.
///
/// Reads (GET) are retried with exponential backoff on transport errors
/// and 5xx answers; writes are sent once.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    submit_timeout: Duration,
    read_retries: u32,
    retry_backoff: Duration,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(&config.base_url)?;
        // Keep the base path a directory so relative joins append to it.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            http,
            base_url,
            submit_timeout: config.submit_timeout,
            read_retries: config.read_retries,
            retry_backoff: config.retry_backoff,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Bound for a submission round trip; sessions use it as their timeout.
    pub fn submit_timeout(&self) -> Duration {
        self.submit_timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// `GET /api/quizzes`
    pub async fn list_quizzes(&self, filter: &QuizFilter) -> Result<Vec<Quiz>, ClientError> {
        let mut url = self.endpoint("api/quizzes")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(category) = filter.category {
                pairs.append_pair("category", &enum_value(&category)?);
            }
            if let Some(difficulty) = filter.difficulty {
                pairs.append_pair("difficulty", &enum_value(&difficulty)?);
            }
            if let Some(tag_id) = filter.tag_id {
                pairs.append_pair("tag_id", &tag_id.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.get_json(url).await
    }

    /// `GET /api/rankings/quizzes`
    pub async fn popular_quizzes(&self) -> Result<Vec<Quiz>, ClientError> {
        self.get_json(self.endpoint("api/rankings/quizzes")?).await
    }

    /// `POST /api/quizzes`
    pub async fn create_quiz(&self, request: &CreateQuizRequest) -> Result<Quiz, ClientError> {
        let response = self
            .http
            .post(self.endpoint("api/quizzes")?)
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    /// `GET /api/tags`
    pub async fn list_tags(&self) -> Result<Vec<OshiTag>, ClientError> {
        self.get_json(self.endpoint("api/tags")?).await
    }

    /// `POST /api/tags`
    pub async fn create_tag(&self, request: &CreateTagRequest) -> Result<OshiTag, ClientError> {
        let response = self
            .http
            .post(self.endpoint("api/tags")?)
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    /// `GET /api/users/{id}`
    pub async fn get_user(&self, user_id: i64) -> Result<User, ClientError> {
        self.get_json(self.endpoint(&format!("api/users/{}", user_id))?)
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let mut attempt = 0;
        loop {
            let outcome = match self.http.get(url.clone()).send().await {
                Ok(response) => decode(response).await,
                Err(e) => Err(ClientError::from(e)),
            };

            match outcome {
                Err(e) if e.is_retryable() && attempt < self.read_retries => {
                    attempt += 1;
                    let delay = self.retry_backoff * 2u32.saturating_pow(attempt - 1);
                    tracing::warn!(
                        "GET {} failed ({}), retrying in {:?} (attempt {})",
                        url,
                        e,
                        delay,
                        attempt
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl QuizBackend for ApiClient {
    async fn fetch_quiz(&self, quiz_id: i64, include_questions: bool) -> Result<Quiz, ClientError> {
        let mut url = self.endpoint(&format!("api/quizzes/{}", quiz_id))?;
        if include_questions {
            url.set_query(Some("include_questions=true"));
        }
        self.get_json(url).await
    }

    async fn submit_answers(
        &self,
        quiz_id: i64,
        request: &SubmitQuizRequest,
    ) -> Result<SubmissionResult, ClientError> {
        let response = self
            .http
            .post(self.endpoint(&format!("api/quizzes/{}/submit", quiz_id))?)
            .timeout(self.submit_timeout)
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    async fn fetch_rankings(&self, quiz_id: i64) -> Result<QuizRankings, ClientError> {
        self.get_json(self.endpoint(&format!("api/quizzes/{}/rankings", quiz_id))?)
            .await
    }

    async fn create_user(&self, username: &str) -> Result<User, ClientError> {
        let response = self
            .http
            .post(self.endpoint("api/users")?)
            .json(&UpsertUserRequest {
                username: username.to_string(),
            })
            .send()
            .await?;
        decode(response).await
    }

    async fn update_user(&self, user_id: i64, username: &str) -> Result<User, ClientError> {
        let response = self
            .http
            .put(self.endpoint(&format!("api/users/{}", user_id))?)
            .json(&UpsertUserRequest {
                username: username.to_string(),
            })
            .send()
            .await?;
        decode(response).await
    }
}

/// Turns a response into `T`, or into `ClientError::Status` carrying the
/// server's `{"error": ...}` message.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
        .unwrap_or(body);

    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Wire name of a unit enum variant, e.g. `Difficulty::Mania` → `mania`.
fn enum_value<T: serde::Serialize>(value: &T) -> Result<String, ClientError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => Ok(s),
        _ => Err(ClientError::InvalidState(
            "filter value is not a plain string".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{quiz::Difficulty, tag::TagCategory};

    #[test]
    fn base_url_keeps_its_path() {
        let client = ApiClient::new(&ClientConfig::new("http://quiz.test/backend")).unwrap();
        assert_eq!(
            client.endpoint("api/quizzes").unwrap().as_str(),
            "http://quiz.test/backend/api/quizzes"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = ApiClient::new(&ClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn filter_values_use_wire_names() {
        assert_eq!(enum_value(&Difficulty::Mania).unwrap(), "mania");
        assert_eq!(enum_value(&TagCategory::Vtuber).unwrap(), "vtuber");
    }
}
