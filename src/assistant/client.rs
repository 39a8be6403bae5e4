//! Assistants v2 REST client
//!
//! Every request goes through the configured [`RetryPolicy`].

use super::types::{
    ListOrder, MessageList, MessageRole, NewMessage, NewRun, Run, Thread, MESSAGE_LIST_LIMIT,
};
use super::{ApiError, AssistantsApi, Credentials};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VALUE: &str = "assistants=v2";

/// reqwest-backed Assistants API client
pub struct AssistantsClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl AssistantsClient {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ApiError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Upstream URL from `segment/id` pairs followed by `tail`
    fn url_with(&self, path: &[(&str, &str)], tail: &str) -> Result<String, ApiError> {
        let mut url = self.base_url.clone();
        for (segment, id) in path {
            url.push('/');
            url.push_str(segment);
            url.push('/');
            url.push_str(path_id(segment, id)?);
        }
        url.push_str(tail);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder, creds: &Credentials) -> RequestBuilder {
        request
            .bearer_auth(&creds.api_key)
            .header(BETA_HEADER, BETA_VALUE)
    }

    /// Send with retries, classify the final status, and return the body
    async fn send<B>(&self, operation: &str, build: B) -> Result<String, ApiError>
    where
        B: Fn() -> RequestBuilder + Send + Sync,
    {
        let response = self
            .retry
            .call(operation, || {
                let request = build();
                async move { request.send().await.map_err(transport_error) }
            })
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        tracing::debug!(operation, status = status.as_u16(), "Assistants API call succeeded");
        Ok(body)
    }
}

#[async_trait]
impl AssistantsApi for AssistantsClient {
    async fn create_thread(&self, creds: &Credentials) -> Result<Thread, ApiError> {
        let url = self.url("threads");
        let body = self
            .send("create thread", || {
                self.authorized(self.client.post(&url), creds)
                    .json(&serde_json::json!({}))
            })
            .await?;
        parse("create thread", &body)
    }

    async fn add_message(
        &self,
        creds: &Credentials,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<(), ApiError> {
        let url = self.url_with(&[("threads", thread_id)], "/messages")?;
        let operation = match role {
            MessageRole::User => "send user message",
            MessageRole::Assistant => "send greeting",
        };
        self.send(operation, || {
            self.authorized(self.client.post(&url), creds)
                .json(&NewMessage { role, content })
        })
        .await?;
        Ok(())
    }

    async fn create_run(&self, creds: &Credentials, thread_id: &str) -> Result<Run, ApiError> {
        let url = self.url_with(&[("threads", thread_id)], "/runs")?;
        let body = self
            .send("create run", || {
                self.authorized(self.client.post(&url), creds).json(&NewRun {
                    assistant_id: &creds.assistant_id,
                })
            })
            .await?;
        parse("create run", &body)
    }

    async fn get_run(
        &self,
        creds: &Credentials,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Run, ApiError> {
        let url = self.url_with(&[("threads", thread_id), ("runs", run_id)], "")?;
        let body = self
            .send("get run status", || {
                self.authorized(self.client.get(&url), creds)
            })
            .await?;
        parse("get run status", &body)
    }

    async fn list_messages(
        &self,
        creds: &Credentials,
        thread_id: &str,
        order: Option<ListOrder>,
    ) -> Result<MessageList, ApiError> {
        let mut url = self.url_with(
            &[("threads", thread_id)],
            &format!("/messages?limit={MESSAGE_LIST_LIMIT}"),
        )?;
        if let Some(order) = order {
            url.push_str("&order=");
            url.push_str(order.as_str());
        }
        let body = self
            .send("list messages", || {
                self.authorized(self.client.get(&url), creds)
            })
            .await?;
        parse("list messages", &body)
    }
}

/// Ids end up in the request path; anything outside the id alphabet is
/// refused before a request is made.
fn path_id<'a>(segment: &str, id: &'a str) -> Result<&'a str, ApiError> {
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(id)
    } else {
        Err(ApiError::invalid_request(format!(
            "invalid id for {segment}: {id:?}"
        )))
    }
}

fn parse<T: DeserializeOwned>(operation: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        ApiError::malformed(format!("{operation}: failed to parse response: {e}"))
            .with_details(body)
    })
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::network(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        ApiError::network(format!("Connection failed: {e}"))
    } else {
        ApiError::network(format!("Request failed: {e}"))
    }
}

fn classify_error(status: StatusCode, body: &str) -> ApiError {
    // Prefer the API's own `{"error": {"message": ...}}` text when present
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string());

    let code = status.as_u16();
    let err = match code {
        401 | 403 => ApiError::auth(format!("Authentication failed ({code}): {message}")),
        400 | 404 => ApiError::invalid_request(format!("Invalid request ({code}): {message}")),
        429 => ApiError::server_error(format!("Rate limited ({code}): {message}")),
        500..=599 => ApiError::server_error(format!("Server error ({code}): {message}")),
        _ => ApiError::unknown(format!("HTTP {status}: {message}")),
    };
    err.with_details(body)
}
