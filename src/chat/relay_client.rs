//! HTTP client for the relay endpoints

use crate::api::{InitializeRequest, OperationResponse, SendMessageRequest};
use crate::assistant::{ApiError, RunStatus, ThreadMessage};
use crate::session::{ConversationOps, Initialized, RunOutcome, Session, StartedRun};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Conversation operations carried out by a remote relay
pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ApiError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send and unwrap the envelope; `success: false` becomes `Err`
    async fn call(&self, request: RequestBuilder) -> Result<OperationResponse, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::network(format!("relay unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            // Keep the code in the text; the poll loop keys transient handling off it
            let message = format!("relay returned HTTP {status}");
            return Err(if status.is_server_error() {
                ApiError::server_error(message)
            } else {
                ApiError::invalid_request(message)
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("relay response interrupted: {e}")))?;
        let envelope: OperationResponse = serde_json::from_str(&body).map_err(|e| {
            ApiError::malformed(format!("unreadable relay response: {e}")).with_details(body)
        })?;

        if envelope.success {
            Ok(envelope)
        } else {
            Err(envelope.into_error())
        }
    }
}

fn missing(field: &str) -> ApiError {
    ApiError::malformed(format!("relay response has no {field}"))
}

#[async_trait]
impl ConversationOps for RelayClient {
    async fn initialize(&self, session: &mut Session) -> Result<Initialized, ApiError> {
        let request = InitializeRequest {
            thread_id: session.thread_id().map(str::to_string),
        };
        let envelope = self
            .call(self.client.post(self.url("/api/chat/initialize")).json(&request))
            .await?;
        let thread_id = envelope.thread_id.ok_or_else(|| missing("threadId"))?;

        let created = session.thread_id() != Some(thread_id.as_str());
        *session = Session::with_thread(thread_id.clone());
        Ok(Initialized { thread_id, created })
    }

    async fn send_message(&self, text: &str, session: &Session) -> Result<StartedRun, ApiError> {
        let thread_id = session.thread_id().ok_or_else(ApiError::no_session)?;
        let request = SendMessageRequest {
            text: text.to_string(),
            thread_id: Some(thread_id.to_string()),
        };
        let envelope = self
            .call(self.client.post(self.url("/api/chat/messages")).json(&request))
            .await?;

        Ok(StartedRun {
            run_id: envelope.run_id.ok_or_else(|| missing("runId"))?,
            thread_id: envelope.thread_id.unwrap_or_else(|| thread_id.to_string()),
        })
    }

    async fn poll_status(
        &self,
        run_id: &str,
        session: &Session,
    ) -> Result<RunOutcome, ApiError> {
        let thread_id = session.thread_id().ok_or_else(ApiError::no_session)?;
        let envelope = self
            .call(
                self.client
                    .get(self.url(&format!("/api/chat/runs/{run_id}")))
                    .query(&[("threadId", thread_id)]),
            )
            .await?;

        let status = envelope.status.ok_or_else(|| missing("status"))?;
        match RunStatus::parse(&status) {
            Some(RunStatus::Completed) => Ok(RunOutcome::Completed {
                response: envelope.response.ok_or_else(|| missing("response"))?,
            }),
            Some(other) => Ok(RunOutcome::InFlight(other)),
            None => Err(ApiError::malformed(format!("invalid status: {status}"))),
        }
    }

    async fn fetch_history(&self, session: &Session) -> Result<Vec<ThreadMessage>, ApiError> {
        let thread_id = session.thread_id().ok_or_else(ApiError::no_session)?;
        let envelope = self
            .call(
                self.client
                    .get(self.url("/api/chat/history"))
                    .query(&[("threadId", thread_id)]),
            )
            .await?;
        envelope.messages.ok_or_else(|| missing("messages"))
    }
}
