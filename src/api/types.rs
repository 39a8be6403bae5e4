//! API request and response types

use crate::assistant::{ApiError, ErrorKind, RunStatus, ThreadMessage};
use crate::session::{Initialized, RunOutcome, StartedRun};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat/initialize`
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Body of `POST /api/chat/messages`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// `?threadId=` on the read endpoints
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadQuery {
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// Uniform result envelope: `success` plus whichever fields the operation
/// produced, or `error`/`details` on failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ThreadMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl OperationResponse {
    fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure(error: &ApiError) -> Self {
        Self {
            success: false,
            status: (error.kind == ErrorKind::RunFailed)
                .then(|| RunStatus::Failed.as_str().to_string()),
            error: Some(error.message.clone()),
            details: error.details.clone(),
            kind: Some(error.kind),
            ..Self::default()
        }
    }

    pub fn initialized(init: Initialized) -> Self {
        Self {
            thread_id: Some(init.thread_id),
            ..Self::ok()
        }
    }

    pub fn started(run: StartedRun) -> Self {
        Self {
            run_id: Some(run.run_id),
            thread_id: Some(run.thread_id),
            ..Self::ok()
        }
    }

    pub fn outcome(outcome: RunOutcome) -> Self {
        let status = Some(outcome.status().as_str().to_string());
        match outcome {
            RunOutcome::InFlight(_) => Self { status, ..Self::ok() },
            RunOutcome::Completed { response } => Self {
                status,
                response: Some(response),
                ..Self::ok()
            },
        }
    }

    pub fn history(messages: Vec<ThreadMessage>) -> Self {
        Self {
            messages: Some(messages),
            ..Self::ok()
        }
    }

    /// Error carried by a `success: false` envelope
    pub fn into_error(self) -> ApiError {
        let message = self
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "operation failed without an error message".to_string());
        let error = ApiError::new(self.kind.unwrap_or(ErrorKind::Unknown), message);
        match self.details {
            Some(details) => error.with_details(details),
            None => error,
        }
    }
}
