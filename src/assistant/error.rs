//! Relay error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status codes whose appearance in an error message marks it as transient
const TRANSIENT_STATUS_MARKERS: [&str; 3] = ["502", "503", "504"];

/// Error with classification, shared by every layer of the relay
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// Raw payload or other diagnostic context, never shown to end users
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn no_session() -> Self {
        Self::new(ErrorKind::NoSession, "no session")
    }

    pub fn credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Credentials, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, message)
    }

    pub fn run_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RunFailed, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Whether the message names a gateway/unavailable status code.
    ///
    /// The polling layer only sees error text from the layers below it, so
    /// this is a textual check rather than a kind check.
    pub fn looks_transient(&self) -> bool {
        TRANSIENT_STATUS_MARKERS
            .iter()
            .any(|code| self.message.contains(code))
    }
}

/// Failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Operation needs a thread id and none was supplied - no network call made
    NoSession,
    /// API key or assistant id could not be loaded
    Credentials,
    /// Connection failures, timeouts
    Network,
    /// 5xx and 429 responses, including retry exhaustion
    ServerError,
    /// 401, 403
    Auth,
    /// 400, 404
    InvalidRequest,
    /// Payload missing fields we rely on, or carrying values we do not know
    MalformedResponse,
    /// The remote run itself reported `failed`
    RunFailed,
    /// Client gave up waiting for a run
    TimedOut,
    Unknown,
}
