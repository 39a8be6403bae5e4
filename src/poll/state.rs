//! Poll state types

use crate::assistant::{ApiError, ErrorKind};
use crate::config::PollConfig;
use std::fmt;
use thiserror::Error;

/// Where a submitted message is in its wait for a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Waiting for the first run to be created
    Submitted,

    /// Waiting on `run_id`
    Polling {
        run_id: String,
        /// Completed poll cycles so far, kept across restarts
        iteration: u32,
        /// Consecutive gateway-status failures since the last successful poll
        transient_attempt: u32,
        restarts: u32,
    },

    /// Waiting for a replacement run after an unusable poll result
    Restarting { restarts: u32, iteration: u32 },

    Completed { response: String },

    Failed { failure: PollFailure },

    TimedOut { iterations: u32 },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Completed { .. } | PollState::Failed { .. } | PollState::TimedOut { .. }
        )
    }

    pub(crate) fn failed(reason: FailureReason, cause: ApiError) -> Self {
        PollState::Failed {
            failure: PollFailure::new(reason, cause),
        }
    }
}

/// Why the orchestrator gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The initial `send_message` failed
    StartFailed,
    /// The remote run reported `failed`
    RunFailed,
    /// Gateway-status poll failures outlasted the backoff schedule
    TransientExhausted,
    /// `send_message` failed while replacing a run
    RestartFailed,
    RestartsExhausted,
    /// Poll failure with no message text to restart from
    Unrecoverable,
    TimedOut,
    /// The state machine rejected an event
    Internal,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::StartFailed => "could not start run",
            FailureReason::RunFailed => "run failed",
            FailureReason::TransientExhausted => "status polling kept failing",
            FailureReason::RestartFailed => "could not restart run",
            FailureReason::RestartsExhausted => "maximum number of restarts reached",
            FailureReason::Unrecoverable => "status polling failed",
            FailureReason::TimedOut => "timed out waiting for run",
            FailureReason::Internal => "internal error",
        };
        f.write_str(text)
    }
}

/// Structured orchestrator failure; `cause` is for logs, not end users
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}: {cause}")]
pub struct PollFailure {
    pub reason: FailureReason,
    pub cause: ApiError,
}

impl PollFailure {
    pub fn new(reason: FailureReason, cause: ApiError) -> Self {
        Self { reason, cause }
    }

    pub fn timed_out(iterations: u32) -> Self {
        Self::new(
            FailureReason::TimedOut,
            ApiError::new(
                ErrorKind::TimedOut,
                format!("run did not finish after {iterations} polls"),
            ),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureReason::Internal, ApiError::unknown(message))
    }
}

/// Fixed inputs of one orchestration
#[derive(Debug, Clone)]
pub struct PollContext {
    pub config: PollConfig,
    /// Message text to resend on restart; `None` disables restarts
    pub original_text: Option<String>,
}

impl PollContext {
    pub fn new(config: PollConfig, original_text: Option<String>) -> Self {
        Self {
            config,
            original_text,
        }
    }
}
