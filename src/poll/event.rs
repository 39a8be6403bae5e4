//! Events fed back into the poll state machine

use crate::assistant::ApiError;
use crate::session::RunOutcome;

#[derive(Debug, Clone)]
pub enum PollEvent {
    // Run creation
    RunStarted { run_id: String },
    StartFailed { error: ApiError },

    // Status polling
    PollSucceeded { outcome: RunOutcome },
    PollFailed { error: ApiError },
}
