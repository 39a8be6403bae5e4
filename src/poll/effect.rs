//! Effects produced by poll transitions

use std::time::Duration;

/// Work for the driver to perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEffect {
    /// Wait `delay`, then fetch the run's status
    Poll { run_id: String, delay: Duration },

    /// Wait `delay`, then send `text` again to start a fresh run
    StartRun { text: String, delay: Duration },
}

impl PollEffect {
    pub fn delay(&self) -> Duration {
        match self {
            PollEffect::Poll { delay, .. } | PollEffect::StartRun { delay, .. } => *delay,
        }
    }
}
