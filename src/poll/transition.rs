//! Pure poll transition function

use super::{FailureReason, PollContext, PollEffect, PollEvent, PollState};
use crate::assistant::{ApiError, ErrorKind};
use crate::session::RunOutcome;
use std::time::Duration;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: PollState,
    pub effects: Vec<PollEffect>,
}

impl TransitionResult {
    pub fn new(state: PollState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: PollEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Already finished: {0}")]
    AlreadyTerminal(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function: same inputs, same outputs, no I/O
pub fn transition(
    state: &PollState,
    context: &PollContext,
    event: PollEvent,
) -> Result<TransitionResult, TransitionError> {
    if state.is_terminal() {
        return Err(TransitionError::AlreadyTerminal(format!("{state:?}")));
    }

    match (state, event) {
        // ============================================================
        // Run creation
        // ============================================================

        // First run: wait one interval before the first poll
        (PollState::Submitted, PollEvent::RunStarted { run_id }) => Ok(TransitionResult::new(
            PollState::Polling {
                run_id: run_id.clone(),
                iteration: 0,
                transient_attempt: 0,
                restarts: 0,
            },
        )
        .with_effect(PollEffect::Poll {
            run_id,
            delay: context.config.poll_interval,
        })),

        (PollState::Submitted, PollEvent::StartFailed { error }) => Ok(TransitionResult::new(
            PollState::failed(FailureReason::StartFailed, error),
        )),

        // Replacement run: poll it straight away within the same iteration
        (
            PollState::Restarting {
                restarts,
                iteration,
            },
            PollEvent::RunStarted { run_id },
        ) => Ok(TransitionResult::new(PollState::Polling {
            run_id: run_id.clone(),
            iteration: *iteration,
            transient_attempt: 0,
            restarts: *restarts,
        })
        .with_effect(PollEffect::Poll {
            run_id,
            delay: Duration::ZERO,
        })),

        (PollState::Restarting { .. }, PollEvent::StartFailed { error }) => Ok(
            TransitionResult::new(PollState::failed(FailureReason::RestartFailed, error)),
        ),

        // ============================================================
        // Status polling
        // ============================================================
        (
            PollState::Polling { .. },
            PollEvent::PollSucceeded {
                outcome: RunOutcome::Completed { response },
            },
        ) => Ok(TransitionResult::new(PollState::Completed { response })),

        (
            PollState::Polling {
                run_id,
                iteration,
                restarts,
                ..
            },
            PollEvent::PollSucceeded {
                outcome: RunOutcome::InFlight(_),
            },
        ) => {
            let iteration = iteration + 1;
            if iteration >= context.config.max_iterations {
                return Ok(TransitionResult::new(PollState::TimedOut {
                    iterations: iteration,
                }));
            }
            Ok(TransitionResult::new(PollState::Polling {
                run_id: run_id.clone(),
                iteration,
                transient_attempt: 0,
                restarts: *restarts,
            })
            .with_effect(PollEffect::Poll {
                run_id: run_id.clone(),
                delay: context.config.poll_interval,
            }))
        }

        (
            PollState::Polling {
                run_id,
                iteration,
                transient_attempt,
                restarts,
            },
            PollEvent::PollFailed { error },
        ) => Ok(handle_poll_failure(
            context,
            run_id,
            *iteration,
            *transient_attempt,
            *restarts,
            error,
        )),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in {state:?}"
        ))),
    }
}

fn handle_poll_failure(
    context: &PollContext,
    run_id: &str,
    iteration: u32,
    transient_attempt: u32,
    restarts: u32,
    error: ApiError,
) -> TransitionResult {
    let config = &context.config;

    // A cleanly failed run is final; resending would not change the outcome
    if error.kind == ErrorKind::RunFailed {
        return TransitionResult::new(PollState::failed(FailureReason::RunFailed, error));
    }

    if error.looks_transient() {
        return match config.transient_delays.get(transient_attempt as usize) {
            Some(&delay) => TransitionResult::new(PollState::Polling {
                run_id: run_id.to_string(),
                iteration,
                transient_attempt: transient_attempt + 1,
                restarts,
            })
            .with_effect(PollEffect::Poll {
                run_id: run_id.to_string(),
                delay,
            }),
            None => TransitionResult::new(PollState::failed(
                FailureReason::TransientExhausted,
                error,
            )),
        };
    }

    let Some(text) = &context.original_text else {
        return TransitionResult::new(PollState::failed(FailureReason::Unrecoverable, error));
    };

    if restarts >= config.max_restarts {
        return TransitionResult::new(PollState::failed(
            FailureReason::RestartsExhausted,
            error,
        ));
    }

    TransitionResult::new(PollState::Restarting {
        restarts: restarts + 1,
        iteration,
    })
    .with_effect(PollEffect::StartRun {
        text: text.clone(),
        delay: config.restart_delay,
    })
}
