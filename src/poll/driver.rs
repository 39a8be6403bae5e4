//! Effect executor for the poll state machine

use super::{transition, PollContext, PollEffect, PollEvent, PollFailure, PollState};
use crate::config::PollConfig;
use crate::session::{ConversationOps, Session};
use std::collections::VecDeque;

/// Drives one message from submission to a reply, restarting runs and
/// backing off on gateway errors as the state machine dictates
pub struct Orchestrator<C> {
    ops: C,
    config: PollConfig,
}

impl<C: ConversationOps> Orchestrator<C> {
    pub fn new(ops: C, config: PollConfig) -> Self {
        Self { ops, config }
    }

    pub fn ops(&self) -> &C {
        &self.ops
    }

    /// Send `text` on the session's thread and wait for the assistant's reply
    pub async fn submit(&self, text: &str, session: &Session) -> Result<String, PollFailure> {
        let context = PollContext::new(self.config.clone(), Some(text.to_string()));
        let start = PollEffect::StartRun {
            text: text.to_string(),
            delay: std::time::Duration::ZERO,
        };
        self.run(PollState::Submitted, start, &context, session)
            .await
    }

    async fn run(
        &self,
        mut state: PollState,
        first: PollEffect,
        context: &PollContext,
        session: &Session,
    ) -> Result<String, PollFailure> {
        let mut pending = VecDeque::from([first]);

        while let Some(effect) = pending.pop_front() {
            let event = self.execute(effect, session).await;
            let result = transition(&state, context, event)
                .map_err(|e| PollFailure::internal(e.to_string()))?;

            log_change(&state, &result.new_state);
            state = result.new_state;
            pending.extend(result.effects);
        }

        match state {
            PollState::Completed { response } => Ok(response),
            PollState::Failed { failure } => Err(failure),
            PollState::TimedOut { iterations } => Err(PollFailure::timed_out(iterations)),
            other => Err(PollFailure::internal(format!(
                "stopped without a result in {other:?}"
            ))),
        }
    }

    async fn execute(&self, effect: PollEffect, session: &Session) -> PollEvent {
        let delay = effect.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match effect {
            PollEffect::StartRun { text, .. } => match self.ops.send_message(&text, session).await
            {
                Ok(started) => PollEvent::RunStarted {
                    run_id: started.run_id,
                },
                Err(error) => PollEvent::StartFailed { error },
            },
            PollEffect::Poll { run_id, .. } => match self.ops.poll_status(&run_id, session).await {
                Ok(outcome) => PollEvent::PollSucceeded { outcome },
                Err(error) => PollEvent::PollFailed { error },
            },
        }
    }
}

fn log_change(old: &PollState, new: &PollState) {
    match (old, new) {
        (_, PollState::Restarting { restarts, .. }) => {
            tracing::warn!(restart = restarts, "Unusable poll result, starting a new run");
        }
        (
            PollState::Polling {
                transient_attempt: before,
                ..
            },
            PollState::Polling {
                run_id,
                transient_attempt,
                ..
            },
        ) if transient_attempt > before => {
            tracing::debug!(run_id = %run_id, attempt = transient_attempt, "Transient poll failure, backing off");
        }
        (_, PollState::Completed { .. }) => tracing::info!("Run completed"),
        (_, PollState::Failed { failure }) => {
            tracing::warn!(reason = ?failure.reason, cause = %failure.cause, "Giving up on run");
        }
        (_, PollState::TimedOut { iterations }) => {
            tracing::warn!(iterations, "Timed out waiting for run");
        }
        _ => {}
    }
}
