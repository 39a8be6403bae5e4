//! Property-based tests for the poll state machine
//!
//! Feeds arbitrary event sequences through `transition` and checks that the
//! machine always stops and never asks for work after stopping.

use super::*;
use crate::assistant::{ApiError, ErrorKind, RunStatus};
use crate::config::PollConfig;
use crate::session::RunOutcome;
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

fn small_config() -> PollConfig {
    PollConfig {
        max_iterations: 20,
        poll_interval: Duration::from_millis(200),
        transient_delays: vec![Duration::from_millis(100), Duration::from_millis(200)],
        max_restarts: 3,
        restart_delay: Duration::from_secs(1),
    }
}

/// Upper bound on events before a terminal state: every accepted event
/// advances an iteration, transient or restart counter
fn event_budget(config: &PollConfig) -> usize {
    let per_cycle = config.transient_delays.len() + 2;
    (config.max_iterations as usize + config.max_restarts as usize + 1) * per_cycle * 2
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_status() -> impl Strategy<Value = RunStatus> {
    prop::sample::select(RunStatus::ALL.to_vec())
        .prop_filter("completed is reported separately", |s| {
            *s != RunStatus::Completed
        })
}

fn arb_error() -> impl Strategy<Value = ApiError> {
    prop_oneof![
        Just(ApiError::server_error("Request failed with status code 503")),
        Just(ApiError::network("relay returned HTTP 502 Bad Gateway")),
        Just(ApiError::malformed("invalid status: paused")),
        Just(ApiError::malformed("invalid API response: no status present")),
        Just(ApiError::run_failed("run failed: boom")),
        Just(ApiError::no_session()),
        Just(ApiError::new(ErrorKind::Auth, "invalid api key")),
    ]
}

/// Events the driver can produce after a `Poll` effect
fn arb_poll_event() -> impl Strategy<Value = PollEvent> {
    prop_oneof![
        6 => arb_status().prop_map(|status| PollEvent::PollSucceeded {
            outcome: RunOutcome::InFlight(status),
        }),
        1 => "[a-zA-Z ]{1,20}".prop_map(|response| PollEvent::PollSucceeded {
            outcome: RunOutcome::Completed { response },
        }),
        3 => arb_error().prop_map(|error| PollEvent::PollFailed { error }),
    ]
}

/// Events the driver can produce after a `StartRun` effect
fn arb_start_event() -> impl Strategy<Value = PollEvent> {
    prop_oneof![
        8 => "R[0-9]{1,3}".prop_map(|run_id| PollEvent::RunStarted { run_id }),
        1 => arb_error().prop_map(|error| PollEvent::StartFailed { error }),
    ]
}

/// Replay `events` the way the driver would: one event per pending effect,
/// picking from the pool that matches the effect kind
fn simulate(
    context: &PollContext,
    poll_events: &[PollEvent],
    start_events: &[PollEvent],
) -> (PollState, usize) {
    let mut state = PollState::Submitted;
    let mut pending = vec![PollEffect::StartRun {
        text: "Hi".to_string(),
        delay: Duration::ZERO,
    }];
    let (mut polls, mut starts, mut steps) = (0, 0, 0);

    while let Some(effect) = pending.pop() {
        let event = match effect {
            PollEffect::Poll { .. } => {
                let event = poll_events[polls % poll_events.len()].clone();
                polls += 1;
                event
            }
            PollEffect::StartRun { .. } => {
                let event = start_events[starts % start_events.len()].clone();
                starts += 1;
                event
            }
        };

        let result = transition(&state, context, event).expect("driver-shaped event rejected");
        assert!(result.effects.len() <= 1);
        state = result.new_state;
        pending.extend(result.effects);
        steps += 1;

        assert!(steps <= event_budget(&context.config), "no termination");
    }

    (state, steps)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_always_terminates(
        poll_events in prop::collection::vec(arb_poll_event(), 1..40),
        start_events in prop::collection::vec(arb_start_event(), 1..5),
        with_text in any::<bool>(),
    ) {
        let text = with_text.then(|| "Hi".to_string());
        let context = PollContext::new(small_config(), text);

        let (state, _) = simulate(&context, &poll_events, &start_events);

        prop_assert!(state.is_terminal(), "stopped in {:?}", state);
    }

    #[test]
    fn prop_terminal_states_emit_no_effects(
        poll_event in arb_poll_event(),
        response in "[a-z]{1,10}",
    ) {
        let context = PollContext::new(small_config(), Some("Hi".to_string()));
        let terminal = [
            PollState::Completed { response },
            PollState::TimedOut { iterations: 20 },
            PollState::failed(FailureReason::RunFailed, ApiError::run_failed("run failed: boom")),
        ];

        for state in terminal {
            prop_assert!(transition(&state, &context, poll_event.clone()).is_err());
        }
    }

    #[test]
    fn prop_counters_stay_within_limits(
        poll_events in prop::collection::vec(arb_poll_event(), 1..40),
    ) {
        let config = small_config();
        let context = PollContext::new(config.clone(), Some("Hi".to_string()));
        let mut state = PollState::Polling {
            run_id: "R1".to_string(),
            iteration: 0,
            transient_attempt: 0,
            restarts: 0,
        };

        for event in poll_events {
            let next = match &state {
                PollState::Restarting { .. } => PollEvent::RunStarted { run_id: "R2".to_string() },
                _ => event,
            };
            let Ok(result) = transition(&state, &context, next) else { break };
            state = result.new_state;

            match &state {
                PollState::Polling { iteration, transient_attempt, restarts, .. } => {
                    prop_assert!(*iteration < config.max_iterations);
                    prop_assert!(*transient_attempt as usize <= config.transient_delays.len());
                    prop_assert!(*restarts <= config.max_restarts);
                }
                PollState::Restarting { restarts, .. } => {
                    prop_assert!(*restarts <= config.max_restarts);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn prop_clean_run_failure_never_restarts(
        iteration in 0u32..20,
        restarts in 0u32..3,
    ) {
        let context = PollContext::new(small_config(), Some("Hi".to_string()));
        let state = PollState::Polling {
            run_id: "R1".to_string(),
            iteration,
            transient_attempt: 0,
            restarts,
        };

        let result = transition(
            &state,
            &context,
            PollEvent::PollFailed { error: ApiError::run_failed("run failed: boom") },
        ).unwrap();

        prop_assert!(result.effects.is_empty());
        let is_run_failed = matches!(
            result.new_state,
            PollState::Failed { failure: PollFailure { reason: FailureReason::RunFailed, .. } }
        );
        prop_assert!(is_run_failed);
    }
}
