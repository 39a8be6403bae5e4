//! Client-side run polling
//!
//! Implements the Elm Architecture pattern: a pure transition function over
//! [`PollState`] and [`PollEvent`] producing [`PollEffect`]s, and an async
//! driver that executes the effects against [`ConversationOps`].
//!
//! [`ConversationOps`]: crate::session::ConversationOps

mod driver;
mod effect;
mod event;
mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use driver::Orchestrator;
pub use effect::PollEffect;
pub use event::PollEvent;
pub use state::{FailureReason, PollContext, PollFailure, PollState};
pub use transition::transition;
