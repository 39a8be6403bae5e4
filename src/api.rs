//! Relay HTTP API
//!
//! Exposes the conversation operations as JSON endpoints. Operation failures
//! are reported in the response envelope, not through HTTP status codes.

mod handlers;
mod types;

pub use handlers::create_router;
pub use types::{InitializeRequest, OperationResponse, SendMessageRequest};

use crate::session::ConversationOps;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ops: Arc<dyn ConversationOps>,
}

impl AppState {
    pub fn new(ops: impl ConversationOps + 'static) -> Self {
        Self { ops: Arc::new(ops) }
    }
}
