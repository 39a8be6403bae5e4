//! Conversation session management
//!
//! A [`Session`] is an explicit handle on one remote thread. Every operation
//! takes the session it acts on; nothing is shared between conversations.
//! Operations return `Result<_, ApiError>` and never panic past this boundary.

use crate::assistant::{
    load_credentials, ApiError, AssistantsApi, ListOrder, MessageRole, Run, RunStatus,
    SecretStore, ThreadMessage,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Local notion of an ongoing conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    thread_id: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for a thread id supplied by the caller; blank ids count as absent
    pub fn from_thread_id(thread_id: Option<String>) -> Self {
        Self {
            thread_id: thread_id.filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn with_thread(thread_id: impl Into<String>) -> Self {
        Self::from_thread_id(Some(thread_id.into()))
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    /// Forget the thread so the next `initialize` creates a new one
    pub fn clear(&mut self) -> Option<String> {
        self.thread_id.take()
    }

    fn require_thread(&self) -> Result<&str, ApiError> {
        self.thread_id().ok_or_else(ApiError::no_session)
    }
}

/// Result of `initialize`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initialized {
    pub thread_id: String,
    /// False when the session already had a thread and no call was made
    pub created: bool,
}

/// Result of `send_message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedRun {
    pub run_id: String,
    pub thread_id: String,
}

/// Result of a successful `poll_status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Any known non-terminal (or unhandled terminal) status
    InFlight(RunStatus),
    /// Run completed; `response` is the newest message's text
    Completed { response: String },
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        match self {
            RunOutcome::InFlight(status) => *status,
            RunOutcome::Completed { .. } => RunStatus::Completed,
        }
    }
}

/// The four operations a presentation layer drives
#[async_trait]
pub trait ConversationOps: Send + Sync {
    /// Create a thread with the greeting, or return the session's existing one
    async fn initialize(&self, session: &mut Session) -> Result<Initialized, ApiError>;

    /// Append a user message and start a run over the thread
    async fn send_message(&self, text: &str, session: &Session) -> Result<StartedRun, ApiError>;

    /// Current status of a run, with the reply text once completed
    async fn poll_status(&self, run_id: &str, session: &Session)
        -> Result<RunOutcome, ApiError>;

    /// All messages of the thread, newest first
    async fn fetch_history(&self, session: &Session) -> Result<Vec<ThreadMessage>, ApiError>;
}

#[async_trait]
impl<T: ConversationOps + ?Sized> ConversationOps for Arc<T> {
    async fn initialize(&self, session: &mut Session) -> Result<Initialized, ApiError> {
        (**self).initialize(session).await
    }

    async fn send_message(&self, text: &str, session: &Session) -> Result<StartedRun, ApiError> {
        (**self).send_message(text, session).await
    }

    async fn poll_status(
        &self,
        run_id: &str,
        session: &Session,
    ) -> Result<RunOutcome, ApiError> {
        (**self).poll_status(run_id, session).await
    }

    async fn fetch_history(&self, session: &Session) -> Result<Vec<ThreadMessage>, ApiError> {
        (**self).fetch_history(session).await
    }
}

/// Owns the mapping from logical operations to remote identifiers
pub struct SessionManager<A, S> {
    api: A,
    secrets: S,
    greeting: String,
}

impl<A: AssistantsApi, S: SecretStore> SessionManager<A, S> {
    pub fn new(api: A, secrets: S, greeting: impl Into<String>) -> Self {
        Self {
            api,
            secrets,
            greeting: greeting.into(),
        }
    }

    async fn create_thread(&self) -> Result<String, ApiError> {
        let creds = load_credentials(&self.secrets).await?;
        let thread = self.api.create_thread(&creds).await?;
        tracing::info!(thread_id = %thread.id, "Created conversation thread");

        self.api
            .add_message(&creds, &thread.id, MessageRole::Assistant, &self.greeting)
            .await?;
        Ok(thread.id)
    }

    async fn start_run(&self, text: &str, thread_id: &str) -> Result<String, ApiError> {
        let creds = load_credentials(&self.secrets).await?;
        self.api
            .add_message(&creds, thread_id, MessageRole::User, text)
            .await?;

        let run = self.api.create_run(&creds, thread_id).await?;
        run.id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::malformed("invalid API response: run has no id"))
    }

    async fn check_run(&self, run_id: &str, thread_id: &str) -> Result<RunOutcome, ApiError> {
        let creds = load_credentials(&self.secrets).await?;
        let run = self.api.get_run(&creds, thread_id, run_id).await?;

        match interpret_status(&run)? {
            RunStatus::Completed => {
                let messages = self
                    .api
                    .list_messages(&creds, thread_id, Some(ListOrder::Desc))
                    .await?;
                let response = messages
                    .data
                    .first()
                    .and_then(ThreadMessage::text)
                    .ok_or_else(|| {
                        ApiError::malformed("invalid API response: completed run has no reply text")
                    })?;
                Ok(RunOutcome::Completed {
                    response: response.to_string(),
                })
            }
            RunStatus::Failed => {
                let reason = run
                    .last_error
                    .as_ref()
                    .and_then(|e| e.message.as_deref())
                    .filter(|m| !m.is_empty())
                    .unwrap_or("unknown error");
                Err(ApiError::run_failed(format!("run failed: {reason}")))
            }
            status => Ok(RunOutcome::InFlight(status)),
        }
    }
}

/// Validate the run's status against the known set
fn interpret_status(run: &Run) -> Result<RunStatus, ApiError> {
    let raw = || serde_json::to_string(run).unwrap_or_default();

    let status = match run.status.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => {
            return Err(
                ApiError::malformed("invalid API response: no status present").with_details(raw()),
            )
        }
    };

    RunStatus::parse(status)
        .ok_or_else(|| ApiError::malformed(format!("invalid status: {status}")).with_details(raw()))
}

fn log_failure<T>(operation: &str, result: Result<T, ApiError>) -> Result<T, ApiError> {
    if let Err(e) = &result {
        tracing::debug!(
            operation,
            kind = ?e.kind,
            error = %e,
            details = e.details.as_deref().unwrap_or(""),
            "Conversation operation failed"
        );
    }
    result
}

#[async_trait]
impl<A: AssistantsApi, S: SecretStore> ConversationOps for SessionManager<A, S> {
    async fn initialize(&self, session: &mut Session) -> Result<Initialized, ApiError> {
        if let Some(thread_id) = session.thread_id() {
            tracing::debug!(thread_id, "Reusing existing thread");
            return Ok(Initialized {
                thread_id: thread_id.to_string(),
                created: false,
            });
        }

        let thread_id = log_failure("initialize", self.create_thread().await)?;
        session.thread_id = Some(thread_id.clone());
        Ok(Initialized {
            thread_id,
            created: true,
        })
    }

    async fn send_message(&self, text: &str, session: &Session) -> Result<StartedRun, ApiError> {
        let thread_id = log_failure("send message", session.require_thread())?;
        let run_id = log_failure("send message", self.start_run(text, thread_id).await)?;
        tracing::info!(thread_id, run_id = %run_id, "Run started");
        Ok(StartedRun {
            run_id,
            thread_id: thread_id.to_string(),
        })
    }

    async fn poll_status(
        &self,
        run_id: &str,
        session: &Session,
    ) -> Result<RunOutcome, ApiError> {
        let thread_id = log_failure("poll status", session.require_thread())?;
        log_failure("poll status", self.check_run(run_id, thread_id).await)
    }

    async fn fetch_history(&self, session: &Session) -> Result<Vec<ThreadMessage>, ApiError> {
        let thread_id = log_failure("fetch history", session.require_thread())?;
        let result = async {
            let creds = load_credentials(&self.secrets).await?;
            let messages = self.api.list_messages(&creds, thread_id, None).await?;
            Ok::<_, ApiError>(messages.data)
        }
        .await;
        log_failure("fetch history", result)
    }
}
