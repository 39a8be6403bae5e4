//! Terminal chat
//!
//! Keeps the thread id in a local session file, shows the thread's history,
//! and sends each typed line through the poll orchestrator.

mod relay_client;
mod store;
mod view;

pub use relay_client::RelayClient;
pub use store::{SessionFile, StoreError};
pub use view::{ChatEntry, Transcript, GENERIC_ERROR_MESSAGE, RESET_ERROR_MESSAGE};

use crate::assistant::ApiError;
use crate::poll::Orchestrator;
use crate::session::{ConversationOps, Session};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),
}

pub struct ChatController<C> {
    orchestrator: Orchestrator<C>,
    store: SessionFile,
    session: Session,
    transcript: Transcript,
}

impl<C: ConversationOps> ChatController<C> {
    pub fn new(orchestrator: Orchestrator<C>, store: SessionFile) -> Self {
        Self {
            orchestrator,
            store,
            session: Session::new(),
            transcript: Transcript::default(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Reuse the stored thread or start a new one, then load its history
    pub async fn start(&mut self) -> Result<(), ChatError> {
        self.session = Session::from_thread_id(self.store.load()?);
        self.open_session().await
    }

    async fn open_session(&mut self) -> Result<(), ChatError> {
        let init = self.orchestrator.ops().initialize(&mut self.session).await?;
        if init.created {
            self.store.save(&init.thread_id)?;
            tracing::info!(thread_id = %init.thread_id, "Started new conversation");
        } else {
            tracing::debug!(thread_id = %init.thread_id, "Using existing conversation");
        }

        let history = self.orchestrator.ops().fetch_history(&self.session).await?;
        self.transcript = Transcript::from_history(history);
        Ok(())
    }

    /// Send one line and wait for the reply. Returns the appended assistant
    /// entry, or `None` when nothing was sent.
    pub async fn submit(&mut self, input: &str) -> Option<&ChatEntry> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        if self.session.thread_id().is_none() {
            tracing::error!("No conversation thread; message not sent");
            return None;
        }

        self.transcript.push_user(text);
        let reply = match self.orchestrator.submit(text, &self.session).await {
            Ok(reply) => reply,
            Err(failure) => {
                tracing::warn!(
                    reason = ?failure.reason,
                    kind = ?failure.cause.kind,
                    error = %failure.cause,
                    details = failure.cause.details.as_deref().unwrap_or(""),
                    "Message could not be answered"
                );
                GENERIC_ERROR_MESSAGE.to_string()
            }
        };
        Some(self.transcript.push_assistant(&reply))
    }

    /// Forget the current thread and start over
    pub async fn reset(&mut self) {
        self.transcript = Transcript::default();
        let result = async {
            self.store.clear()?;
            self.session.clear();
            self.open_session().await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, "Chat reset failed");
            self.transcript = Transcript::notice(RESET_ERROR_MESSAGE);
        }
    }
}

/// Interactive loop over stdin; `/reset` starts a new conversation, `/quit`
/// or end of input exits
pub async fn run_repl<C: ConversationOps>(
    controller: &mut ChatController<C>,
) -> Result<(), ChatError> {
    if let Err(e) = controller.start().await {
        tracing::error!(error = %e, "Chat could not be initialized");
        println!("{GENERIC_ERROR_MESSAGE}");
    }
    print!("{}", controller.transcript());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/reset" => {
                if controller.transcript().can_reset() {
                    controller.reset().await;
                    print!("{}", controller.transcript());
                } else {
                    println!("(nothing to reset)");
                }
            }
            _ => {
                if let Some(entry) = controller.submit(&line).await {
                    print!("{entry}");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{MessageRole, ThreadMessage};
    use crate::config::PollConfig;
    use crate::session::{Initialized, RunOutcome};
    use crate::testing::MockConversation;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn controller(dir: &TempDir) -> (ChatController<Arc<MockConversation>>, Arc<MockConversation>) {
        let ops = Arc::new(MockConversation::new());
        let orchestrator = Orchestrator::new(Arc::clone(&ops), PollConfig::default());
        let store = SessionFile::new(dir.path().join("session.json"));
        (ChatController::new(orchestrator, store), ops)
    }

    fn greeting() -> Vec<ThreadMessage> {
        vec![ThreadMessage::text_message(
            MessageRole::Assistant,
            "Hallo, ich bin ein hilfreicher Assistent",
        )]
    }

    #[tokio::test]
    async fn test_start_creates_and_stores_thread() {
        let dir = TempDir::new().unwrap();
        let (mut chat, ops) = controller(&dir);
        ops.set_history(Ok(greeting()));

        chat.start().await.unwrap();

        assert_eq!(chat.session().thread_id(), Some("T1"));
        let stored = SessionFile::new(dir.path().join("session.json")).load().unwrap();
        assert_eq!(stored.as_deref(), Some("T1"));
        assert_eq!(chat.transcript().entries().len(), 1);
        assert!(!chat.transcript().can_reset());
    }

    #[tokio::test]
    async fn test_start_reuses_stored_thread() {
        let dir = TempDir::new().unwrap();
        SessionFile::new(dir.path().join("session.json"))
            .save("T5")
            .unwrap();
        let (mut chat, _ops) = controller(&dir);

        chat.start().await.unwrap();

        assert_eq!(chat.session().thread_id(), Some("T5"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_appends_reply() {
        let dir = TempDir::new().unwrap();
        let (mut chat, ops) = controller(&dir);
        ops.set_history(Ok(greeting()));
        chat.start().await.unwrap();
        ops.queue_poll(Ok(RunOutcome::Completed {
            response: "Hello!".to_string(),
        }));

        let entry = chat.submit("  Hi  ").await.unwrap().clone();

        assert_eq!(entry.id, "3");
        assert_eq!(entry.assistant.as_deref(), Some("Hello!"));
        assert_eq!(ops.sent(), vec!["Hi"]);
        assert_eq!(chat.transcript().entries()[1].user.as_deref(), Some("Hi"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_failure_shows_generic_message() {
        let dir = TempDir::new().unwrap();
        let (mut chat, ops) = controller(&dir);
        chat.start().await.unwrap();
        ops.queue_poll(Err(ApiError::run_failed("run failed: boom")));

        let entry = chat.submit("Hi").await.unwrap();

        assert_eq!(entry.assistant.as_deref(), Some(GENERIC_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let dir = TempDir::new().unwrap();
        let (mut chat, ops) = controller(&dir);
        chat.start().await.unwrap();

        assert!(chat.submit("   ").await.is_none());
        assert!(ops.sent().is_empty());
        assert!(chat.transcript().entries().is_empty());
    }

    #[tokio::test]
    async fn test_submit_without_thread_sends_nothing() {
        let dir = TempDir::new().unwrap();
        let (mut chat, ops) = controller(&dir);

        assert!(chat.submit("Hi").await.is_none());
        assert!(ops.sent().is_empty());
    }

    #[tokio::test]
    async fn test_reset_starts_new_thread() {
        let dir = TempDir::new().unwrap();
        let (mut chat, ops) = controller(&dir);
        chat.start().await.unwrap();
        ops.queue_init(Ok(Initialized {
            thread_id: "T2".to_string(),
            created: true,
        }));
        ops.set_history(Ok(greeting()));

        chat.reset().await;

        assert_eq!(chat.session().thread_id(), Some("T2"));
        let stored = SessionFile::new(dir.path().join("session.json")).load().unwrap();
        assert_eq!(stored.as_deref(), Some("T2"));
        assert_eq!(chat.transcript().entries().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_failure_shows_notice() {
        let dir = TempDir::new().unwrap();
        let (mut chat, ops) = controller(&dir);
        chat.start().await.unwrap();
        ops.queue_init(Err(ApiError::network("connection refused")));

        chat.reset().await;

        let entries = chat.transcript().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].assistant.as_deref(), Some(RESET_ERROR_MESSAGE));
        assert!(chat.session().thread_id().is_none());
    }
}
