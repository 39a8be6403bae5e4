//! Assistants API abstraction
//!
//! Thin typed access to the remote thread/run/message endpoints plus the
//! secret store that supplies credentials for them.

mod client;
mod error;
mod secrets;
mod types;

pub use client::{AssistantsClient, DEFAULT_BASE_URL};
pub use error::{ApiError, ErrorKind};
pub use secrets::{load_credentials, Credentials, EnvSecretStore, SecretStore};
pub use types::{ListOrder, MessageList, MessageRole, Run, RunStatus, Thread, ThreadMessage};

#[cfg(test)]
pub use secrets::{SecretValue, API_KEY_SECRET, ASSISTANT_ID_SECRET};

use async_trait::async_trait;
use std::sync::Arc;

/// Remote conversation API
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    /// `POST /threads`
    async fn create_thread(&self, creds: &Credentials) -> Result<Thread, ApiError>;

    /// `POST /threads/{id}/messages`
    async fn add_message(
        &self,
        creds: &Credentials,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<(), ApiError>;

    /// `POST /threads/{id}/runs` against `creds.assistant_id`
    async fn create_run(&self, creds: &Credentials, thread_id: &str) -> Result<Run, ApiError>;

    /// `GET /threads/{id}/runs/{run_id}`
    async fn get_run(
        &self,
        creds: &Credentials,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Run, ApiError>;

    /// `GET /threads/{id}/messages?limit=99[&order=..]`
    async fn list_messages(
        &self,
        creds: &Credentials,
        thread_id: &str,
        order: Option<ListOrder>,
    ) -> Result<MessageList, ApiError>;
}

#[async_trait]
impl<T: AssistantsApi + ?Sized> AssistantsApi for Arc<T> {
    async fn create_thread(&self, creds: &Credentials) -> Result<Thread, ApiError> {
        (**self).create_thread(creds).await
    }

    async fn add_message(
        &self,
        creds: &Credentials,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<(), ApiError> {
        (**self).add_message(creds, thread_id, role, content).await
    }

    async fn create_run(&self, creds: &Credentials, thread_id: &str) -> Result<Run, ApiError> {
        (**self).create_run(creds, thread_id).await
    }

    async fn get_run(
        &self,
        creds: &Credentials,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Run, ApiError> {
        (**self).get_run(creds, thread_id, run_id).await
    }

    async fn list_messages(
        &self,
        creds: &Credentials,
        thread_id: &str,
        order: Option<ListOrder>,
    ) -> Result<MessageList, ApiError> {
        (**self).list_messages(creds, thread_id, order).await
    }
}
