//! Mock implementations for testing
//!
//! These mocks enable testing the session, polling, and relay layers without
//! real I/O.

use crate::assistant::{
    ApiError, AssistantsApi, Credentials, ListOrder, MessageList, MessageRole, Run, RunStatus,
    SecretStore, SecretValue, Thread, ThreadMessage, API_KEY_SECRET, ASSISTANT_ID_SECRET,
};
use crate::session::{ConversationOps, Initialized, RunOutcome, Session, StartedRun};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

// ============================================================================
// Mock Assistants API
// ============================================================================

/// In-memory Assistants API holding a single message log
#[derive(Default)]
pub struct MockAssistantsApi {
    threads: Mutex<u32>,
    runs: Mutex<u32>,
    /// Oldest first
    messages: Mutex<Vec<ThreadMessage>>,
    created_runs: Mutex<VecDeque<Run>>,
    /// Runs for `get_run`, each with an optional reply written when fetched
    polled_runs: Mutex<VecDeque<(Run, Option<String>)>>,
    failures: Mutex<HashMap<&'static str, VecDeque<ApiError>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl MockAssistantsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the payload returned by the next `get_run`
    pub fn queue_run(&self, run: Run) {
        self.polled_runs.lock().unwrap().push_back((run, None));
    }

    /// Queue a `completed` run whose reply appears in the thread once polled
    pub fn queue_completion(&self, run_id: &str, reply: &str) {
        self.polled_runs
            .lock()
            .unwrap()
            .push_back((Run::with_status(run_id, "completed"), Some(reply.to_string())));
    }

    /// Queue the payload returned by the next `create_run`
    pub fn queue_created_run(&self, run: Run) {
        self.created_runs.lock().unwrap().push_back(run);
    }

    /// Append a message as if the remote assistant wrote it
    pub fn push_message(&self, role: MessageRole, text: &str) {
        let mut messages = self.messages.lock().unwrap();
        let id = format!("msg_{}", messages.len() + 1);
        let mut message = ThreadMessage::text_message(role, text);
        message.id = Some(id);
        messages.push(message);
    }

    /// Make the next call to `operation` fail with `error`
    pub fn fail_next(&self, operation: &'static str, error: ApiError) {
        self.failures
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Operation names in call order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(operation);
        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AssistantsApi for MockAssistantsApi {
    async fn create_thread(&self, _creds: &Credentials) -> Result<Thread, ApiError> {
        self.record("create_thread")?;
        let mut threads = self.threads.lock().unwrap();
        *threads += 1;
        Ok(Thread {
            id: format!("T{}", *threads),
        })
    }

    async fn add_message(
        &self,
        _creds: &Credentials,
        _thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<(), ApiError> {
        self.record("add_message")?;
        self.push_message(role, content);
        Ok(())
    }

    async fn create_run(&self, _creds: &Credentials, _thread_id: &str) -> Result<Run, ApiError> {
        self.record("create_run")?;
        if let Some(run) = self.created_runs.lock().unwrap().pop_front() {
            return Ok(run);
        }
        let mut runs = self.runs.lock().unwrap();
        *runs += 1;
        Ok(Run::with_status(format!("R{}", *runs), "queued"))
    }

    async fn get_run(
        &self,
        _creds: &Credentials,
        _thread_id: &str,
        run_id: &str,
    ) -> Result<Run, ApiError> {
        self.record("get_run")?;
        let next = self.polled_runs.lock().unwrap().pop_front();
        match next {
            Some((run, reply)) => {
                if let Some(reply) = reply {
                    self.push_message(MessageRole::Assistant, &reply);
                }
                Ok(run)
            }
            None => Ok(Run::with_status(run_id, "in_progress")),
        }
    }

    async fn list_messages(
        &self,
        _creds: &Credentials,
        _thread_id: &str,
        _order: Option<ListOrder>,
    ) -> Result<MessageList, ApiError> {
        self.record("list_messages")?;
        let mut data = self.messages.lock().unwrap().clone();
        // Stored oldest first; every order the API accepts here lists newest first
        data.reverse();
        Ok(MessageList { data })
    }
}

// ============================================================================
// Mock Secret Store
// ============================================================================

pub struct MockSecretStore {
    secrets: HashMap<String, String>,
}

impl MockSecretStore {
    pub fn with_defaults() -> Self {
        let secrets = HashMap::from([
            (API_KEY_SECRET.to_string(), "sk-test".to_string()),
            (ASSISTANT_ID_SECRET.to_string(), "asst_test".to_string()),
        ]);
        Self { secrets }
    }

    pub fn empty() -> Self {
        Self {
            secrets: HashMap::new(),
        }
    }
}

#[async_trait]
impl SecretStore for MockSecretStore {
    async fn get_secret_value(&self, name: &str) -> Result<SecretValue, ApiError> {
        self.secrets
            .get(name)
            .map(|value| SecretValue {
                value: value.clone(),
            })
            .ok_or_else(|| ApiError::credentials(format!("Secret {name} is not available")))
    }
}

// ============================================================================
// Mock Conversation
// ============================================================================

/// Scripted conversation operations for driver and handler tests
#[derive(Default)]
pub struct MockConversation {
    init_results: Mutex<VecDeque<Result<Initialized, ApiError>>>,
    send_results: Mutex<VecDeque<Result<StartedRun, ApiError>>>,
    poll_results: Mutex<VecDeque<Result<RunOutcome, ApiError>>>,
    history: Mutex<Option<Result<Vec<ThreadMessage>, ApiError>>>,
    next_run: Mutex<u32>,
    /// Texts passed to `send_message`
    sent: Mutex<Vec<String>>,
    /// Run ids passed to `poll_status`
    polled: Mutex<Vec<String>>,
}

impl MockConversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_init(&self, result: Result<Initialized, ApiError>) {
        self.init_results.lock().unwrap().push_back(result);
    }

    pub fn queue_send(&self, result: Result<StartedRun, ApiError>) {
        self.send_results.lock().unwrap().push_back(result);
    }

    pub fn queue_poll(&self, result: Result<RunOutcome, ApiError>) {
        self.poll_results.lock().unwrap().push_back(result);
    }

    pub fn set_history(&self, result: Result<Vec<ThreadMessage>, ApiError>) {
        *self.history.lock().unwrap() = Some(result);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn polled(&self) -> Vec<String> {
        self.polled.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationOps for MockConversation {
    async fn initialize(&self, session: &mut Session) -> Result<Initialized, ApiError> {
        if let Some(result) = self.init_results.lock().unwrap().pop_front() {
            if let Ok(init) = &result {
                *session = Session::with_thread(init.thread_id.clone());
            }
            return result;
        }
        if let Some(thread_id) = session.thread_id() {
            return Ok(Initialized {
                thread_id: thread_id.to_string(),
                created: false,
            });
        }
        *session = Session::with_thread("T1");
        Ok(Initialized {
            thread_id: "T1".to_string(),
            created: true,
        })
    }

    async fn send_message(&self, text: &str, session: &Session) -> Result<StartedRun, ApiError> {
        self.sent.lock().unwrap().push(text.to_string());
        if let Some(result) = self.send_results.lock().unwrap().pop_front() {
            return result;
        }
        let thread_id = session.thread_id().ok_or_else(ApiError::no_session)?;
        let mut next = self.next_run.lock().unwrap();
        *next += 1;
        Ok(StartedRun {
            run_id: format!("R{}", *next),
            thread_id: thread_id.to_string(),
        })
    }

    async fn poll_status(
        &self,
        run_id: &str,
        _session: &Session,
    ) -> Result<RunOutcome, ApiError> {
        self.polled.lock().unwrap().push(run_id.to_string());
        self.poll_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(RunOutcome::InFlight(RunStatus::InProgress)))
    }

    async fn fetch_history(&self, session: &Session) -> Result<Vec<ThreadMessage>, ApiError> {
        session.thread_id().ok_or_else(ApiError::no_session)?;
        self.history
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
