//! Environment configuration

use crate::retry::RetryPolicy;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_GREETING: &str = "Hallo, ich bin ein hilfreicher Assistent";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },
    #[error("{var}: invalid retry schedule {value:?} (expected fast, coarse or comma separated milliseconds)")]
    InvalidRetrySchedule { var: &'static str, value: String },
}

/// Relay settings read from the environment
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Assistants API root, e.g. `https://api.openai.com/v1`
    pub api_base_url: String,
    pub port: u16,
    pub retry: RetryPolicy,
    /// First assistant message of every new thread
    pub greeting: String,
    pub api_key_var: String,
    pub assistant_id_var: String,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = match get("RELAY_PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort {
                    var: "RELAY_PORT",
                    value,
                })?,
            None => DEFAULT_PORT,
        };

        let retry = match get("RELAY_RETRY_SCHEDULE") {
            Some(value) => parse_retry_schedule(&value).ok_or(ConfigError::InvalidRetrySchedule {
                var: "RELAY_RETRY_SCHEDULE",
                value,
            })?,
            None => RetryPolicy::default(),
        };

        Ok(Self {
            api_base_url: get("ASSISTANTS_API_URL")
                .unwrap_or_else(|| crate::assistant::DEFAULT_BASE_URL.to_string()),
            port,
            retry,
            greeting: get("RELAY_GREETING").unwrap_or_else(|| DEFAULT_GREETING.to_string()),
            api_key_var: get("RELAY_API_KEY_VAR").unwrap_or_else(|| "OPENAI_API_KEY".to_string()),
            assistant_id_var: get("RELAY_ASSISTANT_ID_VAR")
                .unwrap_or_else(|| "ASSISTANT_ID".to_string()),
        })
    }
}

/// `fast`, `coarse`, or a comma separated list of millisecond delays
pub fn parse_retry_schedule(value: &str) -> Option<RetryPolicy> {
    match value.trim() {
        "fast" => Some(RetryPolicy::fast()),
        "coarse" => Some(RetryPolicy::coarse()),
        list => {
            let millis = list
                .split(',')
                .map(|part| part.trim().parse::<u64>().ok())
                .collect::<Option<Vec<_>>>()?;
            Some(RetryPolicy::from_millis(&millis))
        }
    }
}

/// Orchestrator limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub max_iterations: u32,
    /// Wait before every status poll
    pub poll_interval: Duration,
    /// Backoff for polls failing with a gateway status
    pub transient_delays: Vec<Duration>,
    pub max_restarts: u32,
    pub restart_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_iterations: 600,
            poll_interval: Duration::from_millis(200),
            transient_delays: [100, 200, 400, 800]
                .into_iter()
                .map(Duration::from_millis)
                .collect(),
            max_restarts: 10,
            restart_delay: Duration::from_secs(1),
        }
    }
}
