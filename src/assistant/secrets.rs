//! Credential loading from a secret store

use super::ApiError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Secret holding the Assistants API key
pub const API_KEY_SECRET: &str = "OpenAI-API-KEY";
/// Secret holding the assistant identifier runs are created against
pub const ASSISTANT_ID_SECRET: &str = "Assistant-ID";

/// Value returned by a privileged secret read
#[derive(Debug, Clone, Deserialize)]
pub struct SecretValue {
    pub value: String,
}

/// Source of named secrets
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret_value(&self, name: &str) -> Result<SecretValue, ApiError>;
}

#[async_trait]
impl<T: SecretStore + ?Sized> SecretStore for Arc<T> {
    async fn get_secret_value(&self, name: &str) -> Result<SecretValue, ApiError> {
        (**self).get_secret_value(name).await
    }
}

/// API key and assistant id for one operation
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub assistant_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("assistant_id", &self.assistant_id)
            .finish()
    }
}

/// Load both secrets required for an operation
pub async fn load_credentials<S: SecretStore + ?Sized>(store: &S) -> Result<Credentials, ApiError> {
    let api_key = store.get_secret_value(API_KEY_SECRET).await?.value;
    let assistant_id = store.get_secret_value(ASSISTANT_ID_SECRET).await?.value;
    Ok(Credentials {
        api_key,
        assistant_id,
    })
}

/// Secret store backed by environment variables
#[derive(Debug, Clone)]
pub struct EnvSecretStore {
    /// Secret name -> environment variable
    mapping: HashMap<String, String>,
}

impl EnvSecretStore {
    pub fn new(api_key_var: impl Into<String>, assistant_id_var: impl Into<String>) -> Self {
        let mut mapping = HashMap::new();
        mapping.insert(API_KEY_SECRET.to_string(), api_key_var.into());
        mapping.insert(ASSISTANT_ID_SECRET.to_string(), assistant_id_var.into());
        Self { mapping }
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new("OPENAI_API_KEY", "ASSISTANT_ID")
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret_value(&self, name: &str) -> Result<SecretValue, ApiError> {
        let var = self
            .mapping
            .get(name)
            .ok_or_else(|| ApiError::credentials(format!("Unknown secret: {name}")))?;

        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => Ok(SecretValue { value }),
            _ => Err(ApiError::credentials(format!(
                "Secret {name} is not available (set {var})"
            ))),
        }
    }
}
