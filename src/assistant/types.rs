//! Wire types for the Assistants API

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of messages requested per listing
pub const MESSAGE_LIST_LIMIT: u32 = 99;

/// Known run states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    RequiresAction,
    Failed,
    Cancelled,
    Expired,
}

impl RunStatus {
    pub const ALL: [RunStatus; 7] = [
        RunStatus::Queued,
        RunStatus::InProgress,
        RunStatus::Completed,
        RunStatus::RequiresAction,
        RunStatus::Failed,
        RunStatus::Cancelled,
        RunStatus::Expired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
        }
    }

    /// Parse a status string, `None` for anything outside the known set
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of a thread message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Explicit sort order for message listings; leaving it out gets the
/// upstream default, which is also newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    Desc,
}

impl ListOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            ListOrder::Desc => "desc",
        }
    }
}

/// `POST /threads` response
#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    pub id: String,
}

/// Run payload as returned by the API.
///
/// `status` stays a raw string so that missing and unknown values can be
/// reported instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RunLastError>,
}

#[cfg(test)]
impl Run {
    pub fn with_status(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            status: Some(status.into()),
            last_error: None,
        }
    }

    #[must_use]
    pub fn with_last_error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(RunLastError {
            code: None,
            message: Some(message.into()),
        });
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunLastError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A message inside a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    #[cfg(test)]
    pub fn text_message(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: vec![MessageContent {
                text: Some(TextContent { value: text.into() }),
            }],
        }
    }

    /// Text of the first content part, if it is a text part
    pub fn text(&self) -> Option<&str> {
        self.content
            .first()
            .and_then(|part| part.text.as_ref())
            .map(|text| text.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
}

/// `GET /threads/{id}/messages` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub data: Vec<ThreadMessage>,
}

/// `POST /threads/{id}/messages` body
#[derive(Debug, Serialize)]
pub(crate) struct NewMessage<'a> {
    pub role: MessageRole,
    pub content: &'a str,
}

/// `POST /threads/{id}/runs` body
#[derive(Debug, Serialize)]
pub(crate) struct NewRun<'a> {
    pub assistant_id: &'a str,
}
