//! Transcript model for the terminal chat

use crate::assistant::{MessageRole, ThreadMessage};
use std::fmt;

/// Shown in place of a reply when a message could not be answered
pub const GENERIC_ERROR_MESSAGE: &str = "A technical error occurred. Please try again later.";
/// Shown as the only entry when starting a new conversation failed
pub const RESET_ERROR_MESSAGE: &str =
    "A technical error occurred while resetting the chat. Please try again later.";

/// One row of the transcript; ids are sequential decimal strings from "1"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub id: String,
    pub user: Option<String>,
    pub assistant: Option<String>,
}

impl fmt::Display for ChatEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            writeln!(f, "you > {user}")?;
        }
        if let Some(assistant) = &self.assistant {
            writeln!(f, "assistant > {assistant}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
}

impl Transcript {
    /// Build from a history listing, which arrives newest first
    pub fn from_history(mut messages: Vec<ThreadMessage>) -> Self {
        messages.reverse();
        let entries = messages
            .iter()
            .enumerate()
            .map(|(index, message)| {
                let text = message.text().map(str::to_string);
                ChatEntry {
                    id: (index + 1).to_string(),
                    user: text.clone().filter(|_| message.role == MessageRole::User),
                    assistant: text.filter(|_| message.role == MessageRole::Assistant),
                }
            })
            .collect();
        Self { entries }
    }

    /// Transcript holding a single assistant notice
    pub fn notice(text: &str) -> Self {
        let mut transcript = Self::default();
        transcript.push_assistant(text);
        transcript
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Only a greeting (or nothing) means there is nothing to reset
    pub fn can_reset(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn push_user(&mut self, text: &str) -> &ChatEntry {
        self.push(Some(text.to_string()), None)
    }

    pub fn push_assistant(&mut self, text: &str) -> &ChatEntry {
        self.push(None, Some(text.to_string()))
    }

    fn push(&mut self, user: Option<String>, assistant: Option<String>) -> &ChatEntry {
        let id = self.next_id();
        self.entries.push(ChatEntry {
            id,
            user,
            assistant,
        });
        &self.entries[self.entries.len() - 1]
    }

    fn next_id(&self) -> String {
        let last = self
            .entries
            .last()
            .and_then(|entry| entry.id.parse::<u64>().ok())
            .unwrap_or(0);
        (last + 1).to_string()
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entries.iter().try_for_each(|entry| write!(f, "{entry}"))
    }
}
