//! UI-agnostic conversation types
//!
//! Transcript entries are shared by every frontend and carry no rendering
//! state of their own.

use crate::format::fallback_text;
use crate::payload::Payload;

/// One entry in the chat transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub content: String,
    pub payload: Option<Payload>,
    pub action: Option<EntryAction>,
}

/// The role of a transcript entry's author
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// A follow-up the user can trigger from an assistant entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryAction {
    /// Ask the backend for the step list of the previous answer.
    ShowSteps { prompt: String },
}

impl ChatEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            payload: None,
            action: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
            payload: None,
            action: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            payload: None,
            action: None,
        }
    }

    /// Assistant entry carrying a backend payload.
    ///
    /// Payloads without a narrative fall back to a backend error message when
    /// one was supplied.
    pub fn from_payload(payload: Payload) -> Self {
        let mut content = fallback_text(&payload);
        if content.is_empty() {
            if let Payload::Error { message: Some(message) } = &payload {
                content = message.clone();
            }
        }
        Self {
            role: ChatRole::Assistant,
            content,
            payload: Some(payload),
            action: None,
        }
    }

    pub fn with_action(mut self, action: EntryAction) -> Self {
        self.action = Some(action);
        self
    }
}
