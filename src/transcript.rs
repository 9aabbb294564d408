//! Ordered conversation transcript shown by the renderer.
//!
//! Messages are appended in turn order. At most one agent message is *open* at a
//! time: its text follows the reveal cursor until the turn is finalized or
//! interrupted, after which it is frozen. User messages are frozen on arrival.

use serde::{Deserialize, Serialize};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Agent => write!(f, "agent"),
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Playback was cut off. Never cleared once set.
    pub interrupted: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            interrupted: false,
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
            interrupted: false,
        }
    }
}

/// Append-only message log with a single open agent slot.
#[derive(Debug, Clone, Default)]
pub struct TranscriptLog {
    messages: Vec<Message>,
    open: Option<usize>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Owned copy for handing to a renderer.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// The agent message still following the reveal cursor, if any.
    pub fn open_message(&self) -> Option<&Message> {
        self.open.and_then(|i| self.messages.get(i))
    }

    pub fn has_open(&self) -> bool {
        self.open.is_some()
    }

    /// Appends a frozen user message.
    pub fn push_user(&mut self, text: impl Into<String>) -> usize {
        self.messages.push(Message::user(text));
        self.messages.len() - 1
    }

    /// Appends a new open agent message, freezing any previous open one.
    pub fn open_agent(&mut self, text: impl Into<String>) -> usize {
        self.freeze_open();
        self.messages.push(Message::agent(text));
        let index = self.messages.len() - 1;
        self.open = Some(index);
        index
    }

    /// Replaces the open agent message's text. Returns whether anything changed.
    pub fn update_open(&mut self, text: &str) -> bool {
        match self.open.and_then(|i| self.messages.get_mut(i)) {
            Some(message) if message.text != text => {
                message.text.clear();
                message.text.push_str(text);
                true
            }
            _ => false,
        }
    }

    /// Sets the open message's interrupted flag. It stays set for good.
    pub fn mark_open_interrupted(&mut self) -> bool {
        match self.open.and_then(|i| self.messages.get_mut(i)) {
            Some(message) => {
                message.interrupted = true;
                true
            }
            None => false,
        }
    }

    /// Stops the open message from following the cursor.
    pub fn freeze_open(&mut self) -> Option<usize> {
        self.open.take()
    }

    /// The last message when it is a frozen, uninterrupted agent message.
    ///
    /// This is the entry a late ground truth belongs to. `None` while a message
    /// is open or once anything else was appended after it.
    pub fn last_completed_agent_mut(&mut self) -> Option<&mut Message> {
        if self.open.is_some() {
            return None;
        }
        self.messages
            .last_mut()
            .filter(|m| m.role == Role::Agent && !m.interrupted)
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.open = None;
    }
}
