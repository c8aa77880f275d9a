//! # Session Types
//!
//! Message log entries and the session value object.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

/// Outcome of the most recent remote call attempt (not a live probe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Connected,
    Disconnected,
}

impl std::fmt::Display for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connectivity::Connected => write!(f, "● Connected"),
            Connectivity::Disconnected => write!(f, "○ Disconnected"),
        }
    }
}

/// Request lifecycle of the widget.
///
/// `Idle` is only ever reported by the engine when no session is open; a
/// live [`Session`] starts in `AwaitingInit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Idle,
    AwaitingInit,
    Ready,
    Sending,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Idle => write!(f, "idle"),
            Lifecycle::AwaitingInit => write!(f, "awaiting_init"),
            Lifecycle::Ready => write!(f, "ready"),
            Lifecycle::Sending => write!(f, "sending"),
        }
    }
}

/// One entry of the message log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub created_at: DateTime<Local>,
    /// Set only on bot replies produced by the fallback responder
    pub degraded: bool,
}

impl Message {
    fn new(seq: u64, sender: Sender, text: impl Into<String>, degraded: bool) -> Self {
        Self {
            id: format!("{}-{}", sender, seq),
            text: text.into(),
            sender,
            created_at: Local::now(),
            degraded,
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}

/// A single conversation with the query service.
///
/// Created when the widget opens and dropped when it closes; nothing here is
/// persisted. The log is append-only and the continuity token latches on the
/// first non-empty value.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    messages: Vec<Message>,
    continuity_token: Option<String>,
    connectivity: Connectivity,
    lifecycle: Lifecycle,
    initialized: bool,
    next_seq: u64,
}

impl Session {
    /// Fresh session seeded with the welcome message, handshake pending.
    pub(crate) fn new(welcome_message: &str) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
            continuity_token: None,
            connectivity: Connectivity::Connected,
            lifecycle: Lifecycle::AwaitingInit,
            initialized: false,
            next_seq: 0,
        };
        session.push(Sender::Bot, welcome_message, false);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn continuity_token(&self) -> Option<&str> {
        self.continuity_token.as_deref()
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn push(&mut self, sender: Sender, text: impl Into<String>, degraded: bool) -> &Message {
        let message = Message::new(self.next_seq, sender, text, degraded);
        self.next_seq += 1;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// First-token-wins. Returns `true` when the token was adopted.
    pub(crate) fn adopt_token(&mut self, token: Option<&str>) -> bool {
        match (self.continuity_token.as_deref(), token) {
            (None, Some(token)) if !token.is_empty() => {
                self.continuity_token = Some(token.to_string());
                true
            }
            _ => false,
        }
    }

    pub(crate) fn set_connectivity(&mut self, connectivity: Connectivity) {
        self.connectivity = connectivity;
    }

    pub(crate) fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.lifecycle = lifecycle;
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }
}
