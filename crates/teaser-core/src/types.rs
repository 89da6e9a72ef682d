//! Core types for Teaser — conversation turns and resumable sessions.
//!
//! The on-disk shape follows the browser client's `chatHistories` records:
//! camelCase keys, `messages` for the turn log, `name` for the display label,
//! and the agent role written as `"ai"`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Turns
// ─────────────────────────────────────────────

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnRole {
    #[serde(rename = "user")]
    User,

    /// The remote brain-teaser AI. Stored as `"ai"`, `"agent"` is accepted on read.
    #[serde(rename = "ai", alias = "agent")]
    Agent,
}

/// A single entry in the conversation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    /// Set only on the apology turn substituted for a failed remote call.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl Turn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Turn {
            role: TurnRole::User,
            content: content.into(),
            fallback: false,
        }
    }

    /// Create an agent turn carrying a real reply.
    pub fn agent(content: impl Into<String>) -> Self {
        Turn {
            role: TurnRole::Agent,
            content: content.into(),
            fallback: false,
        }
    }

    /// Create the agent turn shown when the remote call failed.
    pub fn fallback(content: impl Into<String>) -> Self {
        Turn {
            role: TurnRole::Agent,
            content: content.into(),
            fallback: true,
        }
    }

    /// Whether this turn is a genuine agent reply (not a fallback).
    pub fn is_agent_reply(&self) -> bool {
        self.role == TurnRole::Agent && !self.fallback
    }
}

// ─────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────

/// One resumable conversation in a game room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque id, generated once and never changed.
    pub id: String,
    pub room_id: u32,
    /// Human label, assigned at first persistence.
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Chronological, append-only turn log.
    #[serde(rename = "messages", default)]
    pub turns: Vec<Turn>,
    /// Time of first persistence (unix millis on disk).
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a new empty session in `room_id` with a freshly generated id.
    pub fn new(room_id: u32) -> Self {
        Self::with_id(generate_session_id(), room_id)
    }

    /// Create a new empty session with a caller-chosen id.
    pub fn with_id(id: impl Into<String>, room_id: u32) -> Self {
        Session {
            id: id.into(),
            room_id,
            display_name: None,
            turns: Vec::new(),
            created_at: None,
        }
    }

    /// Whether the session has been written to the history store at least once.
    pub fn is_persisted(&self) -> bool {
        self.created_at.is_some()
    }

    /// The most recent turn, if any.
    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// Generate a session id: `history_<unix-millis>_<4 hex>`.
pub fn generate_session_id() -> String {
    format!(
        "history_{}_{:04x}",
        Utc::now().timestamp_millis(),
        rand::random::<u16>()
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
