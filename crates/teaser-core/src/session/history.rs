//! Durable, versioned index of past sessions.
//!
//! The whole index lives under one storage key (`chatHistories`):
//!
//! ```json
//! {"version": 1, "sessions": [{"id": "...", "roomId": 42, "name": "对话 1", "messages": [...], "createdAt": 1733050000000}]}
//! ```
//!
//! Sessions are ordered most-recently-updated first. A bare JSON array (the
//! unversioned format written by the browser client) is migrated on load.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, StorageError};
use crate::types::Session;

/// Storage key holding the serialized index.
pub const HISTORY_KEY: &str = "chatHistories";

/// Current on-disk format version.
pub const INDEX_VERSION: u32 = 1;

/// Default prefix for generated display names.
pub const DEFAULT_NAME_PREFIX: &str = "对话";

// ─────────────────────────────────────────────
// SessionIndex
// ─────────────────────────────────────────────

/// All known sessions, at most one per id, most recent first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionIndex {
    sessions: Vec<Session>,
}

impl SessionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Session> {
        self.sessions.iter()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Insert or replace `session` and move it to the front.
    fn upsert_front(&mut self, session: Session) {
        self.sessions.retain(|s| s.id != session.id);
        self.sessions.insert(0, session);
    }

    /// Drop the session with `id`. Returns whether anything was removed.
    fn remove(&mut self, id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        self.sessions.len() != before
    }

    /// Build an index from a list, keeping the first entry for a duplicated id.
    fn from_sessions(sessions: Vec<Session>) -> Self {
        let mut index = SessionIndex::new();
        for session in sessions {
            if index.contains(&session.id) {
                warn!(id = %session.id, "dropping duplicate session in stored history");
                continue;
            }
            index.sessions.push(session);
        }
        index
    }
}

impl<'a> IntoIterator for &'a SessionIndex {
    type Item = &'a Session;
    type IntoIter = std::slice::Iter<'a, Session>;

    fn into_iter(self) -> Self::IntoIter {
        self.sessions.iter()
    }
}

// ─────────────────────────────────────────────
// Write outcome
// ─────────────────────────────────────────────

/// Whether the last history write reached durable storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum HistoryStatus {
    #[default]
    Saved,
    /// Storage failed; the index is only held in memory.
    Unavailable { reason: String },
}

impl HistoryStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, HistoryStatus::Saved)
    }
}

/// The updated index plus the durability of the write that produced it.
#[derive(Clone, Debug)]
pub struct Persisted {
    pub index: SessionIndex,
    pub status: HistoryStatus,
}

// ─────────────────────────────────────────────
// On-disk envelope
// ─────────────────────────────────────────────

#[derive(Serialize)]
struct IndexRecordRef<'a> {
    version: u32,
    sessions: &'a [Session],
}

#[derive(Deserialize)]
struct IndexRecord {
    version: u32,
    #[serde(default)]
    sessions: Vec<serde_json::Value>,
}

/// Parse stored history, migrating the unversioned array format.
fn decode_index(raw: &str) -> Result<Vec<Session>, String> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;

    if let serde_json::Value::Array(entries) = value {
        debug!("migrating unversioned session history to version {}", INDEX_VERSION);
        return Ok(decode_sessions(entries));
    }

    let record: IndexRecord = serde_json::from_value(value).map_err(|e| e.to_string())?;
    if record.version != INDEX_VERSION {
        return Err(format!("unsupported history version {}", record.version));
    }
    Ok(decode_sessions(record.sessions))
}

/// Convert stored entries one by one, skipping any that do not parse.
fn decode_sessions(entries: Vec<serde_json::Value>) -> Vec<Session> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(position, entry)| match serde_json::from_value::<Session>(entry) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(position, error = %e, "dropping malformed session in stored history");
                None
            }
        })
        .collect()
}

fn encode_index(index: &SessionIndex) -> Result<String, StorageError> {
    let record = IndexRecordRef {
        version: INDEX_VERSION,
        sessions: &index.sessions,
    };
    Ok(serde_json::to_string(&record)?)
}

// ─────────────────────────────────────────────
// HistoryStore
// ─────────────────────────────────────────────

/// Reads and writes the session index through a [`KeyValueStore`].
///
/// Storage failures never propagate: reads degrade to an empty index and
/// writes report [`HistoryStatus::Unavailable`].
#[derive(Clone)]
pub struct HistoryStore {
    backend: Arc<dyn KeyValueStore>,
    name_prefix: String,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("key", &HISTORY_KEY)
            .field("name_prefix", &self.name_prefix)
            .finish()
    }
}

impl HistoryStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_name_prefix(backend, DEFAULT_NAME_PREFIX)
    }

    /// Use `prefix` for generated display names (`"<prefix> <n>"`).
    pub fn with_name_prefix(backend: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        HistoryStore {
            backend,
            name_prefix: prefix.into(),
        }
    }

    /// Read the persisted index. Absent or unreadable data yields an empty index.
    pub fn load_index(&self) -> SessionIndex {
        let raw = match self.backend.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no stored session history");
                return SessionIndex::new();
            }
            Err(e) => {
                warn!(error = %e, "failed to read session history");
                return SessionIndex::new();
            }
        };

        match decode_index(&raw) {
            Ok(sessions) => {
                let index = SessionIndex::from_sessions(sessions);
                debug!(sessions = index.len(), "loaded session history");
                index
            }
            Err(e) => {
                warn!(error = %e, "stored session history is corrupt, starting empty");
                SessionIndex::new()
            }
        }
    }

    /// Upsert `session` at the front of `index` and write the result back.
    ///
    /// The display name and creation time are assigned the first time an id
    /// is persisted and carried over afterwards. Sessions without turns are
    /// not stored.
    pub fn persist(&self, session: &Session, mut index: SessionIndex) -> Persisted {
        if session.turns.is_empty() {
            return Persisted {
                index,
                status: HistoryStatus::Saved,
            };
        }

        let mut entry = session.clone();
        match index.get(&session.id) {
            Some(existing) => {
                entry.display_name = existing.display_name.clone().or(entry.display_name);
                entry.created_at = existing.created_at.or(entry.created_at);
            }
            None => {
                if entry.display_name.is_none() {
                    entry.display_name = Some(format!("{} {}", self.name_prefix, index.len() + 1));
                }
                if entry.created_at.is_none() {
                    // Millisecond precision, matching what is written to disk.
                    entry.created_at = Some(Utc::now().trunc_subsecs(3));
                }
            }
        }

        index.upsert_front(entry);
        let status = self.write(&index);
        debug!(
            id = %session.id,
            turns = session.turns.len(),
            sessions = index.len(),
            durable = status.is_available(),
            "persisted session"
        );
        Persisted { index, status }
    }

    /// Remove `id` from `index` (if present) and write the result back.
    pub fn remove(&self, id: &str, mut index: SessionIndex) -> Persisted {
        if !index.remove(id) {
            debug!(id, "session not in history, nothing to remove");
            return Persisted {
                index,
                status: HistoryStatus::Saved,
            };
        }
        let status = self.write(&index);
        debug!(id, sessions = index.len(), "removed session from history");
        Persisted { index, status }
    }

    fn write(&self, index: &SessionIndex) -> HistoryStatus {
        let result = encode_index(index).and_then(|raw| self.backend.set(HISTORY_KEY, &raw));
        match result {
            Ok(()) => HistoryStatus::Saved,
            Err(e) => {
                warn!(error = %e, "session history unavailable, keeping it in memory");
                HistoryStatus::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
