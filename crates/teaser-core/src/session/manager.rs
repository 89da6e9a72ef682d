//! Session manager — owns the active session and the history index, and
//! drives one request/response cycle per player turn.
//!
//! # Turn cycle
//! 1. Reject blank input, or input while this session already has a turn in flight
//! 2. Append the user turn (visible through [`SessionManager::snapshot`] right away)
//! 3. Await the [`ChatSender`]
//! 4. Append the reply, or the fallback apology if the send failed
//! 5. Persist the session through the [`HistoryStore`]
//!
//! State sits behind a `std::sync::Mutex` that is never held across an
//! `.await`; the only suspension point is the remote call.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::sender::ChatSender;
use crate::session::history::{HistoryStatus, HistoryStore, SessionIndex};
use crate::session::state::{GamePhase, InputRejection, SessionError, Transition};
use crate::types::Session;

// ─────────────────────────────────────────────
// Turn outcome
// ─────────────────────────────────────────────

/// What a submitted turn produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The backend answered; carries the updated session.
    Replied(Session),
    /// The backend call failed and the fallback turn was appended.
    Fallback(Session),
    /// A guarded command ("begin" / "end") whose guard already held.
    Skipped,
}

impl TurnOutcome {
    /// The session after the turn, if one was taken.
    pub fn session(&self) -> Option<&Session> {
        match self {
            TurnOutcome::Replied(s) | TurnOutcome::Fallback(s) => Some(s),
            TurnOutcome::Skipped => None,
        }
    }
}

// ─────────────────────────────────────────────
// In-flight tracking
// ─────────────────────────────────────────────

/// Marks a session id as having a turn in flight until dropped.
struct InFlight<'a> {
    ids: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

struct ManagerState {
    active: Session,
    index: SessionIndex,
    status: HistoryStatus,
}

// ─────────────────────────────────────────────
// SessionManager
// ─────────────────────────────────────────────

/// The conversation session manager.
///
/// Share it behind an `Arc` when more than one caller issues commands; the
/// single-turn-in-flight rule is enforced here, not by the front end.
pub struct SessionManager {
    history: HistoryStore,
    sender: Arc<dyn ChatSender>,
    game: GameConfig,
    state: Mutex<ManagerState>,
    in_flight: Mutex<HashSet<String>>,
}

impl SessionManager {
    /// Load the history index and open a fresh session in `room_id`.
    pub fn new(
        history: HistoryStore,
        sender: Arc<dyn ChatSender>,
        game: GameConfig,
        room_id: u32,
    ) -> Self {
        let index = history.load_index();
        info!(
            sessions = index.len(),
            room_id,
            sender = sender.display_name(),
            "session manager ready"
        );

        SessionManager {
            history,
            sender,
            game,
            state: Mutex::new(ManagerState {
                active: Session::new(room_id),
                index,
                status: HistoryStatus::Saved,
            }),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn claim(&self, id: &str) -> Result<InFlight<'_>, SessionError> {
        let mut ids = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !ids.insert(id.to_string()) {
            return Err(SessionError::InvalidInput(InputRejection::TurnInFlight));
        }
        Ok(InFlight {
            ids: &self.in_flight,
            id: id.to_string(),
        })
    }

    // ── Reads ──

    /// A copy of the active session.
    pub fn snapshot(&self) -> Session {
        self.lock_state().active.clone()
    }

    /// A copy of the history index.
    pub fn index(&self) -> SessionIndex {
        self.lock_state().index.clone()
    }

    /// Phase of the active session.
    pub fn phase(&self) -> GamePhase {
        self.lock_state().active.phase()
    }

    /// Durability of the most recent history write.
    pub fn history_status(&self) -> HistoryStatus {
        self.lock_state().status.clone()
    }

    /// Whether the active session has a turn awaiting the backend.
    pub fn is_in_flight(&self) -> bool {
        let id = self.lock_state().active.id.clone();
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    // ── Session commands ──

    /// Replace the active session with a fresh one in `room_id`.
    pub fn new_session(&self, room_id: u32) -> Session {
        let session = Session::new(room_id);
        debug!(id = %session.id, room_id, "opened new session");
        self.lock_state().active = session.clone();
        session
    }

    /// Make the stored session `id` the active one.
    pub fn select_session(&self, id: &str) -> Result<Session, SessionError> {
        let mut state = self.lock_state();
        let session = state
            .index
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;

        debug!(id, turns = session.turns.len(), phase = %session.phase(), "selected session");
        state.active = session.clone();
        Ok(session)
    }

    /// Delete `id` from history. Returns whether it existed.
    ///
    /// Deleting the active session resets it to a fresh one in the same
    /// room. A session with a turn in flight cannot be deleted.
    pub fn delete_session(&self, id: &str) -> Result<bool, SessionError> {
        let _claim = self.claim(id)?;
        let mut state = self.lock_state();

        let existed = state.index.contains(id);
        let index = std::mem::take(&mut state.index);
        let persisted = self.history.remove(id, index);
        state.index = persisted.index;
        state.status = persisted.status;

        if state.active.id == id {
            state.active = Session::new(state.active.room_id);
            debug!(id, new_id = %state.active.id, "deleted active session, opened a fresh one");
        } else {
            debug!(id, existed, "deleted session");
        }
        Ok(existed)
    }

    // ── Turn orchestration ──

    /// Submit a player turn to the active session.
    pub async fn submit(&self, raw_text: &str) -> Result<TurnOutcome, SessionError> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(SessionError::InvalidInput(InputRejection::Empty));
        }

        let (mut working, _claim) = {
            let mut state = self.lock_state();
            let claim = self.claim(&state.active.id)?;
            state.active.append_user_turn(text)?;
            (state.active.clone(), claim)
        };

        debug!(id = %working.id, room_id = working.room_id, text, "sending turn");

        let replied = match self.sender.send_message(working.room_id, text).await {
            Ok(reply) if !reply.trim().is_empty() => {
                let phase = working.append_agent_turn(reply);
                info!(id = %working.id, %phase, "agent replied");
                true
            }
            Ok(_) => {
                warn!(id = %working.id, "backend returned a blank reply, using fallback");
                working.append_fallback_turn(self.game.fallback_reply.clone());
                false
            }
            Err(e) => {
                warn!(id = %working.id, error = %e, "send failed, using fallback");
                working.append_fallback_turn(self.game.fallback_reply.clone());
                false
            }
        };

        let session = self.complete(working);
        Ok(if replied {
            TurnOutcome::Replied(session)
        } else {
            TurnOutcome::Fallback(session)
        })
    }

    /// "Begin game": sends the start keyword, unless the game has started.
    pub async fn begin(&self) -> Result<TurnOutcome, SessionError> {
        let transition = self.lock_state().active.start();
        if transition == Transition::NoOp {
            debug!("begin ignored, game already started");
            return Ok(TurnOutcome::Skipped);
        }
        self.submit(&self.game.start_keyword).await
    }

    /// "End game": sends the end keyword, unless the game has ended.
    pub async fn end(&self) -> Result<TurnOutcome, SessionError> {
        let transition = self.lock_state().active.finish();
        if transition == Transition::NoOp {
            debug!("end ignored, game already ended");
            return Ok(TurnOutcome::Skipped);
        }
        self.submit(&self.game.end_keyword).await
    }

    /// Persist a finished turn and publish it as the active session if it
    /// still is one.
    fn complete(&self, working: Session) -> Session {
        let mut state = self.lock_state();

        let index = std::mem::take(&mut state.index);
        let persisted = self.history.persist(&working, index);
        state.index = persisted.index;
        state.status = persisted.status;

        // Pick up the display name and creation time assigned on first write.
        let session = match state.index.get(&working.id) {
            Some(stored) => stored.clone(),
            None => working,
        };

        if state.active.id == session.id {
            state.active = session.clone();
        } else {
            debug!(id = %session.id, active = %state.active.id, "turn finished for an inactive session");
        }
        session
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
