//! Conversation sessions — state machine, history store, and turn orchestration.
//!
//! - [`state`] — phase derivation and guarded transitions on a [`Session`](crate::types::Session)
//! - [`history`] — the versioned [`SessionIndex`] persisted through a key-value store
//! - [`manager`] — [`SessionManager`], which runs one send/receive cycle per turn

pub mod history;
pub mod manager;
pub mod state;

pub use history::{HistoryStatus, HistoryStore, Persisted, SessionIndex};
pub use manager::{SessionManager, TurnOutcome};
pub use state::{GamePhase, InputRejection, SessionError, Transition, END_SENTINEL};
