//! Core of Teaser, a terminal client for a remote brain-teaser game.
//!
//! - [`types`] — turns and sessions
//! - [`session`] — state machine, history store, session manager
//! - [`storage`] — key-value persistence backends
//! - [`sender`] — the remote send operation trait
//! - [`config`] — JSON config with env overrides

pub mod config;
pub mod sender;
pub mod session;
pub mod storage;
pub mod types;
pub mod utils;

pub use sender::{ChatSender, RemoteFailure};
pub use session::{GamePhase, SessionError, SessionManager, TurnOutcome};
pub use types::{Session, Turn, TurnRole};
