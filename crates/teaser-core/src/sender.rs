//! The remote send operation: the one call the session manager makes to the
//! brain-teaser backend.
//!
//! `teaser-client` provides the HTTP implementation; tests use scripted ones.

use async_trait::async_trait;

/// Why a remote send failed. Never surfaced to the player directly; the
/// session manager turns it into a fallback agent turn.
#[derive(Debug, thiserror::Error)]
pub enum RemoteFailure {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("server returned an empty reply")]
    EmptyReply,
}

/// Sends one player message to a game room and returns the agent's reply.
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Send `text` to room `room_id`.
    ///
    /// The reply is opaque to the caller except for end-of-game sentinel
    /// detection.
    async fn send_message(&self, room_id: u32, text: &str) -> Result<String, RemoteFailure>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
