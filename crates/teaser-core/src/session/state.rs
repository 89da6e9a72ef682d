//! Session state machine — turn appends and game-phase derivation.
//!
//! ```text
//! NotStarted --(first agent reply)--> Started --(reply containing 游戏已结束)--> Ended
//! ```
//!
//! The phase is never stored; it is recomputed from the turn log on every
//! call to [`Session::phase`].

use crate::types::{Session, Turn};

/// Marker in an agent reply that signals the game is over.
///
/// Matched as a plain substring anywhere in the reply.
pub const END_SENTINEL: &str = "游戏已结束";

/// Game phase derived from a session's turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    NotStarted,
    Started,
    Ended,
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            GamePhase::NotStarted => "not started",
            GamePhase::Started => "started",
            GamePhase::Ended => "ended",
        };
        f.write_str(label)
    }
}

/// Result of a guarded command check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The command should be issued.
    Proceed,
    /// The guard already holds; the command is a no-op.
    NoOp,
}

/// Why a player input was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputRejection {
    /// Text was empty or whitespace only.
    Empty,
    /// Another turn for the same session has not completed yet.
    TurnInFlight,
}

impl std::fmt::Display for InputRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputRejection::Empty => f.write_str("message is empty"),
            InputRejection::TurnInFlight => f.write_str("a turn is already in flight"),
        }
    }
}

/// Errors reported back to the caller of a session command.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid input: {0}")]
    InvalidInput(InputRejection),

    #[error("unknown session: {0}")]
    UnknownSession(String),
}

impl Session {
    /// Derive the game phase from the turn log. Fallback turns are ignored.
    pub fn phase(&self) -> GamePhase {
        let mut phase = GamePhase::NotStarted;
        for turn in self.turns.iter().filter(|t| t.is_agent_reply()) {
            if turn.content.contains(END_SENTINEL) {
                return GamePhase::Ended;
            }
            phase = GamePhase::Started;
        }
        phase
    }

    /// Guard for "begin game": proceeds only before the first agent reply.
    pub fn start(&self) -> Transition {
        match self.phase() {
            GamePhase::NotStarted => Transition::Proceed,
            GamePhase::Started | GamePhase::Ended => Transition::NoOp,
        }
    }

    /// Guard for "end game": a no-op once the game has ended.
    pub fn finish(&self) -> Transition {
        match self.phase() {
            GamePhase::Ended => Transition::NoOp,
            GamePhase::NotStarted | GamePhase::Started => Transition::Proceed,
        }
    }

    /// Append a player turn. The text is trimmed; blank text is rejected
    /// without touching the log.
    pub fn append_user_turn(&mut self, text: &str) -> Result<&Turn, SessionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SessionError::InvalidInput(InputRejection::Empty));
        }
        Ok(self.push(Turn::user(trimmed)))
    }

    /// Append an agent reply and return the recomputed phase.
    pub fn append_agent_turn(&mut self, text: impl Into<String>) -> GamePhase {
        self.push(Turn::agent(text));
        self.phase()
    }

    /// Append the apology turn used when the remote call failed.
    pub fn append_fallback_turn(&mut self, text: impl Into<String>) -> GamePhase {
        self.push(Turn::fallback(text));
        self.phase()
    }

    fn push(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TurnRole;

    #[test]
    fn test_empty_session_not_started() {
        let session = Session::with_id("s", 42);
        assert_eq!(session.phase(), GamePhase::NotStarted);
        assert_eq!(session.start(), Transition::Proceed);
        assert_eq!(session.finish(), Transition::Proceed);
    }

    #[test]
    fn test_user_turns_alone_do_not_start() {
        let mut session = Session::with_id("s", 42);
        session.append_user_turn("开始").unwrap();
        session.append_user_turn("hello").unwrap();
        assert_eq!(session.phase(), GamePhase::NotStarted);
    }

    #[test]
    fn test_first_agent_turn_starts() {
        let mut session = Session::with_id("s", 42);
        session.append_user_turn("开始").unwrap();
        assert_eq!(session.append_agent_turn("你好，游戏开始"), GamePhase::Started);
        assert_eq!(session.start(), Transition::NoOp);
        assert_eq!(session.finish(), Transition::Proceed);
    }

    #[test]
    fn test_sentinel_ends_game() {
        let mut session = Session::with_id("s", 42);
        session.append_agent_turn("第一题");
        let phase = session.append_agent_turn("答对了！游戏已结束，谢谢参与");
        assert_eq!(phase, GamePhase::Ended);
        assert_eq!(session.finish(), Transition::NoOp);
        assert_eq!(session.start(), Transition::NoOp);
    }

    #[test]
    fn test_ended_is_sticky() {
        let mut session = Session::with_id("s", 42);
        session.append_agent_turn("游戏已结束");
        session.append_user_turn("再来").unwrap();
        assert_eq!(session.append_agent_turn("新的问题"), GamePhase::Ended);
    }

    #[test]
    fn test_sentinel_in_user_turn_ignored() {
        let mut session = Session::with_id("s", 42);
        session.append_user_turn("游戏已结束").unwrap();
        assert_eq!(session.phase(), GamePhase::NotStarted);
    }

    #[test]
    fn test_fallback_does_not_change_phase() {
        let mut session = Session::with_id("s", 42);
        assert_eq!(session.append_fallback_turn("抱歉"), GamePhase::NotStarted);

        session.append_agent_turn("第一题");
        assert_eq!(session.append_fallback_turn("抱歉"), GamePhase::Started);
    }

    #[test]
    fn test_blank_user_turn_rejected_without_mutation() {
        let mut session = Session::with_id("s", 42);
        session.append_user_turn("hi").unwrap();

        for blank in ["", "   ", "\n\t "] {
            let err = session.append_user_turn(blank).unwrap_err();
            assert!(matches!(err, SessionError::InvalidInput(InputRejection::Empty)));
        }
        assert_eq!(session.turns.len(), 1);
    }

    #[test]
    fn test_user_turn_is_trimmed() {
        let mut session = Session::with_id("s", 42);
        let turn = session.append_user_turn("  猜一猜 \n").unwrap();
        assert_eq!(turn.content, "猜一猜");
        assert_eq!(turn.role, TurnRole::User);
    }

    #[test]
    fn test_appends_preserve_call_order() {
        let mut session = Session::with_id("s", 42);
        let mut expected = Vec::new();
        for i in 0..5 {
            let before = session.turns.len();
            if i % 2 == 0 {
                session.append_user_turn(&format!("q{i}")).unwrap();
                expected.push((TurnRole::User, format!("q{i}")));
            } else {
                session.append_agent_turn(format!("a{i}"));
                expected.push((TurnRole::Agent, format!("a{i}")));
            }
            assert_eq!(session.turns.len(), before + 1);
        }

        let actual: Vec<(TurnRole, String)> = session
            .turns
            .iter()
            .map(|t| (t.role, t.content.clone()))
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_phase_depends_only_on_turns() {
        let mut a = Session::with_id("a", 1);
        let mut b = Session::with_id("b", 2);
        b.display_name = Some("对话 3".into());
        for s in [&mut a, &mut b] {
            s.append_user_turn("开始").unwrap();
            s.append_agent_turn("题目");
        }
        assert_eq!(a.phase(), b.phase());
    }
}
