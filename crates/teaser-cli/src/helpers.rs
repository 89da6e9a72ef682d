//! Shared CLI helpers — path expansion, turn printing, history listing.

use std::path::PathBuf;

use chrono::Local;
use colored::Colorize;

use teaser_core::session::{HistoryStatus, SessionIndex};
use teaser_core::types::{Session, Turn, TurnRole};
use teaser_core::utils::truncate_string;
use teaser_core::GamePhase;

/// Width of the preview column in history listings.
const PREVIEW_CHARS: usize = 40;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print an agent turn to stdout.
pub fn print_agent_turn(turn: &Turn) {
    println!();
    let label = if turn.fallback {
        "🧩 Teaser (offline)".yellow().bold()
    } else {
        "🧩 Teaser".cyan().bold()
    };
    println!("{label}");
    println!("{}", turn.content);
    println!();
}

/// Replay a whole session, e.g. after `/load`.
pub fn print_transcript(session: &Session) {
    if session.turns.is_empty() {
        println!("{}", "(empty session)".dimmed());
        return;
    }
    for turn in &session.turns {
        match turn.role {
            TurnRole::User => println!("{} {}", "You:".green().bold(), turn.content),
            TurnRole::Agent => print_agent_turn(turn),
        }
    }
}

/// Short colored label for a game phase.
pub fn phase_label(phase: GamePhase) -> String {
    match phase {
        GamePhase::NotStarted => phase.to_string().dimmed().to_string(),
        GamePhase::Started => phase.to_string().green().to_string(),
        GamePhase::Ended => phase.to_string().yellow().to_string(),
    }
}

/// Print the banner shown at REPL start.
pub fn print_banner(session: &Session) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🧩 Teaser".cyan().bold(), version.dimmed());
    println!(
        "{}",
        format!("room {} · session {}", session.room_id, session.id).dimmed()
    );
    println!(
        "{}",
        "Type /start to play, /help for commands, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Warn that history writes are not reaching disk.
pub fn print_history_warning(status: &HistoryStatus) {
    if let HistoryStatus::Unavailable { reason } = status {
        eprintln!(
            "{} history unavailable, changes kept in memory only ({})",
            "⚠".yellow(),
            reason.dimmed()
        );
    }
}

/// One line of a history listing.
pub fn format_history_row(session: &Session, active: bool) -> String {
    let marker = if active { "*" } else { " " };
    let name = session.display_name.as_deref().unwrap_or("(unnamed)");
    let created = session
        .created_at
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let preview = session
        .turns
        .first()
        .map(|t| truncate_string(&t.content, PREVIEW_CHARS))
        .unwrap_or_default();

    format!(
        "{marker} {:<28} {:<10} {:<16} {:<11} {}",
        session.id,
        name,
        created,
        session.phase().to_string(),
        preview
    )
}

/// Print the saved sessions, most recent first.
pub fn print_history(index: &SessionIndex, active_id: Option<&str>) {
    if index.is_empty() {
        println!("{}", "No saved sessions.".dimmed());
        return;
    }
    println!(
        "{}",
        format!(
            "  {:<28} {:<10} {:<16} {:<11} {}",
            "ID", "NAME", "CREATED", "PHASE", "FIRST MESSAGE"
        )
        .bold()
    );
    for session in index {
        println!("{}", format_history_row(session, Some(session.id.as_str()) == active_id));
    }
}

/// Show a placeholder while the backend is answering.
pub fn print_thinking() {
    eprint!("{}", "⠿ waiting for the host...".dimmed());
}

/// Clear the waiting placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
