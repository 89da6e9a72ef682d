//! Interactive REPL for playing a game session.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Plain lines are sent as player turns; lines starting with `/` are
//! session commands.

use std::future::Future;

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use teaser_core::session::{HistoryStatus, InputRejection};
use teaser_core::utils::random_room_id;
use teaser_core::{GamePhase, SessionError, SessionManager, TurnOutcome};

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

const HELP: &str = "\
  /start          begin the game
  /end            end the game
  /new [room]     open a fresh session (random room if omitted)
  /history        list saved sessions
  /load <id>      resume a saved session
  /delete <id>    delete a saved session
  /help           show this help
  exit            quit";

/// A parsed line of REPL input.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Exit,
    Help,
    Start,
    End,
    New(Option<u32>),
    History,
    Load(&'a str),
    Delete(&'a str),
    /// A known command used with bad arguments.
    Usage(&'static str),
    Unknown(&'a str),
    /// Plain text for the game.
    Say(&'a str),
}

/// Classify a trimmed, non-empty input line.
fn parse_command(input: &str) -> ReplCommand<'_> {
    if is_exit_command(input) {
        return ReplCommand::Exit;
    }
    if !input.starts_with('/') {
        return ReplCommand::Say(input);
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    match (name, arg) {
        ("/help", _) => ReplCommand::Help,
        ("/start", None) => ReplCommand::Start,
        ("/end", None) => ReplCommand::End,
        ("/history", None) => ReplCommand::History,
        ("/new", None) => ReplCommand::New(None),
        ("/new", Some(room)) => match room.parse::<u32>() {
            Ok(n) if n > 0 => ReplCommand::New(Some(n)),
            _ => ReplCommand::Usage("/new [room]  (room must be a positive integer)"),
        },
        ("/load", Some(id)) => ReplCommand::Load(id),
        ("/load", None) => ReplCommand::Usage("/load <id>"),
        ("/delete", Some(id)) => ReplCommand::Delete(id),
        ("/delete", None) => ReplCommand::Usage("/delete <id>"),
        ("/start", Some(_)) => ReplCommand::Usage("/start"),
        ("/end", Some(_)) => ReplCommand::Usage("/end"),
        ("/history", Some(_)) => ReplCommand::Usage("/history"),
        _ => ReplCommand::Unknown(name),
    }
}

/// Run the interactive REPL loop.
pub async fn run(manager: SessionManager) -> Result<()> {
    let active = manager.snapshot();
    helpers::print_banner(&active);
    if !active.turns.is_empty() {
        helpers::print_transcript(&active);
    }

    let mut editor = create_editor()?;
    let mut last_status = HistoryStatus::Saved;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                // Ctrl-C
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                // Ctrl-D
                break;
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let command = parse_command(trimmed);
        if command != ReplCommand::Exit {
            let _ = editor.add_history_entry(&input);
        }
        debug!(?command, "repl input");

        match command {
            ReplCommand::Exit => {
                println!("\nGoodbye! 👋");
                break;
            }
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Start => report_turn(
                with_thinking(manager.begin()).await,
                "the game has already started",
            ),
            ReplCommand::End => report_turn(
                with_thinking(manager.end()).await,
                "the game has already ended",
            ),
            ReplCommand::Say(text) => report_turn(with_thinking(manager.submit(text)).await, ""),
            ReplCommand::New(room) => {
                let room_id = room.unwrap_or_else(random_room_id);
                let session = manager.new_session(room_id);
                println!(
                    "{}",
                    format!("new session {} in room {}", session.id, session.room_id).dimmed()
                );
            }
            ReplCommand::History => {
                let active_id = manager.snapshot().id;
                helpers::print_history(&manager.index(), Some(&active_id));
            }
            ReplCommand::Load(id) => match manager.select_session(id) {
                Ok(session) => {
                    println!(
                        "{}",
                        format!(
                            "resumed {} · room {} · {}",
                            session.display_name.as_deref().unwrap_or(&session.id),
                            session.room_id,
                            helpers::phase_label(session.phase())
                        )
                        .dimmed()
                    );
                    helpers::print_transcript(&session);
                }
                Err(e) => eprintln!("❌ {e}"),
            },
            ReplCommand::Delete(id) => match manager.delete_session(id) {
                Ok(true) => println!("{} deleted {id}", "✓".green()),
                Ok(false) => println!("{}", format!("no saved session {id}").dimmed()),
                Err(e) => eprintln!("❌ {e}"),
            },
            ReplCommand::Usage(usage) => eprintln!("usage: {usage}"),
            ReplCommand::Unknown(name) => {
                eprintln!("unknown command {name}, type /help for a list")
            }
        }

        // Only warn when durability changes, not on every turn.
        let status = manager.history_status();
        if status != last_status {
            helpers::print_history_warning(&status);
            if status.is_available() {
                println!("{}", "history saved again".dimmed());
            }
            last_status = status;
        }
    }

    save_history(&mut editor);

    Ok(())
}

/// Await a turn with the waiting placeholder on stderr.
async fn with_thinking<T>(turn: impl Future<Output = T>) -> T {
    helpers::print_thinking();
    let result = turn.await;
    helpers::clear_thinking();
    result
}

/// Print the result of a turn-taking command.
fn report_turn(result: Result<TurnOutcome, SessionError>, skipped_note: &str) {
    match result {
        Ok(TurnOutcome::Skipped) => println!("{}", skipped_note.dimmed()),
        Ok(outcome) => {
            if let Some(session) = outcome.session() {
                if let Some(turn) = session.last_turn() {
                    helpers::print_agent_turn(turn);
                }
                if session.phase() == GamePhase::Ended {
                    println!(
                        "{}",
                        "Game over. /new for another round, /history to browse.".dimmed()
                    );
                }
            }
        }
        Err(SessionError::InvalidInput(InputRejection::TurnInFlight)) => {
            eprintln!("{}", "still waiting for the last reply".yellow())
        }
        Err(e) => eprintln!("❌ {e}"),
    }
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the readline history file.
fn history_path() -> std::path::PathBuf {
    teaser_core::utils::get_data_path()
        .join("history")
        .join("cli_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
