//! `teaser history` — inspect and prune saved sessions from the CLI.
//!
//! - `teaser history list` — all saved sessions, most recent first
//! - `teaser history show <id>` — print one session's transcript
//! - `teaser history delete <id>` — remove a session

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;

use teaser_core::config::{load_config, Config};
use teaser_core::session::HistoryStore;

use crate::helpers;

// ─────────────────────────────────────────────
// Subcommand enum
// ─────────────────────────────────────────────

/// History subcommands.
#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List saved sessions
    List,

    /// Print the transcript of a saved session
    Show {
        /// Session id (see `teaser history list`)
        id: String,
    },

    /// Delete a saved session
    Delete {
        /// Session id (see `teaser history list`)
        id: String,
    },
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

/// Dispatch a history subcommand.
pub fn dispatch(cmd: HistoryCommands) -> Result<()> {
    let config = load_config(None);
    let store = open_history(&config)?;

    match cmd {
        HistoryCommands::List => list(&store),
        HistoryCommands::Show { id } => show(&store, &id),
        HistoryCommands::Delete { id } => delete(&store, &id),
    }
}

fn open_history(config: &Config) -> Result<HistoryStore> {
    let backend = crate::open_store(config, false)?;
    Ok(HistoryStore::with_name_prefix(
        backend,
        config.game.name_prefix.clone(),
    ))
}

/// `teaser history list`
fn list(store: &HistoryStore) -> Result<()> {
    let index = store.load_index();
    println!();
    helpers::print_history(&index, None);
    println!();
    println!("  {}", format!("{} session(s)", index.len()).dimmed());
    println!();
    Ok(())
}

/// `teaser history show <id>`
fn show(store: &HistoryStore, id: &str) -> Result<()> {
    let index = store.load_index();
    let Some(session) = index.get(id) else {
        bail!("no saved session {id}");
    };

    println!();
    println!(
        "{}  {}",
        session.display_name.as_deref().unwrap_or(id).bold(),
        format!("room {} · {}", session.room_id, helpers::phase_label(session.phase())).dimmed()
    );
    println!();
    helpers::print_transcript(session);
    Ok(())
}

/// `teaser history delete <id>`
fn delete(store: &HistoryStore, id: &str) -> Result<()> {
    let index = store.load_index();
    if !index.contains(id) {
        println!("  {}", format!("no saved session {id}").dimmed());
        return Ok(());
    }

    let persisted = store.remove(id, index);
    if !persisted.status.is_available() {
        helpers::print_history_warning(&persisted.status);
        bail!("failed to delete {id}");
    }

    println!("  {} deleted {id}", "✓".green());
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
