//! Teaser CLI — entry point.
//!
//! # Commands
//!
//! - `teaser play [--room N] [--session ID] [--ephemeral]` — interactive game REPL
//! - `teaser history list|show|delete` — inspect or prune saved sessions
//! - `teaser init` — write the default config and create the storage dir
//! - `teaser status` — show configuration and history status

mod helpers;
mod history_cmd;
mod init;
mod repl;
mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use teaser_client::HttpChatClient;
use teaser_core::config::{load_config, Config};
use teaser_core::session::HistoryStore;
use teaser_core::storage::{FileStore, KeyValueStore, MemoryStore};
use teaser_core::utils::random_room_id;
use teaser_core::SessionManager;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🧩 Teaser — brain-teaser game sessions from the terminal
#[derive(Parser)]
#[command(name = "teaser", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play in an interactive REPL
    Play {
        /// Backend room id. A random one is picked when omitted.
        #[arg(short, long)]
        room: Option<u32>,

        /// Resume a saved session by id
        #[arg(short, long)]
        session: Option<String>,

        /// Keep history in memory only
        #[arg(long, default_value_t = false)]
        ephemeral: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Inspect or prune saved sessions
    History {
        #[command(subcommand)]
        action: history_cmd::HistoryCommands,
    },

    /// Write the default config and create the storage directory
    Init,

    /// Show configuration and history status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            room,
            session,
            ephemeral,
            logs,
        } => {
            init_logging(logs);
            run_play(room, session, ephemeral).await
        }
        Commands::History { action } => {
            init_logging(false);
            history_cmd::dispatch(action)
        }
        Commands::Init => init::run(),
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Play command
// ─────────────────────────────────────────────

async fn run_play(room: Option<u32>, session_id: Option<String>, ephemeral: bool) -> Result<()> {
    let config = load_config(None);
    let room_id = room.unwrap_or_else(random_room_id);
    let manager = build_manager(&config, room_id, ephemeral)?;

    if let Some(id) = session_id {
        manager
            .select_session(&id)
            .with_context(|| format!("cannot resume session {id}"))?;
        info!(session = %id, "resumed saved session");
    }

    repl::run(manager).await
}

/// Open the key-value backend described by the config.
pub fn open_store(config: &Config, ephemeral: bool) -> Result<Arc<dyn KeyValueStore>> {
    if ephemeral {
        return Ok(Arc::new(MemoryStore::new()));
    }

    let dir = helpers::expand_tilde(&config.storage.dir);
    let store = FileStore::open(&dir)
        .with_context(|| format!("failed to open storage dir: {}", dir.display()))?;
    Ok(Arc::new(store))
}

/// Build a `SessionManager` from the loaded configuration.
pub fn build_manager(config: &Config, room_id: u32, ephemeral: bool) -> Result<SessionManager> {
    let store = open_store(config, ephemeral)?;
    let history = HistoryStore::with_name_prefix(store, config.game.name_prefix.clone());

    let client = HttpChatClient::new(&config.server).context("failed to build HTTP client")?;
    info!(api_base = client.api_base(), room_id, ephemeral, "backend configured");

    Ok(SessionManager::new(
        history,
        Arc::new(client),
        config.game.clone(),
        room_id,
    ))
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("teaser=debug,teaser_core=debug,teaser_client=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_play_flags() {
        let cli = Cli::try_parse_from(["teaser", "play", "--room", "42", "--ephemeral"]).unwrap();
        match cli.command {
            Commands::Play {
                room,
                session,
                ephemeral,
                logs,
            } => {
                assert_eq!(room, Some(42));
                assert!(session.is_none());
                assert!(ephemeral);
                assert!(!logs);
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn parse_history_delete() {
        let cli = Cli::try_parse_from(["teaser", "history", "delete", "history_1_abcd"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::History {
                action: history_cmd::HistoryCommands::Delete { .. }
            }
        ));
    }

    #[test]
    fn build_manager_ephemeral_starts_empty() {
        let manager = build_manager(&Config::default(), 7, true).unwrap();
        assert!(manager.index().is_empty());
        assert_eq!(manager.snapshot().room_id, 7);
        assert!(manager.snapshot().turns.is_empty());
    }

    #[test]
    fn open_store_creates_storage_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.dir = dir.path().join("store").to_string_lossy().into_owned();

        open_store(&config, false).unwrap();
        assert!(dir.path().join("store").is_dir());
    }
}
