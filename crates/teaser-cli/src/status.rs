//! `teaser status` — show configuration and history status.

use anyhow::Result;
use colored::Colorize;

use teaser_core::config::{get_config_path, load_config};
use teaser_core::session::HistoryStore;

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "🧩 Teaser Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        found_marker(config_path.exists())
    );

    println!("  {:<18} {}", "API base:".bold(), config.server.api_base);
    println!(
        "  {:<18} {}",
        "Timeout:".bold(),
        format!("{}s", config.server.timeout_secs).dimmed()
    );
    println!(
        "  {:<18} {} / {}",
        "Keywords:".bold(),
        config.game.start_keyword,
        config.game.end_keyword
    );

    // Storage
    let storage_dir = crate::helpers::expand_tilde(&config.storage.dir);
    println!(
        "  {:<18} {} {}",
        "Storage:".bold(),
        storage_dir.display(),
        found_marker(storage_dir.is_dir())
    );

    if storage_dir.is_dir() {
        let backend = crate::open_store(&config, false)?;
        let index = HistoryStore::new(backend).load_index();
        let ended = index
            .iter()
            .filter(|s| s.phase() == teaser_core::GamePhase::Ended)
            .count();
        println!(
            "  {:<18} {} {}",
            "Sessions:".bold(),
            index.len(),
            format!("({ended} finished)").dimmed()
        );
    }

    println!();

    Ok(())
}

fn found_marker(found: bool) -> String {
    if found {
        "✓".green().to_string()
    } else {
        "(not found)".red().to_string()
    }
}
