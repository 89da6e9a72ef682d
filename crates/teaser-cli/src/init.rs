//! `teaser init` — write the default config and create the storage dir.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use teaser_core::config::{get_config_path, load_config, save_config};

/// Run the init command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "🧩 Teaser — Setup".cyan().bold());
    println!();

    setup(&get_config_path())?;

    println!();
    println!(
        "{}",
        "  Setup complete! Run `teaser play` to start a game.".green()
    );
    println!();

    Ok(())
}

/// Create the config at `config_path` unless present, then the storage dir
/// it names.
fn setup(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        let config = load_config(Some(config_path)); // defaults + env
        save_config(&config, Some(config_path))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
    }

    let config = load_config(Some(config_path));
    let storage_dir = crate::helpers::expand_tilde(&config.storage.dir);
    std::fs::create_dir_all(&storage_dir)
        .with_context(|| format!("failed to create {}", storage_dir.display()))?;
    println!("  {} storage at {}", "✓".green(), storage_dir.display());

    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
