//! Configuration — JSON file at `~/.teaser/config.json` plus env overrides.

pub mod loader;
pub mod schema;

pub use loader::{get_config_path, load_config, save_config};
pub use schema::{Config, GameConfig, ServerConfig, StorageConfig};
