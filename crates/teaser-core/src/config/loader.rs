//! Config loader — reads `~/.teaser/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.teaser/config.json`
//! 3. Environment variables `TEASER_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path (or `path`) + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `TEASER_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `TEASER_SERVER__API_BASE` → `server.api_base`
/// - `TEASER_SERVER__TIMEOUT_SECS` → `server.timeout_secs`
/// - `TEASER_GAME__START_KEYWORD` → `game.start_keyword`
/// - `TEASER_GAME__END_KEYWORD` → `game.end_keyword`
/// - `TEASER_GAME__FALLBACK_REPLY` → `game.fallback_reply`
/// - `TEASER_GAME__NAME_PREFIX` → `game.name_prefix`
/// - `TEASER_STORAGE__DIR` → `storage.dir`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("TEASER_SERVER__API_BASE") {
        config.server.api_base = val;
    }
    if let Ok(val) = std::env::var("TEASER_SERVER__TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.server.timeout_secs = n;
        }
    }

    if let Ok(val) = std::env::var("TEASER_GAME__START_KEYWORD") {
        config.game.start_keyword = val;
    }
    if let Ok(val) = std::env::var("TEASER_GAME__END_KEYWORD") {
        config.game.end_keyword = val;
    }
    if let Ok(val) = std::env::var("TEASER_GAME__FALLBACK_REPLY") {
        config.game.fallback_reply = val;
    }
    if let Ok(val) = std::env::var("TEASER_GAME__NAME_PREFIX") {
        config.game.name_prefix = val;
    }

    if let Ok(val) = std::env::var("TEASER_STORAGE__DIR") {
        config.storage.dir = val;
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};
    use tempfile::NamedTempFile;

    // Env overrides are process-wide; serialize every test that reads them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let _env = env_lock();
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert_eq!(config.game.end_keyword, "结束");
        assert_eq!(config.server.timeout_secs, 60);
    }

    #[test]
    fn test_load_valid_json() {
        let _env = env_lock();
        let file = write_temp_json(
            r#"{
            "server": {
                "apiBase": "http://teaser.example:9000/api",
                "timeoutSecs": 15
            }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.server.api_base, "http://teaser.example:9000/api");
        assert_eq!(config.server.timeout_secs, 15);
        assert_eq!(config.game.start_keyword, "开始");
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let _env = env_lock();
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.server.timeout_secs, 60);
    }

    #[test]
    fn test_load_wrong_types_returns_defaults() {
        let _env = env_lock();
        let file = write_temp_json(r#"{"server": {"timeoutSecs": "soon"}}"#);
        let config = load_config_from_path(file.path());
        assert_eq!(config.server.timeout_secs, 60);
    }

    #[test]
    fn test_unknown_top_level_keys_ignored() {
        let _env = env_lock();
        let file = write_temp_json(
            r#"{"apiBase": "http://elsewhere/api", "game": {"endKeyword": "stop"}}"#,
        );
        let config = load_config_from_path(file.path());
        assert_eq!(config.server.api_base, "http://localhost:8123/api");
        assert_eq!(config.game.end_keyword, "stop");
    }

    #[test]
    fn test_save_and_reload() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.game.fallback_reply = "sorry, try again".to_string();
        config.storage.dir = "/tmp/teaser".to_string();

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.game.fallback_reply, "sorry, try again");
        assert_eq!(reloaded.storage.dir, "/tmp/teaser");
    }

    #[test]
    fn test_env_override_api_base() {
        let _env = env_lock();
        std::env::set_var("TEASER_SERVER__API_BASE", "http://env:1234/api");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.server.api_base, "http://env:1234/api");
        std::env::remove_var("TEASER_SERVER__API_BASE");
    }

    #[test]
    fn test_env_override_timeout_ignores_garbage() {
        let _env = env_lock();
        std::env::set_var("TEASER_SERVER__TIMEOUT_SECS", "never");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.server.timeout_secs, 60);
        std::env::remove_var("TEASER_SERVER__TIMEOUT_SECS");
    }

    #[test]
    fn test_env_override_game_keywords() {
        let _env = env_lock();
        std::env::set_var("TEASER_GAME__END_KEYWORD", "stop");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.game.end_keyword, "stop");
        std::env::remove_var("TEASER_GAME__END_KEYWORD");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["game"].get("startKeyword").is_some());
        assert!(raw["game"].get("start_keyword").is_none());
    }
}
