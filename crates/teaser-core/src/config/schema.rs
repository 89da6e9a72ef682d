//! Configuration schema.
//!
//! Hierarchy: `Config` → `ServerConfig`, `GameConfig`, `StorageConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};

use crate::session::history::DEFAULT_NAME_PREFIX;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.teaser/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub server: ServerConfig,
    pub game: GameConfig,
    pub storage: StorageConfig,
}

// ─────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────

/// Where the brain-teaser backend lives.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Base URL; requests go to `{apiBase}/chat/{roomId}`.
    pub api_base: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8123/api".to_string(),
            timeout_secs: 60,
        }
    }
}

// ─────────────────────────────────────────────
// Game
// ─────────────────────────────────────────────

/// Keywords and canned texts used by the turn orchestrator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    /// Sent by the "begin game" command.
    pub start_keyword: String,
    /// Sent by the "end game" command.
    pub end_keyword: String,
    /// Agent turn substituted when the backend call fails.
    pub fallback_reply: String,
    /// Prefix for generated session names (`"<prefix> <n>"`).
    pub name_prefix: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_keyword: "开始".to_string(),
            end_keyword: "结束".to_string(),
            fallback_reply: "抱歉，发送消息失败，请稍后重试。".to_string(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────

/// Local persistence settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Directory for the key-value files (`~` is expanded).
    pub dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: "~/.teaser/storage".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.timeout_secs, 60);
        assert_eq!(config.game.start_keyword, "开始");
        assert_eq!(config.game.end_keyword, "结束");
        assert_eq!(config.game.name_prefix, "对话");
        assert_eq!(config.storage.dir, "~/.teaser/storage");
    }

    #[test]
    fn test_camel_case_keys() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json["server"].get("apiBase").is_some());
        assert!(json["server"].get("timeoutSecs").is_some());
        assert!(json["game"].get("fallbackReply").is_some());
        assert!(json["game"].get("fallback_reply").is_none());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"game": {"startKeyword": "start"}}"#).unwrap();
        assert_eq!(config.game.start_keyword, "start");
        assert_eq!(config.game.end_keyword, "结束");
        assert_eq!(config.server.timeout_secs, 60);
    }
}
