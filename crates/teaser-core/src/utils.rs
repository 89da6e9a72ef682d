//! Utility helpers — data path, room ids, string manipulation.

use std::path::PathBuf;

use rand::Rng;

/// Upper bound (exclusive) for generated room ids.
pub const MAX_ROOM_ID: u32 = 1_000_000;

/// Get the Teaser data directory (e.g. `~/.teaser/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".teaser")
}

/// Pick a random positive room id in `1..MAX_ROOM_ID`.
pub fn random_room_id() -> u32 {
    rand::thread_rng().gen_range(1..MAX_ROOM_ID)
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Sanitize a string for use as a filename.
pub fn safe_filename(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
