// ABOUTME: Shared constants for Rehearse
// ABOUTME: Default turn ceiling and the data directory layout under the home directory

use std::env;
use std::path::PathBuf;

/// Total-turn ceiling for a conversation (PROMPT and RESPONSE turns combined)
pub const DEFAULT_MAX_TURNS: usize = 8;

/// Get the path to the Rehearse directory (~/.rehearse)
pub fn rehearse_dir() -> PathBuf {
    // First try HOME environment variable (useful for tests)
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".rehearse")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rehearse")
    }
}

/// Get the default database path (~/.rehearse/rehearse.db)
pub fn default_database_path() -> PathBuf {
    rehearse_dir().join("rehearse.db")
}
