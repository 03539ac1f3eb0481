// ABOUTME: Core types and utilities for Rehearse
// ABOUTME: Shared interview vocabulary used by every Rehearse package

pub mod constants;
pub mod types;
pub mod utils;

// Re-export main types
pub use types::{ConversationStatus, ParseEnumError, Purpose, QuestionCategory, TurnRole};

// Re-export constants
pub use constants::{default_database_path, rehearse_dir, DEFAULT_MAX_TURNS};

// Re-export utilities
pub use utils::{generate_id, now_rfc3339, parse_timestamp, truncate};
