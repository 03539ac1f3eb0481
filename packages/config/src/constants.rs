// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Rehearse

// Storage
pub const REHEARSE_DATABASE_PATH: &str = "REHEARSE_DATABASE_PATH";

// Conversation engine
pub const REHEARSE_MAX_TURNS: &str = "REHEARSE_MAX_TURNS";
pub const REHEARSE_SEED_POLICY: &str = "REHEARSE_SEED_POLICY";

// Generation cache
pub const REHEARSE_CACHE_BACKEND: &str = "REHEARSE_CACHE_BACKEND";
pub const REHEARSE_CACHE_TTL_SECS: &str = "REHEARSE_CACHE_TTL_SECS";
pub const REHEARSE_CACHE_CAPACITY: &str = "REHEARSE_CACHE_CAPACITY";
pub const REHEARSE_CACHE_FOLLOW_UPS: &str = "REHEARSE_CACHE_FOLLOW_UPS";

// Generation calls
pub const REHEARSE_GENERATION_TIMEOUT_SECS: &str = "REHEARSE_GENERATION_TIMEOUT_SECS";
pub const REHEARSE_GENERATION_MAX_ATTEMPTS: &str = "REHEARSE_GENERATION_MAX_ATTEMPTS";

// Prompt documents overriding the embedded set
pub const REHEARSE_PROMPTS_DIR: &str = "REHEARSE_PROMPTS_DIR";

// Provider
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_MODEL: &str = "ANTHROPIC_MODEL";
pub const ANTHROPIC_API_URL: &str = "ANTHROPIC_API_URL";
