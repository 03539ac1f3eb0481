// ABOUTME: Runtime configuration for Rehearse loaded from environment variables
// ABOUTME: Every setting has a default; malformed values are rejected rather than coerced

pub mod constants;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rehearse_core::{default_database_path, DEFAULT_MAX_TURNS};
use thiserror::Error;
use tracing::debug;

use constants::*;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 1800;
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_GENERATION_MAX_ATTEMPTS: u32 = 2;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("MAX_TURNS must be an even number of at least 2, got {0}")]
    InvalidMaxTurns(usize),
    #[error("Invalid cache backend: {0}")]
    InvalidCacheBackend(String),
    #[error("Invalid seed policy: {0}")]
    InvalidSeedPolicy(String),
}

/// Where validated generation results are cached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Sqlite,
    Disabled,
}

impl FromStr for CacheBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "sqlite" => Ok(CacheBackend::Sqlite),
            "none" | "disabled" | "off" => Ok(CacheBackend::Disabled),
            _ => Err(ConfigError::InvalidCacheBackend(s.to_string())),
        }
    }
}

/// What starting a conversation does when the seed question already has an ongoing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    /// Return the existing ongoing conversation
    #[default]
    Reuse,
    /// Fail with a duplicate-seed error
    Reject,
}

impl FromStr for SeedPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reuse" => Ok(SeedPolicy::Reuse),
            "reject" => Ok(SeedPolicy::Reject),
            _ => Err(ConfigError::InvalidSeedPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterviewConfig {
    pub database_path: PathBuf,
    pub max_turns: usize,
    pub seed_policy: SeedPolicy,
    pub cache_backend: CacheBackend,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
    pub cache_follow_ups: bool,
    pub generation_timeout_secs: u64,
    pub generation_max_attempts: u32,
    pub prompts_dir: Option<PathBuf>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: Option<String>,
    pub anthropic_api_url: Option<String>,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            max_turns: DEFAULT_MAX_TURNS,
            seed_policy: SeedPolicy::Reuse,
            cache_backend: CacheBackend::Memory,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_follow_ups: true,
            generation_timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
            generation_max_attempts: DEFAULT_GENERATION_MAX_ATTEMPTS,
            prompts_dir: None,
            anthropic_api_key: None,
            anthropic_model: None,
            anthropic_api_url: None,
        }
    }
}

impl InterviewConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (environment, test maps)
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_path = value(REHEARSE_DATABASE_PATH)
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let max_turns = parse_number(REHEARSE_MAX_TURNS, value(REHEARSE_MAX_TURNS))?
            .unwrap_or(defaults.max_turns);
        if max_turns < 2 || max_turns % 2 != 0 {
            return Err(ConfigError::InvalidMaxTurns(max_turns));
        }

        let seed_policy = value(REHEARSE_SEED_POLICY)
            .map(|v| v.parse::<SeedPolicy>())
            .transpose()?
            .unwrap_or(defaults.seed_policy);

        let cache_backend = value(REHEARSE_CACHE_BACKEND)
            .map(|v| v.parse::<CacheBackend>())
            .transpose()?
            .unwrap_or(defaults.cache_backend);

        let cache_ttl_secs = parse_number(REHEARSE_CACHE_TTL_SECS, value(REHEARSE_CACHE_TTL_SECS))?
            .unwrap_or(defaults.cache_ttl_secs);
        let cache_capacity =
            parse_number(REHEARSE_CACHE_CAPACITY, value(REHEARSE_CACHE_CAPACITY))?
                .unwrap_or(defaults.cache_capacity);
        let cache_follow_ups =
            parse_flag(REHEARSE_CACHE_FOLLOW_UPS, value(REHEARSE_CACHE_FOLLOW_UPS))?
                .unwrap_or(defaults.cache_follow_ups);

        let generation_timeout_secs = parse_number(
            REHEARSE_GENERATION_TIMEOUT_SECS,
            value(REHEARSE_GENERATION_TIMEOUT_SECS),
        )?
        .unwrap_or(defaults.generation_timeout_secs);
        let generation_max_attempts: u32 = parse_number(
            REHEARSE_GENERATION_MAX_ATTEMPTS,
            value(REHEARSE_GENERATION_MAX_ATTEMPTS),
        )?
        .unwrap_or(defaults.generation_max_attempts);
        if generation_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: REHEARSE_GENERATION_MAX_ATTEMPTS,
                value: "0".to_string(),
            });
        }

        let config = Self {
            database_path,
            max_turns,
            seed_policy,
            cache_backend,
            cache_ttl_secs,
            cache_capacity,
            cache_follow_ups,
            generation_timeout_secs,
            generation_max_attempts,
            prompts_dir: value(REHEARSE_PROMPTS_DIR).map(PathBuf::from),
            anthropic_api_key: value(ANTHROPIC_API_KEY),
            anthropic_model: value(ANTHROPIC_MODEL),
            anthropic_api_url: value(ANTHROPIC_API_URL),
        };

        debug!(
            "Loaded config: max_turns={}, cache={:?}, ttl={}s, timeout={}s",
            config.max_turns,
            config.cache_backend,
            config.cache_ttl_secs,
            config.generation_timeout_secs
        );

        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

fn parse_number<T: FromStr>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError> {
    raw.map(|v| {
        v.trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: v })
    })
    .transpose()
}

fn parse_flag(key: &'static str, raw: Option<String>) -> Result<Option<bool>, ConfigError> {
    raw.map(|v| match v.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value: v }),
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<InterviewConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        InterviewConfig::from_source(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.max_turns, 8);
        assert_eq!(config.seed_policy, SeedPolicy::Reuse);
        assert_eq!(config.cache_backend, CacheBackend::Memory);
        assert_eq!(config.cache_ttl(), Duration::from_secs(1800));
        assert!(config.cache_follow_ups);
        assert_eq!(config.generation_max_attempts, 2);
        assert!(config.anthropic_api_key.is_none());
        assert!(config.prompts_dir.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            (REHEARSE_MAX_TURNS, "4"),
            (REHEARSE_SEED_POLICY, "reject"),
            (REHEARSE_CACHE_BACKEND, "none"),
            (REHEARSE_CACHE_FOLLOW_UPS, "false"),
            (REHEARSE_DATABASE_PATH, "/tmp/rehearse-test.db"),
            (REHEARSE_PROMPTS_DIR, "/tmp/rehearse-prompts"),
        ])
        .unwrap();

        assert_eq!(config.max_turns, 4);
        assert_eq!(config.seed_policy, SeedPolicy::Reject);
        assert_eq!(config.cache_backend, CacheBackend::Disabled);
        assert!(!config.cache_follow_ups);
        assert_eq!(config.database_path, PathBuf::from("/tmp/rehearse-test.db"));
        assert_eq!(config.prompts_dir, Some(PathBuf::from("/tmp/rehearse-prompts")));
    }

    #[test]
    fn test_odd_turn_budget_is_rejected() {
        let err = config_from(&[(REHEARSE_MAX_TURNS, "7")]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidMaxTurns(7));
        assert!(config_from(&[(REHEARSE_MAX_TURNS, "0")]).is_err());
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        assert!(matches!(
            config_from(&[(REHEARSE_CACHE_TTL_SECS, "half an hour")]),
            Err(ConfigError::InvalidValue { key: REHEARSE_CACHE_TTL_SECS, .. })
        ));
        assert!(matches!(
            config_from(&[(REHEARSE_CACHE_BACKEND, "redis")]),
            Err(ConfigError::InvalidCacheBackend(_))
        ));
        assert!(matches!(
            config_from(&[(REHEARSE_GENERATION_MAX_ATTEMPTS, "0")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        env::set_var(REHEARSE_CACHE_TTL_SECS, "60");
        let config = InterviewConfig::from_env().unwrap();
        env::remove_var(REHEARSE_CACHE_TTL_SECS);

        assert_eq!(config.cache_ttl_secs, 60);
    }
}
