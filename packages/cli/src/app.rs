// ABOUTME: Application bootstrap for the rehearse binary
// ABOUTME: Builds the InterviewService from InterviewConfig with explicit dependency wiring

use std::sync::Arc;

use anyhow::Context;
use rehearse_ai::{AIService, TextGenerator};
use rehearse_config::InterviewConfig;
use rehearse_interview::{cache_from_config, InterviewService};
use rehearse_storage::{connect, StorageConfig};
use sqlx::SqlitePool;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Log to stderr so JSON output on stdout stays machine-readable
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

pub struct App {
    pub config: InterviewConfig,
    pub pool: SqlitePool,
    pub service: InterviewService,
}

impl App {
    pub async fn from_env() -> anyhow::Result<Self> {
        let config = InterviewConfig::from_env().context("Invalid configuration")?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: InterviewConfig) -> anyhow::Result<Self> {
        let pool = connect(&StorageConfig::at(&config.database_path))
            .await
            .with_context(|| format!("Failed to open database at {}", config.database_path.display()))?;

        let generator = build_generator(&config);
        let cache = cache_from_config(&config, &pool);
        let service = InterviewService::new(pool.clone(), generator, cache, &config)?;

        info!(
            "Rehearse ready (max turns {}, seed policy {:?})",
            config.max_turns, config.seed_policy
        );

        Ok(Self {
            config,
            pool,
            service,
        })
    }
}

fn build_generator(config: &InterviewConfig) -> Arc<dyn TextGenerator> {
    let mut service = AIService::new(config.anthropic_api_key.clone())
        .with_request_timeout(config.generation_timeout());

    if let Some(model) = &config.anthropic_model {
        service = service.with_model(model.clone());
    }
    if let Some(url) = &config.anthropic_api_url {
        service = service.with_api_url(url.clone());
    }

    Arc::new(service)
}
