// ABOUTME: SQLite connection management and schema migrations for Rehearse
// ABOUTME: Builds configured pools (WAL, foreign keys) and applies the embedded migrations

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

use rehearse_core::default_database_path;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Database error: {0}")]
    Database(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub enable_wal: bool,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            enable_wal: true,
            max_connections: 10,
            busy_timeout_seconds: 30,
        }
    }
}

impl StorageConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Open (creating if needed) the database described by `config` and run migrations
pub async fn connect(config: &StorageConfig) -> StorageResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let journal_mode = if config.enable_wal {
        SqliteJournalMode::Wal
    } else {
        SqliteJournalMode::Delete
    };

    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .journal_mode(journal_mode)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(config.busy_timeout_seconds));

    debug!("Opening database at: {}", config.path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.busy_timeout_seconds))
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    info!("Database ready at {}", config.path.display());

    Ok(pool)
}

/// Single-connection in-memory database with the schema applied
pub async fn connect_in_memory() -> StorageResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    // One connection only: every :memory: connection is its own database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> StorageResult<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Whether an error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_connect_creates_database_and_schema() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig::at(dir.path().join("nested").join("rehearse.db"));

        let pool = connect(&config).await.unwrap();

        let tables: Vec<String> = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.get("name"))
        .collect();

        for expected in [
            "conversations",
            "feedback",
            "generation_cache",
            "question_sets",
            "questions",
            "turns",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table {}", expected);
        }
        assert!(config.path.exists());
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let pool = connect_in_memory().await.unwrap();

        let result = sqlx::query(
            "INSERT INTO turns (id, conversation_id, position, role, content, created_at)
             VALUES ('turn-0001', 'missing-conv', 0, 'PROMPT', 'hi', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_only_one_ongoing_conversation_per_seed() {
        let pool = connect_in_memory().await.unwrap();
        let insert = |id: &'static str| {
            sqlx::query(
                "INSERT INTO conversations (id, seed_question_id, seed_question_text, category, status, created_at, updated_at)
                 VALUES (?, 'seed-1', 'Why?', 'PROJECT', 'ONGOING', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            )
            .bind(id)
        };

        insert("conv-0001").execute(&pool).await.unwrap();
        let err = insert("conv-0002").execute(&pool).await.unwrap_err();
        assert!(is_unique_violation(&err));

        // Once the first one ends, the seed may be reused
        sqlx::query("UPDATE conversations SET status = 'ENDED' WHERE id = 'conv-0001'")
            .execute(&pool)
            .await
            .unwrap();
        insert("conv-0002").execute(&pool).await.unwrap();
    }
}
