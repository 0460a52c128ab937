//! Application state for the legal intel API

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use risk_engine::{builtin_rules, RiskEngine, RuleSet};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::Config;

pub struct AppState {
    pub db: SqlitePool,
    pub engine: Arc<RiskEngine>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config, database_url: Option<&str>, rules: Option<&Path>) -> Result<Self> {
        let rules = match rules {
            Some(path) => {
                tracing::info!("Loading classifier rules from {}", path.display());
                Arc::new(RuleSet::from_path(path)?)
            }
            None => builtin_rules(),
        };
        tracing::info!("Classifier ready with {} rules", rules.len());

        let db_url = match database_url {
            Some(url) => url.to_string(),
            None => default_database_url(),
        };
        tracing::info!("Connecting to database: {}", db_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .with_context(|| format!("Failed to open database {}", db_url))?;

        Self::with_pool(pool, config, rules).await
    }

    /// Fresh in-memory database with the built-in rules
    pub async fn in_memory(config: Config) -> Result<Self> {
        // Each in-memory connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool, config, builtin_rules()).await
    }

    async fn with_pool(pool: SqlitePool, config: Config, rules: Arc<RuleSet>) -> Result<Self> {
        Self::run_migrations(&pool).await?;

        Ok(Self {
            db: pool,
            engine: Arc::new(RiskEngine::new(rules)),
            config,
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_login TEXT
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                filename TEXT NOT NULL,
                file_type TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                content_hash TEXT NOT NULL,
                extracted_text TEXT NOT NULL,
                processing_status TEXT NOT NULL DEFAULT 'completed',
                risk_level TEXT NOT NULL,
                compliance_status TEXT NOT NULL,
                confidence_score INTEGER NOT NULL,
                risk_score INTEGER NOT NULL,
                agreement_type TEXT NOT NULL,
                indicators_json TEXT NOT NULL DEFAULT '[]',
                insights_json TEXT NOT NULL DEFAULT '{}',
                metadata_json TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        for index in [
            "CREATE INDEX IF NOT EXISTS idx_documents_risk ON documents(risk_level)",
            "CREATE INDEX IF NOT EXISTS idx_documents_compliance ON documents(compliance_status)",
            "CREATE INDEX IF NOT EXISTS idx_documents_created ON documents(created_at)",
        ] {
            sqlx::query(index).execute(pool).await?;
        }

        tracing::info!("Migrations complete");
        Ok(())
    }
}

fn default_database_url() -> String {
    let data_dir = data_dir().join("legal-intel");
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::warn!("Could not create {}: {}", data_dir.display(), e);
    }
    format!("sqlite:{}/legal-intel.db?mode=rwc", data_dir.display())
}

/// Per-user data directory, falling back to the working directory
fn data_dir() -> PathBuf {
    let env_path = |key: &str| std::env::var_os(key).map(PathBuf::from);
    let home = env_path("HOME");

    let dir = if cfg!(target_os = "macos") {
        home.map(|h| h.join("Library/Application Support"))
    } else if cfg!(target_os = "windows") {
        env_path("APPDATA")
    } else {
        env_path("XDG_DATA_HOME").or_else(|| home.map(|h| h.join(".local/share")))
    };

    dir.unwrap_or_else(|| PathBuf::from("."))
}
