//! SQLite-backed storage for the bearer token + identity snapshot pair.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use classconnect_core::Identity;

/// Error surfaced by the credential store.
#[derive(Debug, thiserror::Error)]
#[error("{0:#}")]
pub struct StoreError(#[from] anyhow::Error);

/// The persisted pair: an opaque bearer token and the identity snapshot the
/// server returned alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialRecord {
    pub token: String,
    pub identity: Identity,
}

/// SQLite-backed credential store.
///
/// The pair lives in a single row (`slot = 0`) and is written by one upsert
/// statement, so a reader never observes a token without its matching
/// identity. SQLite serializes the writes; no extra locking here.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    /// Open (or create) the store at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create credential directory at {parent:?}"))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("failed to open credential store at {path:?}"))?;

        Self::init(&pool).await?;
        Ok(Self { pool })
    }

    /// Open the store at the platform's default location,
    /// `{app_data_dir}/classconnect/credentials.db`.
    pub async fn open_default() -> Result<Self, StoreError> {
        Self::open(default_db_path()?).await
    }

    /// In-memory store for tests.
    ///
    /// A single-connection pool is required: every SQLite in-memory
    /// connection gets its own database, so a second pool connection would
    /// see an empty one.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("failed to open in-memory credential store")?;

        Self::init(&pool).await?;
        Ok(Self { pool })
    }

    async fn init(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                slot     INTEGER PRIMARY KEY CHECK (slot = 0),
                token    TEXT NOT NULL,
                identity TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .context("failed to create credentials table")?;

        Ok(())
    }

    /// Persist the pair. Last writer wins.
    pub async fn save(&self, token: &str, identity: &Identity) -> Result<(), StoreError> {
        let snapshot = serde_json::to_string(identity)
            .context("failed to serialize identity snapshot")?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO credentials (slot, token, identity, saved_at)
            VALUES (0, ?1, ?2, ?3)
            ON CONFLICT(slot) DO UPDATE SET
                token    = excluded.token,
                identity = excluded.identity,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(token)
        .bind(&snapshot)
        .bind(&now)
        .execute(&self.pool)
        .await
        .context("failed to upsert credential pair")?;

        tracing::debug!(username = %identity.username, "credential pair saved");
        Ok(())
    }

    /// Read the pair. `None` is the normal "never logged in" state, not a
    /// failure.
    pub async fn load(&self) -> Result<Option<CredentialRecord>, StoreError> {
        let row = sqlx::query("SELECT token, identity FROM credentials WHERE slot = 0")
            .fetch_optional(&self.pool)
            .await
            .context("failed to read credential pair")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let token: String = row.try_get("token").context("credentials row missing token")?;
        let snapshot: String = row
            .try_get("identity")
            .context("credentials row missing identity")?;
        let identity: Identity = serde_json::from_str(&snapshot)
            .context("stored identity snapshot is not valid JSON")?;

        Ok(Some(CredentialRecord { token, identity }))
    }

    /// Drop the pair. Idempotent: clearing an empty store is a no-op.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM credentials")
            .execute(&self.pool)
            .await
            .context("failed to clear credential pair")?;

        tracing::debug!(was_present = result.rows_affected() > 0, "credential pair cleared");
        Ok(())
    }
}

/// `{app_data_dir}/classconnect/credentials.db`.
fn default_db_path() -> Result<PathBuf, StoreError> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory")?;

    let mut path = base;
    path.push("classconnect");
    path.push("credentials.db");
    Ok(path)
}
