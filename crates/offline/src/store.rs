//! Local key-value persistence.
//!
//! The queue and the offline cache both live behind the [`KvStore`] trait:
//! one string value per key. The durable implementation is a single SQLite
//! `kv` table; tests use [`MemoryStore`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

/// String key-value store used for queue and cache documents.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
enum Location {
    /// `{app_data_dir}/presupro/presupro.db`, resolved on first use.
    Default,
    Path(PathBuf),
    Memory,
}

/// SQLite-backed store.
///
/// The pool is initialized lazily on first use, so constructing the store is
/// cheap and infallible. The handle is cheap to clone and safe to share
/// across tasks.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    location: Location,
    pool: Arc<Mutex<Option<SqlitePool>>>,
}

impl SqliteStore {
    /// Store under the OS data directory.
    pub fn new() -> Self {
        Self {
            location: Location::Default,
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Store at an explicit database path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            location: Location::Path(path),
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Private in-memory database; contents live as long as the pool.
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Initialize the database connection (called lazily on first use).
    async fn ensure_initialized(&self) -> anyhow::Result<()> {
        let mut pool_guard = self.pool.lock().await;
        if pool_guard.is_some() {
            return Ok(());
        }

        let (options, pool_options) = match &self.location {
            Location::Memory => (
                SqliteConnectOptions::new().in_memory(true),
                // One shared connection, or each checkout would see its own
                // empty database.
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None),
            ),
            Location::Path(path) => (
                file_options(path.clone())?,
                SqlitePoolOptions::new(),
            ),
            Location::Default => {
                let path = default_db_path()
                    .context("failed to determine store DB path - ensure app data directory is accessible")?;
                (file_options(path)?, SqlitePoolOptions::new())
            }
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("failed to create SQLite pool for KvStore")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create kv table")?;

        *pool_guard = Some(pool);
        Ok(())
    }

    /// Get the pool, initializing if necessary.
    async fn get_pool(&self) -> anyhow::Result<SqlitePool> {
        self.ensure_initialized().await?;
        let pool_guard = self.pool.lock().await;
        Ok(pool_guard.as_ref().unwrap().clone())
    }
}

impl Default for SqliteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let pool = self.get_pool().await?;

        let row = sqlx::query("SELECT value FROM kv WHERE key = ?1")
            .bind(key)
            .fetch_optional(&pool)
            .await
            .with_context(|| format!("failed to read key {key:?}"))?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let pool = self.get_pool().await?;

        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key)
            DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .with_context(|| format!("failed to write key {key:?}"))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let pool = self.get_pool().await?;

        sqlx::query("DELETE FROM kv WHERE key = ?1")
            .bind(key)
            .execute(&pool)
            .await
            .with_context(|| format!("failed to remove key {key:?}"))?;

        Ok(())
    }
}

fn file_options(path: PathBuf) -> anyhow::Result<SqliteConnectOptions> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create store directory at {parent:?}"))?;
    }
    Ok(SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true))
}

/// Resolve the default SQLite path: `{app_data_dir}/presupro/presupro.db`.
pub fn default_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut dir = base;
    dir.push("presupro");

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory at {dir:?}"))?;

    dir.push("presupro.db");

    Ok(dir)
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sqlite_store_roundtrips_values() {
        let store = SqliteStore::in_memory();

        assert_eq!(store.get("missing").await.unwrap(), None);

        store.set("queue", "[]").await.unwrap();
        assert_eq!(store.get("queue").await.unwrap().as_deref(), Some("[]"));

        store.set("queue", "[1]").await.unwrap();
        assert_eq!(store.get("queue").await.unwrap().as_deref(), Some("[1]"));

        store.remove("queue").await.unwrap();
        assert_eq!(store.get("queue").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_roundtrips_values() {
        let store = MemoryStore::new();

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
