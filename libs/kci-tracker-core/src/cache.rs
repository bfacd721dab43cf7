//! Persistent local cache
//!
//! A device-local key-value store backed by `SQLite`, used as a read-through
//! cache for previously fetched report documents. Not a source of truth: a
//! read failure resolves to `None` and write/delete failures are logged and
//! swallowed. There is no TTL and no eviction; growth is bounded only by
//! explicit `delete`/`clear_all` calls, which is a documented property of
//! the system rather than a defect.

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use kci_tracker_common::{CACHE_NAMESPACE, CACHE_STORE, CACHE_VERSION};

use crate::error::{Result, TrackerError};

/// Local cache configuration
#[derive(Debug, Clone)]
pub struct LocalCacheConfig {
    /// Cache database path
    pub db_path: PathBuf,
    /// Logical store name
    pub store: String,
    /// Schema version; a mismatch on open wipes and recreates the store
    pub version: u32,
}

impl Default for LocalCacheConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(format!("{CACHE_NAMESPACE}.db")),
            store: CACHE_STORE.to_string(),
            version: CACHE_VERSION,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalCacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl LocalCacheStats {
    /// Hit rate across reads so far
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            #[allow(clippy::cast_precision_loss)]
            {
                self.hits as f64 / total as f64
            }
        } else {
            0.0
        }
    }
}

/// Device-local key-value cache
pub struct LocalCache {
    config: LocalCacheConfig,
    stats: Arc<RwLock<LocalCacheStats>>,
}

impl LocalCache {
    /// Open (or create) the cache store
    ///
    /// # Errors
    ///
    /// Returns an error only when the database file cannot be created or the
    /// schema cannot be initialized; per-operation failures after open are
    /// swallowed.
    pub fn open(config: LocalCacheConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init_database(&config)?;
        Ok(Self {
            config,
            stats: Arc::new(RwLock::new(LocalCacheStats::default())),
        })
    }

    /// Open the cache with default configuration
    ///
    /// # Errors
    ///
    /// See [`LocalCache::open`].
    pub fn open_default() -> Result<Self> {
        Self::open(LocalCacheConfig::default())
    }

    fn connect(path: &Path) -> Result<Connection> {
        Connection::open(path).map_err(|e| TrackerError::cache(e.to_string()))
    }

    fn init_database(config: &LocalCacheConfig) -> Result<()> {
        let conn = Self::connect(&config.db_path)?;

        conn.execute(
            r"
            CREATE TABLE IF NOT EXISTS cache_meta (
                store TEXT PRIMARY KEY,
                version INTEGER NOT NULL
            )
            ",
            [],
        )
        .map_err(|e| TrackerError::cache(e.to_string()))?;

        let stored_version: Option<u32> = conn
            .query_row(
                "SELECT version FROM cache_meta WHERE store = ?1",
                params![config.store],
                |row| row.get(0),
            )
            .ok();

        // Schema migration is wipe-and-recreate
        if let Some(version) = stored_version {
            if version != config.version {
                info!(
                    store = %config.store,
                    from = version,
                    to = config.version,
                    "cache version changed, wiping store"
                );
                conn.execute("DROP TABLE IF EXISTS cache_entries", [])
                    .map_err(|e| TrackerError::cache(e.to_string()))?;
            }
        }

        conn.execute(
            r"
            CREATE TABLE IF NOT EXISTS cache_entries (
                store TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (store, key)
            )
            ",
            [],
        )
        .map_err(|e| TrackerError::cache(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO cache_meta (store, version) VALUES (?1, ?2)",
            params![config.store, config.version],
        )
        .map_err(|e| TrackerError::cache(e.to_string()))?;

        debug!(path = %config.db_path.display(), "local cache initialized");
        Ok(())
    }

    /// Read a value; any underlying failure resolves to `None`
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key);
        let mut stats = self.stats.write().await;
        match raw {
            Some(text) => match serde_json::from_str(&text) {
                Ok(value) => {
                    stats.hits += 1;
                    Some(value)
                }
                Err(e) => {
                    warn!(key, error = %e, "cached value failed to deserialize");
                    stats.misses += 1;
                    None
                }
            },
            None => {
                stats.misses += 1;
                None
            }
        }
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        let conn = match Self::connect(&self.config.db_path) {
            Ok(conn) => conn,
            Err(e) => {
                warn!(key, error = %e, "cache read failed");
                return None;
            }
        };
        conn.query_row(
            "SELECT value FROM cache_entries WHERE store = ?1 AND key = ?2",
            params![self.config.store, key],
            |row| row.get(0),
        )
        .ok()
    }

    /// Write a value, best effort
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(e) => {
                warn!(key, error = %e, "cache value failed to serialize");
                return;
            }
        };
        let result = Self::connect(&self.config.db_path).and_then(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO cache_entries (store, key, value, updated_at)
                 VALUES (?1, ?2, ?3, strftime('%s', 'now'))",
                params![self.config.store, key, text],
            )
            .map_err(|e| TrackerError::cache(e.to_string()))
        });
        if let Err(e) = result {
            warn!(key, error = %e, "cache write failed");
        }
    }

    /// Delete one key, best effort
    pub async fn delete(&self, key: &str) {
        let result = Self::connect(&self.config.db_path).and_then(|conn| {
            conn.execute(
                "DELETE FROM cache_entries WHERE store = ?1 AND key = ?2",
                params![self.config.store, key],
            )
            .map_err(|e| TrackerError::cache(e.to_string()))
        });
        if let Err(e) = result {
            warn!(key, error = %e, "cache delete failed");
        }
    }

    /// Clear every entry in the store, best effort
    pub async fn clear_all(&self) {
        let result = Self::connect(&self.config.db_path).and_then(|conn| {
            conn.execute(
                "DELETE FROM cache_entries WHERE store = ?1",
                params![self.config.store],
            )
            .map_err(|e| TrackerError::cache(e.to_string()))
        });
        match result {
            Ok(deleted) => debug!(deleted, "cache cleared"),
            Err(e) => warn!(error = %e, "cache clear failed"),
        }
    }

    /// Number of entries currently stored
    pub async fn len(&self) -> usize {
        Self::connect(&self.config.db_path)
            .ok()
            .and_then(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries WHERE store = ?1",
                    params![self.config.store],
                    |row| row.get::<_, i64>(0),
                )
                .ok()
            })
            .map_or(0, |count| usize::try_from(count).unwrap_or(0))
    }

    /// True when the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Current read statistics
    pub async fn stats(&self) -> LocalCacheStats {
        *self.stats.read().await
    }
}
