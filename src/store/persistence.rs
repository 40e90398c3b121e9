use std::{collections::HashMap, str::FromStr};

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};
use tokio::sync::RwLock;

use crate::{
    constants::{LAST_VIEWED_KEY, QUOTES_KEY},
    models::quotes::Quote,
    store::{default_quotes, error::PersistError, framing, merge::merge, sanitize::sanitize},
};

/// String key-value storage, the shape both the durable and the session store share.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), PersistError>;
}

pub async fn connect(db_url: &str) -> anyhow::Result<Pool<Sqlite>> {
    let opts = SqliteConnectOptions::from_str(db_url)?;

    open(opts, 20).await
}

pub async fn open(
    opts: SqliteConnectOptions,
    max_connections: u32,
) -> anyhow::Result<Pool<Sqlite>> {
    let opts = opts
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let db = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(opts)
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when connecting to database"))?;

    tracing::info!("running migrations...");
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("finished running migrations!");

    Ok(db)
}

/// Durable store backed by the `local_storage` table.
#[derive(Clone)]
pub struct SqliteStore {
    db: Pool<Sqlite>,
}

impl SqliteStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        SqliteStore { db }
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        let value = sqlx::query_scalar::<_, String>(
            r#"
                SELECT
                    value
                FROM local_storage
                WHERE key = $1;
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .inspect_err(|e| {
            tracing::error!(err = ?e, key = %key, "an error occurred when reading from local storage")
        })?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        sqlx::query(
            r#"
                INSERT INTO
                    local_storage (key, value)
                VALUES
                    ($1, $2)
                ON CONFLICT (key)
                DO UPDATE SET
                    value = excluded.value,
                    updated_at = CURRENT_TIMESTAMP;
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await
        .inspect_err(|e| {
            tracing::error!(err = ?e, key = %key, "an error occurred when writing to local storage")
        })?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistError> {
        sqlx::query(
            r#"
                DELETE FROM local_storage
                WHERE key = $1;
            "#,
        )
        .bind(key)
        .execute(&self.db)
        .await
        .inspect_err(|e| {
            tracing::error!(err = ?e, key = %key, "an error occurred when removing from local storage")
        })?;

        Ok(())
    }
}

/// Process-local store. Used for the session store, which starts empty on every run.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes that would push the total size of keys and values past `quota` bytes.
    #[cfg(test)]
    pub fn with_quota(quota: usize) -> Self {
        MemoryStore {
            entries: RwLock::default(),
            quota: Some(quota),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let mut entries = self.entries.write().await;

        if let Some(quota) = self.quota {
            let needed = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum::<usize>()
                + key.len()
                + value.len();

            if needed > quota {
                return Err(PersistError::QuotaExceeded { needed, quota });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Loads the collection, falling back to (and persisting) the defaults when the stored
/// value is missing, unreadable, malformed, or sanitizes down to nothing.
#[tracing::instrument(skip_all)]
pub async fn load_quotes(kv: &dyn KeyValueStore) -> Vec<Quote> {
    if let Some(quotes) = read_quotes(kv).await {
        tracing::info!(count = quotes.len(), "loaded quotes from local storage");
        return quotes;
    }

    let quotes = default_quotes();

    if let Err(e) = save_quotes(kv, &quotes).await {
        tracing::warn!(err = ?e, "couldn't persist default quotes, continuing in memory");
    }

    quotes
}

async fn read_quotes(kv: &dyn KeyValueStore) -> Option<Vec<Quote>> {
    let raw = match kv.get(QUOTES_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::info!("no stored quotes found, seeding defaults");
            return None;
        }
        Err(e) => {
            tracing::warn!(err = ?e, "couldn't read stored quotes, restoring defaults");
            return None;
        }
    };

    let items = framing::deserialize(raw.as_bytes())
        .inspect_err(|e| tracing::warn!(err = ?e, "stored quotes are corrupt, restoring defaults"))
        .ok()?;

    // a hand-edited store can hold duplicates, so rebuild it through the merger.
    let (quotes, _) = merge(Vec::new(), sanitize(&items));

    if quotes.is_empty() {
        tracing::warn!("stored quotes had no valid entries, restoring defaults");
        return None;
    }

    Some(quotes)
}

pub async fn save_quotes(kv: &dyn KeyValueStore, quotes: &[Quote]) -> Result<(), PersistError> {
    let value = serde_json::to_string(quotes)?;

    kv.set(QUOTES_KEY, &value).await
}

pub async fn load_last_viewed(kv: &dyn KeyValueStore) -> Option<Quote> {
    let raw = kv
        .get(LAST_VIEWED_KEY)
        .await
        .inspect_err(|e| tracing::warn!(err = ?e, "couldn't read last viewed quote"))
        .ok()??;

    serde_json::from_str::<Quote>(&raw)
        .ok()
        .filter(Quote::is_sanitized)
}

pub async fn save_last_viewed(kv: &dyn KeyValueStore, quote: &Quote) -> Result<(), PersistError> {
    let value = serde_json::to_string(quote)?;

    kv.set(LAST_VIEWED_KEY, &value).await
}
