//! SQLite-backed local store.
//!
//! One `documents` table holds every collection plus the settings document.
//! Writes notify subscribers inline, after the statement completes.

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as Document;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::instrument;

use repdesk_core::RecordKind;
use repdesk_events::Subscription;
use repdesk_sales::Settings;

use super::{
    DataStore, SETTINGS_COLLECTION, SETTINGS_KEY, SettingsCallback, SnapshotCallback, StoreError,
    StoreFeeds,
};

#[derive(Debug)]
pub struct LocalStore {
    pool: SqlitePool,
    feeds: StoreFeeds,
}

impl LocalStore {
    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create data directory at {:?}", parent))?;
        }
        let url = format!("sqlite://{}", path.to_string_lossy());
        Self::connect(&url, 4)
            .await
            .with_context(|| format!("failed to open local store at {:?}", path))
    }

    /// Connect to a SQLite URL such as `sqlite::memory:`.
    ///
    /// In-memory databases are per connection, so they need `max_connections = 1`.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid SQLite URL {url:?}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("failed to create SQLite pool")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id         TEXT NOT NULL,
                data       TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create documents table")?;

        Ok(Self {
            pool,
            feeds: StoreFeeds::default(),
        })
    }

    async fn read_collection(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT data
            FROM documents
            WHERE collection = ?1
            ORDER BY rowid ASC
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::database("list", e))?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.try_get("data").map_err(|e| StoreError::database("list", e))?;
            docs.push(serde_json::from_str(&data)?);
        }
        Ok(docs)
    }

    /// Fan the collection out after a committed write. A failed re-read is
    /// logged; the write itself stands.
    async fn notify(&self, kind: RecordKind) {
        match self.read_collection(kind.collection()).await {
            Ok(docs) => self.feeds.publish(kind, &docs),
            Err(err) => {
                tracing::warn!(collection = %kind, error = %err, "change notification dropped");
            }
        }
    }
}

#[async_trait]
impl DataStore for LocalStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn subscribe(
        &self,
        kind: RecordKind,
        callback: SnapshotCallback,
    ) -> Result<Subscription, StoreError> {
        let current = self.read_collection(kind.collection()).await?;
        let sub = self.feeds.subscribe(kind, callback.clone());
        callback(&current);
        Ok(sub)
    }

    async fn list(&self, kind: RecordKind) -> Result<Vec<Document>, StoreError> {
        self.read_collection(kind.collection()).await
    }

    #[instrument(skip(self, document), fields(collection = %kind), err)]
    async fn add(&self, kind: RecordKind, id: &str, document: Document) -> Result<(), StoreError> {
        let data = serde_json::to_string(&document)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(kind.collection())
        .bind(id)
        .bind(&data)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::AlreadyExists { kind, id: id.to_string() }
            }
            other => StoreError::database("add", other),
        })?;

        self.notify(kind).await;
        Ok(())
    }

    #[instrument(skip(self, document), fields(collection = %kind), err)]
    async fn update(&self, kind: RecordKind, id: &str, document: Document) -> Result<(), StoreError> {
        let data = serde_json::to_string(&document)?;
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = ?3, updated_at = ?4
            WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(kind.collection())
        .bind(id)
        .bind(&data)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { kind, id: id.to_string() });
        }
        self.notify(kind).await;
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %kind), err)]
    async fn delete(&self, kind: RecordKind, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(kind.collection())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { kind, id: id.to_string() });
        }
        self.notify(kind).await;
        Ok(())
    }

    async fn subscribe_settings(&self, callback: SettingsCallback) -> Result<Subscription, StoreError> {
        let current = self.load_settings().await?;
        let sub = self.feeds.subscribe_settings(callback.clone());
        callback(current.as_ref());
        Ok(sub)
    }

    async fn load_settings(&self) -> Result<Option<Settings>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT data
            FROM documents
            WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(SETTINGS_COLLECTION)
        .bind(SETTINGS_KEY)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::database("load_settings", e))?;

        match row {
            Some(row) => {
                let data: String = row
                    .try_get("data")
                    .map_err(|e| StoreError::database("load_settings", e))?;
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip_all, err)]
    async fn update_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let data = serde_json::to_string(settings)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(collection, id)
            DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(SETTINGS_COLLECTION)
        .bind(SETTINGS_KEY)
        .bind(&data)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("update_settings", e))?;

        self.feeds.publish_settings(&Some(settings.clone()));
        Ok(())
    }
}
