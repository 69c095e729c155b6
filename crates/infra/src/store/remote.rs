//! PostgreSQL-backed remote store.
//!
//! Documents live in a JSONB `documents` table. Every write also issues
//! `pg_notify` on [`CHANGE_CHANNEL`] with the collection name in the same
//! transaction; a background listener reloads the changed collection and fans
//! it out. Notifications therefore reach subscribers asynchronously, after
//! the write call has returned.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value as Document;
use sqlx::postgres::{PgListener, PgPool, PgPoolOptions};
use sqlx::Row;
use tokio::task::JoinHandle;
use tracing::{Span, instrument};

use repdesk_core::RecordKind;
use repdesk_events::Subscription;
use repdesk_sales::Settings;

use super::{
    CHANGE_CHANNEL, DataStore, SETTINGS_COLLECTION, SETTINGS_KEY, SettingsCallback,
    SnapshotCallback, StoreError, StoreFeeds,
};

/// Shared between the store handle and its listener task.
#[derive(Debug)]
struct Shared {
    pool: PgPool,
    feeds: StoreFeeds,
}

#[derive(Debug)]
pub struct RemoteStore {
    shared: Arc<Shared>,
    listener: JoinHandle<()>,
}

impl RemoteStore {
    /// Connect, ensure the schema and start the change listener.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await
            .context("failed to connect to the remote document store")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT        NOT NULL,
                id         TEXT        NOT NULL,
                data       JSONB       NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create documents table")?;

        let mut listener = PgListener::connect_with(&pool)
            .await
            .context("failed to open change listener connection")?;
        listener
            .listen(CHANGE_CHANNEL)
            .await
            .with_context(|| format!("failed to LISTEN on {CHANGE_CHANNEL}"))?;

        let shared = Arc::new(Shared {
            pool,
            feeds: StoreFeeds::default(),
        });
        let task = tokio::spawn(listen_for_changes(listener, shared.clone()));

        Ok(Self {
            shared,
            listener: task,
        })
    }
}

impl Drop for RemoteStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn listen_for_changes(mut listener: PgListener, shared: Arc<Shared>) {
    loop {
        let notification = match listener.recv().await {
            Ok(n) => n,
            Err(err) => {
                // PgListener reconnects on the next recv; notifications sent in
                // between are lost, so every collection is refreshed below.
                tracing::warn!(error = %err, "change listener error");
                for kind in RecordKind::ALL {
                    refresh(&shared, kind.collection()).await;
                }
                refresh(&shared, SETTINGS_COLLECTION).await;
                continue;
            }
        };
        refresh(&shared, notification.payload()).await;
    }
}

async fn refresh(shared: &Shared, collection: &str) {
    if collection == SETTINGS_COLLECTION {
        match shared.load_settings().await {
            Ok(settings) => shared.feeds.publish_settings(&settings),
            Err(err) => tracing::warn!(error = %err, "failed to reload settings"),
        }
        return;
    }
    let Some(kind) = RecordKind::from_collection(collection) else {
        tracing::debug!(collection, "ignoring change on unknown collection");
        return;
    };
    match shared.read_collection(kind).await {
        Ok(docs) => shared.feeds.publish(kind, &docs),
        Err(err) => tracing::warn!(collection, error = %err, "failed to reload collection"),
    }
}

impl Shared {
    async fn read_collection(&self, kind: RecordKind) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT data
            FROM documents
            WHERE collection = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(kind.collection())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter()
            .map(|row| row.try_get::<Document, _>("data").map_err(|e| map_sqlx_error("list", e)))
            .collect()
    }

    async fn load_settings(&self) -> Result<Option<Settings>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT data
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(SETTINGS_COLLECTION)
        .bind(SETTINGS_KEY)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_settings", e))?;

        match row {
            Some(row) => {
                let data: Document = row
                    .try_get("data")
                    .map_err(|e| map_sqlx_error("load_settings", e))?;
                Ok(Some(serde_json::from_value(data)?))
            }
            None => Ok(None),
        }
    }

    /// Run `statement` and the change notification in one transaction;
    /// returns the number of rows the statement touched.
    ///
    /// `statement_error` maps a failure of the statement itself.
    async fn write_and_notify(
        &self,
        operation: &'static str,
        collection: &str,
        statement: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
        statement_error: impl FnOnce(sqlx::Error) -> StoreError,
    ) -> Result<u64, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        let affected = statement
            .execute(&mut *tx)
            .await
            .map_err(statement_error)?
            .rows_affected();

        if affected > 0 {
            sqlx::query("SELECT pg_notify($1, $2)")
                .bind(CHANGE_CHANNEL)
                .bind(collection)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(operation, e))?;
        }

        tx.commit().await.map_err(|e| map_sqlx_error(operation, e))?;
        Span::current().record("rows", affected);
        Ok(affected)
    }
}

#[async_trait]
impl DataStore for RemoteStore {
    fn backend(&self) -> &'static str {
        "remote"
    }

    async fn subscribe(
        &self,
        kind: RecordKind,
        callback: SnapshotCallback,
    ) -> Result<Subscription, StoreError> {
        let current = self.shared.read_collection(kind).await?;
        let sub = self.shared.feeds.subscribe(kind, callback.clone());
        callback(&current);
        Ok(sub)
    }

    async fn list(&self, kind: RecordKind) -> Result<Vec<Document>, StoreError> {
        self.shared.read_collection(kind).await
    }

    #[instrument(skip(self, document), fields(collection = %kind, rows = tracing::field::Empty), err)]
    async fn add(&self, kind: RecordKind, id: &str, document: Document) -> Result<(), StoreError> {
        let statement = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(kind.collection())
        .bind(id)
        .bind(document);

        self.shared
            .write_and_notify("add", kind.collection(), statement, |e| {
                if is_unique_violation(&e) {
                    StoreError::AlreadyExists { kind, id: id.to_string() }
                } else {
                    map_sqlx_error("add", e)
                }
            })
            .await
            .map(|_| ())
    }

    #[instrument(skip(self, document), fields(collection = %kind, rows = tracing::field::Empty), err)]
    async fn update(&self, kind: RecordKind, id: &str, document: Document) -> Result<(), StoreError> {
        let statement = sqlx::query(
            r#"
            UPDATE documents
            SET data = $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(kind.collection())
        .bind(id)
        .bind(document);

        match self
            .shared
            .write_and_notify("update", kind.collection(), statement, |e| map_sqlx_error("update", e))
            .await?
        {
            0 => Err(StoreError::NotFound { kind, id: id.to_string() }),
            _ => Ok(()),
        }
    }

    #[instrument(skip(self), fields(collection = %kind, rows = tracing::field::Empty), err)]
    async fn delete(&self, kind: RecordKind, id: &str) -> Result<(), StoreError> {
        let statement = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(kind.collection())
        .bind(id);

        match self
            .shared
            .write_and_notify("delete", kind.collection(), statement, |e| map_sqlx_error("delete", e))
            .await?
        {
            0 => Err(StoreError::NotFound { kind, id: id.to_string() }),
            _ => Ok(()),
        }
    }

    async fn subscribe_settings(&self, callback: SettingsCallback) -> Result<Subscription, StoreError> {
        let current = self.shared.load_settings().await?;
        let sub = self.shared.feeds.subscribe_settings(callback.clone());
        callback(current.as_ref());
        Ok(sub)
    }

    async fn load_settings(&self) -> Result<Option<Settings>, StoreError> {
        self.shared.load_settings().await
    }

    #[instrument(skip_all, fields(rows = tracing::field::Empty), err)]
    async fn update_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let statement = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = NOW()
            "#,
        )
        .bind(SETTINGS_COLLECTION)
        .bind(SETTINGS_KEY)
        .bind(serde_json::to_value(settings)?);

        self.shared
            .write_and_notify("update_settings", SETTINGS_COLLECTION, statement, |e| {
                map_sqlx_error("update_settings", e)
            })
            .await
            .map(|_| ())
    }
}

/// Map SQLx errors to `StoreError`.
///
/// Unique violations on `add` are caught earlier by [`is_unique_violation`].
///
/// | SQLx Error | Maps to |
/// |------------|---------|
/// | Database | `Database` with the server message |
/// | PoolClosed / PoolTimedOut | `Unavailable` |
/// | Other | `Database` with the sqlx message |
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::database(operation, db_err.message()),
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        other => StoreError::database(operation, other),
    }
}

/// SQLSTATE `23505`.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
