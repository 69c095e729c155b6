//! Persistence facade.
//!
//! Records are stored as JSON documents grouped in collections (one per
//! [`RecordKind`]) plus a single settings document. Every backend implements
//! [`DataStore`]; the rest of the system only ever sees `Arc<dyn DataStore>`,
//! chosen once at startup from [`crate::config::StoreConfig`].
//!
//! Subscribers receive the full current snapshot of a collection, once right
//! away and again after every change.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as Document;
use thiserror::Error;

use repdesk_core::{Record, RecordKind};
use repdesk_events::{ChangeFeed, Subscription};
use repdesk_sales::Settings;

pub mod local;
pub mod memory;
pub mod remote;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use remote::RemoteStore;

/// Receives the full document list of one collection.
pub type SnapshotCallback = Arc<dyn Fn(&[Document]) + Send + Sync>;

/// Receives the settings document, `None` while none was ever saved.
pub type SettingsCallback = Arc<dyn Fn(Option<&Settings>) + Send + Sync>;

/// Collection name and key of the settings document.
pub const SETTINGS_COLLECTION: &str = "settings";
pub const SETTINGS_KEY: &str = "general_settings";

/// Channel used by backends that notify changes out of band.
pub const CHANGE_CHANNEL: &str = "repdesk_changes";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("{kind} document {id} not found")]
    NotFound { kind: RecordKind, id: String },

    #[error("{kind} document {id} already exists")]
    AlreadyExists { kind: RecordKind, id: String },
}

impl StoreError {
    pub(crate) fn database(operation: &'static str, err: impl core::fmt::Display) -> Self {
        Self::Database {
            operation,
            message: err.to_string(),
        }
    }

    pub(crate) fn poisoned() -> Self {
        Self::Unavailable("store state lock poisoned".to_string())
    }
}

/// Uniform storage contract shared by every backend.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    async fn subscribe(
        &self,
        kind: RecordKind,
        callback: SnapshotCallback,
    ) -> Result<Subscription, StoreError>;

    /// Documents of a collection in insertion order.
    async fn list(&self, kind: RecordKind) -> Result<Vec<Document>, StoreError>;

    async fn add(&self, kind: RecordKind, id: &str, document: Document) -> Result<(), StoreError>;

    /// Replace an existing document.
    async fn update(&self, kind: RecordKind, id: &str, document: Document) -> Result<(), StoreError>;

    async fn delete(&self, kind: RecordKind, id: &str) -> Result<(), StoreError>;

    async fn subscribe_settings(&self, callback: SettingsCallback) -> Result<Subscription, StoreError>;

    async fn load_settings(&self) -> Result<Option<Settings>, StoreError>;

    async fn update_settings(&self, settings: &Settings) -> Result<(), StoreError>;
}

/// Typed access for [`Record`] types on top of any [`DataStore`].
#[async_trait]
pub trait DataStoreExt: DataStore {
    /// Subscribe with decoded records. Documents that fail to decode are
    /// skipped and logged.
    async fn subscribe_records<R, F>(&self, callback: F) -> Result<Subscription, StoreError>
    where
        R: Record,
        F: Fn(Vec<R>) + Send + Sync + 'static,
    {
        let callback: SnapshotCallback = Arc::new(move |docs| callback(decode_all::<R>(docs)));
        self.subscribe(R::KIND, callback).await
    }

    async fn list_records<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let docs = self.list(R::KIND).await?;
        Ok(decode_all(&docs))
    }

    async fn add_record<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        let document = serde_json::to_value(record)?;
        self.add(R::KIND, &record.key(), document).await
    }

    async fn update_record<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        let document = serde_json::to_value(record)?;
        self.update(R::KIND, &record.key(), document).await
    }

    async fn delete_record<R: Record>(&self, id: &R::Id) -> Result<(), StoreError>
    where
        R::Id: Sync,
    {
        self.delete(R::KIND, &id.to_string()).await
    }
}

impl<S: DataStore + ?Sized> DataStoreExt for S {}

fn decode_all<R: Record>(docs: &[Document]) -> Vec<R> {
    docs.iter()
        .filter_map(|doc| match serde_json::from_value::<R>(doc.clone()) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(collection = %R::KIND, error = %err, "skipping malformed document");
                None
            }
        })
        .collect()
}

/// Change feeds every backend fans out through.
#[derive(Debug, Default)]
pub(crate) struct StoreFeeds {
    quotes: ChangeFeed<Vec<Document>>,
    orders: ChangeFeed<Vec<Document>>,
    settings: ChangeFeed<Option<Settings>>,
}

impl StoreFeeds {
    fn collection(&self, kind: RecordKind) -> &ChangeFeed<Vec<Document>> {
        match kind {
            RecordKind::Quotes => &self.quotes,
            RecordKind::Orders => &self.orders,
        }
    }

    pub(crate) fn subscribe(&self, kind: RecordKind, callback: SnapshotCallback) -> Subscription {
        self.collection(kind)
            .subscribe(move |docs: &Vec<Document>| callback(docs))
    }

    pub(crate) fn subscribe_settings(&self, callback: SettingsCallback) -> Subscription {
        self.settings
            .subscribe(move |settings: &Option<Settings>| callback(settings.as_ref()))
    }

    pub(crate) fn publish(&self, kind: RecordKind, docs: &Vec<Document>) {
        if let Err(err) = self.collection(kind).publish(docs) {
            tracing::warn!(collection = %kind, error = %err, "change notification dropped");
        }
    }

    pub(crate) fn publish_settings(&self, settings: &Option<Settings>) {
        if let Err(err) = self.settings.publish(settings) {
            tracing::warn!(error = %err, "settings notification dropped");
        }
    }
}

/// Backend-agnostic contract checks, run against every backend's tests.
#[cfg(test)]
pub(crate) mod contract {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    pub(crate) fn doc(id: &str, value: f64) -> Document {
        json!({ "id": id, "value": value })
    }

    pub(crate) fn recorder() -> (Arc<Mutex<Vec<Vec<Document>>>>, SnapshotCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let callback: SnapshotCallback = Arc::new(move |docs: &[Document]| {
            s.lock().unwrap().push(docs.to_vec());
        });
        (seen, callback)
    }

    pub(crate) async fn crud_round_trip(store: &dyn DataStore) {
        store.add(RecordKind::Quotes, "a", doc("a", 1.0)).await.unwrap();
        store.add(RecordKind::Quotes, "b", doc("b", 2.0)).await.unwrap();
        store.add(RecordKind::Orders, "a", doc("a", 9.0)).await.unwrap();

        assert!(matches!(
            store.add(RecordKind::Quotes, "a", doc("a", 3.0)).await,
            Err(StoreError::AlreadyExists { .. })
        ));

        store.update(RecordKind::Quotes, "a", doc("a", 10.0)).await.unwrap();
        let quotes = store.list(RecordKind::Quotes).await.unwrap();
        assert_eq!(quotes, vec![doc("a", 10.0), doc("b", 2.0)]);

        store.delete(RecordKind::Quotes, "b").await.unwrap();
        assert_eq!(store.list(RecordKind::Quotes).await.unwrap(), vec![doc("a", 10.0)]);
        assert_eq!(store.list(RecordKind::Orders).await.unwrap(), vec![doc("a", 9.0)]);

        assert!(matches!(
            store.update(RecordKind::Quotes, "zzz", doc("zzz", 0.0)).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(RecordKind::Quotes, "zzz").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    pub(crate) async fn subscribers_get_snapshots_inline(store: &dyn DataStore) {
        store.add(RecordKind::Orders, "a", doc("a", 1.0)).await.unwrap();

        let (seen, callback) = recorder();
        let sub = store.subscribe(RecordKind::Orders, callback).await.unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[vec![doc("a", 1.0)]]);

        store.add(RecordKind::Orders, "b", doc("b", 2.0)).await.unwrap();
        store.add(RecordKind::Quotes, "q", doc("q", 2.0)).await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(seen.lock().unwrap()[1], vec![doc("a", 1.0), doc("b", 2.0)]);

        sub.unsubscribe();
        store.delete(RecordKind::Orders, "a").await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    pub(crate) async fn settings_round_trip(store: &dyn DataStore) {
        assert_eq!(store.load_settings().await.unwrap(), None);

        let seen: Arc<Mutex<Vec<Option<Settings>>>> = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let _sub = store
            .subscribe_settings(Arc::new(move |settings: Option<&Settings>| {
                s.lock().unwrap().push(settings.cloned());
            }))
            .await
            .unwrap();

        let mut settings = Settings::default();
        settings.set_lead_time("Cabos", 20);
        store.update_settings(&settings).await.unwrap();

        assert_eq!(store.load_settings().await.unwrap(), Some(settings.clone()));
        assert_eq!(seen.lock().unwrap().as_slice(), &[None, Some(settings)]);
    }
}
