//! In-memory store for tests and demos.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value as Document;

use repdesk_core::RecordKind;
use repdesk_events::Subscription;
use repdesk_sales::Settings;

use super::{DataStore, SettingsCallback, SnapshotCallback, StoreError, StoreFeeds};

/// Process-local maps. Notifications fan out inline with each write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<RecordKind, Vec<(String, Document)>>>,
    settings: RwLock<Option<Settings>>,
    feeds: StoreFeeds,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, kind: RecordKind) -> Result<Vec<Document>, StoreError> {
        let map = self.collections.read().map_err(|_| StoreError::poisoned())?;
        Ok(map
            .get(&kind)
            .map(|docs| docs.iter().map(|(_, doc)| doc.clone()).collect())
            .unwrap_or_default())
    }

    /// Apply `change` to one collection, then notify its subscribers.
    fn write<F>(&self, kind: RecordKind, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<(String, Document)>) -> Result<(), StoreError>,
    {
        {
            let mut map = self.collections.write().map_err(|_| StoreError::poisoned())?;
            change(map.entry(kind).or_default())?;
        }
        let docs = self.snapshot(kind)?;
        self.feeds.publish(kind, &docs);
        Ok(())
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn subscribe(
        &self,
        kind: RecordKind,
        callback: SnapshotCallback,
    ) -> Result<Subscription, StoreError> {
        let current = self.snapshot(kind)?;
        let sub = self.feeds.subscribe(kind, callback.clone());
        callback(&current);
        Ok(sub)
    }

    async fn list(&self, kind: RecordKind) -> Result<Vec<Document>, StoreError> {
        self.snapshot(kind)
    }

    async fn add(&self, kind: RecordKind, id: &str, document: Document) -> Result<(), StoreError> {
        self.write(kind, |docs| {
            if docs.iter().any(|(key, _)| key == id) {
                return Err(StoreError::AlreadyExists { kind, id: id.to_string() });
            }
            docs.push((id.to_string(), document));
            Ok(())
        })
    }

    async fn update(&self, kind: RecordKind, id: &str, document: Document) -> Result<(), StoreError> {
        self.write(kind, |docs| {
            let slot = docs
                .iter_mut()
                .find(|(key, _)| key == id)
                .ok_or_else(|| StoreError::NotFound { kind, id: id.to_string() })?;
            slot.1 = document;
            Ok(())
        })
    }

    async fn delete(&self, kind: RecordKind, id: &str) -> Result<(), StoreError> {
        self.write(kind, |docs| {
            let idx = docs
                .iter()
                .position(|(key, _)| key == id)
                .ok_or_else(|| StoreError::NotFound { kind, id: id.to_string() })?;
            docs.remove(idx);
            Ok(())
        })
    }

    async fn subscribe_settings(&self, callback: SettingsCallback) -> Result<Subscription, StoreError> {
        let current = self.load_settings().await?;
        let sub = self.feeds.subscribe_settings(callback.clone());
        callback(current.as_ref());
        Ok(sub)
    }

    async fn load_settings(&self) -> Result<Option<Settings>, StoreError> {
        let guard = self.settings.read().map_err(|_| StoreError::poisoned())?;
        Ok(guard.clone())
    }

    async fn update_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let current = {
            let mut guard = self.settings.write().map_err(|_| StoreError::poisoned())?;
            *guard = Some(settings.clone());
            guard.clone()
        };
        self.feeds.publish_settings(&current);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;
    use crate::store::DataStoreExt;
    use repdesk_core::QuoteId;
    use repdesk_sales::{Factory, QuoteDraft, QuoteStatus, Quote};

    #[tokio::test]
    async fn satisfies_crud_contract() {
        contract::crud_round_trip(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn notifies_inline() {
        contract::subscribers_get_snapshots_inline(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn settings_contract() {
        contract::settings_round_trip(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn typed_records_round_trip() {
        let store = MemoryStore::new();
        let quote = QuoteDraft {
            constructor_name: "Construtora Horizonte".into(),
            project_name: "Residencial Aurora".into(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            factory: Factory::Roca,
            product: "Porcelanato".into(),
            status: QuoteStatus::Sent,
            value: 100.0,
            contact_name: String::new(),
            phone: String::new(),
            email: String::new(),
        }
        .into_quote(QuoteId::new())
        .unwrap();

        store.add_record(&quote).await.unwrap();
        // A document another client wrote badly is skipped, not fatal.
        store
            .add(RecordKind::Quotes, "junk", serde_json::json!({ "id": "junk" }))
            .await
            .unwrap();

        let quotes: Vec<Quote> = store.list_records().await.unwrap();
        assert_eq!(quotes, vec![quote.clone()]);

        store.delete_record::<Quote>(&quote.id).await.unwrap();
        assert_eq!(store.list(RecordKind::Quotes).await.unwrap().len(), 1);
    }
}
