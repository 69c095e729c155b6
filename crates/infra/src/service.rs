//! Data service: the single entry point the API talks to.
//!
//! Keeps an in-memory snapshot of quotes, orders and settings fed by store
//! subscriptions, and routes every mutation through the domain rules before
//! persisting it. Writes also update the snapshot optimistically so the
//! caller sees its own change even when the backend notifies later.

use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::instrument;

use repdesk_core::{DomainError, Entity, FollowUpId, OrderId, QuoteId, RecordKind};
use repdesk_events::Subscription;
use repdesk_reporting::{BillingView, DashboardView, ReportQuery};
use repdesk_sales::{
    FollowUp, Installment, InvoiceDetails, Order, OrderContext, OrderDraft, Quote, QuoteDraft,
    Settings, commission, delivery,
};

use crate::store::{DataStore, DataStoreExt, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{kind} record {id} not found")]
    NotFound { kind: RecordKind, id: String },

    /// Data access before `attach()` (i.e. before login).
    #[error("data service is not attached")]
    Detached,
}

impl ServiceError {
    fn not_found(kind: RecordKind, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Latest known state of every collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub quotes: Vec<Quote>,
    pub orders: Vec<Order>,
    pub settings: Settings,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            quotes: Vec::new(),
            orders: Vec::new(),
            settings: Settings::with_catalog_defaults(),
        }
    }
}

pub struct DataService {
    store: Arc<dyn DataStore>,
    snapshot: Arc<RwLock<Snapshot>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl core::fmt::Debug for DataService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DataService")
            .field("backend", &self.store.backend())
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

impl DataService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            store,
            snapshot: Arc::new(RwLock::new(Snapshot::default())),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Subscribe to every collection and the settings document.
    ///
    /// Idempotent: attaching twice keeps the first set of subscriptions.
    #[instrument(skip(self), fields(backend = self.store.backend()), err)]
    pub async fn attach(&self) -> Result<(), ServiceError> {
        if self.is_attached() {
            return Ok(());
        }

        let snapshot = self.snapshot.clone();
        let quotes = self
            .store
            .subscribe_records::<Quote, _>(move |quotes| {
                if let Ok(mut s) = snapshot.write() {
                    s.quotes = quotes;
                }
            })
            .await?;

        let snapshot = self.snapshot.clone();
        let orders = self
            .store
            .subscribe_records::<Order, _>(move |orders| {
                if let Ok(mut s) = snapshot.write() {
                    s.orders = orders;
                }
            })
            .await?;

        let snapshot = self.snapshot.clone();
        let settings = self
            .store
            .subscribe_settings(Arc::new(move |settings: Option<&Settings>| {
                let Some(settings) = settings else {
                    return;
                };
                if let Ok(mut s) = snapshot.write() {
                    s.settings = settings.clone();
                }
            }))
            .await?;

        let mut subscriptions = self
            .subscriptions
            .lock()
            .map_err(|_| StoreError::poisoned())?;
        if subscriptions.is_empty() {
            subscriptions.extend([quotes, orders, settings]);
            tracing::info!("data service attached");
        }
        // Otherwise a concurrent attach won; the handles above drop and unsubscribe.
        Ok(())
    }

    /// Drop every subscription and forget the loaded records.
    pub fn detach(&self) {
        let released: Vec<Subscription> = match self.subscriptions.lock() {
            Ok(mut subs) => subs.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        if released.is_empty() {
            return;
        }
        drop(released);

        if let Ok(mut s) = self.snapshot.write() {
            s.quotes.clear();
            s.orders.clear();
        }
        tracing::info!("data service detached");
    }

    pub fn is_attached(&self) -> bool {
        self.subscriptions
            .lock()
            .map(|subs| !subs.is_empty())
            .unwrap_or(false)
    }

    fn ensure_attached(&self) -> Result<(), ServiceError> {
        if self.is_attached() {
            Ok(())
        } else {
            Err(ServiceError::Detached)
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Snapshot>, ServiceError> {
        self.snapshot
            .read()
            .map_err(|_| ServiceError::Store(StoreError::poisoned()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Snapshot>, ServiceError> {
        self.snapshot
            .write()
            .map_err(|_| ServiceError::Store(StoreError::poisoned()))
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub fn snapshot(&self) -> Result<Snapshot, ServiceError> {
        Ok(self.read()?.clone())
    }

    pub fn quotes(&self) -> Result<Vec<Quote>, ServiceError> {
        Ok(self.read()?.quotes.clone())
    }

    pub fn orders(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(self.read()?.orders.clone())
    }

    pub fn settings(&self) -> Result<Settings, ServiceError> {
        Ok(self.read()?.settings.clone())
    }

    pub fn get_quote(&self, id: &QuoteId) -> Result<Quote, ServiceError> {
        self.read()?
            .quotes
            .iter()
            .find(|q| q.id == *id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(RecordKind::Quotes, id))
    }

    pub fn get_order(&self, id: &OrderId) -> Result<Order, ServiceError> {
        self.read()?
            .orders
            .iter()
            .find(|o| o.id == *id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(RecordKind::Orders, id))
    }

    // ---------------------------------------------------------------------
    // Quotes
    // ---------------------------------------------------------------------

    #[instrument(skip_all, err)]
    pub async fn add_quote(&self, draft: QuoteDraft) -> Result<Quote, ServiceError> {
        self.ensure_attached()?;
        let quote = draft.into_quote(QuoteId::new())?;
        self.store.add_record(&quote).await?;
        upsert(&mut self.write()?.quotes, quote.clone());
        tracing::info!(quote_id = %quote.id, factory = %quote.factory, "quote created");
        Ok(quote)
    }

    #[instrument(skip_all, fields(quote_id = %quote.id), err)]
    pub async fn update_quote(&self, quote: Quote) -> Result<Quote, ServiceError> {
        self.ensure_attached()?;
        self.get_quote(&quote.id)?;
        if quote.constructor_name.trim().is_empty() {
            return Err(DomainError::validation("constructor name is required").into());
        }
        self.store.update_record(&quote).await?;
        upsert(&mut self.write()?.quotes, quote.clone());
        Ok(quote)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_quote(&self, id: QuoteId) -> Result<(), ServiceError> {
        self.ensure_attached()?;
        self.get_quote(&id)?;
        self.store.delete_record::<Quote>(&id).await?;
        self.write()?.quotes.retain(|q| q.id != id);
        Ok(())
    }

    #[instrument(skip(self, note), err)]
    pub async fn add_follow_up(
        &self,
        id: QuoteId,
        note: String,
        now: DateTime<Utc>,
    ) -> Result<FollowUp, ServiceError> {
        self.ensure_attached()?;
        let mut quote = self.get_quote(&id)?;
        let follow_up = quote.add_follow_up(FollowUpId::new(), note, now)?.clone();
        self.store.update_record(&quote).await?;
        upsert(&mut self.write()?.quotes, quote);
        Ok(follow_up)
    }

    // ---------------------------------------------------------------------
    // Orders
    // ---------------------------------------------------------------------

    #[instrument(skip(self, draft), err)]
    pub async fn add_order(&self, draft: OrderDraft, now: DateTime<Utc>) -> Result<Order, ServiceError> {
        self.ensure_attached()?;
        let order = {
            let snapshot = self.read()?;
            let ctx = OrderContext {
                settings: &snapshot.settings,
                loaded_orders: snapshot.orders.len(),
                now,
            };
            Order::create(OrderId::new(), draft, &ctx)?
        };
        self.store.add_record(&order).await?;
        upsert(&mut self.write()?.orders, order.clone());
        tracing::info!(
            order_id = %order.id,
            po_number = %order.po_number,
            delivery_date = %order.delivery_date,
            "order created"
        );
        Ok(order)
    }

    #[instrument(skip_all, fields(order_id = %order.id), err)]
    pub async fn update_order(&self, order: Order, now: DateTime<Utc>) -> Result<Order, ServiceError> {
        self.ensure_attached()?;
        let revised = {
            let snapshot = self.read()?;
            let prior = snapshot
                .orders
                .iter()
                .find(|o| o.id == order.id)
                .ok_or_else(|| ServiceError::not_found(RecordKind::Orders, order.id))?;
            let ctx = OrderContext {
                settings: &snapshot.settings,
                loaded_orders: snapshot.orders.len(),
                now,
            };
            Order::revise(prior, order, &ctx)?
        };
        self.persist_order(revised).await
    }

    /// Pin (`manual = true`) or release the delivery date of an order.
    #[instrument(skip(self), err)]
    pub async fn set_manual_delivery(
        &self,
        id: OrderId,
        manual: bool,
        date: Option<NaiveDate>,
    ) -> Result<Order, ServiceError> {
        self.ensure_attached()?;
        let mut order = self.get_order(&id)?;
        let settings = self.settings()?;
        delivery::set_manual(&mut order, manual, date, &settings)?;
        self.persist_order(order).await
    }

    #[instrument(skip(self, details), err)]
    pub async fn invoice_order(
        &self,
        id: OrderId,
        details: InvoiceDetails,
        now: DateTime<Utc>,
    ) -> Result<Order, ServiceError> {
        self.ensure_attached()?;
        let mut order = self.get_order(&id)?;
        order.invoice(details, now)?;
        let order = self.persist_order(order).await?;
        tracing::info!(order_id = %order.id, po_number = %order.po_number, "order invoiced");
        Ok(order)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_order(&self, id: OrderId) -> Result<(), ServiceError> {
        self.ensure_attached()?;
        self.get_order(&id)?;
        self.store.delete_record::<Order>(&id).await?;
        self.write()?.orders.retain(|o| o.id != id);
        Ok(())
    }

    /// Projected commission installments of one order.
    pub fn installments(&self, id: &OrderId) -> Result<Vec<Installment>, ServiceError> {
        Ok(commission::installments(&self.get_order(id)?))
    }

    async fn persist_order(&self, order: Order) -> Result<Order, ServiceError> {
        self.store.update_record(&order).await?;
        upsert(&mut self.write()?.orders, order.clone());
        Ok(order)
    }

    // ---------------------------------------------------------------------
    // Settings
    // ---------------------------------------------------------------------

    #[instrument(skip_all, err)]
    pub async fn update_settings(&self, settings: Settings) -> Result<Settings, ServiceError> {
        self.ensure_attached()?;
        self.store.update_settings(&settings).await?;
        self.write()?.settings = settings.clone();
        Ok(settings)
    }

    // ---------------------------------------------------------------------
    // Reports
    // ---------------------------------------------------------------------

    pub fn dashboard(&self, query: &ReportQuery, now: DateTime<Utc>) -> Result<DashboardView, ServiceError> {
        let snapshot = self.read()?;
        Ok(DashboardView::build(
            &snapshot.quotes,
            &snapshot.orders,
            &snapshot.settings,
            query,
            now,
        ))
    }

    pub fn billing(&self, query: &ReportQuery) -> Result<BillingView, ServiceError> {
        Ok(BillingView::build(&self.read()?.orders, query))
    }
}

/// Replace the record with the same id, or append it.
fn upsert<R: Entity>(records: &mut Vec<R>, record: R) {
    match records.iter_mut().find(|r| r.id() == record.id()) {
        Some(slot) => *slot = record,
        None => records.push(record),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, TimeZone};

    use super::*;
    use crate::store::MemoryStore;
    use repdesk_core::calendar::parse_day;
    use repdesk_sales::{Factory, OrderStatus, QuoteStatus};

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn order_draft(send: &str) -> OrderDraft {
        OrderDraft {
            constructor_name: "Construtora Horizonte".into(),
            project_name: "Residencial Aurora".into(),
            po_number: String::new(),
            send_date: parse_day(send).unwrap(),
            delivery_date: None,
            is_manual_delivery_date: false,
            factory: Factory::Condex,
            product: "Cabos".into(),
            quantity: 10,
            value: 10000.0,
            status: OrderStatus::AwaitingEntry,
            system_forecast: None,
        }
    }

    fn quote_draft() -> QuoteDraft {
        QuoteDraft {
            constructor_name: "Construtora Horizonte".into(),
            project_name: "Residencial Aurora".into(),
            date: parse_day("2024-03-04").unwrap(),
            factory: Factory::Mgm,
            product: "Fechadura".into(),
            status: QuoteStatus::Sent,
            value: 12500.0,
            contact_name: String::new(),
            phone: String::new(),
            email: String::new(),
        }
    }

    async fn attached() -> (Arc<MemoryStore>, DataService) {
        let store = Arc::new(MemoryStore::new());
        let service = DataService::new(store.clone());
        service.attach().await.unwrap();
        (store, service)
    }

    #[tokio::test]
    async fn writes_require_attach() {
        let service = DataService::new(Arc::new(MemoryStore::new()));
        assert!(!service.is_attached());
        assert!(matches!(
            service.add_quote(quote_draft()).await,
            Err(ServiceError::Detached)
        ));
        assert!(matches!(
            service.add_order(order_draft("2024-01-10"), ts(2024, 1, 10)).await,
            Err(ServiceError::Detached)
        ));
    }

    #[tokio::test]
    async fn attach_loads_existing_records_and_settings() {
        let store = Arc::new(MemoryStore::new());
        let mut settings = Settings::default();
        settings.set_lead_time("Cabos", 20);
        store.update_settings(&settings).await.unwrap();
        let quote = quote_draft().into_quote(QuoteId::new()).unwrap();
        store.add_record(&quote).await.unwrap();

        let service = DataService::new(store);
        service.attach().await.unwrap();
        service.attach().await.unwrap();

        assert_eq!(service.quotes().unwrap(), vec![quote]);
        assert_eq!(service.settings().unwrap().lead_time_days("Cabos"), 20);
    }

    #[tokio::test]
    async fn new_orders_get_numbered_and_dated() {
        let (_store, service) = attached().await;
        let mut settings = Settings::default();
        settings.set_lead_time("Cabos", 20);
        service.update_settings(settings).await.unwrap();

        let now = ts(2024, 1, 10);
        let first = service.add_order(order_draft("2024-01-10"), now).await.unwrap();
        let second = service.add_order(order_draft("2024-01-12"), now).await.unwrap();

        assert_eq!(first.po_number, format!("OC-{}-0001", now.year()));
        assert_eq!(second.po_number, format!("OC-{}-0002", now.year()));
        assert_eq!(first.status_date, now);
        assert_eq!(first.delivery_date, parse_day("2024-01-30").unwrap());
        assert_eq!(service.orders().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn status_change_refreshes_status_date_only_when_changed() {
        let (_store, service) = attached().await;
        let created = service
            .add_order(order_draft("2024-01-10"), ts(2024, 1, 10))
            .await
            .unwrap();

        let mut edit = created.clone();
        edit.value = 12000.0;
        let kept = service.update_order(edit, ts(2024, 1, 15)).await.unwrap();
        assert_eq!(kept.status_date, created.status_date);
        assert_eq!(kept.delivery_date, created.delivery_date);

        let mut edit = kept.clone();
        edit.status = OrderStatus::Credit;
        let moved = service.update_order(edit, ts(2024, 1, 16)).await.unwrap();
        assert_eq!(moved.status_date, ts(2024, 1, 16));
        assert_eq!(service.get_order(&created.id).unwrap(), moved);
    }

    #[tokio::test]
    async fn manual_delivery_is_kept_until_released() {
        let (_store, service) = attached().await;
        let order = service
            .add_order(order_draft("2024-01-10"), ts(2024, 1, 10))
            .await
            .unwrap();
        let pinned = parse_day("2024-03-01").unwrap();

        let manual = service
            .set_manual_delivery(order.id, true, Some(pinned))
            .await
            .unwrap();
        assert!(manual.is_manual_delivery_date);

        let mut edit = manual.clone();
        edit.send_date = parse_day("2024-02-01").unwrap();
        let edited = service.update_order(edit, ts(2024, 1, 11)).await.unwrap();
        assert_eq!(edited.delivery_date, pinned);

        let released = service
            .set_manual_delivery(order.id, false, None)
            .await
            .unwrap();
        assert!(!released.is_manual_delivery_date);
        assert_eq!(released.delivery_date, parse_day("2024-02-16").unwrap());
    }

    #[tokio::test]
    async fn invoicing_produces_installments() {
        let (_store, service) = attached().await;
        let order = service
            .add_order(order_draft("2024-01-10"), ts(2024, 1, 10))
            .await
            .unwrap();
        assert!(service.installments(&order.id).unwrap().is_empty());

        let details = InvoiceDetails {
            invoice_date: parse_day("2024-02-01").unwrap(),
            payment_terms: "30/60 dias".into(),
            commission_rate: 5.0,
        };
        let invoiced = service
            .invoice_order(order.id, details, ts(2024, 2, 1))
            .await
            .unwrap();
        assert_eq!(invoiced.status, OrderStatus::Invoiced);
        assert_eq!(invoiced.status_date, ts(2024, 2, 1));

        let parts = service.installments(&order.id).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| (p.amount - 250.0).abs() < 1e-9));
    }

    #[tokio::test]
    async fn follow_ups_are_persisted() {
        let (store, service) = attached().await;
        let quote = service.add_quote(quote_draft()).await.unwrap();
        let note = service
            .add_follow_up(quote.id, "liguei".into(), ts(2024, 3, 5))
            .await
            .unwrap();

        let stored: Vec<Quote> = store.list_records().await.unwrap();
        assert_eq!(stored[0].follow_ups, vec![note]);
        assert!(service
            .add_follow_up(quote.id, "  ".into(), ts(2024, 3, 5))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let (_store, service) = attached().await;
        assert!(matches!(
            service.delete_order(OrderId::new()).await,
            Err(ServiceError::NotFound { kind: RecordKind::Orders, .. })
        ));
        assert!(matches!(
            service.delete_quote(QuoteId::new()).await,
            Err(ServiceError::NotFound { kind: RecordKind::Quotes, .. })
        ));
    }

    #[tokio::test]
    async fn catalog_mismatch_is_a_domain_error() {
        let (_store, service) = attached().await;
        let mut draft = quote_draft();
        draft.product = "Cabos".into();
        assert!(matches!(
            service.add_quote(draft).await,
            Err(ServiceError::Domain(DomainError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn detach_clears_records_and_blocks_writes() {
        let (store, service) = attached().await;
        service.add_quote(quote_draft()).await.unwrap();
        service.detach();

        assert!(!service.is_attached());
        assert!(service.quotes().unwrap().is_empty());
        assert!(matches!(
            service.add_quote(quote_draft()).await,
            Err(ServiceError::Detached)
        ));

        // Store changes no longer reach the snapshot.
        store
            .add_record(&quote_draft().into_quote(QuoteId::new()).unwrap())
            .await
            .unwrap();
        assert!(service.quotes().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dashboard_reflects_snapshot() {
        let (_store, service) = attached().await;
        service.add_quote(quote_draft()).await.unwrap();
        service
            .add_order(order_draft("2024-03-10"), ts(2024, 3, 10))
            .await
            .unwrap();

        let query = ReportQuery::current_month(parse_day("2024-03-15").unwrap());
        let view = service.dashboard(&query, ts(2024, 3, 15)).unwrap();
        assert_eq!(view.quotes.count, 1);
        assert_eq!(view.orders.count, 1);

        let billing = service.billing(&query).unwrap();
        assert_eq!(billing.total_revenue, 0.0);
    }
}
