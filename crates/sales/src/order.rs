use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use repdesk_core::calendar;
use repdesk_core::{DomainError, Entity, OrderId, Record, RecordKind};

use crate::catalog::Factory;
use crate::delivery;
use crate::numbering;
use crate::settings::Settings;

/// Commission rate proposed when an order is billed without one.
pub const DEFAULT_COMMISSION_RATE: f64 = 3.0;

/// Purchase order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Aguardando digitação")]
    AwaitingEntry,
    #[serde(rename = "Liberado")]
    Released,
    #[serde(rename = "Crédito")]
    Credit,
    #[serde(rename = "Cancelado")]
    Cancelled,
    #[serde(rename = "Faturado")]
    Invoiced,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::AwaitingEntry,
        OrderStatus::Released,
        OrderStatus::Credit,
        OrderStatus::Cancelled,
        OrderStatus::Invoiced,
    ];
}

/// An order that has stayed too long in a waiting status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusAlert {
    /// Waiting for entry at the factory for more than 5 days.
    AwaitingEntryOverdue { days: i64 },
    /// Stuck in credit analysis for more than 2 days.
    CreditReviewOverdue { days: i64 },
}

/// A confirmed purchase tracked through fulfillment and invoicing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub constructor_name: String,
    #[serde(rename = "workName")]
    pub project_name: String,
    pub po_number: String,
    #[serde(with = "calendar::serde_day")]
    pub send_date: NaiveDate,
    #[serde(with = "calendar::serde_day")]
    pub delivery_date: NaiveDate,
    #[serde(default)]
    pub is_manual_delivery_date: bool,
    pub factory: Factory,
    pub product: String,
    pub quantity: i64,
    pub value: f64,
    pub status: OrderStatus,
    pub status_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "calendar::serde_day::option")]
    pub system_forecast: Option<NaiveDate>,

    // Billing fields, meaningful once the order is invoiced.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "calendar::serde_day::option")]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
}

/// Explicit inputs the order rules depend on.
#[derive(Debug, Clone, Copy)]
pub struct OrderContext<'a> {
    pub settings: &'a Settings,
    /// Orders currently loaded by the caller (drives PO numbering).
    pub loaded_orders: usize,
    pub now: DateTime<Utc>,
}

/// Fields submitted by the order form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub constructor_name: String,
    #[serde(rename = "workName")]
    pub project_name: String,
    #[serde(default)]
    pub po_number: String,
    #[serde(with = "calendar::serde_day")]
    pub send_date: NaiveDate,
    #[serde(default, with = "calendar::serde_day::option")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_manual_delivery_date: bool,
    pub factory: Factory,
    pub product: String,
    pub quantity: i64,
    pub value: f64,
    #[serde(default = "default_order_status")]
    pub status: OrderStatus,
    #[serde(default, with = "calendar::serde_day::option")]
    pub system_forecast: Option<NaiveDate>,
}

fn default_order_status() -> OrderStatus {
    OrderStatus::AwaitingEntry
}

/// Billing data captured when an order is invoiced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetails {
    #[serde(with = "calendar::serde_day")]
    pub invoice_date: NaiveDate,
    pub payment_terms: String,
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,
}

fn default_commission_rate() -> f64 {
    DEFAULT_COMMISSION_RATE
}

impl Order {
    /// Build a new order from the form.
    ///
    /// Assigns a PO number when none was given, stamps the status date and
    /// derives the delivery date unless it was pinned manually.
    pub fn create(id: OrderId, draft: OrderDraft, ctx: &OrderContext<'_>) -> Result<Order, DomainError> {
        if draft.constructor_name.trim().is_empty() {
            return Err(DomainError::validation("constructor name is required"));
        }
        if draft.quantity < 0 {
            return Err(DomainError::validation("quantity must not be negative"));
        }
        if !draft.value.is_finite() || draft.value < 0.0 {
            return Err(DomainError::validation("value must be a non-negative number"));
        }
        draft.factory.ensure_offers(&draft.product)?;

        let delivery_date = match (draft.is_manual_delivery_date, draft.delivery_date) {
            (true, Some(date)) => date,
            (true, None) => {
                return Err(DomainError::validation(
                    "a manual delivery date requires a delivery date",
                ));
            }
            // Placeholder, replaced by the derivation below.
            (false, _) => draft.send_date,
        };

        let po_number = match draft.po_number.trim() {
            "" => numbering::po_number(ctx.now.year(), ctx.loaded_orders),
            given => given.to_string(),
        };

        let mut order = Order {
            id,
            constructor_name: draft.constructor_name,
            project_name: draft.project_name,
            po_number,
            send_date: draft.send_date,
            delivery_date,
            is_manual_delivery_date: draft.is_manual_delivery_date,
            factory: draft.factory,
            product: draft.product,
            quantity: draft.quantity,
            value: draft.value,
            status: draft.status,
            status_date: ctx.now,
            system_forecast: draft.system_forecast,
            invoice_date: None,
            payment_terms: None,
            commission_rate: None,
        };
        delivery::apply_on_create(&mut order, ctx.settings)?;
        Ok(order)
    }

    /// Apply an edit of `prior`, returning the version to store.
    ///
    /// The status date moves to `now` only when the status changed, a blank PO
    /// number keeps the stored one, and the delivery date follows
    /// [`delivery::apply_on_update`].
    pub fn revise(prior: &Order, mut next: Order, ctx: &OrderContext<'_>) -> Result<Order, DomainError> {
        next.id = prior.id;
        if next.po_number.trim().is_empty() {
            next.po_number = prior.po_number.clone();
        }
        let status = next.status;
        next.status = prior.status;
        next.status_date = prior.status_date;
        next.set_status(status, ctx.now);
        delivery::apply_on_update(prior, &mut next, ctx.settings)?;
        Ok(next)
    }

    /// Move to `status`, stamping the status date only on an actual change.
    pub fn set_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        if self.status != status {
            self.status = status;
            self.status_date = now;
        }
    }

    /// Mark the order invoiced and record its billing data.
    pub fn invoice(&mut self, details: InvoiceDetails, now: DateTime<Utc>) -> Result<(), DomainError> {
        if details.payment_terms.trim().is_empty() {
            return Err(DomainError::validation("payment terms are required"));
        }
        if !details.commission_rate.is_finite() || details.commission_rate < 0.0 {
            return Err(DomainError::validation("commission rate must be a non-negative number"));
        }
        self.status = OrderStatus::Invoiced;
        self.status_date = now;
        self.invoice_date = Some(details.invoice_date);
        self.payment_terms = Some(details.payment_terms);
        self.commission_rate = Some(details.commission_rate);
        Ok(())
    }

    /// Invoiced with the data needed to project commission installments.
    pub fn is_billable(&self) -> bool {
        self.status == OrderStatus::Invoiced
            && self.invoice_date.is_some()
            && self.payment_terms.is_some()
    }

    /// Days elapsed since the last status change, by calendar day.
    pub fn days_in_status(&self, now: DateTime<Utc>) -> i64 {
        calendar::days_between(calendar::day_of(self.status_date), calendar::day_of(now))
    }

    pub fn status_alert(&self, now: DateTime<Utc>) -> Option<StatusAlert> {
        let days = self.days_in_status(now);
        match self.status {
            OrderStatus::AwaitingEntry if days > 5 => Some(StatusAlert::AwaitingEntryOverdue { days }),
            OrderStatus::Credit if days > 2 => Some(StatusAlert::CreditReviewOverdue { days }),
            _ => None,
        }
    }

    /// The factory's own forecast lands after the promised delivery date.
    pub fn is_delivery_late(&self) -> bool {
        self.system_forecast
            .is_some_and(|forecast| forecast > self.delivery_date)
    }

    /// Case-insensitive match against the name fields shown in listings.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.constructor_name, &self.project_name, &self.po_number, &self.product]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Record for Order {
    const KIND: RecordKind = RecordKind::Orders;
}
