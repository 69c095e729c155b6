//! Sales representation domain: quotes, purchase orders, settings and the
//! derivation rules that keep dependent fields consistent.
//!
//! This crate contains business rules only, implemented as deterministic
//! functions of their inputs (no IO, no HTTP, no storage). Settings, the
//! current time and the number of loaded orders are always passed in
//! explicitly through [`OrderContext`].

pub mod catalog;
pub mod commission;
pub mod delivery;
pub mod numbering;
pub mod order;
pub mod quote;
pub mod settings;
pub mod target;

pub use catalog::{Factory, PAYMENT_TERMS, UPFRONT_TERMS};
pub use commission::{Installment, PaymentSchedule};
pub use order::{DEFAULT_COMMISSION_RATE, InvoiceDetails, Order, OrderContext, OrderDraft, OrderStatus, StatusAlert};
pub use quote::{FollowUp, Quote, QuoteDraft, QuoteStatus};
pub use settings::{DEFAULT_LEAD_TIME_DAYS, ProductSettings, Settings, TargetSettings};
pub use target::{FactoryPerformance, TotalPerformance};
