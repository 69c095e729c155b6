//! Aggregation queries over quotes and orders.
//!
//! Every function here is a pure function of (records, filter) to a derived
//! view. Nothing is cached; callers recompute on each data or filter change.

pub mod billing;
pub mod dashboard;
pub mod filter;
pub mod orders;
pub mod performance;
pub mod quotes;

#[cfg(test)]
pub(crate) mod fixtures;

pub use billing::{CommissionForecast, FactoryRevenue, MonthlyCommission};
pub use dashboard::{BillingView, DashboardView, OrderAttention, ReportQuery};
pub use filter::{Filterable, RecordFilter, SortOrder, sort_by_date};
pub use orders::{OrderSummary, ProductForecast, ProductSales};
pub use quotes::{FactoryQuotes, QuoteSummary};
