//! Composite views served by the report endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use repdesk_core::OrderId;
use repdesk_core::calendar::DateRange;
use repdesk_sales::{
    Factory, FactoryPerformance, Order, OrderStatus, Quote, Settings, StatusAlert,
    TotalPerformance,
};

use crate::billing::{self, CommissionForecast, FactoryRevenue};
use crate::filter::RecordFilter;
use crate::orders::{self, OrderSummary, ProductForecast, ProductSales};
use crate::performance;
use crate::quotes::{self, FactoryQuotes, QuoteSummary};

/// Report window plus the optional single-factory filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ReportQuery {
    pub range: DateRange,
    pub factory: Option<Factory>,
}

impl ReportQuery {
    pub fn new(range: DateRange, factory: Option<Factory>) -> Self {
        Self { range, factory }
    }

    /// The calendar month containing `today`, all factories.
    pub fn current_month(today: NaiveDate) -> Self {
        Self::new(DateRange::month_of(today), None)
    }
}

/// An order that needs a follow-up from the rep.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAttention {
    pub order_id: OrderId,
    pub po_number: String,
    pub constructor_name: String,
    pub factory: Factory,
    pub status: OrderStatus,
    pub alert: Option<StatusAlert>,
    pub late_delivery: bool,
}

impl OrderAttention {
    fn of(order: &Order, now: DateTime<Utc>) -> Option<Self> {
        let alert = order.status_alert(now);
        let late_delivery = order.is_delivery_late();
        if alert.is_none() && !late_delivery {
            return None;
        }
        Some(Self {
            order_id: order.id,
            po_number: order.po_number.clone(),
            constructor_name: order.constructor_name.clone(),
            factory: order.factory,
            status: order.status,
            alert,
            late_delivery,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub query: ReportQuery,
    pub quotes: QuoteSummary,
    /// Over every quote in the window, ignoring the factory filter.
    pub conversion_rate: f64,
    pub quotes_by_factory: Vec<FactoryQuotes>,
    pub orders: OrderSummary,
    pub sales_by_product: Vec<ProductSales>,
    pub forecast_by_product: Vec<ProductForecast>,
    pub factory_performance: Vec<FactoryPerformance>,
    pub total_performance: TotalPerformance,
    pub attention: Vec<OrderAttention>,
}

impl DashboardView {
    pub fn build(
        quotes: &[Quote],
        orders: &[Order],
        settings: &Settings,
        query: &ReportQuery,
        now: DateTime<Utc>,
    ) -> Self {
        let quotes_in_window = RecordFilter::in_range(query.range).apply(quotes);
        let factory_quotes: Vec<&Quote> = quotes_in_window
            .iter()
            .copied()
            .filter(|q| query.factory.is_none_or(|f| f == q.factory))
            .collect();

        let orders_in_window = RecordFilter::in_range(query.range).apply(orders);
        let factory_orders: Vec<&Order> = orders_in_window
            .iter()
            .copied()
            .filter(|o| query.factory.is_none_or(|f| f == o.factory))
            .collect();

        let factory_performance = performance::factory_performance(
            &orders_in_window,
            settings,
            &query.range,
            query.factory,
        );
        let total_performance = performance::total_performance(&factory_performance);

        let mut attention: Vec<OrderAttention> = orders
            .iter()
            .filter(|o| query.factory.is_none_or(|f| f == o.factory))
            .filter_map(|o| OrderAttention::of(o, now))
            .collect();
        attention.sort_by(|a, b| a.po_number.cmp(&b.po_number));

        Self {
            query: *query,
            quotes: quotes::summarize(&factory_quotes),
            conversion_rate: quotes::conversion_rate(&quotes_in_window),
            quotes_by_factory: quotes::by_factory(&factory_quotes),
            orders: orders::summarize(&factory_orders),
            sales_by_product: orders::sales_by_product(&factory_orders),
            forecast_by_product: orders::forecast_by_product(orders, &query.range, query.factory),
            factory_performance,
            total_performance,
            attention,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingView {
    pub query: ReportQuery,
    pub total_revenue: f64,
    pub revenue_by_factory: Vec<FactoryRevenue>,
    pub commission: CommissionForecast,
}

impl BillingView {
    pub fn build(orders: &[Order], query: &ReportQuery) -> Self {
        let invoiced = billing::invoiced_in_range(orders, &query.range, query.factory);
        Self {
            query: *query,
            total_revenue: invoiced.iter().map(|o| o.value).sum(),
            revenue_by_factory: billing::revenue_by_factory(&invoiced),
            commission: billing::commission_forecast(orders, &query.range, query.factory),
        }
    }
}
