//! Invoiced revenue and the commission forecast.

use std::collections::BTreeMap;

use serde::Serialize;

use repdesk_core::calendar::{self, DateRange};
use repdesk_sales::commission;
use repdesk_sales::{Factory, Order, OrderStatus};

/// Invoiced orders whose invoice date falls in `range`.
pub fn invoiced_in_range<'a>(
    orders: &'a [Order],
    range: &DateRange,
    factory: Option<Factory>,
) -> Vec<&'a Order> {
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Invoiced)
        .filter(|o| o.invoice_date.is_some_and(|d| range.contains(d)))
        .filter(|o| factory.is_none_or(|f| f == o.factory))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactoryRevenue {
    pub factory: Factory,
    pub value: f64,
}

/// Invoiced value per factory, highest first.
pub fn revenue_by_factory(invoiced: &[&Order]) -> Vec<FactoryRevenue> {
    let mut groups: BTreeMap<Factory, f64> = BTreeMap::new();
    for o in invoiced {
        *groups.entry(o.factory).or_default() += o.value;
    }
    let mut rows: Vec<FactoryRevenue> = groups
        .into_iter()
        .map(|(factory, value)| FactoryRevenue { factory, value })
        .collect();
    rows.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.factory.as_str().cmp(b.factory.as_str()))
    });
    rows
}

/// Commission falling due in one month, split by factory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCommission {
    /// `YYYY-MM`.
    pub month: String,
    /// Display label such as `mar/2024`.
    pub label: String,
    pub by_factory: BTreeMap<Factory, f64>,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommissionForecast {
    /// Months in ascending order; months without installments are absent.
    pub months: Vec<MonthlyCommission>,
    pub total: f64,
}

/// Commission installments of every billable order that fall due in `range`.
///
/// The window selects installments, not orders: an order invoiced before the
/// window still contributes the installments that land inside it.
pub fn commission_forecast(
    orders: &[Order],
    range: &DateRange,
    factory: Option<Factory>,
) -> CommissionForecast {
    let mut months: BTreeMap<String, MonthlyCommission> = BTreeMap::new();
    let mut total = 0.0;

    let billable = orders
        .iter()
        .filter(|o| o.is_billable())
        .filter(|o| factory.is_none_or(|f| f == o.factory));

    for order in billable {
        for installment in commission::installments(order) {
            if !range.contains(installment.date) {
                continue;
            }
            let month = months
                .entry(installment.month_key())
                .or_insert_with(|| MonthlyCommission {
                    month: installment.month_key(),
                    label: calendar::month_label(installment.date),
                    by_factory: BTreeMap::new(),
                    total: 0.0,
                });
            *month.by_factory.entry(installment.factory).or_default() += installment.amount;
            month.total += installment.amount;
            total += installment.amount;
        }
    }

    CommissionForecast {
        months: months.into_values().collect(),
        total,
    }
}
