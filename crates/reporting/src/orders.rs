//! Order summaries and product groupings.

use std::collections::BTreeMap;

use serde::Serialize;

use repdesk_core::calendar::DateRange;
use repdesk_sales::{Factory, Order};

/// Quantity totals saturate at `i64::MAX`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderSummary {
    pub count: usize,
    pub value: f64,
    pub quantity: i64,
}

pub fn summarize(orders: &[&Order]) -> OrderSummary {
    OrderSummary {
        count: orders.len(),
        value: orders.iter().map(|o| o.value).sum(),
        quantity: orders
            .iter()
            .fold(0i64, |total, o| total.saturating_add(o.quantity)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub product: String,
    pub value: f64,
    pub quantity: i64,
}

/// Sales mix per product, highest value first.
pub fn sales_by_product(orders: &[&Order]) -> Vec<ProductSales> {
    let mut groups: BTreeMap<&str, (f64, i64)> = BTreeMap::new();
    for o in orders {
        let entry = groups.entry(o.product.as_str()).or_default();
        entry.0 += o.value;
        entry.1 = entry.1.saturating_add(o.quantity);
    }

    let mut rows: Vec<ProductSales> = groups
        .into_iter()
        .map(|(product, (value, quantity))| ProductSales {
            product: product.to_string(),
            value,
            quantity,
        })
        .collect();
    rows.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.product.cmp(&b.product)));
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductForecast {
    pub product: String,
    pub quantity: i64,
}

/// Quantity per product of orders whose factory forecast falls in `range`.
///
/// Works over every order, not only those sent within the window.
pub fn forecast_by_product(
    orders: &[Order],
    range: &DateRange,
    factory: Option<Factory>,
) -> Vec<ProductForecast> {
    let mut groups: BTreeMap<&str, i64> = BTreeMap::new();
    for o in orders {
        let Some(forecast) = o.system_forecast else {
            continue;
        };
        if !range.contains(forecast) || factory.is_some_and(|f| f != o.factory) {
            continue;
        }
        let total = groups.entry(o.product.as_str()).or_default();
        *total = total.saturating_add(o.quantity);
    }

    let mut rows: Vec<ProductForecast> = groups
        .into_iter()
        .map(|(product, quantity)| ProductForecast {
            product: product.to_string(),
            quantity,
        })
        .collect();
    rows.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.product.cmp(&b.product)));
    rows
}
