//! Sales against prorated monthly targets.

use repdesk_core::calendar::DateRange;
use repdesk_sales::{Factory, FactoryPerformance, Order, Settings, TotalPerformance};

/// One row per factory in catalog order, restricted to `factory` when set.
///
/// `orders` are the orders already selected for the window; their full value
/// counts as actual sales regardless of status.
pub fn factory_performance(
    orders: &[&Order],
    settings: &Settings,
    range: &DateRange,
    factory: Option<Factory>,
) -> Vec<FactoryPerformance> {
    Factory::ALL
        .into_iter()
        .filter(|f| factory.is_none_or(|only| only == *f))
        .map(|f| {
            let actual = orders
                .iter()
                .filter(|o| o.factory == f)
                .map(|o| o.value)
                .sum();
            FactoryPerformance::compute(f, actual, settings.monthly_target(f), range)
        })
        .collect()
}

pub fn total_performance(rows: &[FactoryPerformance]) -> TotalPerformance {
    TotalPerformance::from_factories(rows)
}
