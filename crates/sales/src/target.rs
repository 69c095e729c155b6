//! Target proration and achievement.
//!
//! Monthly targets are prorated to the length of the report window as if every
//! month had 30 days.

use serde::Serialize;

use repdesk_core::calendar::DateRange;

use crate::catalog::Factory;

/// `monthly_target / 30 * days_in_range`.
pub fn prorated_target(monthly_target: f64, range: &DateRange) -> f64 {
    monthly_target / 30.0 * range.days() as f64
}

/// `actual / target * 100`, or 0 when there is no target.
pub fn achievement_pct(actual: f64, target: f64) -> f64 {
    if target > 0.0 {
        actual / target * 100.0
    } else {
        0.0
    }
}

/// Round to one decimal place for display.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryPerformance {
    pub factory: Factory,
    pub actual: f64,
    pub monthly_target: f64,
    /// Target prorated to the report window.
    pub target: f64,
    pub percentage: f64,
}

impl FactoryPerformance {
    pub fn compute(factory: Factory, actual: f64, monthly_target: f64, range: &DateRange) -> Self {
        let target = prorated_target(monthly_target, range);
        Self {
            factory,
            actual,
            monthly_target,
            target,
            percentage: round1(achievement_pct(actual, target)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalPerformance {
    pub actual: f64,
    pub target: f64,
    /// Achievement clamped at 100 for gauge encodings.
    pub percentage: f64,
    /// Unrounded, unclamped achievement.
    pub real_percentage: f64,
}

impl TotalPerformance {
    pub fn from_factories<'a>(rows: impl IntoIterator<Item = &'a FactoryPerformance>) -> Self {
        let (actual, target) = rows
            .into_iter()
            .fold((0.0, 0.0), |(a, t), row| (a + row.actual, t + row.target));
        let real = achievement_pct(actual, target);
        Self {
            actual,
            target,
            percentage: real.min(100.0),
            real_percentage: real,
        }
    }
}
