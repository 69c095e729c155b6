//! Global settings: per-product lead times and per-factory monthly targets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Factory;

/// Lead time used when a product has no (or a zero) configured lead time.
pub const DEFAULT_LEAD_TIME_DAYS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSettings {
    pub lead_time_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSettings {
    pub monthly_target: f64,
}

/// Settings document, keyed by product name and factory name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub products: BTreeMap<String, ProductSettings>,
    #[serde(default)]
    pub targets: BTreeMap<String, TargetSettings>,
}

impl Settings {
    /// Settings with every catalog product and factory present, using the
    /// default lead time and a zero target.
    pub fn with_catalog_defaults() -> Self {
        let mut settings = Self::default();
        for factory in Factory::ALL {
            for product in factory.products() {
                settings.set_lead_time(*product, DEFAULT_LEAD_TIME_DAYS);
            }
            settings.set_monthly_target(factory, 0.0);
        }
        settings
    }

    /// Lead time in calendar days for `product`.
    ///
    /// A missing entry or a zero value falls back to [`DEFAULT_LEAD_TIME_DAYS`].
    pub fn lead_time_days(&self, product: &str) -> u32 {
        match self.products.get(product) {
            Some(p) if p.lead_time_days > 0 => p.lead_time_days,
            _ => DEFAULT_LEAD_TIME_DAYS,
        }
    }

    /// Configured monthly target for `factory`, 0 when unset.
    pub fn monthly_target(&self, factory: Factory) -> f64 {
        self.targets
            .get(factory.as_str())
            .map(|t| t.monthly_target)
            .unwrap_or(0.0)
    }

    pub fn set_lead_time(&mut self, product: impl Into<String>, days: u32) {
        self.products
            .insert(product.into(), ProductSettings { lead_time_days: days });
    }

    pub fn set_monthly_target(&mut self, factory: Factory, monthly_target: f64) {
        self.targets
            .insert(factory.as_str().to_string(), TargetSettings { monthly_target });
    }
}
