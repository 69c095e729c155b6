//! Fixed vocabularies: represented factories, their product catalogs and the
//! payment terms offered at invoicing time.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use repdesk_core::DomainError;

/// A factory (manufacturer) the company represents.
///
/// Serialized with the literal names used by stored documents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Factory {
    #[serde(rename = "Alumbra")]
    Alumbra,
    #[serde(rename = "MGM")]
    Mgm,
    #[serde(rename = "DM2")]
    Dm2,
    #[serde(rename = "DACAPO")]
    Dacapo,
    #[serde(rename = "Roca")]
    Roca,
    #[serde(rename = "Condex")]
    Condex,
    #[serde(rename = "Construcom")]
    Construcom,
}

impl Factory {
    pub const ALL: [Factory; 7] = [
        Factory::Alumbra,
        Factory::Mgm,
        Factory::Dm2,
        Factory::Dacapo,
        Factory::Roca,
        Factory::Condex,
        Factory::Construcom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Factory::Alumbra => "Alumbra",
            Factory::Mgm => "MGM",
            Factory::Dm2 => "DM2",
            Factory::Dacapo => "DACAPO",
            Factory::Roca => "Roca",
            Factory::Condex => "Condex",
            Factory::Construcom => "Construcom",
        }
    }

    /// Products this factory sells.
    pub fn products(&self) -> &'static [&'static str] {
        match self {
            Factory::Alumbra => &["Acabamentos Elétricos", "Disjuntores"],
            Factory::Mgm => &["Kit porta pronta", "Esquadrias de alumínio", "Fechadura", "Alizar"],
            Factory::Dm2 => &["Porta Corta-fogo"],
            Factory::Dacapo => &["Revestimentos"],
            Factory::Roca => &["Sanitários", "Porcelanato"],
            Factory::Condex => &["Cabos"],
            Factory::Construcom => &["Blocos de concreto", "Piso intertravado", "Argamassas"],
        }
    }

    pub fn offers(&self, product: &str) -> bool {
        self.products().contains(&product)
    }

    /// Validate that `product` belongs to this factory's catalog.
    pub fn ensure_offers(&self, product: &str) -> Result<(), DomainError> {
        if self.offers(product) {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "product {product:?} is not in the {} catalog",
                self.as_str()
            )))
        }
    }
}

impl core::fmt::Display for Factory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Factory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Factory::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown factory: {s}")))
    }
}

/// The single-installment term paid at order registration.
pub const UPFRONT_TERMS: &str = "Antecipado";

/// Payment terms offered when an order is invoiced.
pub const PAYMENT_TERMS: [&str; 9] = [
    UPFRONT_TERMS,
    "28 dias",
    "30 dias",
    "45 dias",
    "60 dias",
    "28/56 dias",
    "30/60 dias",
    "30/60/90 dias",
    "30/60/90/120 dias",
];
