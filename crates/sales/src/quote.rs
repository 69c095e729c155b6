use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use repdesk_core::calendar;
use repdesk_core::{DomainError, Entity, FollowUpId, QuoteId, Record, RecordKind};

use crate::catalog::Factory;

/// Quote status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteStatus {
    #[serde(rename = "Enviado")]
    Sent,
    #[serde(rename = "Em negociação")]
    Negotiating,
    #[serde(rename = "Fechado")]
    Closed,
    #[serde(rename = "Perdido")]
    Lost,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 4] = [
        QuoteStatus::Sent,
        QuoteStatus::Negotiating,
        QuoteStatus::Closed,
        QuoteStatus::Lost,
    ];
}

/// A timestamped note recorded while following a quote up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: FollowUpId,
    pub date: DateTime<Utc>,
    pub note: String,
}

/// A price proposal sent to a prospective client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: QuoteId,
    pub constructor_name: String,
    #[serde(rename = "workName")]
    pub project_name: String,
    #[serde(with = "calendar::serde_day")]
    pub date: NaiveDate,
    pub factory: Factory,
    pub product: String,
    pub status: QuoteStatus,
    pub value: f64,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub follow_ups: Vec<FollowUp>,
}

impl Quote {
    pub fn is_closed(&self) -> bool {
        self.status == QuoteStatus::Closed
    }

    /// Append a follow-up note; notes keep insertion order.
    pub fn add_follow_up(
        &mut self,
        id: FollowUpId,
        note: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<&FollowUp, DomainError> {
        let note = note.into();
        if note.trim().is_empty() {
            return Err(DomainError::validation("follow-up note must not be empty"));
        }
        self.follow_ups.push(FollowUp { id, date: at, note });
        Ok(&self.follow_ups[self.follow_ups.len() - 1])
    }

    /// Case-insensitive match against the name fields shown in listings.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.constructor_name, &self.project_name, &self.product]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl Entity for Quote {
    type Id = QuoteId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Record for Quote {
    const KIND: RecordKind = RecordKind::Quotes;
}

/// Fields submitted by the quote form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDraft {
    pub constructor_name: String,
    #[serde(rename = "workName")]
    pub project_name: String,
    #[serde(with = "calendar::serde_day")]
    pub date: NaiveDate,
    pub factory: Factory,
    pub product: String,
    #[serde(default = "default_quote_status")]
    pub status: QuoteStatus,
    pub value: f64,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

fn default_quote_status() -> QuoteStatus {
    QuoteStatus::Sent
}

impl QuoteDraft {
    /// Validate the form and build a quote without follow-ups.
    ///
    /// The product must belong to the factory catalog at creation time; later
    /// edits are not re-checked.
    pub fn into_quote(self, id: QuoteId) -> Result<Quote, DomainError> {
        if self.constructor_name.trim().is_empty() {
            return Err(DomainError::validation("constructor name is required"));
        }
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(DomainError::validation("value must be a non-negative number"));
        }
        self.factory.ensure_offers(&self.product)?;

        Ok(Quote {
            id,
            constructor_name: self.constructor_name,
            project_name: self.project_name,
            date: self.date,
            factory: self.factory,
            product: self.product,
            status: self.status,
            value: self.value,
            contact_name: self.contact_name,
            phone: self.phone,
            email: self.email,
            follow_ups: Vec::new(),
        })
    }
}
