//! Record filtering shared by listings and reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use repdesk_core::calendar::DateRange;
use repdesk_sales::{Factory, Order, OrderStatus, Quote, QuoteStatus};

/// What a [`RecordFilter`] needs to know about a record.
pub trait Filterable {
    type Status: Copy + PartialEq;

    /// Day the date-range filter applies to.
    fn filter_date(&self) -> NaiveDate;
    fn factory(&self) -> Factory;
    fn status(&self) -> Self::Status;
    fn matches_search(&self, needle: &str) -> bool;
}

impl Filterable for Quote {
    type Status = QuoteStatus;

    fn filter_date(&self) -> NaiveDate {
        self.date
    }

    fn factory(&self) -> Factory {
        self.factory
    }

    fn status(&self) -> QuoteStatus {
        self.status
    }

    fn matches_search(&self, needle: &str) -> bool {
        Quote::matches_search(self, needle)
    }
}

impl Filterable for Order {
    type Status = OrderStatus;

    fn filter_date(&self) -> NaiveDate {
        self.send_date
    }

    fn factory(&self) -> Factory {
        self.factory
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn matches_search(&self, needle: &str) -> bool {
        Order::matches_search(self, needle)
    }
}

/// Conjunction of optional criteria. Unset criteria match everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter<S> {
    pub range: Option<DateRange>,
    pub factory: Option<Factory>,
    pub status: Option<S>,
    pub search: Option<String>,
}

impl<S> Default for RecordFilter<S> {
    fn default() -> Self {
        Self {
            range: None,
            factory: None,
            status: None,
            search: None,
        }
    }
}

impl<S: Copy + PartialEq> RecordFilter<S> {
    pub fn in_range(range: DateRange) -> Self {
        Self {
            range: Some(range),
            ..Self::default()
        }
    }

    pub fn with_factory(mut self, factory: Option<Factory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_status(mut self, status: Option<S>) -> Self {
        self.status = status;
        self
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search;
        self
    }

    pub fn matches<R: Filterable<Status = S>>(&self, record: &R) -> bool {
        if self.range.is_some_and(|r| !r.contains(record.filter_date())) {
            return false;
        }
        if self.factory.is_some_and(|f| f != record.factory()) {
            return false;
        }
        if self.status.is_some_and(|s| s != record.status()) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => record.matches_search(needle),
            _ => true,
        }
    }

    pub fn apply<'a, R: Filterable<Status = S>>(&self, records: &'a [R]) -> Vec<&'a R> {
        records.iter().filter(|r| self.matches(*r)).collect()
    }
}

/// Listing order by record date.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

/// Stable sort by [`Filterable::filter_date`].
pub fn sort_by_date<R: Filterable>(records: &mut [&R], order: SortOrder) {
    match order {
        SortOrder::Ascending => records.sort_by_key(|r| r.filter_date()),
        SortOrder::Descending => records.sort_by(|a, b| b.filter_date().cmp(&a.filter_date())),
    }
}
