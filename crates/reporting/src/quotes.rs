//! Quote summaries and groupings.

use std::collections::BTreeMap;

use serde::Serialize;

use repdesk_sales::{Factory, Quote};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuoteSummary {
    pub count: usize,
    pub value: f64,
}

pub fn summarize(quotes: &[&Quote]) -> QuoteSummary {
    QuoteSummary {
        count: quotes.len(),
        value: quotes.iter().map(|q| q.value).sum(),
    }
}

/// Share of closed quotes, in percent; 0 for an empty set.
pub fn conversion_rate(quotes: &[&Quote]) -> f64 {
    if quotes.is_empty() {
        return 0.0;
    }
    let closed = quotes.iter().filter(|q| q.is_closed()).count();
    closed as f64 / quotes.len() as f64 * 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactoryQuotes {
    pub factory: Factory,
    pub count: usize,
    pub value: f64,
}

/// Quote volume per factory, most quoted first.
pub fn by_factory(quotes: &[&Quote]) -> Vec<FactoryQuotes> {
    let mut groups: BTreeMap<Factory, FactoryQuotes> = BTreeMap::new();
    for q in quotes {
        let entry = groups.entry(q.factory).or_insert(FactoryQuotes {
            factory: q.factory,
            count: 0,
            value: 0.0,
        });
        entry.count += 1;
        entry.value += q.value;
    }

    let mut rows: Vec<FactoryQuotes> = groups.into_values().collect();
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.factory.as_str().cmp(b.factory.as_str()))
    });
    rows
}
