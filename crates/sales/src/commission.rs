//! Commission-installment scheduling.
//!
//! An invoiced order pays `value * commission_rate / 100` in commission,
//! split evenly across the installments implied by its payment terms.

use chrono::NaiveDate;
use serde::Serialize;

use repdesk_core::{OrderId, calendar};

use crate::catalog::{Factory, UPFRONT_TERMS};
use crate::order::Order;

/// Fallback when the payment terms carry no day count.
pub const FALLBACK_DAYS: u16 = 30;

/// When the installments of a set of payment terms fall due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSchedule {
    /// Single installment on the order's send date.
    Upfront,
    /// One installment per day count, counted from the invoice date.
    AfterInvoice(Vec<u16>),
}

impl PaymentSchedule {
    /// Interpret a payment-terms string.
    ///
    /// Unrecognized terms never fail: with no day count in them they fall back
    /// to a single installment after [`FALLBACK_DAYS`].
    pub fn parse(terms: &str) -> Self {
        if terms.trim() == UPFRONT_TERMS {
            return PaymentSchedule::Upfront;
        }
        let days = extract_day_counts(terms);
        if days.is_empty() {
            PaymentSchedule::AfterInvoice(vec![FALLBACK_DAYS])
        } else {
            PaymentSchedule::AfterInvoice(days)
        }
    }

    pub fn installment_count(&self) -> usize {
        match self {
            PaymentSchedule::Upfront => 1,
            PaymentSchedule::AfterInvoice(days) => days.len(),
        }
    }

    /// Due dates in the order they appear in the terms.
    ///
    /// A due date past the end of the calendar lands on its last day.
    pub fn due_dates(&self, send_date: NaiveDate, invoice_date: NaiveDate) -> Vec<NaiveDate> {
        match self {
            PaymentSchedule::Upfront => vec![send_date],
            PaymentSchedule::AfterInvoice(days) => days
                .iter()
                .map(|d| {
                    calendar::add_days(invoice_date, i64::from(*d))
                        .unwrap_or_else(|_| calendar::last_day())
                })
                .collect(),
        }
    }
}

/// Every run of ASCII digits in `terms`, in order.
///
/// Runs too large for a day count are skipped.
pub fn extract_day_counts(terms: &str) -> Vec<u16> {
    terms
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .filter_map(|run| run.parse::<u16>().ok())
        .collect()
}

/// One projected commission payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub order_id: OrderId,
    pub factory: Factory,
    #[serde(with = "calendar::serde_day")]
    pub date: NaiveDate,
    pub amount: f64,
}

impl Installment {
    pub fn month_key(&self) -> String {
        calendar::month_key(self.date)
    }
}

/// Total commission of an order; a missing rate counts as zero.
pub fn total_commission(order: &Order) -> f64 {
    order.value * order.commission_rate.unwrap_or(0.0) / 100.0
}

/// Project the commission installments of an order.
///
/// Orders that are not invoiced, or lack an invoice date or payment terms,
/// produce nothing. Each installment is `total / n` with no remainder
/// correction, so the sum may drift from the total by float rounding.
pub fn installments(order: &Order) -> Vec<Installment> {
    if !order.is_billable() {
        return Vec::new();
    }
    let (Some(invoice_date), Some(terms)) = (order.invoice_date, order.payment_terms.as_deref())
    else {
        return Vec::new();
    };

    let schedule = PaymentSchedule::parse(terms);
    let amount = total_commission(order) / schedule.installment_count() as f64;
    schedule
        .due_dates(order.send_date, invoice_date)
        .into_iter()
        .map(|date| Installment {
            order_id: order.id,
            factory: order.factory,
            date,
            amount,
        })
        .collect()
}
