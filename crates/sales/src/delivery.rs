//! Delivery-date derivation.
//!
//! The expected delivery date of an order is its send date plus the product's
//! lead time, unless the user pinned the date manually. A pinned date is never
//! recomputed automatically.

use chrono::NaiveDate;

use repdesk_core::{DomainResult, calendar};

use crate::order::Order;
use crate::settings::Settings;

/// `send_date + lead_time(product)` in plain calendar days.
pub fn delivery_date(settings: &Settings, product: &str, send_date: NaiveDate) -> DomainResult<NaiveDate> {
    calendar::add_days(send_date, i64::from(settings.lead_time_days(product)))
}

/// Derive the delivery date of a freshly created order unless it is manual.
pub fn apply_on_create(order: &mut Order, settings: &Settings) -> DomainResult<()> {
    if !order.is_manual_delivery_date {
        order.delivery_date = delivery_date(settings, &order.product, order.send_date)?;
    }
    Ok(())
}

/// Whether an edit from `prior` to `next` must recompute the delivery date.
///
/// Only automatic dates are recomputed, and only when the send date or the
/// product changed, or when the date was just switched back from manual.
pub fn needs_recalculation(prior: &Order, next: &Order) -> bool {
    if next.is_manual_delivery_date {
        return false;
    }
    prior.is_manual_delivery_date
        || next.send_date != prior.send_date
        || next.product != prior.product
}

/// Apply the edit rule; returns whether the delivery date was recomputed.
pub fn apply_on_update(prior: &Order, next: &mut Order, settings: &Settings) -> DomainResult<bool> {
    if needs_recalculation(prior, next) {
        next.delivery_date = delivery_date(settings, &next.product, next.send_date)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Switch between a manual and an automatic delivery date.
///
/// Turning manual mode off recomputes once from the current product and send
/// date. Turning it on keeps the current date (or `pinned` when given).
pub fn set_manual(
    order: &mut Order,
    manual: bool,
    pinned: Option<NaiveDate>,
    settings: &Settings,
) -> DomainResult<()> {
    match (order.is_manual_delivery_date, manual) {
        (true, false) => {
            order.delivery_date = delivery_date(settings, &order.product, order.send_date)?;
            order.is_manual_delivery_date = false;
        }
        (_, true) => {
            order.is_manual_delivery_date = true;
            if let Some(date) = pinned {
                order.delivery_date = date;
            }
        }
        (false, false) => {}
    }
    Ok(())
}
