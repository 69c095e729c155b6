use chrono::{DateTime, NaiveDate, Utc};

use repdesk_core::calendar::{DateRange, parse_day};
use repdesk_core::{OrderId, QuoteId};
use repdesk_sales::{Factory, Order, OrderStatus, Quote, QuoteStatus};

pub fn day(s: &str) -> NaiveDate {
    parse_day(s).unwrap()
}

pub fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn range(start: &str, end: &str) -> DateRange {
    DateRange::new(day(start), day(end))
}

pub fn quote(date: &str, factory: Factory, status: QuoteStatus, value: f64) -> Quote {
    Quote {
        id: QuoteId::new(),
        constructor_name: "Construtora Horizonte".into(),
        project_name: "Residencial Aurora".into(),
        date: day(date),
        factory,
        product: factory.products()[0].to_string(),
        status,
        value,
        contact_name: String::new(),
        phone: String::new(),
        email: String::new(),
        follow_ups: Vec::new(),
    }
}

pub fn order(send: &str, factory: Factory, product: &str, quantity: i64, value: f64) -> Order {
    Order {
        id: OrderId::new(),
        constructor_name: "Construtora Horizonte".into(),
        project_name: "Residencial Aurora".into(),
        po_number: "OC-2024-0001".into(),
        send_date: day(send),
        delivery_date: day(send),
        is_manual_delivery_date: false,
        factory,
        product: product.to_string(),
        quantity,
        value,
        status: OrderStatus::Released,
        status_date: ts(&format!("{send}T12:00:00Z")),
        system_forecast: None,
        invoice_date: None,
        payment_terms: None,
        commission_rate: None,
    }
}

pub fn invoiced(mut order: Order, invoice: &str, terms: &str, rate: f64) -> Order {
    order.status = OrderStatus::Invoiced;
    order.invoice_date = Some(day(invoice));
    order.payment_terms = Some(terms.to_string());
    order.commission_rate = Some(rate);
    order
}
