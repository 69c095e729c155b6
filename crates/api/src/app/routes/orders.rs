use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;

use repdesk_core::{OrderId, calendar};
use repdesk_reporting::{RecordFilter, sort_by_date};
use repdesk_sales::{InvoiceDetails, Order, OrderDraft, OrderStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
        .route("/:id/invoice", post(invoice_order))
        .route("/:id/delivery", put(set_delivery))
        .route("/:id/installments", get(list_installments))
}

fn parse_id(id: &str) -> Result<OrderId, axum::response::Response> {
    id.parse().map_err(errors::domain_error_to_response)
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListParams>,
) -> axum::response::Response {
    let now = Utc::now();
    let (filter, order): (RecordFilter<OrderStatus>, _) =
        match (params.filter(calendar::day_of(now)), params.sort_order()) {
            (Ok(f), Ok(o)) => (f, o),
            (Err(rejection), _) | (_, Err(rejection)) => return rejection,
        };

    let orders = match services.data.orders() {
        Ok(o) => o,
        Err(e) => return errors::service_error_to_response(e),
    };
    let mut matching = filter.apply(&orders);
    sort_by_date(&mut matching, order);

    let items = matching
        .into_iter()
        .map(|o| {
            serde_json::json!({
                "order": o,
                "alert": o.status_alert(now),
                "lateDelivery": o.is_delivery_late(),
            })
        })
        .collect::<Vec<_>>();

    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<OrderDraft>,
) -> axum::response::Response {
    match services.data.add_order(body, Utc::now()).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match services.data.get_order(&id) {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Replace an order; the id in the path wins over the body.
pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(mut body): Json<Order>,
) -> axum::response::Response {
    body.id = match parse_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match services.data.update_order(body, Utc::now()).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match services.data.delete_order(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn invoice_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<InvoiceDetails>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match services.data.invoice_order(id, body, Utc::now()).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn set_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::DeliveryRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match services.data.set_manual_delivery(id, body.manual, body.date).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_installments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match services.data.installments(&id) {
        Ok(items) => {
            let total: f64 = items.iter().map(|i| i.amount).sum();
            (
                StatusCode::OK,
                Json(serde_json::json!({ "items": items, "total": total })),
            )
                .into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
