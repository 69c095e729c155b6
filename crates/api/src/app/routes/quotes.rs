use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use repdesk_core::{QuoteId, calendar};
use repdesk_reporting::{RecordFilter, sort_by_date};
use repdesk_sales::{Quote, QuoteDraft, QuoteStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_quotes).post(create_quote))
        .route("/:id", get(get_quote).put(update_quote).delete(delete_quote))
        .route("/:id/follow-ups", post(add_follow_up))
}

fn parse_id(id: &str) -> Result<QuoteId, axum::response::Response> {
    id.parse().map_err(errors::domain_error_to_response)
}

pub async fn list_quotes(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListParams>,
) -> axum::response::Response {
    let today = calendar::day_of(Utc::now());
    let (filter, order): (RecordFilter<QuoteStatus>, _) =
        match (params.filter(today), params.sort_order()) {
            (Ok(f), Ok(o)) => (f, o),
            (Err(rejection), _) | (_, Err(rejection)) => return rejection,
        };

    let quotes = match services.data.quotes() {
        Ok(q) => q,
        Err(e) => return errors::service_error_to_response(e),
    };
    let mut items = filter.apply(&quotes);
    sort_by_date(&mut items, order);

    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn create_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<QuoteDraft>,
) -> axum::response::Response {
    match services.data.add_quote(body).await {
        Ok(quote) => (StatusCode::CREATED, Json(quote)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match services.data.get_quote(&id) {
        Ok(quote) => (StatusCode::OK, Json(quote)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Replace a quote; the id in the path wins over the body.
pub async fn update_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(mut body): Json<Quote>,
) -> axum::response::Response {
    body.id = match parse_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match services.data.update_quote(body).await {
        Ok(quote) => (StatusCode::OK, Json(quote)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match services.data.delete_quote(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_follow_up(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::FollowUpRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    match services.data.add_follow_up(id, body.note, Utc::now()).await {
        Ok(follow_up) => (StatusCode::CREATED, Json(follow_up)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
