use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use repdesk_core::calendar;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/billing", get(billing))
}

pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ReportParams>,
) -> axum::response::Response {
    let now = Utc::now();
    let query = match params.query(calendar::day_of(now)) {
        Ok(q) => q,
        Err(rejection) => return rejection,
    };
    match services.data.dashboard(&query, now) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn billing(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ReportParams>,
) -> axum::response::Response {
    let query = match params.query(calendar::day_of(Utc::now())) {
        Ok(q) => q,
        Err(rejection) => return rejection,
    };
    match services.data.billing(&query) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
