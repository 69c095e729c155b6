use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use repdesk_sales::Settings;

use crate::app::errors;
use crate::app::services::AppServices;

pub async fn get_settings(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.data.settings() {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Settings>,
) -> axum::response::Response {
    match services.data.update_settings(body).await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
