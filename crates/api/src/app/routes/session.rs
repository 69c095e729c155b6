use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::SessionContext;

/// Log in and load the data for the new session.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let session = match services
        .auth
        .login(&body.email, body.password.as_deref(), Utc::now())
    {
        Ok(s) => s,
        Err(e) => return errors::auth_error_to_response(e),
    };

    if let Err(e) = services.data.attach().await {
        services.auth.logout();
        return errors::service_error_to_response(e);
    }

    (StatusCode::OK, Json(session)).into_response()
}

pub async fn logout(Extension(services): Extension<Arc<AppServices>>) -> StatusCode {
    services.auth.logout();
    services.data.detach();
    StatusCode::NO_CONTENT
}

pub async fn current(Extension(ctx): Extension<SessionContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "user": ctx.user(),
        "expiresAt": ctx.session().expires_at,
    }))
}
