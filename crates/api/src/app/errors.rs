use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use repdesk_auth::AuthError;
use repdesk_core::DomainError;
use repdesk_infra::{ServiceError, StoreError};

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::NotFound { .. } => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        ServiceError::Detached => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "detached",
            "data is not loaded for this session",
        ),
        ServiceError::Store(e) => store_error_to_response(e),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvalidDate(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_date", msg),
    }
}

fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        StoreError::AlreadyExists { .. } => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        StoreError::Unavailable(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
        StoreError::Serialization(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "serialization_error", e.to_string())
        }
        StoreError::Database { .. } => {
            tracing::error!(error = %err, "store write failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
        }
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::InvalidEmail(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_email", err.to_string())
        }
        AuthError::NotLoggedIn | AuthError::InvalidToken | AuthError::Session(_) => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
        }
        AuthError::Poisoned => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "auth_error", err.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use repdesk_core::RecordKind;

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (ServiceError::Domain(DomainError::validation("x")), StatusCode::BAD_REQUEST),
            (
                ServiceError::NotFound { kind: RecordKind::Orders, id: "1".into() },
                StatusCode::NOT_FOUND,
            ),
            (ServiceError::Detached, StatusCode::SERVICE_UNAVAILABLE),
            (
                ServiceError::Store(StoreError::AlreadyExists { kind: RecordKind::Quotes, id: "1".into() }),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Store(StoreError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(service_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn expired_sessions_are_unauthorized() {
        let res = auth_error_to_response(AuthError::Session(repdesk_auth::SessionError::Expired));
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
