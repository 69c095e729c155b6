use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use repdesk_auth::{Authenticator, SessionToken};

use crate::app::errors;
use crate::context::SessionContext;

#[derive(Clone)]
pub struct AuthState {
    pub auth: Arc<dyn Authenticator>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token,
        Err(message) => {
            return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", message);
        }
    };

    let session = match state.auth.verify(&token, Utc::now()) {
        Ok(session) => session,
        Err(e) => return errors::auth_error_to_response(e),
    };

    req.extensions_mut().insert(SessionContext::new(session));
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<SessionToken, &'static str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing bearer token")?;

    let header = header.to_str().map_err(|_| "malformed authorization header")?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or("authorization must use the Bearer scheme")?
        .trim();
    if token.is_empty() {
        return Err("missing bearer token");
    }

    token.parse().map_err(|_| "malformed bearer token")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_token_is_parsed() {
        let token = SessionToken::new();
        assert_eq!(extract_bearer(&headers(&format!("Bearer {token}"))), Ok(token));
    }

    #[test]
    fn bad_headers_are_rejected() {
        assert!(extract_bearer(&HeaderMap::new()).is_err());
        assert!(extract_bearer(&headers("Basic abc")).is_err());
        assert!(extract_bearer(&headers("Bearer   ")).is_err());
        assert!(extract_bearer(&headers("Bearer not-a-token")).is_err());
    }
}
