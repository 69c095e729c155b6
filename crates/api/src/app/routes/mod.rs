use axum::{
    Router,
    routing::{get, post},
};

pub mod orders;
pub mod quotes;
pub mod reports;
pub mod session;
pub mod settings;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/session", get(session::current))
        .route("/session/logout", post(session::logout))
        .route("/settings", get(settings::get_settings).put(settings::update_settings))
        .nest("/quotes", quotes::router())
        .nest("/orders", orders::router())
        .nest("/reports", reports::router())
}
