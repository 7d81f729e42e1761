//! Router configuration.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::health::health_check;
use super::state::AppState;
use crate::api::{admin, rsvp};

/// Build the full router: public RSVP intake, the admin surface, and the
/// health check, with request tracing.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/rsvp", post(rsvp::submit))
        .route("/admin/login", post(admin::login))
        .route("/admin/me", get(admin::me))
        .route("/admin/entries", get(admin::entries))
        .route("/admin/export-csv", get(admin::export_csv));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
