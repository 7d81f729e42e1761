//! HTTP server assembly: shared state, router, health check.

pub mod health;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
