//! API routes module
//!
//! Wires the tracking domain into the HTTP surface of the binary.

pub mod banner;
pub mod health;
pub mod records;

use axum::Router;
use domain_tracking::RecordKind;

use crate::state::AppState;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .nest("/views", records::router(state, RecordKind::View))
        .nest("/actions", records::router(state, RecordKind::Action))
        .nest("/goals", records::router(state, RecordKind::Goal))
        .merge(health::router(state.clone()))
}
