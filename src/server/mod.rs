//! HTTP host for the hub.
//!
//! - [`api`]: JSON routes for the tools, status and metrics
//! - [`assets`]: fallback that serves everything else through the offline cache

pub mod api;
pub mod assets;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use api::AppState;

/// Build the HTTP router.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_routes()
        .fallback(assets::intercept)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
