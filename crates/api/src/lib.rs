//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for periods, group structures, payment lists and statements
//! - Upstream proxy routes (teams)
//! - Response types and error mapping

pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use bordereau_shared::{SubscriptionFeedClient, TeamsClient};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Client for the upstream subscription feed.
    pub feed: Arc<SubscriptionFeedClient>,
    /// Client for the upstream teams service.
    pub teams: Arc<TeamsClient>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
