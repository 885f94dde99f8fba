//! Bordereau API Server
//!
//! Main entry point for the entry-fee billing service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bordereau_api::{AppState, create_router};
use bordereau_db::connect_with;
use bordereau_shared::{AppConfig, SubscriptionFeedClient, TeamsClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bordereau=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    // Create upstream clients
    let feed = SubscriptionFeedClient::new(&config.upstream)?;
    let teams = TeamsClient::new(&config.upstream)?;
    info!(
        feed_base_url = %config.upstream.feed_base_url,
        teams_base_url = %config.upstream.teams_base_url,
        "Upstream clients configured"
    );

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        feed: Arc::new(feed),
        teams: Arc::new(teams),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
