//! Teams directory proxy route.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tracing::error;

use crate::AppState;
use crate::routes::error_response;
use bordereau_shared::AppError;

/// Creates the teams routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/teams", get(list_teams))
}

/// GET `/teams` - Display names from the teams directory, proxied verbatim.
async fn list_teams(State(state): State<AppState>) -> impl IntoResponse {
    match state.teams.fetch_all().await {
        Ok(teams) => (StatusCode::OK, Json(json!({ "items": teams }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to fetch teams directory");
            error_response(&AppError::from(e))
        }
    }
}
