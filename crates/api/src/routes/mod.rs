//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::AppState;
use bordereau_shared::AppError;

pub mod group_structures;
pub mod health;
pub mod payment_lists;
pub mod periods;
pub mod statements;
pub mod teams;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(group_structures::routes())
        .merge(periods::routes())
        .merge(payment_lists::routes())
        .merge(statements::routes())
        .merge(teams::routes())
}

/// Builds the standard error body for an application error.
pub(crate) fn error_response(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}
