//! Entry-fee period management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use crate::routes::error_response;
use bordereau_core::period::{PeriodBatch, PeriodBatchOp};
use bordereau_db::repositories::period::{
    PeriodCursor, PeriodError, PeriodFilter, PeriodRepository,
};
use bordereau_shared::AppError;

/// Creates the entry-fee period routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/entry-fees/periods", get(list_periods))
        .route("/entry-fees/periods", post(create_period))
        .route("/entry-fees/periods/resolve", get(resolve_period))
        .route("/entry-fees/periods/batch", post(batch_periods))
        .route("/entry-fees/periods/{id}", patch(update_period))
        .route("/entry-fees/periods/{id}", delete(delete_period))
}

/// Query parameters for listing periods.
#[derive(Debug, Deserialize)]
pub struct ListPeriodsQuery {
    /// Keep periods ending after this date.
    pub from: Option<NaiveDate>,
    /// Keep periods starting before this date.
    pub to: Option<NaiveDate>,
    /// Items per page.
    pub limit: Option<u64>,
    /// `next_cursor` of the previous page.
    pub cursor: Option<String>,
}

/// Request body for creating or updating a period.
#[derive(Debug, Deserialize)]
pub struct PeriodRangeRequest {
    /// First day (inclusive).
    pub start_date: NaiveDate,
    /// Day after the last day (exclusive).
    pub end_date: NaiveDate,
}

/// Query parameters for resolving a date to its period.
#[derive(Debug, Deserialize)]
pub struct ResolvePeriodQuery {
    /// Date to locate.
    pub date: NaiveDate,
}

/// GET `/entry-fees/periods` - List periods in ascending calendar order.
async fn list_periods(
    State(state): State<AppState>,
    Query(query): Query<ListPeriodsQuery>,
) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());

    let cursor = match query.cursor.as_deref() {
        None => None,
        Some(raw) => match PeriodCursor::decode(raw) {
            Some(cursor) => Some(cursor),
            None => {
                return error_response(&AppError::Validation(
                    "Malformed pagination cursor".to_string(),
                ));
            }
        },
    };

    let filter = PeriodFilter {
        from: query.from,
        to: query.to,
    };

    match repo.list(filter, query.limit, cursor).await {
        Ok(page) => (StatusCode::OK, Json(json!(page))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list periods");
            error_response(&period_error(e))
        }
    }
}

/// POST `/entry-fees/periods` - Create a period.
async fn create_period(
    State(state): State<AppState>,
    Json(payload): Json<PeriodRangeRequest>,
) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());

    match repo.create(payload.start_date, payload.end_date).await {
        Ok(period) => {
            info!(
                period_id = %period.id,
                start = %period.start_date,
                end = %period.end_date,
                "Period created"
            );
            (StatusCode::CREATED, Json(json!(period))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create period");
            error_response(&period_error(e))
        }
    }
}

/// GET `/entry-fees/periods/resolve` - Find the period containing a date.
async fn resolve_period(
    State(state): State<AppState>,
    Query(query): Query<ResolvePeriodQuery>,
) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());

    match repo.resolve_date(query.date).await {
        Ok(Some(period)) => (StatusCode::OK, Json(json!(period))).into_response(),
        Ok(None) => error_response(&AppError::PeriodNotFound(format!(
            "No billing period contains {}",
            query.date
        ))),
        Err(e) => {
            error!(error = %e, date = %query.date, "Failed to resolve period");
            error_response(&period_error(e))
        }
    }
}

/// POST `/entry-fees/periods/batch` - Apply creates, updates, and deletes in
/// one transaction; any failing item rolls back the whole batch.
async fn batch_periods(
    State(state): State<AppState>,
    Json(payload): Json<PeriodBatch>,
) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());

    match repo.apply_batch(&payload).await {
        Ok(outcome) => {
            info!(
                created = outcome.created.len(),
                updated = outcome.updated.len(),
                deleted = outcome.deleted.len(),
                "Period batch applied"
            );
            (StatusCode::OK, Json(json!(outcome))).into_response()
        }
        Err(PeriodError::BatchItem { op, index, source }) => {
            error!(error = %source, operation = %op, index, "Period batch item failed");
            let item_id = match op {
                PeriodBatchOp::Create => None,
                PeriodBatchOp::Update => payload.update.get(index).map(|item| item.id),
                PeriodBatchOp::Delete => payload.delete.get(index).copied(),
            };
            let mapped = period_error(*source);
            let status = StatusCode::from_u16(mapped.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(json!({
                    "error": mapped.error_code(),
                    "message": mapped.to_string(),
                    "operation": op.as_str(),
                    "index": index,
                    "id": item_id,
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to apply period batch");
            error_response(&period_error(e))
        }
    }
}

/// PATCH `/entry-fees/periods/{id}` - Replace a period's date range.
async fn update_period(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PeriodRangeRequest>,
) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());

    match repo.update(id, payload.start_date, payload.end_date).await {
        Ok(period) => {
            info!(
                period_id = %period.id,
                start = %period.start_date,
                end = %period.end_date,
                "Period updated"
            );
            (StatusCode::OK, Json(json!(period))).into_response()
        }
        Err(e) => {
            error!(error = %e, period_id = %id, "Failed to update period");
            error_response(&period_error(e))
        }
    }
}

/// DELETE `/entry-fees/periods/{id}` - Remove a period.
async fn delete_period(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = PeriodRepository::new((*state.db).clone());

    match repo.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!(error = %e, period_id = %id, "Failed to delete period");
            error_response(&period_error(e))
        }
    }
}

// Helper functions

fn period_error(e: PeriodError) -> AppError {
    match e {
        PeriodError::InvalidRange(err) => AppError::Validation(err.to_string()),
        PeriodError::Validation(err) => AppError::Validation(err.to_string()),
        PeriodError::Overlap => {
            AppError::PeriodOverlap("requested range overlaps an existing period".to_string())
        }
        PeriodError::NotFound(id) => AppError::PeriodNotFound(id.to_string()),
        PeriodError::BatchItem { source, .. } => period_error(*source),
        PeriodError::Database(err) => AppError::Database(err.to_string()),
    }
}
