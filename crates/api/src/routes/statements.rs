//! Statement lifecycle routes.

use std::collections::BTreeSet;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use crate::routes::error_response;
use bordereau_db::repositories::statement::{
    PaymentStatusUpdate, StatementError, StatementFilter, StatementRepository, StatusChange,
};
use bordereau_shared::AppError;
use bordereau_shared::types::{CursorPage, CursorResponse, IssueStatus, PaymentStatus};

/// Creates the statement routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/entry-fees/statements", get(list_statements))
        .route("/entry-fees/statements/cancel/batch", post(cancel_batch))
        .route(
            "/entry-fees/statements/payment-status/batch",
            post(payment_status_batch),
        )
        .route("/entry-fees/statements/{id}", get(get_statement))
        .route("/entry-fees/statements/{id}", patch(update_statement))
        .route("/entry-fees/statements/{id}/lines", get(get_statement_lines))
        .route("/entry-fees/statements/{id}/cancel", post(cancel_statement))
}

/// Query parameters for listing statements.
#[derive(Debug, Deserialize)]
pub struct ListStatementsQuery {
    /// Keep statements of one payment list.
    pub payment_list_id: Option<Uuid>,
    /// Keep statements in one issue status.
    pub issue_status: Option<IssueStatus>,
    /// Keep statements in one payment status.
    pub payment_status: Option<PaymentStatus>,
    /// Keep statements in one currency.
    pub currency: Option<String>,
    /// Keep statements addressed to one billing group.
    pub billing_group_id: Option<Uuid>,
    /// Items per page.
    pub limit: Option<u64>,
    /// `next_cursor` of the previous page.
    pub cursor: Option<DateTime<Utc>>,
}

/// Request body for moving a statement's status axes.
#[derive(Debug, Deserialize)]
pub struct UpdateStatementRequest {
    /// Target payment status, if the payment axis should move.
    pub payment_status: Option<PaymentStatus>,
    /// Target issue status; cancellation goes through the cancel route.
    pub issue_status: Option<IssueStatus>,
}

/// Request body for cancelling a statement.
#[derive(Debug, Deserialize)]
pub struct CancelStatementRequest {
    /// Why the statement is cancelled.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request body for batch cancellation.
#[derive(Debug, Deserialize)]
pub struct CancelBatchRequest {
    /// Statements to cancel, each with an optional reason.
    pub items: Vec<CancelBatchItem>,
}

/// One statement to cancel.
#[derive(Debug, Deserialize)]
pub struct CancelBatchItem {
    /// Statement to cancel.
    pub statement_id: Uuid,
    /// Why the statement is cancelled.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request body for a batch payment-status update.
#[derive(Debug, Deserialize)]
pub struct PaymentStatusBatchRequest {
    /// Requested updates; applied all-or-nothing.
    pub updates: Vec<PaymentStatusBatchItem>,
}

/// One payment-status update.
#[derive(Debug, Deserialize)]
pub struct PaymentStatusBatchItem {
    /// Statement to update.
    pub statement_id: Uuid,
    /// Target payment status.
    pub payment_status: PaymentStatus,
}

/// GET `/entry-fees/statements` - List statements, newest first.
async fn list_statements(
    State(state): State<AppState>,
    Query(query): Query<ListStatementsQuery>,
) -> impl IntoResponse {
    let repo = StatementRepository::new((*state.db).clone());

    let filter = StatementFilter {
        payment_list_id: query.payment_list_id,
        issue_status: query.issue_status,
        payment_status: query.payment_status,
        currency: query.currency,
        billing_group_id: query.billing_group_id,
    };
    let page = CursorPage::new(query.limit, query.cursor);

    match repo.list(&filter, &page).await {
        Ok((rows, total)) => {
            let body =
                CursorResponse::from_rows(rows, total, |row| row.created_at.with_timezone(&Utc));
            (StatusCode::OK, Json(json!(body))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list statements");
            error_response(&statement_error(e))
        }
    }
}

/// GET `/entry-fees/statements/{id}` - One statement.
async fn get_statement(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = StatementRepository::new((*state.db).clone());

    match repo.find_by_id(id).await {
        Ok(Some(statement)) => (StatusCode::OK, Json(json!(statement))).into_response(),
        Ok(None) => error_response(&AppError::StatementNotFound(id.to_string())),
        Err(e) => {
            error!(error = %e, statement_id = %id, "Failed to load statement");
            error_response(&statement_error(e))
        }
    }
}

/// GET `/entry-fees/statements/{id}/lines` - Subscription snapshot lines.
async fn get_statement_lines(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = StatementRepository::new((*state.db).clone());

    match repo.lines(id).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "items": rows }))).into_response(),
        Err(e) => {
            error!(error = %e, statement_id = %id, "Failed to load statement lines");
            error_response(&statement_error(e))
        }
    }
}

/// PATCH `/entry-fees/statements/{id}` - Move the status axes.
async fn update_statement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatementRequest>,
) -> impl IntoResponse {
    let repo = StatementRepository::new((*state.db).clone());

    let change = StatusChange {
        payment_status: payload.payment_status,
        issue_status: payload.issue_status,
    };

    match repo.update_status(id, change).await {
        Ok(statement) => {
            info!(
                statement_id = %statement.id,
                payment_status = ?statement.payment_status,
                "Statement status updated"
            );
            (StatusCode::OK, Json(json!(statement))).into_response()
        }
        Err(e) => {
            error!(error = %e, statement_id = %id, "Failed to update statement status");
            error_response(&statement_error(e))
        }
    }
}

/// POST `/entry-fees/statements/{id}/cancel` - Cancel a statement and append
/// its compensating ledger event.
async fn cancel_statement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelStatementRequest>,
) -> impl IntoResponse {
    let repo = StatementRepository::new((*state.db).clone());

    match repo.cancel(id, payload.reason).await {
        Ok(cancelled) => {
            info!(
                statement_id = %cancelled.statement.id,
                event_id = %cancelled.event.id,
                "Statement cancelled"
            );
            (StatusCode::OK, Json(json!(cancelled))).into_response()
        }
        Err(e) => {
            error!(error = %e, statement_id = %id, "Failed to cancel statement");
            error_response(&statement_error(e))
        }
    }
}

/// POST `/entry-fees/statements/cancel/batch` - Cancel several statements.
///
/// Each item is its own transaction; the response reports a per-item status
/// instead of failing the whole request.
async fn cancel_batch(
    State(state): State<AppState>,
    Json(payload): Json<CancelBatchRequest>,
) -> impl IntoResponse {
    let repo = StatementRepository::new((*state.db).clone());

    let mut results = Vec::with_capacity(payload.items.len());
    let mut cancelled = 0_usize;
    let mut already_cancelled = 0_usize;
    let mut not_found = 0_usize;
    let mut errors = 0_usize;
    let mut payment_list_ids = BTreeSet::new();

    for item in payload.items {
        let statement_id = item.statement_id;
        match repo.cancel(statement_id, item.reason).await {
            Ok(outcome) => {
                cancelled += 1;
                payment_list_ids.insert(outcome.statement.entry_fees_payment_list_id);
                results.push(json!({
                    "statement_id": statement_id,
                    "status": "CANCELLED",
                }));
            }
            Err(StatementError::AlreadyCancelled(_)) => {
                already_cancelled += 1;
                results.push(json!({
                    "statement_id": statement_id,
                    "status": "ALREADY_CANCELLED",
                }));
            }
            Err(StatementError::NotFound(_)) => {
                not_found += 1;
                results.push(json!({
                    "statement_id": statement_id,
                    "status": "NOT_FOUND",
                }));
            }
            Err(e) => {
                errors += 1;
                error!(error = %e, statement_id = %statement_id, "Batch cancel item failed");
                results.push(json!({
                    "statement_id": statement_id,
                    "status": "ERROR",
                    "message": e.to_string(),
                }));
            }
        }
    }

    info!(
        cancelled,
        already_cancelled,
        not_found,
        errors,
        "Statement cancel batch processed"
    );

    (
        StatusCode::OK,
        Json(json!({
            "results": results,
            "cancelled": cancelled,
            "already_cancelled": already_cancelled,
            "not_found": not_found,
            "errors": errors,
            "payment_list_ids": payment_list_ids,
        })),
    )
        .into_response()
}

/// POST `/entry-fees/statements/payment-status/batch` - Update payment
/// status for several statements in one transaction.
async fn payment_status_batch(
    State(state): State<AppState>,
    Json(payload): Json<PaymentStatusBatchRequest>,
) -> impl IntoResponse {
    let repo = StatementRepository::new((*state.db).clone());

    let updates: Vec<PaymentStatusUpdate> = payload
        .updates
        .iter()
        .map(|u| PaymentStatusUpdate {
            statement_id: u.statement_id,
            payment_status: u.payment_status,
        })
        .collect();

    match repo.set_payment_status_batch(&updates).await {
        Ok(rows) => {
            info!(updated = rows.len(), "Payment status batch applied");
            (StatusCode::OK, Json(json!({ "updated": rows }))).into_response()
        }
        Err(StatementError::BatchItem {
            index,
            statement_id,
            source,
        }) => {
            error!(
                error = %source,
                index,
                statement_id = %statement_id,
                "Payment status batch item failed"
            );
            let mapped = statement_error(*source);
            let status = StatusCode::from_u16(mapped.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(json!({
                    "error": mapped.error_code(),
                    "message": mapped.to_string(),
                    "operation": "update",
                    "index": index,
                    "statement_id": statement_id,
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to apply payment status batch");
            error_response(&statement_error(e))
        }
    }
}

// Helper functions

pub(crate) fn statement_error(e: StatementError) -> AppError {
    match e {
        StatementError::NotFound(id) => AppError::StatementNotFound(id.to_string()),
        StatementError::Transition(err) => AppError::InvalidTransition(err.to_string()),
        StatementError::AlreadyCancelled(id) => AppError::AlreadyCancelled(id.to_string()),
        StatementError::DuplicateStatementEvent(id) => {
            AppError::Conflict(format!("A ledger event already references statement {id}"))
        }
        StatementError::BatchItem { source, .. } => statement_error(*source),
        StatementError::Database(err) => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bordereau_core::statement::StatusError;

    #[test]
    fn test_statement_error_codes() {
        let id = Uuid::nil();
        assert_eq!(
            statement_error(StatementError::NotFound(id)).error_code(),
            "STATEMENT_NOT_FOUND"
        );
        assert_eq!(
            statement_error(StatementError::AlreadyCancelled(id)).error_code(),
            "ALREADY_CANCELLED"
        );
        assert_eq!(
            statement_error(StatementError::DuplicateStatementEvent(id)).error_code(),
            "CONFLICT"
        );
    }

    #[test]
    fn test_forbidden_transition_maps_to_422() {
        let err = StatementError::Transition(StatusError::Forbidden {
            from: "ISSUED",
            to: "CANCELLED",
        });
        let mapped = statement_error(err);
        assert_eq!(mapped.error_code(), "INVALID_TRANSITION");
        assert_eq!(mapped.status_code(), 422);
    }

    #[test]
    fn test_batch_item_unwraps_to_source_error() {
        let err = StatementError::BatchItem {
            index: 2,
            statement_id: Uuid::nil(),
            source: Box::new(StatementError::NotFound(Uuid::nil())),
        };
        assert_eq!(statement_error(err).status_code(), 404);
    }
}
