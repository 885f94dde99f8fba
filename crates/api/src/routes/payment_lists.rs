//! Payment-list routes: creation, listing, totals, and ledger events.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::AppState;
use crate::routes::error_response;
use crate::routes::statements::statement_error;
use bordereau_db::repositories::payment_list::{
    CreatePaymentListInput, PaymentListError, PaymentListFilter, PaymentListRepository,
    RecordEventInput, TotalInput,
};
use bordereau_db::repositories::statement::{StatementFilter, StatementRepository};
use bordereau_shared::AppError;
use bordereau_shared::types::{CursorPage, CursorResponse};

/// Creates the payment-list routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/entry-fees/payment-lists", get(list_payment_lists))
        .route("/entry-fees/payment-lists", post(create_payment_list))
        .route("/entry-fees/payment-lists/{id}", get(get_payment_list))
        .route(
            "/entry-fees/payment-lists/{id}/subscriptions",
            get(get_subscriptions),
        )
        .route("/entry-fees/payment-lists/{id}/totals", get(get_totals))
        .route("/entry-fees/payment-lists/{id}/events", get(list_events))
        .route("/entry-fees/payment-lists/{id}/events", post(record_event))
        .route(
            "/entry-fees/payment-lists/{id}/statements",
            get(get_list_statements),
        )
}

/// Request body for creating a payment list.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentListRequest {
    /// Operator recorded on the list.
    pub created_by: String,
    /// Structure version to resolve against; omitted uses the active one.
    pub group_structure_id: Option<Uuid>,
    /// Free-form billing-window label.
    pub period_label: Option<String>,
    /// Subscriptions to bill.
    pub subscription_ids: Vec<Uuid>,
    /// Announced totals; computed from the feed snapshot when absent.
    pub totals: Option<Vec<TotalRequest>>,
}

/// One caller-supplied announced total.
#[derive(Debug, Deserialize)]
pub struct TotalRequest {
    /// Currency of the total.
    pub currency: String,
    /// Announced amount.
    pub total_announced: Decimal,
}

/// Query parameters for listing payment lists.
#[derive(Debug, Deserialize)]
pub struct ListPaymentListsQuery {
    /// Keep lists created at or after this instant.
    pub created_from: Option<DateTime<Utc>>,
    /// Keep lists created strictly before this instant.
    pub created_to: Option<DateTime<Utc>>,
    /// Keep lists created by one operator.
    pub created_by: Option<String>,
    /// Keep lists frozen against one structure version.
    pub group_structure_id: Option<Uuid>,
    /// Items per page.
    pub limit: Option<u64>,
    /// `next_cursor` of the previous page.
    pub cursor: Option<DateTime<Utc>>,
}

/// Pagination query for nested statement listings.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Items per page.
    pub limit: Option<u64>,
    /// `next_cursor` of the previous page.
    pub cursor: Option<DateTime<Utc>>,
}

/// Request body for recording a manual adjustment event.
#[derive(Debug, Deserialize)]
pub struct RecordEventRequest {
    /// Currency of the adjustment.
    pub currency: String,
    /// Signed delta; must be strictly negative.
    pub amount_delta: Decimal,
    /// Why the adjustment was made.
    #[serde(default)]
    pub reason: Option<String>,
    /// Statement the adjustment compensates, if any.
    #[serde(default)]
    pub statement_id: Option<Uuid>,
}

/// POST `/entry-fees/payment-lists` - Create a payment list with its
/// membership, totals, and statements.
///
/// The subscription feed snapshot is fetched before the storage transaction
/// opens; an upstream failure therefore writes nothing.
async fn create_payment_list(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentListRequest>,
) -> impl IntoResponse {
    let records = match state.feed.fetch_all().await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "Failed to fetch subscription feed");
            return error_response(&AppError::from(e));
        }
    };

    let repo = PaymentListRepository::new((*state.db).clone());

    let input = CreatePaymentListInput {
        created_by: payload.created_by,
        group_structure_id: payload.group_structure_id,
        period_label: payload.period_label,
        subscription_ids: payload.subscription_ids,
        totals: payload.totals.map(|totals| {
            totals
                .into_iter()
                .map(|t| TotalInput {
                    currency: t.currency,
                    total_announced: t.total_announced,
                })
                .collect()
        }),
        records,
    };

    match repo.create(input).await {
        Ok(created) => {
            info!(
                payment_list_id = %created.payment_list.id,
                statements = created.statements.len(),
                subscriptions = created.payment_list.subscriptions_count,
                "Payment list created"
            );
            (StatusCode::CREATED, Json(json!(created))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create payment list");
            match e {
                PaymentListError::Conflict { conflicts } => (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "error": "CONFLICT",
                        "message": format!(
                            "{} subscription(s) already attached to active statements",
                            conflicts.len()
                        ),
                        "conflicts": conflicts,
                    })),
                )
                    .into_response(),
                other => error_response(&payment_list_error(other)),
            }
        }
    }
}

/// GET `/entry-fees/payment-lists` - List payment lists, newest first, each
/// with net totals, event count, and statement stats.
async fn list_payment_lists(
    State(state): State<AppState>,
    Query(query): Query<ListPaymentListsQuery>,
) -> impl IntoResponse {
    let repo = PaymentListRepository::new((*state.db).clone());

    let filter = PaymentListFilter {
        created_from: query.created_from,
        created_to: query.created_to,
        created_by: query.created_by,
        group_structure_id: query.group_structure_id,
    };
    let page = CursorPage::new(query.limit, query.cursor);

    match repo.list_summaries(&filter, &page).await {
        Ok((items, total)) => {
            let body = CursorResponse::from_rows(items, total, |row| {
                row.payment_list.created_at.with_timezone(&Utc)
            });
            (StatusCode::OK, Json(json!(body))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list payment lists");
            error_response(&payment_list_error(e))
        }
    }
}

/// GET `/entry-fees/payment-lists/{id}` - One payment list with its derived
/// statement count.
async fn get_payment_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = PaymentListRepository::new((*state.db).clone());

    match repo.find_detail(id).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(json!(detail))).into_response(),
        Ok(None) => error_response(&AppError::NotFound(format!("Payment list not found: {id}"))),
        Err(e) => {
            error!(error = %e, payment_list_id = %id, "Failed to load payment list");
            error_response(&payment_list_error(e))
        }
    }
}

/// GET `/entry-fees/payment-lists/{id}/subscriptions` - Membership rows.
async fn get_subscriptions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = PaymentListRepository::new((*state.db).clone());

    match repo.subscriptions(id).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "items": rows }))).into_response(),
        Err(e) => {
            error!(error = %e, payment_list_id = %id, "Failed to load payment list subscriptions");
            error_response(&payment_list_error(e))
        }
    }
}

/// GET `/entry-fees/payment-lists/{id}/totals` - Net totals per currency,
/// including currencies that appear only in ledger events.
async fn get_totals(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = PaymentListRepository::new((*state.db).clone());

    match repo.totals_view(id).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "items": rows }))).into_response(),
        Err(e) => {
            error!(error = %e, payment_list_id = %id, "Failed to load payment list totals");
            error_response(&payment_list_error(e))
        }
    }
}

/// GET `/entry-fees/payment-lists/{id}/events` - Ledger events, newest first.
async fn list_events(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = PaymentListRepository::new((*state.db).clone());

    match repo.events(id).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "items": rows }))).into_response(),
        Err(e) => {
            error!(error = %e, payment_list_id = %id, "Failed to load payment list events");
            error_response(&payment_list_error(e))
        }
    }
}

/// POST `/entry-fees/payment-lists/{id}/events` - Record a manual
/// adjustment event against the list's ledger.
async fn record_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordEventRequest>,
) -> impl IntoResponse {
    let repo = PaymentListRepository::new((*state.db).clone());

    let input = RecordEventInput {
        currency: payload.currency,
        amount_delta: payload.amount_delta,
        reason: payload.reason,
        statement_id: payload.statement_id,
    };

    match repo.record_event(id, input).await {
        Ok(event) => {
            info!(
                payment_list_id = %id,
                event_id = %event.id,
                delta = %event.amount_delta,
                "Adjustment event recorded"
            );
            (StatusCode::CREATED, Json(json!(event))).into_response()
        }
        Err(e) => {
            error!(error = %e, payment_list_id = %id, "Failed to record adjustment event");
            error_response(&payment_list_error(e))
        }
    }
}

/// GET `/entry-fees/payment-lists/{id}/statements` - Statements of one list.
async fn get_list_statements(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let lists = PaymentListRepository::new((*state.db).clone());

    match lists.find_detail(id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(&AppError::NotFound(format!("Payment list not found: {id}")));
        }
        Err(e) => {
            error!(error = %e, payment_list_id = %id, "Failed to load payment list");
            return error_response(&payment_list_error(e));
        }
    }

    let statements = StatementRepository::new((*state.db).clone());
    let filter = StatementFilter {
        payment_list_id: Some(id),
        ..StatementFilter::default()
    };
    let page = CursorPage::new(query.limit, query.cursor);

    match statements.list(&filter, &page).await {
        Ok((rows, total)) => {
            let body =
                CursorResponse::from_rows(rows, total, |row| row.created_at.with_timezone(&Utc));
            (StatusCode::OK, Json(json!(body))).into_response()
        }
        Err(e) => {
            error!(error = %e, payment_list_id = %id, "Failed to list statements of payment list");
            error_response(&statement_error(e))
        }
    }
}

// Helper functions

fn payment_list_error(e: PaymentListError) -> AppError {
    match e {
        e @ PaymentListError::Conflict { .. } => AppError::Conflict(e.to_string()),
        PaymentListError::Generation(err) => AppError::Validation(err.to_string()),
        PaymentListError::Adjustment(err) => AppError::Validation(err.to_string()),
        PaymentListError::Currency(err) => AppError::Validation(err.to_string()),
        PaymentListError::StructureNotFound(id) => {
            AppError::NotFound(format!("Group structure not found: {id}"))
        }
        PaymentListError::NoActiveStructure => {
            AppError::NotFound("No active group structure".to_string())
        }
        PaymentListError::NotFound(id) => {
            AppError::NotFound(format!("Payment list not found: {id}"))
        }
        PaymentListError::StatementNotFound(id) => AppError::StatementNotFound(id.to_string()),
        PaymentListError::StatementNotInList {
            statement_id,
            payment_list_id,
        } => AppError::Validation(format!(
            "Statement {statement_id} does not belong to payment list {payment_list_id}"
        )),
        PaymentListError::DuplicateStatementEvent(id) => {
            AppError::Conflict(format!("A ledger event already references statement {id}"))
        }
        PaymentListError::Database(err) => AppError::Database(err.to_string()),
    }
}
