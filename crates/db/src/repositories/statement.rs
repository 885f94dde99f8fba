//! Statement repository for database operations.
//!
//! Owns the lifecycle side of statements: filtered listing, line reads, the
//! generic payment-status update, cancellation with its compensating ledger
//! event, and the shared-transaction payment-status batch. Every status
//! mutation locks the statement row with `SELECT ... FOR UPDATE` first; the
//! legality of a move is decided by the pure transition rules in core.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, SqlErr, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use bordereau_core::statement::{
    plan_cancel, validate_issue_transition, validate_payment_transition, CancelDecision,
    StatusError, Transition,
};
use bordereau_shared::types::{CursorPage, EventId, IssueStatus, PaymentStatus};

use crate::entities::{
    entry_fees_payment_list_event, entry_fees_statement, entry_fees_statement_subscription,
    sea_orm_active_enums::EntryFeesIssueStatus,
};

/// Error types for statement operations.
#[derive(Debug, thiserror::Error)]
pub enum StatementError {
    /// Statement not found.
    #[error("Statement not found: {0}")]
    NotFound(Uuid),

    /// The requested status move is not part of the lifecycle.
    #[error(transparent)]
    Transition(#[from] StatusError),

    /// Cancel requested on an already-cancelled statement.
    #[error("Statement already cancelled: {0}")]
    AlreadyCancelled(Uuid),

    /// The statement already has a compensating ledger event.
    #[error("A ledger event already references statement {0}")]
    DuplicateStatementEvent(Uuid),

    /// A batch item failed; the whole batch was rolled back.
    #[error("update item {index} for statement {statement_id}: {source}")]
    BatchItem {
        /// Position within the update list.
        index: usize,
        /// The statement the item targeted.
        statement_id: Uuid,
        /// The underlying failure.
        #[source]
        source: Box<StatementError>,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl StatementError {
    /// Wraps a failure with its batch-item position.
    fn in_batch(self, index: usize, statement_id: Uuid) -> Self {
        Self::BatchItem {
            index,
            statement_id,
            source: Box::new(self),
        }
    }
}

/// Filters for the statement listing.
#[derive(Debug, Clone, Default)]
pub struct StatementFilter {
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
}

/// One listing row: the statement plus its line count.
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct StatementRow {
    /// Statement id.
    pub id: Uuid,
    /// Owning payment list.
    pub entry_fees_payment_list_id: Uuid,
    /// Billing group receiving the statement.
    pub group_key: Uuid,
    /// Deterministic statement number.
    pub statement_number: String,
    /// Issue axis.
    pub issue_status: crate::entities::sea_orm_active_enums::EntryFeesIssueStatus,
    /// Payment axis.
    pub payment_status: crate::entities::sea_orm_active_enums::EntryFeesPaymentStatus,
    /// Statement currency.
    pub currency: String,
    /// Sum of the line amounts.
    pub total_amount: rust_decimal::Decimal,
    /// Creation timestamp.
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    /// Set while payment status is PAID.
    pub paid_at: Option<chrono::DateTime<chrono::FixedOffset>>,
    /// Set when the statement was cancelled.
    pub cancelled_at: Option<chrono::DateTime<chrono::FixedOffset>>,
    /// Number of subscription lines.
    pub subscriptions_count: i64,
}

/// Requested status changes for one statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusChange {
    /// Target payment status, if the payment axis should move.
    pub payment_status: Option<PaymentStatus>,
    /// Target issue status; anything but the current state is refused
    /// (cancellation goes through the cancel path).
    pub issue_status: Option<IssueStatus>,
}

/// One item of a payment-status batch.
#[derive(Debug, Clone, Copy)]
pub struct PaymentStatusUpdate {
    /// Statement to update.
    pub statement_id: Uuid,
    /// Target payment status.
    pub payment_status: PaymentStatus,
}

/// A cancelled statement together with its compensating ledger event.
#[derive(Debug, Clone, Serialize)]
pub struct CancelledStatement {
    /// The statement after cancellation.
    pub statement: entry_fees_statement::Model,
    /// The appended event (`amount_delta = -total_amount`).
    pub event: entry_fees_payment_list_event::Model,
}

/// Statement repository.
#[derive(Debug, Clone)]
pub struct StatementRepository {
    db: DatabaseConnection,
}

impl StatementRepository {
    /// Creates a new statement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists statements newest first with filters, cursor pagination, and
    /// per-statement line counts.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list(
        &self,
        filter: &StatementFilter,
        page: &CursorPage,
    ) -> Result<(Vec<StatementRow>, u64), StatementError> {
        let condition = filter_condition(filter);

        let total = entry_fees_statement::Entity::find()
            .filter(condition.clone())
            .count(&self.db)
            .await?;

        let mut query = entry_fees_statement::Entity::find()
            .column_as(
                entry_fees_statement_subscription::Column::Id.count(),
                "subscriptions_count",
            )
            .join(
                JoinType::LeftJoin,
                entry_fees_statement::Relation::EntryFeesStatementSubscription.def(),
            )
            .group_by(entry_fees_statement::Column::Id)
            .filter(condition)
            .order_by_desc(entry_fees_statement::Column::CreatedAt)
            .order_by_desc(entry_fees_statement::Column::Id);

        if let Some(cursor) = page.cursor {
            query = query.filter(entry_fees_statement::Column::CreatedAt.lt(cursor));
        }

        let items = query
            .limit(page.limit())
            .into_model::<StatementRow>()
            .all(&self.db)
            .await?;

        Ok((items, total))
    }

    /// Finds a statement by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<entry_fees_statement::Model>, StatementError> {
        Ok(entry_fees_statement::Entity::find_by_id(id)
            .one(&self.db)
            .await?)
    }

    /// Returns the line snapshots of a statement, ordered by subscription.
    ///
    /// # Errors
    ///
    /// Returns [`StatementError::NotFound`] if the statement does not exist.
    pub async fn lines(
        &self,
        id: Uuid,
    ) -> Result<Vec<entry_fees_statement_subscription::Model>, StatementError> {
        let Some(_) = self.find_by_id(id).await? else {
            return Err(StatementError::NotFound(id));
        };

        Ok(entry_fees_statement_subscription::Entity::find()
            .filter(entry_fees_statement_subscription::Column::EntryFeesStatementId.eq(id))
            .order_by_asc(entry_fees_statement_subscription::Column::SubscriptionId)
            .all(&self.db)
            .await?)
    }

    /// Applies the generic status update to one statement.
    ///
    /// The payment axis may flip freely; a same-state request is an
    /// idempotent no-op. The issue axis accepts only same-state requests
    /// here, so cancellation cannot sneak past its compensating event.
    ///
    /// # Errors
    ///
    /// Returns [`StatementError::NotFound`] for a missing statement or
    /// [`StatementError::Transition`] for a forbidden issue-status move.
    pub async fn update_status(
        &self,
        id: Uuid,
        change: StatusChange,
    ) -> Result<entry_fees_statement::Model, StatementError> {
        let txn = self.db.begin().await?;

        let Some(statement) = entry_fees_statement::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            return Err(StatementError::NotFound(id));
        };

        if let Some(target) = change.issue_status {
            let current: IssueStatus = statement.issue_status.clone().into();
            validate_issue_transition(current, target)?;
        }

        let updated = match change.payment_status {
            Some(target) => match payment_change(&statement, target) {
                Some(active) => {
                    let row = active.update(&txn).await?;
                    tracing::info!(
                        statement_id = %id,
                        payment_status = %target,
                        "updated statement payment status"
                    );
                    row
                }
                None => statement,
            },
            None => statement,
        };

        txn.commit().await?;
        Ok(updated)
    }

    /// Cancels one statement and appends its compensating ledger event, in
    /// one transaction with the row locked.
    ///
    /// # Errors
    ///
    /// Returns [`StatementError::NotFound`], or
    /// [`StatementError::AlreadyCancelled`] when the statement was cancelled
    /// before (nothing is written in that case).
    pub async fn cancel(
        &self,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<CancelledStatement, StatementError> {
        let txn = self.db.begin().await?;

        let Some(statement) = entry_fees_statement::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            return Err(StatementError::NotFound(id));
        };

        match plan_cancel(statement.issue_status.clone().into()) {
            CancelDecision::AlreadyCancelled => {
                return Err(StatementError::AlreadyCancelled(id));
            }
            CancelDecision::Cancel => {}
        }

        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        let list_id = statement.entry_fees_payment_list_id;
        let currency = statement.currency.clone();
        let amount_delta = -statement.total_amount;

        let mut active: entry_fees_statement::ActiveModel = statement.into();
        active.issue_status = Set(EntryFeesIssueStatus::Cancelled);
        active.cancelled_at = Set(Some(now));
        let cancelled = active.update(&txn).await?;

        let event = entry_fees_payment_list_event::ActiveModel {
            id: Set(EventId::new().into_inner()),
            entry_fees_payment_list_id: Set(list_id),
            currency: Set(currency),
            amount_delta: Set(amount_delta),
            created_at: Set(now),
            reason: Set(reason),
            statement_id: Set(Some(id)),
        };
        let event = event.insert(&txn).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                StatementError::DuplicateStatementEvent(id)
            } else {
                StatementError::Database(e)
            }
        })?;

        txn.commit().await?;

        tracing::info!(
            statement_id = %id,
            payment_list_id = %list_id,
            amount_delta = %event.amount_delta,
            "cancelled statement"
        );
        Ok(CancelledStatement {
            statement: cancelled,
            event,
        })
    }

    /// Applies payment-status updates to many statements in one shared
    /// transaction; the first failing item rolls back every earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`StatementError::BatchItem`] wrapping the first item
    /// failure with its `{index, statement_id}` position.
    pub async fn set_payment_status_batch(
        &self,
        updates: &[PaymentStatusUpdate],
    ) -> Result<Vec<entry_fees_statement::Model>, StatementError> {
        let txn = self.db.begin().await?;

        let mut rows = Vec::with_capacity(updates.len());
        for (index, update) in updates.iter().enumerate() {
            let row = apply_payment_status(&txn, update.statement_id, update.payment_status)
                .await
                .map_err(|e| e.in_batch(index, update.statement_id))?;
            rows.push(row);
        }

        txn.commit().await?;
        tracing::info!(updated = rows.len(), "applied payment-status batch");
        Ok(rows)
    }
}

fn filter_condition(filter: &StatementFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(id) = filter.payment_list_id {
        condition = condition.add(entry_fees_statement::Column::EntryFeesPaymentListId.eq(id));
    }
    if let Some(status) = filter.issue_status {
        condition = condition.add(
            entry_fees_statement::Column::IssueStatus
                .eq(crate::entities::sea_orm_active_enums::EntryFeesIssueStatus::from(status)),
        );
    }
    if let Some(status) = filter.payment_status {
        condition = condition.add(
            entry_fees_statement::Column::PaymentStatus
                .eq(crate::entities::sea_orm_active_enums::EntryFeesPaymentStatus::from(status)),
        );
    }
    if let Some(currency) = &filter.currency {
        condition = condition.add(entry_fees_statement::Column::Currency.eq(currency.clone()));
    }
    if let Some(group) = filter.billing_group_id {
        condition = condition.add(entry_fees_statement::Column::GroupKey.eq(group));
    }
    condition
}

/// Decides what a payment-status request changes on a fetched row.
/// `None` means the request was a same-state no-op.
fn payment_change(
    statement: &entry_fees_statement::Model,
    target: PaymentStatus,
) -> Option<entry_fees_statement::ActiveModel> {
    let current: PaymentStatus = statement.payment_status.clone().into();
    match validate_payment_transition(current, target) {
        Transition::Noop => None,
        Transition::Apply => {
            let mut active: entry_fees_statement::ActiveModel = statement.clone().into();
            active.payment_status = Set(target.into());
            active.paid_at = Set(match target {
                PaymentStatus::Paid => Some(chrono::Utc::now().into()),
                PaymentStatus::Unpaid => None,
            });
            Some(active)
        }
    }
}

async fn apply_payment_status<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    target: PaymentStatus,
) -> Result<entry_fees_statement::Model, StatementError> {
    let Some(statement) = entry_fees_statement::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
    else {
        return Err(StatementError::NotFound(id));
    };

    match payment_change(&statement, target) {
        Some(active) => Ok(active.update(conn).await?),
        None => Ok(statement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums::EntryFeesPaymentStatus;
    use rust_decimal_macros::dec;
    use sea_orm::ActiveValue;

    fn statement(payment: EntryFeesPaymentStatus) -> entry_fees_statement::Model {
        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        entry_fees_statement::Model {
            id: Uuid::now_v7(),
            entry_fees_payment_list_id: Uuid::now_v7(),
            group_key: Uuid::now_v7(),
            statement_number: "PL-018f4f2e-EUR-1".to_string(),
            issue_status: EntryFeesIssueStatus::Issued,
            payment_status: payment,
            currency: "EUR".to_string(),
            total_amount: dec!(120.50),
            created_at: now,
            paid_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn test_same_state_payment_request_is_noop() {
        let row = statement(EntryFeesPaymentStatus::Unpaid);
        assert!(payment_change(&row, PaymentStatus::Unpaid).is_none());

        let row = statement(EntryFeesPaymentStatus::Paid);
        assert!(payment_change(&row, PaymentStatus::Paid).is_none());
    }

    #[test]
    fn test_marking_paid_sets_paid_at() {
        let row = statement(EntryFeesPaymentStatus::Unpaid);
        let active = payment_change(&row, PaymentStatus::Paid).unwrap();

        assert_eq!(
            active.payment_status,
            ActiveValue::Set(EntryFeesPaymentStatus::Paid)
        );
        assert!(matches!(active.paid_at, ActiveValue::Set(Some(_))));
    }

    #[test]
    fn test_marking_unpaid_clears_paid_at() {
        let mut row = statement(EntryFeesPaymentStatus::Paid);
        row.paid_at = Some(chrono::Utc::now().into());

        let active = payment_change(&row, PaymentStatus::Unpaid).unwrap();
        assert_eq!(active.paid_at, ActiveValue::Set(None));
    }

    #[test]
    fn test_batch_item_error_names_position() {
        let id = Uuid::now_v7();
        let err = StatementError::NotFound(id).in_batch(2, id);
        assert_eq!(
            err.to_string(),
            format!("update item 2 for statement {id}: Statement not found: {id}")
        );
    }
}
