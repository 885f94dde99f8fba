//! Payment-list repository: the transactional creation coordinator plus
//! listing, totals, and ledger-event operations.
//!
//! Creation is one transaction: advisory locks on the requested
//! subscriptions, the double-billing conflict check, the list/membership/
//! totals inserts, and statement generation either all commit or all roll
//! back. The net-total and stats views are read-side projections built from
//! the pure functions in core.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, SqlErr, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use bordereau_core::billing::{BillingResolver, MappingEntry};
use bordereau_core::statement::{
    build_stats, plan_statements, validate_fee_records, GenerationError, GenerationPlan,
    StatementAggregate, StatementStats,
};
use bordereau_core::totals::{
    announced_totals, net_totals, validate_adjustment, AdjustmentError, EventDelta, ListTotal,
    NetTotal,
};
use bordereau_shared::feed::FeedRecord;
use bordereau_shared::types::money::{round_amount, EmptyCurrencyCode};
use bordereau_shared::types::{
    CurrencyCode, CursorPage, EventId, GroupId, GroupStructureId, PaymentListId, StatementId,
    StatementLineId,
};

use crate::entities::{
    entry_fees_payment_list, entry_fees_payment_list_event, entry_fees_payment_list_subscription,
    entry_fees_payment_list_total, entry_fees_statement, entry_fees_statement_subscription,
    group_structure_map, group_structures,
    sea_orm_active_enums::{EntryFeesIssueStatus, EntryFeesPaymentStatus},
};

/// Most colliding subscriptions reported on a creation conflict.
const CONFLICT_SAMPLE_LIMIT: u64 = 20;

/// Error types for payment-list operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentListError {
    /// Requested subscriptions are already billed on active statements.
    #[error(
        "Subscriptions already attached to active statements: {}",
        conflict_ids(.conflicts)
    )]
    Conflict {
        /// Up to [`CONFLICT_SAMPLE_LIMIT`] colliding tuples.
        conflicts: Vec<SubscriptionConflict>,
    },

    /// A feed record failed generation-time validation.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A manual adjustment was rejected before storage.
    #[error(transparent)]
    Adjustment(#[from] AdjustmentError),

    /// An event currency was blank.
    #[error(transparent)]
    Currency(#[from] EmptyCurrencyCode),

    /// The named group structure does not exist.
    #[error("Group structure not found: {0}")]
    StructureNotFound(Uuid),

    /// No structure version is active and none was named.
    #[error("No active group structure")]
    NoActiveStructure,

    /// Payment list not found.
    #[error("Payment list not found: {0}")]
    NotFound(Uuid),

    /// The statement named by an adjustment does not exist.
    #[error("Statement not found: {0}")]
    StatementNotFound(Uuid),

    /// The statement named by an adjustment belongs to another list.
    #[error("Statement {statement_id} does not belong to payment list {payment_list_id}")]
    StatementNotInList {
        /// The referenced statement.
        statement_id: Uuid,
        /// The list the adjustment targeted.
        payment_list_id: Uuid,
    },

    /// The statement already has a ledger event.
    #[error("A ledger event already references statement {0}")]
    DuplicateStatementEvent(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

fn conflict_ids(conflicts: &[SubscriptionConflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.subscription_id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One colliding (subscription, payment list, statement) tuple.
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct SubscriptionConflict {
    /// Subscription requested for the new list.
    pub subscription_id: Uuid,
    /// List where the subscription is already billed.
    pub payment_list_id: Uuid,
    /// Active statement carrying the subscription.
    pub statement_id: Uuid,
}

/// One caller-supplied announced total.
#[derive(Debug, Clone)]
pub struct TotalInput {
    /// Currency of the total.
    pub currency: String,
    /// Announced amount.
    pub total_announced: Decimal,
}

/// Input for creating a payment list.
#[derive(Debug, Clone)]
pub struct CreatePaymentListInput {
    /// Operator recorded on the list.
    pub created_by: String,
    /// Structure version to resolve against; `None` uses the active one.
    pub group_structure_id: Option<Uuid>,
    /// Free-form billing-window label.
    pub period_label: Option<String>,
    /// Requested subscriptions; duplicates are dropped.
    pub subscription_ids: Vec<Uuid>,
    /// Announced totals; computed from the feed records when absent.
    pub totals: Option<Vec<TotalInput>>,
    /// Feed snapshot the fees are read from.
    pub records: Vec<FeedRecord>,
}

/// Input for a manual ledger adjustment.
#[derive(Debug, Clone)]
pub struct RecordEventInput {
    /// Currency of the adjustment.
    pub currency: String,
    /// Signed delta; must be strictly negative.
    pub amount_delta: Decimal,
    /// Why the adjustment was made.
    pub reason: Option<String>,
    /// Statement the adjustment compensates, if any.
    pub statement_id: Option<Uuid>,
}

/// The created payment list with everything written alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedPaymentList {
    /// The list row.
    pub payment_list: entry_fees_payment_list::Model,
    /// Per-currency announced totals.
    pub totals: Vec<entry_fees_payment_list_total::Model>,
    /// Generated statements in numbering order.
    pub statements: Vec<entry_fees_statement::Model>,
    /// Statements written by this call.
    pub newly_created: usize,
}

/// Result of a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    /// The list's statements, existing or just written.
    pub statements: Vec<entry_fees_statement::Model>,
    /// Zero when the list already had statements.
    pub newly_created: usize,
}

/// One payment list with a derived statement count.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentListDetail {
    /// The list row.
    pub payment_list: entry_fees_payment_list::Model,
    /// Number of statements, counted live.
    pub statements_count: u64,
}

/// One payment list decorated for the listing view.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentListSummary {
    /// The list row.
    pub payment_list: entry_fees_payment_list::Model,
    /// Net totals per currency.
    pub totals: Vec<NetTotal>,
    /// Number of ledger events.
    pub events_count: u64,
    /// Statement counts and sums across the status matrix.
    pub statements: StatementStats,
}

/// Filters for the payment-list listing.
#[derive(Debug, Clone, Default)]
pub struct PaymentListFilter {
    /// Keep lists created at or after this instant.
    pub created_from: Option<chrono::DateTime<chrono::Utc>>,
    /// Keep lists created strictly before this instant.
    pub created_to: Option<chrono::DateTime<chrono::Utc>>,
    /// Keep lists created by one operator.
    pub created_by: Option<String>,
    /// Keep lists frozen against one structure version.
    pub group_structure_id: Option<Uuid>,
}

/// Payment-list repository.
#[derive(Debug, Clone)]
pub struct PaymentListRepository {
    db: DatabaseConnection,
}

impl PaymentListRepository {
    /// Creates a new payment-list repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a payment list with its membership, totals, and statements
    /// in one transaction.
    ///
    /// Validation and planning run before the transaction; inside it the
    /// coordinator takes an advisory lock per requested subscription (in
    /// sorted order, so two concurrent creates sharing a subscription
    /// serialize instead of racing the conflict check), verifies no
    /// requested subscription is already billed on an active statement,
    /// and then writes everything.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentListError::Conflict`] with up to twenty colliding
    /// tuples, [`PaymentListError::Generation`] for a bad feed record, or
    /// a structure lookup failure. Any error rolls back every write.
    pub async fn create(
        &self,
        input: CreatePaymentListInput,
    ) -> Result<CreatedPaymentList, PaymentListError> {
        let members: Vec<Uuid> = input
            .subscription_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let records = member_records(&input.records, &members);
        let snapshots = validate_fee_records(&records)?;

        let structure = self.load_structure(input.group_structure_id).await?;
        let resolver = load_resolver(&self.db, structure.id).await?;

        let list_id = PaymentListId::new();
        let plan = plan_statements(list_id, &snapshots, &resolver);
        let planned_totals = totals_rows(&records, &members, input.totals.as_deref(), &plan);

        let txn = self.db.begin().await?;
        lock_subscriptions(&txn, &members).await?;

        let conflicts = conflict_sample(&txn, &members).await?;
        if !conflicts.is_empty() {
            return Err(PaymentListError::Conflict { conflicts });
        }

        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        let list = entry_fees_payment_list::ActiveModel {
            id: Set(list_id.into_inner()),
            created_at: Set(now),
            created_by: Set(input.created_by),
            group_structure_id: Set(structure.id),
            period_label: Set(input.period_label),
            subscriptions_count: Set(count_i32(members.len())),
        }
        .insert(&txn)
        .await?;

        for subscription_id in &members {
            entry_fees_payment_list_subscription::ActiveModel {
                entry_fees_payment_list_id: Set(list.id),
                subscription_id: Set(*subscription_id),
            }
            .insert(&txn)
            .await?;
        }

        let mut totals = Vec::with_capacity(planned_totals.len());
        for row in planned_totals {
            let stored = entry_fees_payment_list_total::ActiveModel {
                id: Set(Uuid::now_v7()),
                entry_fees_payment_list_id: Set(list.id),
                currency: Set(row.currency),
                total_announced: Set(row.total_announced),
                statements_count: Set(row.statements_count),
                subscriptions_count: Set(row.subscriptions_count),
            }
            .insert(&txn)
            .await?;
            totals.push(stored);
        }

        let outcome = generate_in_txn(&txn, &plan, now).await?;
        txn.commit().await?;

        tracing::info!(
            payment_list_id = %list.id,
            subscriptions = members.len(),
            statements = outcome.newly_created,
            "created payment list"
        );
        Ok(CreatedPaymentList {
            payment_list: list,
            totals,
            statements: outcome.statements,
            newly_created: outcome.newly_created,
        })
    }

    /// Generates statements for an existing list from a feed snapshot.
    ///
    /// A list that already has statements is returned as-is with
    /// `newly_created = 0`, so the call is safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentListError::NotFound`] for a missing list or
    /// [`PaymentListError::Generation`] for a bad feed record.
    pub async fn generate_statements(
        &self,
        payment_list_id: Uuid,
        records: &[FeedRecord],
    ) -> Result<GenerationOutcome, PaymentListError> {
        let Some(list) = entry_fees_payment_list::Entity::find_by_id(payment_list_id)
            .one(&self.db)
            .await?
        else {
            return Err(PaymentListError::NotFound(payment_list_id));
        };

        let members: Vec<Uuid> = entry_fees_payment_list_subscription::Entity::find()
            .filter(
                entry_fees_payment_list_subscription::Column::EntryFeesPaymentListId
                    .eq(payment_list_id),
            )
            .order_by_asc(entry_fees_payment_list_subscription::Column::SubscriptionId)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.subscription_id)
            .collect();

        let records = member_records(records, &members);
        let snapshots = validate_fee_records(&records)?;
        let resolver = load_resolver(&self.db, list.group_structure_id).await?;
        let plan = plan_statements(
            PaymentListId::from_uuid(payment_list_id),
            &snapshots,
            &resolver,
        );

        let txn = self.db.begin().await?;
        let outcome = generate_in_txn(&txn, &plan, chrono::Utc::now().into()).await?;
        txn.commit().await?;

        if outcome.newly_created > 0 {
            tracing::info!(
                payment_list_id = %payment_list_id,
                statements = outcome.newly_created,
                "generated statements"
            );
        }
        Ok(outcome)
    }

    /// Lists payment lists newest first, each decorated with its net
    /// totals, event count, and statement stats.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list_summaries(
        &self,
        filter: &PaymentListFilter,
        page: &CursorPage,
    ) -> Result<(Vec<PaymentListSummary>, u64), PaymentListError> {
        let condition = filter_condition(filter);

        let total = entry_fees_payment_list::Entity::find()
            .filter(condition.clone())
            .count(&self.db)
            .await?;

        let mut query = entry_fees_payment_list::Entity::find()
            .filter(condition)
            .order_by_desc(entry_fees_payment_list::Column::CreatedAt)
            .order_by_desc(entry_fees_payment_list::Column::Id);
        if let Some(cursor) = page.cursor {
            query = query.filter(entry_fees_payment_list::Column::CreatedAt.lt(cursor));
        }
        let lists = query.limit(page.limit()).all(&self.db).await?;

        let mut items = Vec::with_capacity(lists.len());
        for list in lists {
            items.push(self.summarize(list).await?);
        }
        Ok((items, total))
    }

    /// Finds a payment list with its live statement count.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn find_detail(
        &self,
        id: Uuid,
    ) -> Result<Option<PaymentListDetail>, PaymentListError> {
        let Some(list) = entry_fees_payment_list::Entity::find_by_id(id)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let statements_count = entry_fees_statement::Entity::find()
            .filter(entry_fees_statement::Column::EntryFeesPaymentListId.eq(id))
            .count(&self.db)
            .await?;

        Ok(Some(PaymentListDetail {
            payment_list: list,
            statements_count,
        }))
    }

    /// Returns a list's membership rows, ordered by subscription.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentListError::NotFound`] if the list does not exist.
    pub async fn subscriptions(
        &self,
        id: Uuid,
    ) -> Result<Vec<entry_fees_payment_list_subscription::Model>, PaymentListError> {
        self.ensure_exists(id).await?;

        Ok(entry_fees_payment_list_subscription::Entity::find()
            .filter(entry_fees_payment_list_subscription::Column::EntryFeesPaymentListId.eq(id))
            .order_by_asc(entry_fees_payment_list_subscription::Column::SubscriptionId)
            .all(&self.db)
            .await?)
    }

    /// Returns the per-currency net view: announced totals merged with the
    /// event ledger, including ledger-only currencies.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentListError::NotFound`] if the list does not exist.
    pub async fn totals_view(&self, id: Uuid) -> Result<Vec<NetTotal>, PaymentListError> {
        self.ensure_exists(id).await?;
        Ok(net_view(&self.db, id).await?)
    }

    /// Returns a list's ledger events, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentListError::NotFound`] if the list does not exist.
    pub async fn events(
        &self,
        id: Uuid,
    ) -> Result<Vec<entry_fees_payment_list_event::Model>, PaymentListError> {
        self.ensure_exists(id).await?;

        Ok(entry_fees_payment_list_event::Entity::find()
            .filter(entry_fees_payment_list_event::Column::EntryFeesPaymentListId.eq(id))
            .order_by_desc(entry_fees_payment_list_event::Column::CreatedAt)
            .order_by_desc(entry_fees_payment_list_event::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Appends a manual adjustment to a list's ledger.
    ///
    /// The delta must be strictly negative; when a statement is referenced
    /// the reason becomes mandatory, the statement must belong to the list,
    /// and at most one event may reference it.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentListError::Adjustment`] for a rejected delta,
    /// [`PaymentListError::DuplicateStatementEvent`] when the statement is
    /// already compensated, and not-found errors for missing rows.
    pub async fn record_event(
        &self,
        id: Uuid,
        input: RecordEventInput,
    ) -> Result<entry_fees_payment_list_event::Model, PaymentListError> {
        validate_adjustment(
            input.amount_delta,
            input.reason.as_deref(),
            input.statement_id.map(StatementId::from_uuid),
        )?;
        let currency = CurrencyCode::parse(&input.currency)?;

        self.ensure_exists(id).await?;

        if let Some(statement_id) = input.statement_id {
            let Some(statement) = entry_fees_statement::Entity::find_by_id(statement_id)
                .one(&self.db)
                .await?
            else {
                return Err(PaymentListError::StatementNotFound(statement_id));
            };
            if statement.entry_fees_payment_list_id != id {
                return Err(PaymentListError::StatementNotInList {
                    statement_id,
                    payment_list_id: id,
                });
            }
        }

        let event = entry_fees_payment_list_event::ActiveModel {
            id: Set(EventId::new().into_inner()),
            entry_fees_payment_list_id: Set(id),
            currency: Set(currency.as_str().to_string()),
            amount_delta: Set(round_amount(input.amount_delta)),
            created_at: Set(chrono::Utc::now().into()),
            reason: Set(input.reason),
            statement_id: Set(input.statement_id),
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                PaymentListError::DuplicateStatementEvent(
                    input.statement_id.unwrap_or_default(),
                )
            } else {
                PaymentListError::Database(e)
            }
        })?;

        tracing::info!(
            payment_list_id = %id,
            currency = %event.currency,
            amount_delta = %event.amount_delta,
            "recorded adjustment event"
        );
        Ok(event)
    }

    /// Builds the statement stats block for one list.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stats(&self, id: Uuid) -> Result<StatementStats, PaymentListError> {
        let rows = entry_fees_statement::Entity::find()
            .filter(entry_fees_statement::Column::EntryFeesPaymentListId.eq(id))
            .all(&self.db)
            .await?;

        let aggregates: Vec<StatementAggregate> = rows
            .iter()
            .map(|row| StatementAggregate {
                currency: CurrencyCode::parse_lossy(&row.currency),
                issue_status: row.issue_status.clone().into(),
                payment_status: row.payment_status.clone().into(),
                count: 1,
                total_amount: row.total_amount,
            })
            .collect();

        Ok(build_stats(&aggregates))
    }

    async fn summarize(
        &self,
        list: entry_fees_payment_list::Model,
    ) -> Result<PaymentListSummary, PaymentListError> {
        let totals = net_view(&self.db, list.id).await?;
        let events_count = entry_fees_payment_list_event::Entity::find()
            .filter(entry_fees_payment_list_event::Column::EntryFeesPaymentListId.eq(list.id))
            .count(&self.db)
            .await?;
        let statements = self.stats(list.id).await?;

        Ok(PaymentListSummary {
            payment_list: list,
            totals,
            events_count,
            statements,
        })
    }

    async fn load_structure(
        &self,
        requested: Option<Uuid>,
    ) -> Result<group_structures::Model, PaymentListError> {
        match requested {
            Some(id) => {
                let Some(structure) = group_structures::Entity::find_by_id(id)
                    .one(&self.db)
                    .await?
                else {
                    return Err(PaymentListError::StructureNotFound(id));
                };
                if !structure.is_active {
                    tracing::warn!(
                        group_structure_id = %id,
                        "creating payment list against an inactive structure version"
                    );
                }
                Ok(structure)
            }
            None => group_structures::Entity::find()
                .filter(group_structures::Column::IsActive.eq(true))
                .one(&self.db)
                .await?
                .ok_or(PaymentListError::NoActiveStructure),
        }
    }

    async fn ensure_exists(&self, id: Uuid) -> Result<(), PaymentListError> {
        let Some(_) = entry_fees_payment_list::Entity::find_by_id(id)
            .one(&self.db)
            .await?
        else {
            return Err(PaymentListError::NotFound(id));
        };
        Ok(())
    }
}

fn filter_condition(filter: &PaymentListFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(from) = filter.created_from {
        condition = condition.add(entry_fees_payment_list::Column::CreatedAt.gte(from));
    }
    if let Some(to) = filter.created_to {
        condition = condition.add(entry_fees_payment_list::Column::CreatedAt.lt(to));
    }
    if let Some(created_by) = &filter.created_by {
        condition = condition.add(entry_fees_payment_list::Column::CreatedBy.eq(created_by.clone()));
    }
    if let Some(structure) = filter.group_structure_id {
        condition = condition.add(entry_fees_payment_list::Column::GroupStructureId.eq(structure));
    }
    condition
}

/// Keeps the first feed record of each requested subscription.
fn member_records(records: &[FeedRecord], members: &[Uuid]) -> Vec<FeedRecord> {
    let wanted: HashSet<Uuid> = members.iter().copied().collect();
    let mut seen: HashSet<Uuid> = HashSet::with_capacity(members.len());
    records
        .iter()
        .filter(|r| wanted.contains(&r.subscription_id) && seen.insert(r.subscription_id))
        .cloned()
        .collect()
}

struct TotalRowPlan {
    currency: String,
    total_announced: Decimal,
    statements_count: i32,
    subscriptions_count: i32,
}

/// Plans the per-currency totals rows.
///
/// The base is computed from the member records; caller-supplied entries
/// override per currency. Counts always come from the generation plan, so
/// a supplied currency without statements gets zeroes.
fn totals_rows(
    records: &[FeedRecord],
    members: &[Uuid],
    supplied: Option<&[TotalInput]>,
    plan: &GenerationPlan,
) -> Vec<TotalRowPlan> {
    let mut announced: BTreeMap<String, Decimal> = announced_totals(records, members)
        .into_iter()
        .map(|t| (t.currency.as_str().to_string(), t.total_announced))
        .collect();
    if let Some(rows) = supplied {
        for row in rows {
            announced.insert(
                CurrencyCode::parse_lossy(&row.currency).as_str().to_string(),
                round_amount(row.total_announced),
            );
        }
    }

    let mut counts: BTreeMap<String, (i32, i32)> = BTreeMap::new();
    for statement in &plan.statements {
        let entry = counts
            .entry(statement.currency.as_str().to_string())
            .or_default();
        entry.0 += 1;
        entry.1 += count_i32(statement.lines.len());
    }

    announced
        .into_iter()
        .map(|(currency, total_announced)| {
            let (statements_count, subscriptions_count) =
                counts.get(&currency).copied().unwrap_or((0, 0));
            TotalRowPlan {
                currency,
                total_announced,
                statements_count,
                subscriptions_count,
            }
        })
        .collect()
}

fn count_i32(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

async fn load_resolver<C: ConnectionTrait>(
    conn: &C,
    structure_id: Uuid,
) -> Result<BillingResolver, DbErr> {
    let rows = group_structure_map::Entity::find()
        .filter(group_structure_map::Column::GroupStructureId.eq(structure_id))
        .all(conn)
        .await?;

    let entries = rows.into_iter().map(|row| MappingEntry {
        source_group_id: GroupId::from_uuid(row.source_group_id),
        billing_group_id: GroupId::from_uuid(row.billing_group_id),
    });
    Ok(BillingResolver::new(
        GroupStructureId::from_uuid(structure_id),
        entries,
    ))
}

/// Takes one advisory transaction lock per subscription, in sorted order.
async fn lock_subscriptions<C: ConnectionTrait>(conn: &C, members: &[Uuid]) -> Result<(), DbErr> {
    for id in members {
        conn.execute_unprepared(&format!(
            "SELECT pg_advisory_xact_lock(hashtextextended('{id}', 0))"
        ))
        .await?;
    }
    Ok(())
}

async fn conflict_sample<C: ConnectionTrait>(
    conn: &C,
    members: &[Uuid],
) -> Result<Vec<SubscriptionConflict>, DbErr> {
    if members.is_empty() {
        return Ok(Vec::new());
    }

    entry_fees_statement_subscription::Entity::find()
        .select_only()
        .column(entry_fees_statement_subscription::Column::SubscriptionId)
        .column_as(
            entry_fees_statement::Column::EntryFeesPaymentListId,
            "payment_list_id",
        )
        .column_as(entry_fees_statement::Column::Id, "statement_id")
        .join(
            JoinType::InnerJoin,
            entry_fees_statement_subscription::Relation::EntryFeesStatement.def(),
        )
        .filter(
            entry_fees_statement_subscription::Column::SubscriptionId
                .is_in(members.iter().copied()),
        )
        .filter(entry_fees_statement::Column::IssueStatus.ne(EntryFeesIssueStatus::Cancelled))
        .order_by_asc(entry_fees_statement_subscription::Column::SubscriptionId)
        .limit(CONFLICT_SAMPLE_LIMIT)
        .into_model::<SubscriptionConflict>()
        .all(conn)
        .await
}

/// Writes the planned statements and lines, or returns the existing rows.
async fn generate_in_txn<C: ConnectionTrait>(
    conn: &C,
    plan: &GenerationPlan,
    now: chrono::DateTime<chrono::FixedOffset>,
) -> Result<GenerationOutcome, PaymentListError> {
    let list_id = plan.payment_list_id.into_inner();

    let existing = entry_fees_statement::Entity::find()
        .filter(entry_fees_statement::Column::EntryFeesPaymentListId.eq(list_id))
        .order_by_asc(entry_fees_statement::Column::CreatedAt)
        .order_by_asc(entry_fees_statement::Column::Id)
        .all(conn)
        .await?;
    if !existing.is_empty() {
        return Ok(GenerationOutcome {
            statements: existing,
            newly_created: 0,
        });
    }

    let mut statements = Vec::with_capacity(plan.statements.len());
    for planned in &plan.statements {
        let statement = entry_fees_statement::ActiveModel {
            id: Set(StatementId::new().into_inner()),
            entry_fees_payment_list_id: Set(list_id),
            group_key: Set(planned.group_key.into_inner()),
            statement_number: Set(planned.statement_number.clone()),
            issue_status: Set(EntryFeesIssueStatus::Issued),
            payment_status: Set(EntryFeesPaymentStatus::Unpaid),
            currency: Set(planned.currency.as_str().to_string()),
            total_amount: Set(planned.total_amount),
            created_at: Set(now),
            paid_at: Set(None),
            cancelled_at: Set(None),
        }
        .insert(conn)
        .await?;

        for line in &planned.lines {
            entry_fees_statement_subscription::ActiveModel {
                id: Set(StatementLineId::new().into_inner()),
                entry_fees_statement_id: Set(statement.id),
                subscription_id: Set(line.subscription_id.into_inner()),
                snapshot_source_group_id: Set(line.source_group_id.into_inner()),
                snapshot_total_amount: Set(line.amount),
            }
            .insert(conn)
            .await?;
        }
        statements.push(statement);
    }

    let newly_created = statements.len();
    Ok(GenerationOutcome {
        statements,
        newly_created,
    })
}

async fn net_view<C: ConnectionTrait>(conn: &C, list_id: Uuid) -> Result<Vec<NetTotal>, DbErr> {
    let totals: Vec<ListTotal> = entry_fees_payment_list_total::Entity::find()
        .filter(entry_fees_payment_list_total::Column::EntryFeesPaymentListId.eq(list_id))
        .order_by_asc(entry_fees_payment_list_total::Column::Currency)
        .all(conn)
        .await?
        .into_iter()
        .map(|row| ListTotal {
            currency: CurrencyCode::parse_lossy(&row.currency),
            total_announced: row.total_announced,
            subscriptions_count: row.subscriptions_count,
            statements_count: row.statements_count,
        })
        .collect();

    let deltas: Vec<EventDelta> = entry_fees_payment_list_event::Entity::find()
        .filter(entry_fees_payment_list_event::Column::EntryFeesPaymentListId.eq(list_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|row| EventDelta {
            currency: CurrencyCode::parse_lossy(&row.currency),
            amount_delta: row.amount_delta,
        })
        .collect();

    Ok(net_totals(&totals, &deltas))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(subscription: Uuid, currency: &str, amount: Decimal) -> FeedRecord {
        FeedRecord {
            subscription_id: subscription,
            source_group_id: Some(Uuid::now_v7()),
            currency: Some(currency.to_string()),
            entry_fees_amount: Some(amount),
        }
    }

    fn identity_plan(records: &[FeedRecord]) -> GenerationPlan {
        let snapshots = validate_fee_records(records).unwrap();
        plan_statements(
            PaymentListId::new(),
            &snapshots,
            &BillingResolver::new(GroupStructureId::new(), Vec::new()),
        )
    }

    #[test]
    fn test_member_records_filter_and_dedup() {
        let member = Uuid::now_v7();
        let stranger = Uuid::now_v7();
        let records = vec![
            record(member, "EUR", dec!(10)),
            record(member, "EUR", dec!(99)),
            record(stranger, "EUR", dec!(5)),
        ];

        let kept = member_records(&records, &[member]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].entry_fees_amount, Some(dec!(10)));
    }

    #[test]
    fn test_totals_rows_computed_from_records() {
        let member = Uuid::now_v7();
        let records = vec![record(member, "EUR", dec!(120.504))];
        let plan = identity_plan(&records);

        let rows = totals_rows(&records, &[member], None, &plan);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].currency, "EUR");
        assert_eq!(rows[0].total_announced, dec!(120.50));
        assert_eq!(rows[0].statements_count, 1);
        assert_eq!(rows[0].subscriptions_count, 1);
    }

    #[test]
    fn test_totals_rows_supplied_overrides_keep_plan_counts() {
        let member = Uuid::now_v7();
        let records = vec![record(member, "EUR", dec!(100))];
        let plan = identity_plan(&records);
        let supplied = vec![
            TotalInput {
                currency: "eur".to_string(),
                total_announced: dec!(999.999),
            },
            TotalInput {
                currency: "USD".to_string(),
                total_announced: dec!(50),
            },
        ];

        let rows = totals_rows(&records, &[member], Some(&supplied), &plan);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].currency, "EUR");
        assert_eq!(rows[0].total_announced, dec!(1000.00));
        assert_eq!(rows[0].statements_count, 1);

        // Supplied currency without statements keeps zero counts.
        assert_eq!(rows[1].currency, "USD");
        assert_eq!(rows[1].total_announced, dec!(50.00));
        assert_eq!(rows[1].statements_count, 0);
        assert_eq!(rows[1].subscriptions_count, 0);
    }

    #[test]
    fn test_conflict_error_names_subscriptions() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let err = PaymentListError::Conflict {
            conflicts: vec![
                SubscriptionConflict {
                    subscription_id: a,
                    payment_list_id: Uuid::now_v7(),
                    statement_id: Uuid::now_v7(),
                },
                SubscriptionConflict {
                    subscription_id: b,
                    payment_list_id: Uuid::now_v7(),
                    statement_id: Uuid::now_v7(),
                },
            ],
        };

        let message = err.to_string();
        assert!(message.contains(&a.to_string()));
        assert!(message.contains(&b.to_string()));
    }
}
