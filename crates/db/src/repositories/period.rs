//! Entry-fee period repository for database operations.
//!
//! Periods are half-open `[start_date, end_date)` windows kept pairwise
//! disjoint. Overlap is checked proactively with a half-open intersection
//! query; the GiST exclusion constraint in the schema stays the final
//! authority under concurrent writers, and its violation is re-mapped to
//! the same overlap error, never surfaced raw.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use bordereau_core::period::{BatchValidationError, PeriodBatch, PeriodBatchOp, PeriodRangeError};
use bordereau_shared::types::PeriodId;

use crate::entities::entry_fees_period;

/// Page size used when the caller does not specify one.
pub const PERIOD_DEFAULT_PAGE_SIZE: u64 = 200;

/// Largest page a caller may request.
pub const PERIOD_MAX_PAGE_SIZE: u64 = 500;

/// Postgres reports exclusion-constraint violations (SQLSTATE 23P01) with
/// this phrase; sea-orm has no typed variant for them.
const EXCLUSION_VIOLATION: &str = "violates exclusion constraint";

/// Error types for period operations.
#[derive(Debug, thiserror::Error)]
pub enum PeriodError {
    /// Start date must be strictly before end date.
    #[error(transparent)]
    InvalidRange(#[from] PeriodRangeError),

    /// The requested range overlaps an existing period.
    #[error("Period range overlaps an existing period")]
    Overlap,

    /// Period not found.
    #[error("Period not found: {0}")]
    NotFound(Uuid),

    /// The batch was rejected before any storage access.
    #[error(transparent)]
    Validation(#[from] BatchValidationError),

    /// A batch item failed; the whole batch was rolled back.
    #[error("{op} item {index}: {source}")]
    BatchItem {
        /// Which operation list the item came from.
        op: PeriodBatchOp,
        /// Position within that list.
        index: usize,
        /// The underlying failure.
        #[source]
        source: Box<PeriodError>,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl PeriodError {
    /// Wraps a failure with its batch-item position.
    fn in_batch(self, op: PeriodBatchOp, index: usize) -> Self {
        Self::BatchItem {
            op,
            index,
            source: Box::new(self),
        }
    }
}

/// Maps storage-level exclusion violations to the overlap error.
fn classify(err: DbErr) -> PeriodError {
    if err.to_string().contains(EXCLUSION_VIOLATION) {
        PeriodError::Overlap
    } else {
        PeriodError::Database(err)
    }
}

/// Date-range filter for listing; both bounds intersect half-open.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodFilter {
    /// Keep periods ending after this date.
    pub from: Option<NaiveDate>,
    /// Keep periods starting before this date.
    pub to: Option<NaiveDate>,
}

/// Opaque keyset cursor over `(start_date, id)` ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodCursor {
    /// Start date of the last row of the previous page.
    pub start_date: NaiveDate,
    /// Id of the last row of the previous page.
    pub id: Uuid,
}

impl PeriodCursor {
    /// Encodes the cursor for the wire.
    #[must_use]
    pub fn encode(&self) -> String {
        base64_url::encode(&format!("{}|{}", self.start_date, self.id))
    }

    /// Decodes a wire cursor; garbage decodes to `None` and is treated as
    /// an absent cursor.
    #[must_use]
    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = base64_url::decode(raw).ok()?;
        let text = String::from_utf8(bytes).ok()?;
        let (date, id) = text.split_once('|')?;
        Some(Self {
            start_date: date.parse().ok()?,
            id: id.parse().ok()?,
        })
    }
}

/// One page of periods in ascending calendar order.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodPage {
    /// The periods of this page.
    pub items: Vec<entry_fees_period::Model>,
    /// Cursor for the next page; `None` on the last page.
    pub next_cursor: Option<String>,
    /// Total number of periods matching the filter.
    pub total: u64,
}

/// Outcome of a successfully committed period batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PeriodBatchOutcome {
    /// Rows inserted, in request order.
    pub created: Vec<entry_fees_period::Model>,
    /// Rows updated, in request order.
    pub updated: Vec<entry_fees_period::Model>,
    /// Ids deleted, in request order.
    pub deleted: Vec<Uuid>,
}

/// Entry-fee period repository.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
}

impl PeriodRepository {
    /// Creates a new period repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a period.
    ///
    /// # Errors
    ///
    /// Returns an error on a degenerate range, an overlap with an existing
    /// period, or a database failure.
    pub async fn create(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<entry_fees_period::Model, PeriodError> {
        let period = insert_period(&self.db, start_date, end_date).await?;
        tracing::info!(period_id = %period.id, %start_date, %end_date, "created period");
        Ok(period)
    }

    /// Lists periods ascending by `(start_date, id)` with keyset pagination.
    ///
    /// The limit is clamped to `1..=PERIOD_MAX_PAGE_SIZE`; one extra row is
    /// fetched to decide whether a next page exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list(
        &self,
        filter: PeriodFilter,
        limit: Option<u64>,
        cursor: Option<PeriodCursor>,
    ) -> Result<PeriodPage, PeriodError> {
        let limit = limit
            .unwrap_or(PERIOD_DEFAULT_PAGE_SIZE)
            .clamp(1, PERIOD_MAX_PAGE_SIZE);

        let mut condition = Condition::all();
        if let Some(from) = filter.from {
            condition = condition.add(entry_fees_period::Column::EndDate.gt(from));
        }
        if let Some(to) = filter.to {
            condition = condition.add(entry_fees_period::Column::StartDate.lt(to));
        }

        let total = entry_fees_period::Entity::find()
            .filter(condition.clone())
            .count(&self.db)
            .await?;

        let mut query = entry_fees_period::Entity::find()
            .filter(condition)
            .order_by_asc(entry_fees_period::Column::StartDate)
            .order_by_asc(entry_fees_period::Column::Id);

        if let Some(cursor) = cursor {
            // (start_date, id) > (cursor.start_date, cursor.id)
            query = query.filter(
                Condition::any()
                    .add(entry_fees_period::Column::StartDate.gt(cursor.start_date))
                    .add(
                        Condition::all()
                            .add(entry_fees_period::Column::StartDate.eq(cursor.start_date))
                            .add(entry_fees_period::Column::Id.gt(cursor.id)),
                    ),
            );
        }

        let mut items = query.limit(limit + 1).all(&self.db).await?;
        let has_more = u64::try_from(items.len()).unwrap_or(u64::MAX) > limit;
        if has_more {
            items.pop();
        }

        let next_cursor = if has_more {
            items.last().map(|last| {
                PeriodCursor {
                    start_date: last.start_date,
                    id: last.id,
                }
                .encode()
            })
        } else {
            None
        };

        Ok(PeriodPage {
            items,
            next_cursor,
            total,
        })
    }

    /// Finds a period by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<entry_fees_period::Model>, PeriodError> {
        Ok(entry_fees_period::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Resolves the unique period containing a date
    /// (`start_date <= date < end_date`), if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn resolve_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<entry_fees_period::Model>, PeriodError> {
        Ok(entry_fees_period::Entity::find()
            .filter(entry_fees_period::Column::StartDate.lte(date))
            .filter(entry_fees_period::Column::EndDate.gt(date))
            .order_by_desc(entry_fees_period::Column::StartDate)
            .one(&self.db)
            .await?)
    }

    /// Replaces a period's range wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error on a degenerate range, a missing period, an overlap
    /// with another period, or a database failure.
    pub async fn update(
        &self,
        id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<entry_fees_period::Model, PeriodError> {
        let updated = update_period(&self.db, id, start_date, end_date).await?;
        tracing::info!(period_id = %id, %start_date, %end_date, "updated period");
        Ok(updated)
    }

    /// Deletes a period.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::NotFound`] if the period does not exist.
    pub async fn delete(&self, id: Uuid) -> Result<(), PeriodError> {
        delete_period(&self.db, id).await?;
        tracing::info!(period_id = %id, "deleted period");
        Ok(())
    }

    /// Applies a mixed batch of period mutations in one transaction.
    ///
    /// The batch is pre-validated before any storage access; afterwards the
    /// first failing item aborts and rolls back the whole batch, carrying
    /// its `{operation, index}` position.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::Validation`] on pre-validation failure, or
    /// [`PeriodError::BatchItem`] wrapping the first item failure.
    pub async fn apply_batch(&self, batch: &PeriodBatch) -> Result<PeriodBatchOutcome, PeriodError> {
        batch.validate()?;

        let txn = self.db.begin().await?;
        let mut outcome = PeriodBatchOutcome::default();

        for (index, item) in batch.create.iter().enumerate() {
            let inserted = insert_period(&txn, item.start_date, item.end_date)
                .await
                .map_err(|e| e.in_batch(PeriodBatchOp::Create, index))?;
            outcome.created.push(inserted);
        }

        for (index, item) in batch.update.iter().enumerate() {
            let updated = update_period(&txn, item.id.into_inner(), item.start_date, item.end_date)
                .await
                .map_err(|e| e.in_batch(PeriodBatchOp::Update, index))?;
            outcome.updated.push(updated);
        }

        for (index, id) in batch.delete.iter().enumerate() {
            delete_period(&txn, id.into_inner())
                .await
                .map_err(|e| e.in_batch(PeriodBatchOp::Delete, index))?;
            outcome.deleted.push(id.into_inner());
        }

        txn.commit().await?;

        tracing::info!(
            created = outcome.created.len(),
            updated = outcome.updated.len(),
            deleted = outcome.deleted.len(),
            "applied period batch"
        );
        Ok(outcome)
    }
}

/// Finds any period intersecting the half-open range, optionally excluding
/// one id (for updates against the row being moved).
async fn overlap_candidate<C: ConnectionTrait>(
    conn: &C,
    start_date: NaiveDate,
    end_date: NaiveDate,
    exclude: Option<Uuid>,
) -> Result<Option<entry_fees_period::Model>, DbErr> {
    let mut query = entry_fees_period::Entity::find()
        .filter(entry_fees_period::Column::StartDate.lt(end_date))
        .filter(entry_fees_period::Column::EndDate.gt(start_date));
    if let Some(id) = exclude {
        query = query.filter(entry_fees_period::Column::Id.ne(id));
    }
    query.one(conn).await
}

async fn insert_period<C: ConnectionTrait>(
    conn: &C,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<entry_fees_period::Model, PeriodError> {
    bordereau_core::period::validate_range(start_date, end_date)?;

    if overlap_candidate(conn, start_date, end_date, None)
        .await?
        .is_some()
    {
        return Err(PeriodError::Overlap);
    }

    let period = entry_fees_period::ActiveModel {
        id: Set(PeriodId::new().into_inner()),
        start_date: Set(start_date),
        end_date: Set(end_date),
    };
    period.insert(conn).await.map_err(classify)
}

async fn update_period<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<entry_fees_period::Model, PeriodError> {
    bordereau_core::period::validate_range(start_date, end_date)?;

    let Some(existing) = entry_fees_period::Entity::find_by_id(id).one(conn).await? else {
        return Err(PeriodError::NotFound(id));
    };

    if overlap_candidate(conn, start_date, end_date, Some(id))
        .await?
        .is_some()
    {
        return Err(PeriodError::Overlap);
    }

    let mut active: entry_fees_period::ActiveModel = existing.into();
    active.start_date = Set(start_date);
    active.end_date = Set(end_date);
    active.update(conn).await.map_err(classify)
}

async fn delete_period<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<(), PeriodError> {
    let result = entry_fees_period::Entity::delete_by_id(id).exec(conn).await?;
    if result.rows_affected == 0 {
        return Err(PeriodError::NotFound(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cursor_round_trip() {
        let cursor = PeriodCursor {
            start_date: date(2026, 3, 1),
            id: Uuid::now_v7(),
        };
        let decoded = PeriodCursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn test_cursor_wire_shape() {
        let id = "018f4f2e-aaaa-7bbb-8ccc-000000000001".parse().unwrap();
        let cursor = PeriodCursor {
            start_date: date(2026, 3, 1),
            id,
        };
        let decoded = base64_url::decode(&cursor.encode()).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            "2026-03-01|018f4f2e-aaaa-7bbb-8ccc-000000000001"
        );
    }

    #[test]
    fn test_garbage_cursor_decodes_to_none() {
        assert!(PeriodCursor::decode("not-base64!!").is_none());
        assert!(PeriodCursor::decode(&base64_url::encode("no-pipe")).is_none());
        assert!(PeriodCursor::decode(&base64_url::encode("2026-13-99|nope")).is_none());
    }

    #[test]
    fn test_classify_exclusion_violation() {
        let err = DbErr::Custom(
            "error returned from database: conflicting key value violates exclusion constraint \
             \"excl_entry_fees_period_overlap\""
                .to_string(),
        );
        assert!(matches!(classify(err), PeriodError::Overlap));

        let other = DbErr::Custom("connection reset".to_string());
        assert!(matches!(classify(other), PeriodError::Database(_)));
    }

    #[test]
    fn test_batch_item_error_names_position() {
        let err = PeriodError::Overlap.in_batch(PeriodBatchOp::Update, 3);
        assert_eq!(
            err.to_string(),
            "update item 3: Period range overlaps an existing period"
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        prop_compose! {
            fn arb_cursor()(days in 0i64..36_500, raw in any::<u128>()) -> PeriodCursor {
                PeriodCursor {
                    start_date: date(1970, 1, 1) + chrono::Duration::days(days),
                    id: Uuid::from_u128(raw),
                }
            }
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            /// Every cursor survives the wire unchanged.
            #[test]
            fn prop_cursor_round_trip(cursor in arb_cursor()) {
                prop_assert_eq!(PeriodCursor::decode(&cursor.encode()), Some(cursor));
            }
        }
    }
}
