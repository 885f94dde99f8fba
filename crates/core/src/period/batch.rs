//! Pre-validation of period batch mutations.
//!
//! A period batch mixes creates, updates, and deletes that later execute in
//! one shared transaction. Everything that can be rejected without touching
//! storage is rejected here: degenerate ranges, duplicate ids within the
//! update or delete lists, and ids that appear in both.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bordereau_shared::types::PeriodId;

use super::rules::validate_range;

/// Operation kinds inside a period batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodBatchOp {
    /// Insert a new period.
    Create,
    /// Replace an existing period's range.
    Update,
    /// Remove a period.
    Delete,
}

impl PeriodBatchOp {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for PeriodBatchOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One period to create.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PeriodCreateItem {
    /// First day (inclusive).
    pub start_date: NaiveDate,
    /// Day after the last day (exclusive).
    pub end_date: NaiveDate,
}

/// One period to update; the range is replaced wholesale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PeriodUpdateItem {
    /// Period to touch.
    pub id: PeriodId,
    /// New first day (inclusive).
    pub start_date: NaiveDate,
    /// New exclusive end day.
    pub end_date: NaiveDate,
}

/// An ordered batch of period mutations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodBatch {
    /// Periods to insert.
    #[serde(default)]
    pub create: Vec<PeriodCreateItem>,
    /// Periods to replace.
    #[serde(default)]
    pub update: Vec<PeriodUpdateItem>,
    /// Periods to remove.
    #[serde(default)]
    pub delete: Vec<PeriodId>,
}

/// Rejection reasons found before any storage access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchValidationError {
    /// A create or update item carries an empty or inverted range.
    #[error("{op} item {index}: start_date {start} must be strictly before end_date {end}")]
    InvalidRange {
        /// Which list the item came from.
        op: PeriodBatchOp,
        /// Position within that list.
        index: usize,
        /// Target id for updates; creates have none yet.
        id: Option<PeriodId>,
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// The same id appears twice in one operation list.
    #[error("duplicate id {id} in {op} items")]
    DuplicateId {
        /// Which list contained the duplicate.
        op: PeriodBatchOp,
        /// The repeated id.
        id: PeriodId,
    },

    /// The same id is both updated and deleted.
    #[error("id {id} appears in both update and delete")]
    UpdateDeleteCollision {
        /// The colliding id.
        id: PeriodId,
    },
}

impl PeriodBatch {
    /// Returns true when no operation is requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    /// Total number of requested operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.create.len() + self.update.len() + self.delete.len()
    }

    /// Rejects the batch before storage access; the first problem wins.
    ///
    /// # Errors
    ///
    /// Returns [`BatchValidationError`] on a degenerate range, a duplicate
    /// id within `update` or `delete`, or an id present in both.
    pub fn validate(&self) -> Result<(), BatchValidationError> {
        for (index, item) in self.create.iter().enumerate() {
            validate_range(item.start_date, item.end_date).map_err(|e| {
                BatchValidationError::InvalidRange {
                    op: PeriodBatchOp::Create,
                    index,
                    id: None,
                    start: e.start,
                    end: e.end,
                }
            })?;
        }

        for (index, item) in self.update.iter().enumerate() {
            validate_range(item.start_date, item.end_date).map_err(|e| {
                BatchValidationError::InvalidRange {
                    op: PeriodBatchOp::Update,
                    index,
                    id: Some(item.id),
                    start: e.start,
                    end: e.end,
                }
            })?;
        }

        let mut update_ids = HashSet::new();
        for item in &self.update {
            if !update_ids.insert(item.id) {
                return Err(BatchValidationError::DuplicateId {
                    op: PeriodBatchOp::Update,
                    id: item.id,
                });
            }
        }

        let mut delete_ids = HashSet::new();
        for id in &self.delete {
            if !delete_ids.insert(*id) {
                return Err(BatchValidationError::DuplicateId {
                    op: PeriodBatchOp::Delete,
                    id: *id,
                });
            }
        }

        if let Some(id) = update_ids.intersection(&delete_ids).next() {
            return Err(BatchValidationError::UpdateDeleteCollision { id: *id });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create(start: NaiveDate, end: NaiveDate) -> PeriodCreateItem {
        PeriodCreateItem {
            start_date: start,
            end_date: end,
        }
    }

    fn update(id: PeriodId, start: NaiveDate, end: NaiveDate) -> PeriodUpdateItem {
        PeriodUpdateItem {
            id,
            start_date: start,
            end_date: end,
        }
    }

    #[test]
    fn test_valid_mixed_batch_passes() {
        let batch = PeriodBatch {
            create: vec![create(date(2024, 1, 1), date(2024, 2, 1))],
            update: vec![update(PeriodId::new(), date(2024, 3, 1), date(2024, 4, 1))],
            delete: vec![PeriodId::new()],
        };
        assert!(batch.validate().is_ok());
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_empty_batch_is_valid_and_empty() {
        let batch = PeriodBatch::default();
        assert!(batch.is_empty());
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn test_inverted_create_range_names_index() {
        let batch = PeriodBatch {
            create: vec![
                create(date(2024, 1, 1), date(2024, 2, 1)),
                create(date(2024, 5, 1), date(2024, 4, 1)),
            ],
            ..PeriodBatch::default()
        };

        match batch.validate() {
            Err(BatchValidationError::InvalidRange { op, index, id, .. }) => {
                assert_eq!(op, PeriodBatchOp::Create);
                assert_eq!(index, 1);
                assert!(id.is_none());
            }
            other => panic!("expected InvalidRange, got {other:?}"),
        }
    }

    #[test]
    fn test_update_range_error_names_id() {
        let target = PeriodId::new();
        let batch = PeriodBatch {
            update: vec![update(target, date(2024, 2, 1), date(2024, 2, 1))],
            ..PeriodBatch::default()
        };

        match batch.validate() {
            Err(BatchValidationError::InvalidRange { op, index, id, .. }) => {
                assert_eq!(op, PeriodBatchOp::Update);
                assert_eq!(index, 0);
                assert_eq!(id, Some(target));
            }
            other => panic!("expected InvalidRange, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_update_id_rejected() {
        let dup = PeriodId::new();
        let batch = PeriodBatch {
            update: vec![
                update(dup, date(2024, 1, 1), date(2024, 2, 1)),
                update(dup, date(2024, 3, 1), date(2024, 4, 1)),
            ],
            ..PeriodBatch::default()
        };

        assert_eq!(
            batch.validate(),
            Err(BatchValidationError::DuplicateId {
                op: PeriodBatchOp::Update,
                id: dup,
            })
        );
    }

    #[test]
    fn test_duplicate_delete_id_rejected() {
        let dup = PeriodId::new();
        let batch = PeriodBatch {
            delete: vec![dup, dup],
            ..PeriodBatch::default()
        };

        assert_eq!(
            batch.validate(),
            Err(BatchValidationError::DuplicateId {
                op: PeriodBatchOp::Delete,
                id: dup,
            })
        );
    }

    #[test]
    fn test_update_delete_collision_rejected() {
        let shared = PeriodId::new();
        let batch = PeriodBatch {
            update: vec![update(shared, date(2024, 1, 1), date(2024, 2, 1))],
            delete: vec![shared],
            ..PeriodBatch::default()
        };

        assert_eq!(
            batch.validate(),
            Err(BatchValidationError::UpdateDeleteCollision { id: shared })
        );
    }
}
