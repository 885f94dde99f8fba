//! Entry-fee billing periods.
//!
//! Periods are half-open date windows `[start_date, end_date)` that must
//! never overlap. This module holds the pure range rules and the
//! pre-validation of batch mutations; the storage-level exclusion
//! constraint and its error mapping live in the db crate.

mod batch;
mod rules;

pub use batch::{
    BatchValidationError, PeriodBatch, PeriodBatchOp, PeriodCreateItem, PeriodUpdateItem,
};
pub use rules::{find_period_for_date, ranges_overlap, validate_range, PeriodRangeError, PeriodWindow};
