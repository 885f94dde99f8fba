//! Statement planning and lifecycle rules.
//!
//! A statement consolidates all entry fees for one (billing group, currency)
//! pair within one payment list. Planning is deterministic: the same fee
//! snapshots and mappings always produce the same buckets, numbers, and
//! totals, regardless of input order. Lifecycle rules govern the two
//! independent status axes and the dedicated cancel operation.

mod error;
mod number;
mod plan;
mod stats;
mod status;

pub use error::GenerationError;
pub use number::statement_number;
pub use plan::{
    plan_statements, validate_fee_records, FeeSnapshot, GenerationPlan, LinePlan, StatementPlan,
};
pub use stats::{build_stats, CurrencyAmount, StatementAggregate, StatementStats};
pub use status::{
    plan_cancel, validate_issue_transition, validate_payment_transition, CancelDecision,
    StatusError, Transition,
};
