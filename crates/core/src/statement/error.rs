//! Error types for statement planning.

use rust_decimal::Decimal;
use thiserror::Error;

use bordereau_shared::types::SubscriptionId;

/// Rejection of a whole generation run.
///
/// Generation is all-or-nothing: a single bad fee snapshot aborts the run,
/// naming the offending subscription so the caller can fix the feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The feed record has no source group.
    #[error("subscription {0} has no source group")]
    MissingSourceGroup(SubscriptionId),

    /// The feed record has no usable currency.
    #[error("subscription {0} has no currency")]
    MissingCurrency(SubscriptionId),

    /// Negative entry fees are rejected; zero is allowed.
    #[error("subscription {subscription_id} has a negative entry fee: {amount}")]
    NegativeAmount {
        /// The offending subscription.
        subscription_id: SubscriptionId,
        /// The rejected amount.
        amount: Decimal,
    },
}
