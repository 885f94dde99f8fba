//! Statement lifecycle transitions.
//!
//! Issue status and payment status move independently. Payment status may
//! flip freely between UNPAID and PAID; issue status only ever moves to
//! CANCELLED, and only through the cancel path which also writes the
//! compensating event.

use thiserror::Error;

use bordereau_shared::types::{IssueStatus, PaymentStatus};

/// Outcome of a status change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested state equals the current state; nothing to persist.
    Noop,
    /// State changes and must be persisted.
    Apply,
}

/// Forbidden lifecycle move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatusError {
    /// The requested issue-status move is not part of the lifecycle.
    #[error("transition from {from} to {to} is not allowed")]
    Forbidden {
        /// Current state.
        from: &'static str,
        /// Requested state.
        to: &'static str,
    },
}

/// Decision for a cancel request against the current issue status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelDecision {
    /// Statement is already cancelled; the caller reports a conflict.
    AlreadyCancelled,
    /// Proceed: flip to CANCELLED and write the compensating event.
    Cancel,
}

/// Validates a payment-status change. Both directions are legal, so the
/// only distinction is whether anything changes.
#[must_use]
pub fn validate_payment_transition(from: PaymentStatus, to: PaymentStatus) -> Transition {
    match (from, to) {
        (PaymentStatus::Unpaid, PaymentStatus::Unpaid)
        | (PaymentStatus::Paid, PaymentStatus::Paid) => Transition::Noop,
        (PaymentStatus::Unpaid, PaymentStatus::Paid)
        | (PaymentStatus::Paid, PaymentStatus::Unpaid) => Transition::Apply,
    }
}

/// Validates an issue-status change requested through the generic update
/// path. Same-state requests are no-ops; everything else is forbidden,
/// cancellation included, because cancelling must go through the cancel
/// path that records the compensating event.
///
/// # Errors
///
/// Returns [`StatusError::Forbidden`] for any state-changing request.
pub fn validate_issue_transition(
    from: IssueStatus,
    to: IssueStatus,
) -> Result<Transition, StatusError> {
    match (from, to) {
        (IssueStatus::Issued, IssueStatus::Issued)
        | (IssueStatus::Cancelled, IssueStatus::Cancelled) => Ok(Transition::Noop),
        (IssueStatus::Issued, IssueStatus::Cancelled) => Err(StatusError::Forbidden {
            from: IssueStatus::Issued.as_str(),
            to: IssueStatus::Cancelled.as_str(),
        }),
        (IssueStatus::Cancelled, IssueStatus::Issued) => Err(StatusError::Forbidden {
            from: IssueStatus::Cancelled.as_str(),
            to: IssueStatus::Issued.as_str(),
        }),
    }
}

/// Decides what a cancel request does given the current issue status.
#[must_use]
pub fn plan_cancel(current: IssueStatus) -> CancelDecision {
    match current {
        IssueStatus::Cancelled => CancelDecision::AlreadyCancelled,
        IssueStatus::Issued => CancelDecision::Cancel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PaymentStatus::Unpaid, PaymentStatus::Unpaid, Transition::Noop)]
    #[case(PaymentStatus::Paid, PaymentStatus::Paid, Transition::Noop)]
    #[case(PaymentStatus::Unpaid, PaymentStatus::Paid, Transition::Apply)]
    #[case(PaymentStatus::Paid, PaymentStatus::Unpaid, Transition::Apply)]
    fn test_payment_transitions(
        #[case] from: PaymentStatus,
        #[case] to: PaymentStatus,
        #[case] expected: Transition,
    ) {
        assert_eq!(validate_payment_transition(from, to), expected);
    }

    #[rstest]
    #[case(IssueStatus::Issued, IssueStatus::Issued)]
    #[case(IssueStatus::Cancelled, IssueStatus::Cancelled)]
    fn test_same_state_issue_request_is_noop(#[case] from: IssueStatus, #[case] to: IssueStatus) {
        assert_eq!(validate_issue_transition(from, to), Ok(Transition::Noop));
    }

    #[test]
    fn test_issue_change_is_forbidden_outside_cancel_path() {
        let err = validate_issue_transition(IssueStatus::Issued, IssueStatus::Cancelled)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "transition from ISSUED to CANCELLED is not allowed"
        );
    }

    #[test]
    fn test_cancelled_statement_cannot_be_reissued() {
        assert!(validate_issue_transition(IssueStatus::Cancelled, IssueStatus::Issued).is_err());
    }

    #[test]
    fn test_cancel_plan() {
        assert_eq!(plan_cancel(IssueStatus::Issued), CancelDecision::Cancel);
        assert_eq!(
            plan_cancel(IssueStatus::Cancelled),
            CancelDecision::AlreadyCancelled
        );
    }
}
