//! Statement status vocabulary.
//!
//! A statement carries two independent status axes: the issue axis
//! (`ISSUED`/`CANCELLED`) and the payment axis (`UNPAID`/`PAID`).
//! The transition rules live in the core crate; this module is only the
//! closed vocabulary shared by storage, core, and the API.

use serde::{Deserialize, Serialize};

/// Issue axis of a statement's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    /// Statement was generated and is live.
    Issued,
    /// Statement was cancelled; terminal.
    Cancelled,
}

/// Payment axis of a statement's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// No payment recorded.
    Unpaid,
    /// Payment recorded.
    Paid,
}

impl IssueStatus {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issued => "ISSUED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl PaymentStatus {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::Paid => "PAID",
        }
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ISSUED" => Ok(Self::Issued),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown issue status: {s}")),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UNPAID" => Ok(Self::Unpaid),
            "PAID" => Ok(Self::Paid),
            _ => Err(format!("Unknown payment status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_issue_status_round_trip() {
        assert_eq!(IssueStatus::Issued.to_string(), "ISSUED");
        assert_eq!(IssueStatus::Cancelled.to_string(), "CANCELLED");
        assert_eq!(
            IssueStatus::from_str("issued").unwrap(),
            IssueStatus::Issued
        );
        assert_eq!(
            IssueStatus::from_str("CANCELLED").unwrap(),
            IssueStatus::Cancelled
        );
        assert!(IssueStatus::from_str("VOID").is_err());
    }

    #[test]
    fn test_payment_status_round_trip() {
        assert_eq!(PaymentStatus::Unpaid.to_string(), "UNPAID");
        assert_eq!(PaymentStatus::Paid.to_string(), "PAID");
        assert_eq!(
            PaymentStatus::from_str("paid").unwrap(),
            PaymentStatus::Paid
        );
        assert!(PaymentStatus::from_str("SETTLED").is_err());
    }
}
