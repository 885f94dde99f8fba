//! `SeaORM` active enums for statement status columns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use bordereau_shared::types::{IssueStatus, PaymentStatus};

/// Issue axis of a statement, as stored in Postgres.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "entry_fees_issue_status"
)]
pub enum EntryFeesIssueStatus {
    /// Statement was generated and is live.
    #[sea_orm(string_value = "ISSUED")]
    Issued,
    /// Statement was cancelled; terminal.
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

/// Payment axis of a statement, as stored in Postgres.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "entry_fees_payment_status"
)]
pub enum EntryFeesPaymentStatus {
    /// No payment recorded.
    #[sea_orm(string_value = "UNPAID")]
    Unpaid,
    /// Payment recorded.
    #[sea_orm(string_value = "PAID")]
    Paid,
}

impl From<IssueStatus> for EntryFeesIssueStatus {
    fn from(status: IssueStatus) -> Self {
        match status {
            IssueStatus::Issued => Self::Issued,
            IssueStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<EntryFeesIssueStatus> for IssueStatus {
    fn from(status: EntryFeesIssueStatus) -> Self {
        match status {
            EntryFeesIssueStatus::Issued => Self::Issued,
            EntryFeesIssueStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<PaymentStatus> for EntryFeesPaymentStatus {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Unpaid => Self::Unpaid,
            PaymentStatus::Paid => Self::Paid,
        }
    }
}

impl From<EntryFeesPaymentStatus> for PaymentStatus {
    fn from(status: EntryFeesPaymentStatus) -> Self {
        match status {
            EntryFeesPaymentStatus::Unpaid => Self::Unpaid,
            EntryFeesPaymentStatus::Paid => Self::Paid,
        }
    }
}
