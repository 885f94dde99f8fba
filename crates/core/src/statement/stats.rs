//! Statement statistics.
//!
//! Collapses per-(issue, payment, currency) aggregate rows into the stats
//! block shown next to a payment list: one count and one per-currency
//! amount list for each slice of the status matrix.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use bordereau_shared::types::money::format_amount;
use bordereau_shared::types::{CurrencyCode, IssueStatus, PaymentStatus};

/// One aggregate row, as grouped by the database:
/// all statements of a payment list sharing (issue, payment, currency).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementAggregate {
    /// Statement currency.
    pub currency: CurrencyCode,
    /// Issue status of the slice.
    pub issue_status: IssueStatus,
    /// Payment status of the slice.
    pub payment_status: PaymentStatus,
    /// Number of statements in the slice.
    pub count: i64,
    /// Sum of statement totals in the slice.
    pub total_amount: Decimal,
}

/// Per-currency amount, formatted to two decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyAmount {
    /// Currency code.
    pub currency: String,
    /// Two-decimal amount string.
    pub amount: String,
}

/// Statement statistics for one payment list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatementStats {
    /// All statements.
    pub total_count: i64,
    /// Statements still issued.
    pub issued_count: i64,
    /// Cancelled statements.
    pub cancelled_count: i64,
    /// Issued and paid.
    pub issued_paid_count: i64,
    /// Issued and unpaid.
    pub issued_unpaid_count: i64,
    /// Cancelled while already paid.
    pub cancelled_paid_count: i64,
    /// Cancelled while unpaid.
    pub cancelled_unpaid_count: i64,
    /// Amounts over all statements, one entry per currency.
    pub total_amounts: Vec<CurrencyAmount>,
    /// Amounts over issued statements.
    pub issued_amounts: Vec<CurrencyAmount>,
    /// Amounts over cancelled statements.
    pub cancelled_amounts: Vec<CurrencyAmount>,
    /// Amounts over issued, paid statements.
    pub issued_paid_amounts: Vec<CurrencyAmount>,
    /// Amounts over issued, unpaid statements.
    pub issued_unpaid_amounts: Vec<CurrencyAmount>,
    /// Amounts over cancelled, paid statements.
    pub cancelled_paid_amounts: Vec<CurrencyAmount>,
    /// Amounts over cancelled, unpaid statements.
    pub cancelled_unpaid_amounts: Vec<CurrencyAmount>,
}

#[derive(Debug, Default)]
struct Accumulator {
    count: i64,
    amounts: BTreeMap<CurrencyCode, Decimal>,
}

impl Accumulator {
    fn add(&mut self, row: &StatementAggregate) {
        self.count += row.count;
        *self.amounts.entry(row.currency.clone()).or_default() += row.total_amount;
    }

    fn into_parts(self) -> (i64, Vec<CurrencyAmount>) {
        let amounts = self
            .amounts
            .into_iter()
            .map(|(currency, amount)| CurrencyAmount {
                currency: currency.as_str().to_string(),
                amount: format_amount(amount),
            })
            .collect();
        (self.count, amounts)
    }
}

/// Builds the stats block from aggregate rows of a single payment list.
///
/// Amount lists are sorted by currency code; an empty input yields the
/// all-zero stats block.
#[must_use]
pub fn build_stats(rows: &[StatementAggregate]) -> StatementStats {
    let mut total = Accumulator::default();
    let mut issued = Accumulator::default();
    let mut cancelled = Accumulator::default();
    let mut issued_paid = Accumulator::default();
    let mut issued_unpaid = Accumulator::default();
    let mut cancelled_paid = Accumulator::default();
    let mut cancelled_unpaid = Accumulator::default();

    for row in rows {
        total.add(row);
        match (row.issue_status, row.payment_status) {
            (IssueStatus::Issued, PaymentStatus::Paid) => {
                issued.add(row);
                issued_paid.add(row);
            }
            (IssueStatus::Issued, PaymentStatus::Unpaid) => {
                issued.add(row);
                issued_unpaid.add(row);
            }
            (IssueStatus::Cancelled, PaymentStatus::Paid) => {
                cancelled.add(row);
                cancelled_paid.add(row);
            }
            (IssueStatus::Cancelled, PaymentStatus::Unpaid) => {
                cancelled.add(row);
                cancelled_unpaid.add(row);
            }
        }
    }

    let (total_count, total_amounts) = total.into_parts();
    let (issued_count, issued_amounts) = issued.into_parts();
    let (cancelled_count, cancelled_amounts) = cancelled.into_parts();
    let (issued_paid_count, issued_paid_amounts) = issued_paid.into_parts();
    let (issued_unpaid_count, issued_unpaid_amounts) = issued_unpaid.into_parts();
    let (cancelled_paid_count, cancelled_paid_amounts) = cancelled_paid.into_parts();
    let (cancelled_unpaid_count, cancelled_unpaid_amounts) = cancelled_unpaid.into_parts();

    StatementStats {
        total_count,
        issued_count,
        cancelled_count,
        issued_paid_count,
        issued_unpaid_count,
        cancelled_paid_count,
        cancelled_unpaid_count,
        total_amounts,
        issued_amounts,
        cancelled_amounts,
        issued_paid_amounts,
        issued_unpaid_amounts,
        cancelled_paid_amounts,
        cancelled_unpaid_amounts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(
        currency: &str,
        issue: IssueStatus,
        payment: PaymentStatus,
        count: i64,
        amount: Decimal,
    ) -> StatementAggregate {
        StatementAggregate {
            currency: CurrencyCode::parse(currency).unwrap(),
            issue_status: issue,
            payment_status: payment,
            count,
            total_amount: amount,
        }
    }

    #[test]
    fn test_empty_rows_build_zero_stats() {
        let stats = build_stats(&[]);
        assert_eq!(stats, StatementStats::default());
        assert_eq!(stats.total_count, 0);
        assert!(stats.total_amounts.is_empty());
    }

    #[test]
    fn test_counts_split_across_status_matrix() {
        let stats = build_stats(&[
            row("EUR", IssueStatus::Issued, PaymentStatus::Paid, 3, dec!(300)),
            row("EUR", IssueStatus::Issued, PaymentStatus::Unpaid, 2, dec!(200)),
            row("EUR", IssueStatus::Cancelled, PaymentStatus::Unpaid, 1, dec!(50)),
        ]);

        assert_eq!(stats.total_count, 6);
        assert_eq!(stats.issued_count, 5);
        assert_eq!(stats.cancelled_count, 1);
        assert_eq!(stats.issued_paid_count, 3);
        assert_eq!(stats.issued_unpaid_count, 2);
        assert_eq!(stats.cancelled_paid_count, 0);
        assert_eq!(stats.cancelled_unpaid_count, 1);
    }

    #[test]
    fn test_amounts_group_by_currency_in_sorted_order() {
        let stats = build_stats(&[
            row("USD", IssueStatus::Issued, PaymentStatus::Unpaid, 1, dec!(10.5)),
            row("CHF", IssueStatus::Issued, PaymentStatus::Unpaid, 1, dec!(20)),
            row("EUR", IssueStatus::Issued, PaymentStatus::Paid, 1, dec!(30)),
            row("USD", IssueStatus::Issued, PaymentStatus::Paid, 1, dec!(4.5)),
        ]);

        let totals: Vec<(&str, &str)> = stats
            .total_amounts
            .iter()
            .map(|a| (a.currency.as_str(), a.amount.as_str()))
            .collect();
        assert_eq!(
            totals,
            vec![("CHF", "20.00"), ("EUR", "30.00"), ("USD", "15.00")]
        );
    }

    #[test]
    fn test_cancelled_amounts_excluded_from_issued_slices() {
        let stats = build_stats(&[
            row("EUR", IssueStatus::Issued, PaymentStatus::Unpaid, 2, dec!(80)),
            row("EUR", IssueStatus::Cancelled, PaymentStatus::Paid, 1, dec!(40)),
        ]);

        assert_eq!(stats.total_amounts[0].amount, "120.00");
        assert_eq!(stats.issued_amounts[0].amount, "80.00");
        assert_eq!(stats.cancelled_amounts[0].amount, "40.00");
        assert_eq!(stats.cancelled_paid_amounts[0].amount, "40.00");
        assert!(stats.issued_paid_amounts.is_empty());
    }
}
