//! Announced totals and the adjustment ledger.
//!
//! A payment list carries one announced total per currency, frozen at
//! creation. Later corrections never touch that row: they append signed
//! [`EventDelta`] entries, and the net view merges both on read. The law
//! `net = announced + Σ deltas` therefore holds per currency after any
//! number of cancellations or manual adjustments.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use bordereau_shared::feed::FeedRecord;
use bordereau_shared::types::money::{format_amount, round_amount};
use bordereau_shared::types::{CurrencyCode, StatementId};

/// Announced total for one currency, computed from the feed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncedTotal {
    /// Currency of the total.
    pub currency: CurrencyCode,
    /// Sum of member entry fees in this currency, two decimals.
    pub total_announced: Decimal,
}

/// Stored per-currency totals row of a payment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTotal {
    /// Currency of the row.
    pub currency: CurrencyCode,
    /// Announced total frozen at creation.
    pub total_announced: Decimal,
    /// Member count recorded on the row.
    pub subscriptions_count: i32,
    /// Statement count recorded on the row.
    pub statements_count: i32,
}

/// One ledger entry, reduced to what the net view needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDelta {
    /// Currency of the adjustment.
    pub currency: CurrencyCode,
    /// Signed amount, negative for cancellations and manual corrections.
    pub amount_delta: Decimal,
}

/// Net view of one currency: announced total merged with the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetTotal {
    /// Currency code.
    pub currency: String,
    /// Announced total, two-decimal string.
    pub announced_total: String,
    /// Sum of ledger deltas, two-decimal string.
    pub events_delta_total: String,
    /// `announced + deltas`, two-decimal string.
    pub net_total: String,
    /// Member count from the totals row, zero for ledger-only currencies.
    pub subscriptions_count: i32,
    /// Statement count from the totals row, zero for ledger-only currencies.
    pub statements_count: i32,
}

/// Rejected manual adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdjustmentError {
    /// Manual adjustments only ever reduce a list; zero and positive
    /// deltas are refused.
    #[error("amount_delta must be a negative number, got {0}")]
    NotNegative(Decimal),
    /// A statement-linked adjustment must say why.
    #[error("reason is required when statement_id is provided")]
    ReasonRequired,
}

/// Sums member entry fees per currency from raw feed records.
///
/// This path is deliberately lenient where statement generation is strict:
/// records missing a currency count under `EUR`, records missing an amount
/// count as zero. The announced total is informational; generation
/// re-validates before any statement exists.
#[must_use]
pub fn announced_totals(records: &[FeedRecord], members: &[Uuid]) -> Vec<AnnouncedTotal> {
    let wanted: HashSet<Uuid> = members.iter().copied().collect();

    let mut by_currency: BTreeMap<CurrencyCode, Decimal> = BTreeMap::new();
    for record in records {
        if !wanted.contains(&record.subscription_id) {
            continue;
        }
        let currency = CurrencyCode::parse_lossy(record.currency.as_deref().unwrap_or(""));
        let amount = record.entry_fees_amount.unwrap_or(Decimal::ZERO);
        *by_currency.entry(currency).or_default() += amount;
    }

    by_currency
        .into_iter()
        .map(|(currency, total)| AnnouncedTotal {
            currency,
            total_announced: round_amount(total),
        })
        .collect()
}

/// Merges stored totals with the event ledger into the net view.
///
/// Currencies present only in the ledger (possible after a manual
/// adjustment in a currency the list never announced) appear with a zero
/// announced total. Output is sorted by currency code.
#[must_use]
pub fn net_totals(totals: &[ListTotal], events: &[EventDelta]) -> Vec<NetTotal> {
    let mut deltas: BTreeMap<CurrencyCode, Decimal> = BTreeMap::new();
    for event in events {
        *deltas.entry(event.currency.clone()).or_default() += event.amount_delta;
    }

    let mut items: Vec<NetTotal> = totals
        .iter()
        .map(|total| {
            let delta = deltas.remove(&total.currency).unwrap_or(Decimal::ZERO);
            NetTotal {
                currency: total.currency.as_str().to_string(),
                announced_total: format_amount(total.total_announced),
                events_delta_total: format_amount(delta),
                net_total: format_amount(total.total_announced + delta),
                subscriptions_count: total.subscriptions_count,
                statements_count: total.statements_count,
            }
        })
        .collect();

    for (currency, delta) in deltas {
        items.push(NetTotal {
            currency: currency.as_str().to_string(),
            announced_total: format_amount(Decimal::ZERO),
            events_delta_total: format_amount(delta),
            net_total: format_amount(delta),
            subscriptions_count: 0,
            statements_count: 0,
        });
    }

    items.sort_by(|a, b| a.currency.cmp(&b.currency));
    items
}

/// Validates a manual ledger adjustment before it is persisted.
///
/// # Errors
///
/// Returns [`AdjustmentError`] when the delta is not strictly negative, or
/// when a statement is referenced without a reason.
pub fn validate_adjustment(
    amount_delta: Decimal,
    reason: Option<&str>,
    statement_id: Option<StatementId>,
) -> Result<(), AdjustmentError> {
    if amount_delta >= Decimal::ZERO {
        return Err(AdjustmentError::NotNegative(amount_delta));
    }
    if statement_id.is_some() && reason.is_none_or(|r| r.trim().is_empty()) {
        return Err(AdjustmentError::ReasonRequired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn currency(code: &str) -> CurrencyCode {
        CurrencyCode::parse(code).unwrap()
    }

    fn feed_row(id: Uuid, cur: Option<&str>, amount: Option<Decimal>) -> FeedRecord {
        FeedRecord {
            subscription_id: id,
            source_group_id: Some(Uuid::now_v7()),
            currency: cur.map(str::to_string),
            entry_fees_amount: amount,
        }
    }

    fn total(cur: &str, announced: Decimal, subs: i32, stmts: i32) -> ListTotal {
        ListTotal {
            currency: currency(cur),
            total_announced: announced,
            subscriptions_count: subs,
            statements_count: stmts,
        }
    }

    fn delta(cur: &str, amount: Decimal) -> EventDelta {
        EventDelta {
            currency: currency(cur),
            amount_delta: amount,
        }
    }

    #[test]
    fn test_announced_totals_filter_to_members() {
        let member = Uuid::now_v7();
        let stranger = Uuid::now_v7();
        let records = vec![
            feed_row(member, Some("EUR"), Some(dec!(100))),
            feed_row(member, Some("EUR"), Some(dec!(20.5))),
            feed_row(stranger, Some("EUR"), Some(dec!(999))),
        ];

        let totals = announced_totals(&records, &[member]);
        assert_eq!(
            totals,
            vec![AnnouncedTotal {
                currency: currency("EUR"),
                total_announced: dec!(120.50),
            }]
        );
    }

    #[test]
    fn test_announced_totals_default_missing_currency_and_amount() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let records = vec![
            feed_row(a, None, Some(dec!(10))),
            feed_row(b, Some("USD"), None),
        ];

        let totals = announced_totals(&records, &[a, b]);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].currency.as_str(), "EUR");
        assert_eq!(totals[0].total_announced, dec!(10));
        assert_eq!(totals[1].currency.as_str(), "USD");
        assert_eq!(totals[1].total_announced, Decimal::ZERO);
    }

    #[test]
    fn test_net_totals_merge_announced_and_ledger() {
        let items = net_totals(
            &[total("EUR", dec!(500), 4, 2)],
            &[delta("EUR", dec!(-120)), delta("EUR", dec!(-30))],
        );

        assert_eq!(items.len(), 1);
        let eur = &items[0];
        assert_eq!(eur.announced_total, "500.00");
        assert_eq!(eur.events_delta_total, "-150.00");
        assert_eq!(eur.net_total, "350.00");
        assert_eq!(eur.subscriptions_count, 4);
        assert_eq!(eur.statements_count, 2);
    }

    #[test]
    fn test_net_totals_include_ledger_only_currencies() {
        let items = net_totals(
            &[total("USD", dec!(80), 1, 1)],
            &[delta("CHF", dec!(-9.5))],
        );

        let codes: Vec<&str> = items.iter().map(|i| i.currency.as_str()).collect();
        assert_eq!(codes, vec!["CHF", "USD"]);

        let chf = &items[0];
        assert_eq!(chf.announced_total, "0.00");
        assert_eq!(chf.net_total, "-9.50");
        assert_eq!(chf.subscriptions_count, 0);
    }

    #[test]
    fn test_net_totals_without_events_pass_through() {
        let items = net_totals(&[total("EUR", dec!(42), 2, 1)], &[]);
        assert_eq!(items[0].events_delta_total, "0.00");
        assert_eq!(items[0].net_total, "42.00");
    }

    #[test]
    fn test_validate_adjustment_requires_negative_delta() {
        assert_eq!(
            validate_adjustment(dec!(0), None, None),
            Err(AdjustmentError::NotNegative(dec!(0)))
        );
        assert_eq!(
            validate_adjustment(dec!(12), None, None),
            Err(AdjustmentError::NotNegative(dec!(12)))
        );
        assert_eq!(validate_adjustment(dec!(-12), None, None), Ok(()));
    }

    #[test]
    fn test_validate_adjustment_requires_reason_with_statement() {
        let statement = StatementId::from_str("018f4f2e-aaaa-7bbb-8ccc-0123456789ab").unwrap();
        assert_eq!(
            validate_adjustment(dec!(-5), None, Some(statement)),
            Err(AdjustmentError::ReasonRequired)
        );
        assert_eq!(
            validate_adjustment(dec!(-5), Some("   "), Some(statement)),
            Err(AdjustmentError::ReasonRequired)
        );
        assert_eq!(
            validate_adjustment(dec!(-5), Some("double billing"), Some(statement)),
            Ok(())
        );
        // Reason stays optional for list-level adjustments.
        assert_eq!(validate_adjustment(dec!(-5), None, None), Ok(()));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// net = announced + Σ deltas, per currency, for any ledger.
        #[test]
        fn prop_net_total_law(
            announced_cents in 0i64..10_000_000,
            deltas in prop::collection::vec(-1_000_000i64..0, 0..16),
        ) {
            let announced = Decimal::new(announced_cents, 2);
            let events: Vec<EventDelta> = deltas
                .iter()
                .map(|&cents| delta("EUR", Decimal::new(cents, 2)))
                .collect();

            let items = net_totals(&[total("EUR", announced, 1, 1)], &events);
            prop_assert_eq!(items.len(), 1);

            let expected: Decimal =
                announced + deltas.iter().map(|&c| Decimal::new(c, 2)).sum::<Decimal>();
            prop_assert_eq!(items[0].net_total.clone(), format_amount(expected));
        }
    }
}
