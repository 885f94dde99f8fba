//! Deterministic statement planning.
//!
//! Turns a subscription fee-snapshot list plus a billing resolver into the
//! exact Statement/StatementLine rows to persist. Planning is pure; the db
//! crate owns persistence and the idempotency check against existing rows.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bordereau_shared::feed::FeedRecord;
use bordereau_shared::types::money::round_amount;
use bordereau_shared::types::{CurrencyCode, GroupId, PaymentListId, SubscriptionId};

use crate::billing::BillingResolver;

use super::error::GenerationError;
use super::number::statement_number;

/// A validated fee snapshot for one subscription.
///
/// Amounts are rounded to two decimals here: the snapshot is the boundary
/// where an upstream value becomes part of a statement, and pre-rounded
/// lines keep every statement total the exact sum of its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSnapshot {
    /// Upstream subscription.
    pub subscription_id: SubscriptionId,
    /// Originating team at snapshot time.
    pub source_group_id: GroupId,
    /// Fee currency.
    pub currency: CurrencyCode,
    /// Entry-fee amount, two decimals, never negative.
    pub amount: Decimal,
}

/// Planned statement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePlan {
    /// Subscription the line snapshots.
    pub subscription_id: SubscriptionId,
    /// Originating team, kept on the line so it stays self-describing.
    pub source_group_id: GroupId,
    /// Snapshot amount.
    pub amount: Decimal,
}

/// Planned statement for one (billing group, currency) bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPlan {
    /// Billing group receiving the statement.
    pub group_key: GroupId,
    /// Statement currency.
    pub currency: CurrencyCode,
    /// Deterministic number, derived from the sorted bucket position.
    pub statement_number: String,
    /// Sum of the line amounts.
    pub total_amount: Decimal,
    /// One line per subscription in the bucket, in input order.
    pub lines: Vec<LinePlan>,
}

/// Full deterministic plan for one payment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationPlan {
    /// Target payment list.
    pub payment_list_id: PaymentListId,
    /// Statements in ascending (billing group, currency) order.
    pub statements: Vec<StatementPlan>,
}

impl GenerationPlan {
    /// Returns true when the plan produces no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Total number of planned lines across all statements.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.statements.iter().map(|s| s.lines.len()).sum()
    }
}

/// Validates raw feed records into fee snapshots.
///
/// A single bad record aborts the whole run: generation is all-or-nothing,
/// and the error names the offending subscription. Absent amounts count as
/// zero (zero fees still appear on the statement); negative amounts are
/// rejected.
///
/// # Errors
///
/// Returns [`GenerationError`] naming the first offending subscription.
pub fn validate_fee_records(records: &[FeedRecord]) -> Result<Vec<FeeSnapshot>, GenerationError> {
    let mut snapshots = Vec::with_capacity(records.len());

    for record in records {
        let subscription_id = SubscriptionId::from_uuid(record.subscription_id);

        let Some(source) = record.source_group_id else {
            return Err(GenerationError::MissingSourceGroup(subscription_id));
        };

        let currency = record
            .currency
            .as_deref()
            .and_then(|raw| CurrencyCode::parse(raw).ok())
            .ok_or(GenerationError::MissingCurrency(subscription_id))?;

        let amount = record.entry_fees_amount.unwrap_or(Decimal::ZERO);
        if amount < Decimal::ZERO {
            return Err(GenerationError::NegativeAmount {
                subscription_id,
                amount,
            });
        }

        snapshots.push(FeeSnapshot {
            subscription_id,
            source_group_id: GroupId::from_uuid(source),
            currency,
            amount: round_amount(amount),
        });
    }

    Ok(snapshots)
}

/// Buckets fee snapshots into statements.
///
/// 1. Resolve each subscription's billing group.
/// 2. Bucket by (billing group, currency).
/// 3. Sort buckets ascending by (billing group, currency); this order is
///    the sole determinant of numbering.
/// 4. Number and total each bucket.
#[must_use]
pub fn plan_statements(
    payment_list_id: PaymentListId,
    snapshots: &[FeeSnapshot],
    resolver: &BillingResolver,
) -> GenerationPlan {
    let mut buckets: HashMap<(GroupId, CurrencyCode), Vec<LinePlan>> = HashMap::new();

    for snapshot in snapshots {
        let billing = resolver.resolve(snapshot.source_group_id);
        buckets
            .entry((billing, snapshot.currency.clone()))
            .or_default()
            .push(LinePlan {
                subscription_id: snapshot.subscription_id,
                source_group_id: snapshot.source_group_id,
                amount: snapshot.amount,
            });
    }

    let mut ordered: Vec<((GroupId, CurrencyCode), Vec<LinePlan>)> = buckets.into_iter().collect();
    ordered.sort_by(|(a, _), (b, _)| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let statements = ordered
        .into_iter()
        .enumerate()
        .map(|(index, ((group_key, currency), lines))| {
            let total: Decimal = lines.iter().map(|l| l.amount).sum();
            StatementPlan {
                statement_number: statement_number(payment_list_id, &currency, index),
                total_amount: round_amount(total),
                group_key,
                currency,
                lines,
            }
        })
        .collect();

    GenerationPlan {
        payment_list_id,
        statements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::str::FromStr;
    use uuid::Uuid;

    use bordereau_shared::types::GroupStructureId;

    use crate::billing::MappingEntry;

    const GROUP_A: &str = "00000000-0000-7000-8000-00000000000a";
    const GROUP_B: &str = "00000000-0000-7000-8000-00000000000b";
    const GROUP_C: &str = "00000000-0000-7000-8000-00000000000c";

    fn group(raw: &str) -> GroupId {
        GroupId::from_uuid(Uuid::from_str(raw).unwrap())
    }

    fn snapshot(source: GroupId, currency: &str, amount: Decimal) -> FeeSnapshot {
        FeeSnapshot {
            subscription_id: SubscriptionId::new(),
            source_group_id: source,
            currency: CurrencyCode::parse(currency).unwrap(),
            amount,
        }
    }

    fn identity_resolver() -> BillingResolver {
        BillingResolver::new(GroupStructureId::new(), Vec::new())
    }

    fn record(
        source: Option<&str>,
        currency: Option<&str>,
        amount: Option<Decimal>,
    ) -> FeedRecord {
        FeedRecord {
            subscription_id: Uuid::now_v7(),
            source_group_id: source.map(|s| Uuid::from_str(s).unwrap()),
            currency: currency.map(str::to_string),
            entry_fees_amount: amount,
        }
    }

    #[test]
    fn test_validate_accepts_zero_and_defaults_missing_amount() {
        let records = vec![
            record(Some(GROUP_A), Some("EUR"), Some(dec!(0))),
            record(Some(GROUP_A), Some("EUR"), None),
        ];

        let snapshots = validate_fee_records(&records).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].amount, Decimal::ZERO);
        assert_eq!(snapshots[1].amount, Decimal::ZERO);
    }

    #[test]
    fn test_validate_rejects_negative_naming_subscription() {
        let bad = record(Some(GROUP_A), Some("EUR"), Some(dec!(-5)));
        let bad_id = SubscriptionId::from_uuid(bad.subscription_id);
        let records = vec![record(Some(GROUP_A), Some("EUR"), Some(dec!(10))), bad];

        assert_eq!(
            validate_fee_records(&records),
            Err(GenerationError::NegativeAmount {
                subscription_id: bad_id,
                amount: dec!(-5),
            })
        );
    }

    #[test]
    fn test_validate_rejects_missing_source_group() {
        let bad = record(None, Some("EUR"), Some(dec!(10)));
        let bad_id = SubscriptionId::from_uuid(bad.subscription_id);

        assert_eq!(
            validate_fee_records(&[bad]),
            Err(GenerationError::MissingSourceGroup(bad_id))
        );
    }

    #[test]
    fn test_validate_rejects_blank_currency() {
        let bad = record(Some(GROUP_A), Some("   "), Some(dec!(10)));
        let bad_id = SubscriptionId::from_uuid(bad.subscription_id);

        assert_eq!(
            validate_fee_records(&[bad]),
            Err(GenerationError::MissingCurrency(bad_id))
        );

        let missing = record(Some(GROUP_A), None, Some(dec!(10)));
        let missing_id = SubscriptionId::from_uuid(missing.subscription_id);
        assert_eq!(
            validate_fee_records(&[missing]),
            Err(GenerationError::MissingCurrency(missing_id))
        );
    }

    #[test]
    fn test_validate_rounds_amounts_to_two_decimals() {
        let records = vec![record(Some(GROUP_A), Some("eur"), Some(dec!(10.005)))];
        let snapshots = validate_fee_records(&records).unwrap();

        assert_eq!(snapshots[0].amount, dec!(10.01));
        assert_eq!(snapshots[0].currency.as_str(), "EUR");
    }

    #[test]
    fn test_buckets_split_by_group_and_currency() {
        let plan = plan_statements(
            PaymentListId::new(),
            &[
                snapshot(group(GROUP_A), "EUR", dec!(100)),
                snapshot(group(GROUP_A), "USD", dec!(50)),
                snapshot(group(GROUP_B), "EUR", dec!(25)),
                snapshot(group(GROUP_A), "EUR", dec!(1.50)),
            ],
            &identity_resolver(),
        );

        assert_eq!(plan.statements.len(), 3);
        assert_eq!(plan.line_count(), 4);

        let a_eur = &plan.statements[0];
        assert_eq!(a_eur.group_key, group(GROUP_A));
        assert_eq!(a_eur.currency.as_str(), "EUR");
        assert_eq!(a_eur.total_amount, dec!(101.50));
        assert_eq!(a_eur.lines.len(), 2);
    }

    #[test]
    fn test_numbering_follows_sorted_bucket_order() {
        let id = PaymentListId::from_str("11111111-2222-7333-8444-555555555555").unwrap();
        let plan = plan_statements(
            id,
            &[
                snapshot(group(GROUP_B), "EUR", dec!(1)),
                snapshot(group(GROUP_A), "USD", dec!(2)),
                snapshot(group(GROUP_A), "EUR", dec!(3)),
            ],
            &identity_resolver(),
        );

        let numbers: Vec<&str> = plan
            .statements
            .iter()
            .map(|s| s.statement_number.as_str())
            .collect();
        // GROUP_A sorts before GROUP_B; EUR before USD within a group.
        assert_eq!(
            numbers,
            vec![
                "PL-11111111-EUR-1",
                "PL-11111111-USD-2",
                "PL-11111111-EUR-3",
            ]
        );
        assert_eq!(plan.statements[2].group_key, group(GROUP_B));
    }

    #[test]
    fn test_resolver_consolidates_sources_under_billing_parent() {
        let structure = GroupStructureId::new();
        let resolver = BillingResolver::new(
            structure,
            vec![
                MappingEntry {
                    source_group_id: group(GROUP_A),
                    billing_group_id: group(GROUP_C),
                },
                MappingEntry {
                    source_group_id: group(GROUP_B),
                    billing_group_id: group(GROUP_C),
                },
            ],
        );

        let plan = plan_statements(
            PaymentListId::new(),
            &[
                snapshot(group(GROUP_A), "EUR", dec!(10)),
                snapshot(group(GROUP_B), "EUR", dec!(20)),
            ],
            &resolver,
        );

        assert_eq!(plan.statements.len(), 1);
        let consolidated = &plan.statements[0];
        assert_eq!(consolidated.group_key, group(GROUP_C));
        assert_eq!(consolidated.total_amount, dec!(30));
        // Lines keep the originating team, not the billing parent.
        assert_eq!(consolidated.lines[0].source_group_id, group(GROUP_A));
        assert_eq!(consolidated.lines[1].source_group_id, group(GROUP_B));
    }

    #[test]
    fn test_empty_input_plans_nothing() {
        let plan = plan_statements(PaymentListId::new(), &[], &identity_resolver());
        assert!(plan.is_empty());
    }

    // ------------------------------------------------------------------
    // Properties: determinism under shuffle, conservation of amounts
    // ------------------------------------------------------------------

    fn arb_snapshot() -> impl Strategy<Value = FeeSnapshot> {
        (
            prop::sample::select(vec![GROUP_A, GROUP_B, GROUP_C]),
            prop::sample::select(vec!["EUR", "USD", "CHF"]),
            0i64..1_000_000,
        )
            .prop_map(|(g, cur, cents)| snapshot(group(g), cur, Decimal::new(cents, 2)))
    }

    fn arb_snapshots() -> impl Strategy<Value = Vec<FeeSnapshot>> {
        prop::collection::vec(arb_snapshot(), 1..24)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Shuffling the input never changes statement numbers or totals.
        #[test]
        fn prop_numbering_invariant_under_shuffle(
            snapshots in arb_snapshots().prop_flat_map(|s| {
                let original = s.clone();
                Just(s).prop_shuffle().prop_map(move |shuffled| (original.clone(), shuffled))
            })
        ) {
            let (original, shuffled) = snapshots;
            let id = PaymentListId::new();
            let resolver = identity_resolver();

            let plan_a = plan_statements(id, &original, &resolver);
            let plan_b = plan_statements(id, &shuffled, &resolver);

            let key = |p: &GenerationPlan| -> Vec<(String, Decimal)> {
                p.statements
                    .iter()
                    .map(|s| (s.statement_number.clone(), s.total_amount))
                    .collect()
            };
            prop_assert_eq!(key(&plan_a), key(&plan_b));
        }

        /// Every statement total is exactly the sum of its lines.
        #[test]
        fn prop_statement_total_equals_line_sum(snapshots in arb_snapshots()) {
            let plan = plan_statements(PaymentListId::new(), &snapshots, &identity_resolver());

            for statement in &plan.statements {
                let line_sum: Decimal = statement.lines.iter().map(|l| l.amount).sum();
                prop_assert_eq!(statement.total_amount, line_sum);
            }
        }

        /// Per currency, statement totals conserve the input fee amounts.
        #[test]
        fn prop_per_currency_conservation(snapshots in arb_snapshots()) {
            let plan = plan_statements(PaymentListId::new(), &snapshots, &identity_resolver());

            let mut input: BTreeMap<String, Decimal> = BTreeMap::new();
            for s in &snapshots {
                *input.entry(s.currency.as_str().to_string()).or_default() += s.amount;
            }

            let mut output: BTreeMap<String, Decimal> = BTreeMap::new();
            for s in &plan.statements {
                *output.entry(s.currency.as_str().to_string()).or_default() += s.total_amount;
            }

            prop_assert_eq!(input, output);
        }

        /// Every input subscription appears on exactly one line.
        #[test]
        fn prop_lines_partition_subscriptions(snapshots in arb_snapshots()) {
            let plan = plan_statements(PaymentListId::new(), &snapshots, &identity_resolver());
            prop_assert_eq!(plan.line_count(), snapshots.len());
        }
    }
}
