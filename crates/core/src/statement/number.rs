//! Deterministic statement numbering.

use bordereau_shared::types::{CurrencyCode, PaymentListId};

/// Derives the statement number for one bucket of a generation plan.
///
/// Format: `PL-{payment list id, first 8 chars}-{currency}-{n}` where `n`
/// is the bucket's 1-based position in the plan sorted ascending by
/// (billing group, currency). The sort order is the sole determinant of
/// numbering, so regenerating from the same inputs reproduces the numbers.
#[must_use]
pub fn statement_number(
    payment_list_id: PaymentListId,
    currency: &CurrencyCode,
    index: usize,
) -> String {
    let id = payment_list_id.to_string();
    let short = &id[..8];
    format!("PL-{short}-{currency}-{}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_number_format() {
        let id = PaymentListId::from_str("018f4f2e-aaaa-7bbb-8ccc-000000000001").unwrap();
        let eur = CurrencyCode::parse("EUR").unwrap();

        assert_eq!(statement_number(id, &eur, 0), "PL-018f4f2e-EUR-1");
        assert_eq!(statement_number(id, &eur, 11), "PL-018f4f2e-EUR-12");
    }

    #[test]
    fn test_number_carries_currency() {
        let id = PaymentListId::new();
        let usd = CurrencyCode::parse("usd").unwrap();

        let number = statement_number(id, &usd, 2);
        assert!(number.ends_with("-USD-3"));
        assert!(number.starts_with("PL-"));
    }
}
