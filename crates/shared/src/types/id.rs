//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `StatementId` where a
//! `PaymentListId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(
    GroupStructureId,
    "Unique identifier for a group structure version."
);
typed_id!(
    GroupId,
    "Unique identifier for a team/group (source or billing side of a mapping)."
);
typed_id!(PeriodId, "Unique identifier for an entry-fee period.");
typed_id!(PaymentListId, "Unique identifier for a payment list.");
typed_id!(
    SubscriptionId,
    "Unique identifier for an upstream fund subscription."
);
typed_id!(StatementId, "Unique identifier for a statement.");
typed_id!(
    StatementLineId,
    "Unique identifier for a statement line (subscription snapshot)."
);
typed_id!(EventId, "Unique identifier for a payment-list ledger event.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ids_are_distinct_types() {
        let a = PaymentListId::new();
        let b = PaymentListId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_ids_are_uuid_v7() {
        let id = StatementId::new();
        assert_eq!(id.into_inner().get_version_num(), 7);
    }

    #[test]
    fn test_round_trip_display_parse() {
        let id = SubscriptionId::new();
        let parsed = SubscriptionId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_from_uuid_preserves_value() {
        let raw = Uuid::now_v7();
        let id = GroupId::from_uuid(raw);
        assert_eq!(id.into_inner(), raw);
    }
}
