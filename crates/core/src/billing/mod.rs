//! Billing-group resolution.
//!
//! A group structure version maps source teams to the billing parents that
//! receive their consolidated statements. Resolution is a pure lookup with a
//! permissive fallback: unmapped teams bill themselves.

mod resolver;

pub use resolver::{BillingResolver, MappingEntry};
