//! Core business logic for Bordereau.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `billing` - Billing-group resolution against a structure version
//! - `period` - Half-open billing windows, overlap rules, batch pre-validation
//! - `statement` - Deterministic statement planning, numbering, lifecycle rules, stats
//! - `totals` - Announced totals and the net-total ledger projection

pub mod billing;
pub mod period;
pub mod statement;
pub mod totals;
