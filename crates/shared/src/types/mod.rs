//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;
pub mod status;

pub use id::*;
pub use money::CurrencyCode;
pub use pagination::{CursorPage, CursorResponse};
pub use status::{IssueStatus, PaymentStatus};
