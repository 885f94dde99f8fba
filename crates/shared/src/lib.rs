//! Shared types, errors, and configuration for Bordereau.
//!
//! This crate provides common types used across all other crates:
//! - Currency codes and money rounding with decimal precision
//! - Typed IDs for type-safe entity references
//! - Statement status vocabulary (issue and payment axes)
//! - Cursor pagination types for list endpoints
//! - Application-wide error types and result codes
//! - Configuration management
//! - Clients for the subscription feed and teams directory

pub mod config;
pub mod error;
pub mod feed;
pub mod teams;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use feed::SubscriptionFeedClient;
pub use teams::TeamsClient;
