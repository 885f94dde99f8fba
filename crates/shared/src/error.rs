//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Each variant carries a human-readable message; the machine-readable
/// result code is stable and returned by [`AppError::error_code`].
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input, rejected before storage access.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No billing period contains the requested date.
    #[error("Period not found: {0}")]
    PeriodNotFound(String),

    /// Statement not found.
    #[error("Statement not found: {0}")]
    StatementNotFound(String),

    /// Business-rule conflict (e.g. double subscription assignment).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Billing periods' half-open date ranges overlap.
    #[error("Period overlap: {0}")]
    PeriodOverlap(String),

    /// Statement is already cancelled.
    #[error("Already cancelled: {0}")]
    AlreadyCancelled(String),

    /// Illegal status transition.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Upstream collaborator failure (subscription feed, teams directory).
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) | Self::PeriodNotFound(_) | Self::StatementNotFound(_) => 404,
            Self::Conflict(_) | Self::PeriodOverlap(_) | Self::AlreadyCancelled(_) => 409,
            Self::InvalidTransition(_) => 422,
            Self::ExternalService(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the stable result code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::StatementNotFound(_) => "STATEMENT_NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::PeriodOverlap(_) => "PERIOD_OVERLAP",
            Self::AlreadyCancelled(_) => "ALREADY_CANCELLED",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Validation(String::new()).status_code(), 400);
        assert_eq!(AppError::NotFound(String::new()).status_code(), 404);
        assert_eq!(AppError::PeriodNotFound(String::new()).status_code(), 404);
        assert_eq!(
            AppError::StatementNotFound(String::new()).status_code(),
            404
        );
        assert_eq!(AppError::Conflict(String::new()).status_code(), 409);
        assert_eq!(AppError::PeriodOverlap(String::new()).status_code(), 409);
        assert_eq!(AppError::AlreadyCancelled(String::new()).status_code(), 409);
        assert_eq!(
            AppError::InvalidTransition(String::new()).status_code(),
            422
        );
        assert_eq!(AppError::ExternalService(String::new()).status_code(), 500);
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Validation(String::new()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(AppError::NotFound(String::new()).error_code(), "NOT_FOUND");
        assert_eq!(
            AppError::PeriodNotFound(String::new()).error_code(),
            "PERIOD_NOT_FOUND"
        );
        assert_eq!(
            AppError::StatementNotFound(String::new()).error_code(),
            "STATEMENT_NOT_FOUND"
        );
        assert_eq!(AppError::Conflict(String::new()).error_code(), "CONFLICT");
        assert_eq!(
            AppError::PeriodOverlap(String::new()).error_code(),
            "PERIOD_OVERLAP"
        );
        assert_eq!(
            AppError::AlreadyCancelled(String::new()).error_code(),
            "ALREADY_CANCELLED"
        );
        assert_eq!(
            AppError::InvalidTransition(String::new()).error_code(),
            "INVALID_TRANSITION"
        );
        assert_eq!(
            AppError::ExternalService(String::new()).error_code(),
            "EXTERNAL_SERVICE_ERROR"
        );
        assert_eq!(
            AppError::Database(String::new()).error_code(),
            "DATABASE_ERROR"
        );
        assert_eq!(
            AppError::Internal(String::new()).error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Validation("msg".into()).to_string(),
            "Validation error: msg"
        );
        assert_eq!(
            AppError::Conflict("msg".into()).to_string(),
            "Conflict: msg"
        );
        assert_eq!(
            AppError::PeriodOverlap("msg".into()).to_string(),
            "Period overlap: msg"
        );
        assert_eq!(
            AppError::InvalidTransition("msg".into()).to_string(),
            "Invalid transition: msg"
        );
        assert_eq!(
            AppError::AlreadyCancelled("msg".into()).to_string(),
            "Already cancelled: msg"
        );
    }
}
