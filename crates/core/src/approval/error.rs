//! Approval error types.
//!
//! Every failure the routing engine can report to a caller, with the HTTP
//! status and machine-readable code the API surfaces.

use reimburse_shared::types::CurrencyCode;
use thiserror::Error;

use crate::currency::ConversionError;

/// Message shown for every `InvalidApprovalTarget`, whatever the real cause.
pub const INVALID_TARGET_MESSAGE: &str = "Expense not found or not awaiting your approval";

/// Errors that can occur during approval operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    /// Bad input; nothing was changed.
    #[error("{0}")]
    Validation(String),

    /// No rate exists for the currency pair; the expense was not created.
    #[error("Currency conversion from {from} to {to} is not supported")]
    ConversionUnavailable {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
    },

    /// Expense is missing, not pending, or not assigned to the actor.
    #[error("Expense not found or not awaiting your approval")]
    InvalidApprovalTarget,

    /// The acting user's role does not allow the operation.
    #[error("{0}")]
    Forbidden(String),

    /// A user or company referenced by the request does not exist.
    #[error("{0}")]
    ReferenceIntegrity(String),

    /// Concurrent modification detected.
    #[error("{0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ApprovalError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::ConversionUnavailable { .. } => 400,
            Self::Forbidden(_) => 403,
            Self::InvalidApprovalTarget => 404,
            Self::Conflict(_) => 409,
            Self::ReferenceIntegrity(_) => 422,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ConversionUnavailable { .. } => "CONVERSION_UNAVAILABLE",
            Self::InvalidApprovalTarget => "INVALID_APPROVAL_TARGET",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::ReferenceIntegrity(_) => "REFERENCE_INTEGRITY_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<ConversionError> for ApprovalError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::ConversionUnavailable { from, to } => {
                Self::ConversionUnavailable { from, to }
            }
            ConversionError::InvalidAmount(_) | ConversionError::OutOfRange(_) => {
                Self::Validation(err.to_string())
            }
        }
    }
}
