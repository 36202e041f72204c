//! Repository error type.

use reimburse_core::approval::ApprovalError;
use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Requested record does not exist in the caller's company.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Domain rule rejected the operation.
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// Stored row could not be mapped back into a domain value.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Approval(e) => e.status_code(),
            Self::InvalidData(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Approval(e) => e.error_code(),
            Self::InvalidData(_) => "INTERNAL_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the message safe to show to API clients.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "An error occurred".to_string()
        } else {
            self.to_string()
        }
    }

    /// Returns true for failures on the server side.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::InvalidData(_) | Self::Database(_) | Self::Approval(ApprovalError::Database(_))
        )
    }
}
