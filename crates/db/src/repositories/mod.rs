//! Tenant-scoped repository implementations of the storage contract.
//!
//! Repositories provide the persistence interface the domain depends on,
//! hiding the `SeaORM` plumbing. Every method binds a tenant session first;
//! row-level security makes cross-tenant reads return empty sets even if a
//! filter is forgotten.

pub mod journal;
pub mod period;
pub mod posting;

pub(crate) mod convert;

pub use journal::{ChainCursor, ImportIssue, JournalRepository};
pub use period::PeriodRepository;
pub use posting::{PostingRepository, ReversalOutcome};

use sea_orm::DbErr;
use thiserror::Error;

use verity_core::LedgerError;
use verity_shared::error::{ErrorCode, ErrorResponse};

/// Errors surfaced by the repositories.
///
/// Domain failures pass through with their kind preserved; database
/// failures are wrapped, never swallowed.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A domain invariant or business rule was violated.
    #[error(transparent)]
    Domain(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// Returns the canonical code for this error.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Domain(inner) => inner.error_code(),
            Self::Database(_) => ErrorCode::InternalError,
        }
    }

    /// Renders the `{code, message, details?}` propagation shape.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            Self::Domain(inner) => inner.to_response(),
            Self::Database(_) => {
                ErrorResponse::new(ErrorCode::InternalError, "Storage operation failed")
            }
        }
    }
}
