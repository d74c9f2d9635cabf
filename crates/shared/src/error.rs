//! Canonical error codes and the error response shape.
//!
//! Every error surfaced by the core carries one of these stable codes; the
//! request surface maps them onto transport status codes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// An input field violates a static invariant.
    ValidationFailed,
    /// A rule spanning multiple fields or entities is violated.
    BusinessRuleViolation,
    /// Referenced identity does not exist in the tenant.
    EntityNotFound,
    /// Posting attempted against a non-open period.
    PeriodClosed,
    /// Posting transition attempted on a non-draft journal.
    JournalAlreadyPosted,
    /// Total debits differ from total credits.
    UnbalancedJournal,
    /// A hash verification failed.
    InvalidHashChain,
    /// Reserved key reused with a different payload (surfaced by the
    /// idempotency store in front of the core, never by the core itself).
    IdempotencyConflict,
    /// Storage corruption or other non-domain failure.
    InternalError,
}

impl ErrorCode {
    /// Returns the stable string form used in responses and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::BusinessRuleViolation => "BUSINESS_RULE_VIOLATION",
            Self::EntityNotFound => "ENTITY_NOT_FOUND",
            Self::PeriodClosed => "PERIOD_CLOSED",
            Self::JournalAlreadyPosted => "JOURNAL_ALREADY_POSTED",
            Self::UnbalancedJournal => "UNBALANCED_JOURNAL",
            Self::InvalidHashChain => "INVALID_HASH_CHAIN",
            Self::IdempotencyConflict => "IDEMPOTENCY_CONFLICT",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code the surface should use for this code.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ValidationFailed | Self::UnbalancedJournal => 400,
            Self::EntityNotFound => 404,
            Self::PeriodClosed | Self::BusinessRuleViolation => 422,
            Self::JournalAlreadyPosted | Self::IdempotencyConflict => 409,
            Self::InvalidHashChain | Self::InternalError => 500,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The `{code, message, details?}` shape every error propagates as.
///
/// `details` is a map of structured context (overlapping period ids,
/// duplicate numbers, posting bounds). Stack traces are never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Structured context for the failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl ErrorResponse {
    /// Creates a response without details.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Creates a response with structured details.
    #[must_use]
    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: Map<String, Value>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details),
        }
    }
}
