//! Domain error types for ledger operations.
//!
//! Every variant maps to one of the canonical error codes and, where the
//! failure carries structured context (overlapping periods, duplicate
//! numbers, totals), exposes it through `details()` so the surface can
//! return `{code, message, details}` without string parsing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;

use verity_shared::error::{ErrorCode, ErrorResponse};
use verity_shared::types::{
    AmountError, Currency, JournalId, Money, MoneyError, PeriodId,
};

use crate::journal::types::JournalStatus;
use crate::period::types::PeriodStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Static validation ==========
    /// Description must not be empty.
    #[error("Description must not be empty")]
    EmptyDescription,

    /// A journal needs at least two lines to balance.
    #[error("Journal must have at least two lines")]
    InsufficientLines,

    /// Line numbers must form the contiguous sequence 1..N.
    #[error("Line numbers must form the sequence 1..{expected}, got {found:?}")]
    NonContiguousLineNumbers {
        /// Number of lines in the journal.
        expected: u32,
        /// The line numbers actually present, sorted.
        found: Vec<u32>,
    },

    /// A line must carry exactly one of debit and credit.
    #[error("Line {line_number} must have exactly one of debit and credit set")]
    InvalidLineSides {
        /// The offending line.
        line_number: u32,
    },

    /// Line amounts must not be negative.
    #[error("Line {line_number} carries a negative amount")]
    NegativeLineAmount {
        /// The offending line.
        line_number: u32,
    },

    /// Every line must be booked in the journal currency.
    #[error("Line {line_number} is in {line_currency}, journal is in {journal_currency}")]
    LineCurrencyMismatch {
        /// The offending line.
        line_number: u32,
        /// The line's booking currency.
        line_currency: Currency,
        /// The journal's currency.
        journal_currency: Currency,
    },

    /// `original_amount * exchange_rate` deviates from the booked amount by
    /// more than the tolerance of 0.0001.
    #[error(
        "Line {line_number}: original amount times rate ({computed}) deviates from booked {booked}"
    )]
    ExchangeRateToleranceExceeded {
        /// The offending line.
        line_number: u32,
        /// The raw product in booking currency.
        computed: Decimal,
        /// The booked amount.
        booked: Money,
    },

    /// Tax rate must lie in `[0, 1]`.
    #[error("Line {line_number}: tax rate {rate} outside [0, 1]")]
    InvalidTaxRate {
        /// The offending line.
        line_number: u32,
        /// The rejected rate.
        rate: Decimal,
    },

    /// Period name must not be empty.
    #[error("Period name must not be empty")]
    EmptyPeriodName,

    /// Period start must be strictly before its end.
    #[error("Period start {start} must be before end {end}")]
    InvalidPeriodDates {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// Periods are capped at two years.
    #[error("Period from {start} to {end} exceeds the two-year maximum")]
    PeriodTooLong {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// The posting date must fall inside the journal's period.
    #[error("Posting date {posting_date} outside period [{period_start}, {period_end}]")]
    PostingDateOutsidePeriod {
        /// The journal's posting date.
        posting_date: NaiveDate,
        /// Period start.
        period_start: NaiveDate,
        /// Period end.
        period_end: NaiveDate,
    },

    // ========== Business rules ==========
    /// The candidate interval intersects existing periods.
    #[error("Period overlaps {} existing period(s)", .overlapping.len())]
    PeriodOverlap {
        /// Identifiers of the conflicting periods.
        overlapping: Vec<PeriodId>,
    },

    /// The requested period transition is not in the state machine.
    #[error("Cannot transition period from {from:?} to {to:?}")]
    InvalidPeriodTransition {
        /// Current status.
        from: PeriodStatus,
        /// Target status.
        to: PeriodStatus,
    },

    /// Only open periods may be edited.
    #[error("Period is {status:?}; only open periods may be edited")]
    PeriodNotEditable {
        /// The period's current status.
        status: PeriodStatus,
    },

    /// A period that journals reference cannot be deleted.
    #[error("Period {period_id} still has {journal_count} journal(s)")]
    PeriodHasJournals {
        /// The period in question.
        period_id: PeriodId,
        /// How many journals reference it.
        journal_count: u64,
    },

    /// Journal number already used within the organization.
    #[error("Journal number {journal_number} already in use")]
    DuplicateJournalNumber {
        /// The colliding number.
        journal_number: String,
    },

    /// External UID already used within the organization.
    #[error("External UID {ext_uid} already in use")]
    DuplicateExtUid {
        /// The colliding UID.
        ext_uid: String,
    },

    /// Drafts are the only mutable journals.
    #[error("Journal is {status:?}; only drafts may be modified")]
    JournalNotEditable {
        /// The journal's current status.
        status: JournalStatus,
    },

    /// Drafts are the only deletable journals.
    #[error("Journal is {status:?}; only drafts may be deleted")]
    OnlyDraftDeletable {
        /// The journal's current status.
        status: JournalStatus,
    },

    /// Only posted journals can be reversed.
    #[error("Journal is {status:?}; only posted journals may be reversed")]
    NotReversible {
        /// The journal's current status.
        status: JournalStatus,
    },

    /// The journal already has a reversal.
    #[error("Journal already reversed by {reversal_journal_id}")]
    AlreadyReversed {
        /// The existing mirror journal.
        reversal_journal_id: JournalId,
    },

    /// Reversals may not predate the original posting.
    #[error("Reversal date {reversal_date} is before original posting date {posting_date}")]
    ReversalBeforeOriginal {
        /// Original posting date.
        posting_date: NaiveDate,
        /// Requested reversal date.
        reversal_date: NaiveDate,
    },

    /// Reversals are limited to one year after the original posting.
    #[error("Reversal date {reversal_date} is more than 365 days after {posting_date}")]
    ReversalWindowExceeded {
        /// Original posting date.
        posting_date: NaiveDate,
        /// Requested reversal date.
        reversal_date: NaiveDate,
    },

    // ========== Period / journal state ==========
    /// Posting attempted against a non-open period.
    #[error("Period {period_id} is {status:?}; posting requires an open period")]
    PeriodClosed {
        /// The period in question.
        period_id: PeriodId,
        /// Its current status.
        status: PeriodStatus,
    },

    /// Posting transition attempted on a non-draft journal.
    #[error("Journal {journal_id} is {status:?}; only drafts can be posted")]
    JournalAlreadyPosted {
        /// The journal in question.
        journal_id: JournalId,
        /// Its current status.
        status: JournalStatus,
    },

    // ========== Not found ==========
    /// Period does not exist in the tenant.
    #[error("Period not found: {period_id}")]
    PeriodNotFound {
        /// The missing period.
        period_id: PeriodId,
    },

    /// Journal does not exist in the tenant.
    #[error("Journal not found: {journal_id}")]
    JournalNotFound {
        /// The missing journal.
        journal_id: JournalId,
    },

    /// No period covers the given date.
    #[error("No period found for date {date}")]
    NoPeriodForDate {
        /// The uncovered date.
        date: NaiveDate,
    },

    // ========== Balance ==========
    /// Total debits differ from total credits.
    #[error("Journal is unbalanced: debits {total_debit}, credits {total_credit}")]
    Unbalanced {
        /// Sum of debit lines.
        total_debit: Money,
        /// Sum of credit lines.
        total_credit: Money,
    },

    // ========== Hash chain ==========
    /// A sealed journal's recomputed digest differs from the stored one.
    #[error("Hash verification failed for journal {journal_id}")]
    HashMismatch {
        /// The tampered or corrupted journal.
        journal_id: JournalId,
    },

    /// A posted journal is missing its sealed hash.
    #[error("Journal {journal_id} is sealed but carries no hash")]
    MissingHash {
        /// The journal in question.
        journal_id: JournalId,
    },

    // ========== Plumbing ==========
    /// Money arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Amount construction failed.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Storage corruption or other non-domain failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the canonical code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyDescription
            | Self::InsufficientLines
            | Self::NonContiguousLineNumbers { .. }
            | Self::InvalidLineSides { .. }
            | Self::NegativeLineAmount { .. }
            | Self::LineCurrencyMismatch { .. }
            | Self::ExchangeRateToleranceExceeded { .. }
            | Self::InvalidTaxRate { .. }
            | Self::EmptyPeriodName
            | Self::InvalidPeriodDates { .. }
            | Self::PeriodTooLong { .. }
            | Self::PostingDateOutsidePeriod { .. }
            | Self::Money(_)
            | Self::Amount(_) => ErrorCode::ValidationFailed,

            Self::PeriodOverlap { .. }
            | Self::InvalidPeriodTransition { .. }
            | Self::PeriodNotEditable { .. }
            | Self::PeriodHasJournals { .. }
            | Self::DuplicateJournalNumber { .. }
            | Self::DuplicateExtUid { .. }
            | Self::JournalNotEditable { .. }
            | Self::OnlyDraftDeletable { .. }
            | Self::NotReversible { .. }
            | Self::AlreadyReversed { .. }
            | Self::ReversalBeforeOriginal { .. }
            | Self::ReversalWindowExceeded { .. } => ErrorCode::BusinessRuleViolation,

            Self::PeriodClosed { .. } => ErrorCode::PeriodClosed,
            Self::JournalAlreadyPosted { .. } => ErrorCode::JournalAlreadyPosted,

            Self::PeriodNotFound { .. }
            | Self::JournalNotFound { .. }
            | Self::NoPeriodForDate { .. } => ErrorCode::EntityNotFound,

            Self::Unbalanced { .. } => ErrorCode::UnbalancedJournal,

            Self::HashMismatch { .. } | Self::MissingHash { .. } => ErrorCode::InvalidHashChain,

            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Returns structured context for this error, if any.
    #[must_use]
    pub fn details(&self) -> Option<Map<String, Value>> {
        let mut map = Map::new();
        match self {
            Self::Unbalanced {
                total_debit,
                total_credit,
            } => {
                map.insert("totalDebit".into(), Value::String(total_debit.to_string()));
                map.insert(
                    "totalCredit".into(),
                    Value::String(total_credit.to_string()),
                );
            }
            Self::PeriodOverlap { overlapping } => {
                map.insert(
                    "overlappingPeriods".into(),
                    Value::Array(
                        overlapping
                            .iter()
                            .map(|id| Value::String(id.to_string()))
                            .collect(),
                    ),
                );
            }
            Self::DuplicateJournalNumber { journal_number } => {
                map.insert(
                    "journalNumber".into(),
                    Value::String(journal_number.clone()),
                );
            }
            Self::DuplicateExtUid { ext_uid } => {
                map.insert("extUid".into(), Value::String(ext_uid.clone()));
            }
            Self::PostingDateOutsidePeriod {
                posting_date,
                period_start,
                period_end,
            } => {
                map.insert("postingDate".into(), Value::String(posting_date.to_string()));
                map.insert("periodStart".into(), Value::String(period_start.to_string()));
                map.insert("periodEnd".into(), Value::String(period_end.to_string()));
            }
            Self::ReversalBeforeOriginal {
                posting_date,
                reversal_date,
            }
            | Self::ReversalWindowExceeded {
                posting_date,
                reversal_date,
            } => {
                map.insert("postingDate".into(), Value::String(posting_date.to_string()));
                map.insert(
                    "reversalDate".into(),
                    Value::String(reversal_date.to_string()),
                );
            }
            Self::PeriodHasJournals {
                period_id,
                journal_count,
            } => {
                map.insert("periodId".into(), Value::String(period_id.to_string()));
                map.insert("journalCount".into(), Value::from(*journal_count));
            }
            Self::HashMismatch { journal_id } | Self::MissingHash { journal_id } => {
                map.insert("journalId".into(), Value::String(journal_id.to_string()));
            }
            _ => return None,
        }
        Some(map)
    }

    /// Renders the `{code, message, details?}` propagation shape.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        match self.details() {
            Some(details) => {
                ErrorResponse::with_details(self.error_code(), self.to_string(), details)
            }
            None => ErrorResponse::new(self.error_code(), self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use verity_shared::types::Amount;

    fn money(value: Decimal, currency: Currency) -> Money {
        Money::new(Amount::new(value).unwrap(), currency)
    }

    #[test]
    fn test_unbalanced_details_render_money_strings() {
        let err = LedgerError::Unbalanced {
            total_debit: money(dec!(100), Currency::Eur),
            total_credit: money(dec!(99.99), Currency::Eur),
        };
        assert_eq!(err.error_code(), ErrorCode::UnbalancedJournal);

        let details = err.details().unwrap();
        assert_eq!(details["totalDebit"], "100.0000 EUR");
        assert_eq!(details["totalCredit"], "99.9900 EUR");
    }

    #[test]
    fn test_overlap_details_list_period_ids() {
        let conflicting = PeriodId::new();
        let err = LedgerError::PeriodOverlap {
            overlapping: vec![conflicting],
        };
        assert_eq!(err.error_code(), ErrorCode::BusinessRuleViolation);

        let details = err.details().unwrap();
        assert_eq!(
            details["overlappingPeriods"],
            serde_json::json!([conflicting.to_string()])
        );
    }

    #[test]
    fn test_code_mapping() {
        let period_id = PeriodId::new();
        let journal_id = JournalId::new();

        assert_eq!(
            LedgerError::PeriodClosed {
                period_id,
                status: PeriodStatus::Closed,
            }
            .error_code(),
            ErrorCode::PeriodClosed
        );
        assert_eq!(
            LedgerError::JournalAlreadyPosted {
                journal_id,
                status: JournalStatus::Posted,
            }
            .error_code(),
            ErrorCode::JournalAlreadyPosted
        );
        assert_eq!(
            LedgerError::JournalNotFound { journal_id }.error_code(),
            ErrorCode::EntityNotFound
        );
        assert_eq!(
            LedgerError::HashMismatch { journal_id }.error_code(),
            ErrorCode::InvalidHashChain
        );
        assert_eq!(
            LedgerError::EmptyDescription.error_code(),
            ErrorCode::ValidationFailed
        );
    }

    #[test]
    fn test_to_response_carries_details() {
        let err = LedgerError::DuplicateJournalNumber {
            journal_number: "JRN-2024-001".into(),
        };
        let response = err.to_response();
        assert_eq!(response.code, ErrorCode::BusinessRuleViolation);
        assert_eq!(
            response.details.unwrap()["journalNumber"],
            "JRN-2024-001"
        );
    }
}
