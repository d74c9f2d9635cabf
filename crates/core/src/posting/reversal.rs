//! Reversal of posted journals.
//!
//! A reversal never edits the original: it posts a mirror journal whose
//! lines swap debit and credit, then marks the original `reversed` and
//! links the two by id. The original's sealed hash is left exactly as it
//! was at posting time; the `reversed` marker and the linkage live outside
//! the hashed field set.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use verity_shared::types::{JournalId, JournalLineId, PeriodId, UserId};

use crate::error::LedgerError;
use crate::journal::types::{Journal, JournalLine, JournalStatus};

/// Maximum age of the original posting at reversal time.
pub const REVERSAL_WINDOW_DAYS: i64 = 365;

/// Input for building a mirror journal.
#[derive(Debug, Clone)]
pub struct ReversalInput {
    /// Description of the mirror journal (e.g., "Error correction").
    pub description: String,
    /// Accounting date of the mirror; resolves its period.
    pub reversal_date: NaiveDate,
    /// The open period containing `reversal_date`.
    pub reversal_period_id: PeriodId,
    /// User performing the reversal.
    pub reversed_by: UserId,
}

/// Stateless service building and linking reversal journals.
pub struct ReversalService;

impl ReversalService {
    /// Requires the original to be posted and not yet reversed.
    ///
    /// # Errors
    ///
    /// Returns `NotReversible` or `AlreadyReversed`.
    pub fn validate_reversible(original: &Journal) -> Result<(), LedgerError> {
        if original.status != JournalStatus::Posted {
            return Err(LedgerError::NotReversible {
                status: original.status,
            });
        }
        if let Some(reversal_journal_id) = original.reversal_journal_id {
            return Err(LedgerError::AlreadyReversed {
                reversal_journal_id,
            });
        }
        Ok(())
    }

    /// Requires the reversal date to lie within the allowed window:
    /// on or after the original posting date, at most 365 days later.
    ///
    /// # Errors
    ///
    /// Returns `ReversalBeforeOriginal` or `ReversalWindowExceeded`.
    pub fn validate_reversal_date(
        original: &Journal,
        reversal_date: NaiveDate,
    ) -> Result<(), LedgerError> {
        if reversal_date < original.posting_date {
            return Err(LedgerError::ReversalBeforeOriginal {
                posting_date: original.posting_date,
                reversal_date,
            });
        }
        if reversal_date - original.posting_date > Duration::days(REVERSAL_WINDOW_DAYS) {
            return Err(LedgerError::ReversalWindowExceeded {
                posting_date: original.posting_date,
                reversal_date,
            });
        }
        Ok(())
    }

    /// Builds the mirror draft for `original`.
    ///
    /// The mirror gets journal number `"{original}-REV"`, reference
    /// `"REV-{original.reference or original.journal_number}"`, and lines
    /// with debit and credit swapped, descriptions prefixed `"REVERSAL: "`,
    /// everything else (line numbers, original amounts, rates, tax fields)
    /// preserved.
    ///
    /// # Errors
    ///
    /// Returns the reversibility or date-window violation, if any.
    pub fn build_mirror(
        original: &Journal,
        mirror_id: JournalId,
        input: &ReversalInput,
        now: DateTime<Utc>,
    ) -> Result<Journal, LedgerError> {
        Self::validate_reversible(original)?;
        Self::validate_reversal_date(original, input.reversal_date)?;

        let lines = original
            .lines
            .iter()
            .map(|line| JournalLine {
                id: JournalLineId::new(),
                journal_id: mirror_id,
                account_id: line.account_id,
                line_number: line.line_number,
                description: format!("REVERSAL: {}", line.description),
                debit_amount: line.credit_amount,
                credit_amount: line.debit_amount,
                original_amount: line.original_amount,
                exchange_rate: line.exchange_rate,
                tax_code: line.tax_code.clone(),
                tax_amount: line.tax_amount,
                tax_rate: line.tax_rate,
            })
            .collect();

        let reference_base = original
            .reference
            .clone()
            .unwrap_or_else(|| original.journal_number.clone());

        Ok(Journal {
            id: mirror_id,
            organization_id: original.organization_id,
            period_id: input.reversal_period_id,
            journal_number: format!("{}-REV", original.journal_number),
            description: input.description.clone(),
            reference: Some(format!("REV-{reference_base}")),
            posting_date: input.reversal_date,
            status: JournalStatus::Draft,
            currency: original.currency,
            lines,
            hash_prev: None,
            hash_self: None,
            reversal_journal_id: None,
            original_journal_id: Some(original.id),
            ext_uid: None,
            created_by: input.reversed_by,
            posted_by: None,
            posted_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Marks the original as reversed and links the mirror.
    ///
    /// The sealed hash is deliberately not recomputed: the `reversed`
    /// marker and linkage are metadata outside the hashed payload.
    ///
    /// # Errors
    ///
    /// Returns the reversibility violation, if any.
    pub fn mark_reversed(
        original: &mut Journal,
        reversal_journal_id: JournalId,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        Self::validate_reversible(original)?;
        original.status = JournalStatus::Reversed;
        original.reversal_journal_id = Some(reversal_journal_id);
        original.updated_at = now;
        Ok(())
    }
}
