//! Aggregate validation for journals.
//!
//! Everything here is pure: the repository layer loads the aggregate and the
//! period, these functions decide.

use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::period::types::Period;

use super::types::{Journal, JournalLine};

/// Maximum deviation, in the booking currency, between
/// `original_amount * exchange_rate` and the booked amount.
#[must_use]
pub fn exchange_tolerance() -> Decimal {
    Decimal::new(1, 4) // 0.0001
}

/// Validates every aggregate invariant that does not need the period:
/// description, line count, contiguous line numbers, per-line shape, and
/// balance at scale 4.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn validate_journal(journal: &Journal) -> Result<(), LedgerError> {
    if journal.description.trim().is_empty() {
        return Err(LedgerError::EmptyDescription);
    }
    if journal.lines.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }

    validate_line_numbers(&journal.lines)?;

    for line in &journal.lines {
        validate_line(line, journal)?;
    }

    let total_debit = journal.total_debit()?;
    let total_credit = journal.total_credit()?;
    if total_debit != total_credit {
        return Err(LedgerError::Unbalanced {
            total_debit,
            total_credit,
        });
    }

    Ok(())
}

/// Requires the journal's posting date to fall inside its period.
///
/// # Errors
///
/// Returns `PostingDateOutsidePeriod`.
pub fn validate_posting_date(journal: &Journal, period: &Period) -> Result<(), LedgerError> {
    if period.contains_date(journal.posting_date) {
        Ok(())
    } else {
        Err(LedgerError::PostingDateOutsidePeriod {
            posting_date: journal.posting_date,
            period_start: period.start_date,
            period_end: period.end_date,
        })
    }
}

/// Line numbers must be exactly the sequence 1..N.
fn validate_line_numbers(lines: &[JournalLine]) -> Result<(), LedgerError> {
    let mut numbers: Vec<u32> = lines.iter().map(|l| l.line_number).collect();
    numbers.sort_unstable();

    let expected = u32::try_from(lines.len())
        .map_err(|_| LedgerError::Internal("line count exceeds u32".to_string()))?;
    let sequential = numbers
        .iter()
        .copied()
        .eq(1..=expected);

    if sequential {
        Ok(())
    } else {
        Err(LedgerError::NonContiguousLineNumbers {
            expected,
            found: numbers,
        })
    }
}

fn validate_line(line: &JournalLine, journal: &Journal) -> Result<(), LedgerError> {
    if line.debit_amount.is_negative()
        || line.credit_amount.is_negative()
        || line.original_amount.is_negative()
    {
        return Err(LedgerError::NegativeLineAmount {
            line_number: line.line_number,
        });
    }

    // Exactly one side set.
    if line.debit_amount.is_zero() == line.credit_amount.is_zero() {
        return Err(LedgerError::InvalidLineSides {
            line_number: line.line_number,
        });
    }

    for booked in [line.debit_amount, line.credit_amount] {
        if booked.currency != journal.currency {
            return Err(LedgerError::LineCurrencyMismatch {
                line_number: line.line_number,
                line_currency: booked.currency,
                journal_currency: journal.currency,
            });
        }
    }

    // |original * rate - booked| <= 0.0001, measured on the booking side.
    let computed = line.original_amount.amount.into_inner() * line.exchange_rate.into_inner();
    let booked = line.booked_amount().amount.into_inner();
    if (computed - booked).abs() > exchange_tolerance() {
        return Err(LedgerError::ExchangeRateToleranceExceeded {
            line_number: line.line_number,
            computed,
            booked: line.booked_amount(),
        });
    }

    if let Some(rate) = line.tax_rate {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(LedgerError::InvalidTaxRate {
                line_number: line.line_number,
                rate,
            });
        }
    }

    Ok(())
}
