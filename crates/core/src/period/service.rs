//! Business rules for period management.
//!
//! This service contains pure rules with no database dependencies; the
//! repository layer loads the candidate rows and drives these checks.

use chrono::{Months, NaiveDate};

use verity_shared::types::PeriodId;

use super::types::{Period, PeriodStatus};
use crate::error::LedgerError;

/// Stateless service enforcing the period rules.
pub struct PeriodService;

impl PeriodService {
    /// Validates the static shape of a new or updated period.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPeriodName`, `InvalidPeriodDates`, or `PeriodTooLong`.
    pub fn validate_attributes(
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<(), LedgerError> {
        if name.trim().is_empty() {
            return Err(LedgerError::EmptyPeriodName);
        }
        if start_date >= end_date {
            return Err(LedgerError::InvalidPeriodDates {
                start: start_date,
                end: end_date,
            });
        }
        let cap = start_date
            .checked_add_months(Months::new(24))
            .ok_or(LedgerError::PeriodTooLong {
                start: start_date,
                end: end_date,
            })?;
        if end_date > cap {
            return Err(LedgerError::PeriodTooLong {
                start: start_date,
                end: end_date,
            });
        }
        Ok(())
    }

    /// Rejects a candidate interval that intersects any of `existing`.
    ///
    /// `exclude` skips the period being updated so it does not conflict with
    /// itself. Intervals are closed on both ends.
    ///
    /// # Errors
    ///
    /// Returns `PeriodOverlap` listing every conflicting period.
    pub fn check_overlap(
        start_date: NaiveDate,
        end_date: NaiveDate,
        existing: &[Period],
        exclude: Option<PeriodId>,
    ) -> Result<(), LedgerError> {
        let overlapping: Vec<PeriodId> = existing
            .iter()
            .filter(|p| exclude != Some(p.id))
            .filter(|p| p.overlaps(start_date, end_date))
            .map(|p| p.id)
            .collect();

        if overlapping.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::PeriodOverlap { overlapping })
        }
    }

    /// Validates a status transition against the period state machine.
    ///
    /// Valid transitions:
    /// - Open → Closing
    /// - Closing → Closed
    /// - Closing → Open
    ///
    /// Everything else, including same-state transitions, is rejected.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriodTransition`.
    pub fn validate_transition(
        from: PeriodStatus,
        to: PeriodStatus,
    ) -> Result<(), LedgerError> {
        let valid = matches!(
            (from, to),
            (PeriodStatus::Open, PeriodStatus::Closing)
                | (PeriodStatus::Closing, PeriodStatus::Closed | PeriodStatus::Open)
        );

        if valid {
            Ok(())
        } else {
            Err(LedgerError::InvalidPeriodTransition { from, to })
        }
    }

    /// Requires the period to be open for posting.
    ///
    /// # Errors
    ///
    /// Returns `PeriodClosed` unless the period is open.
    pub fn validate_for_posting(period: &Period) -> Result<(), LedgerError> {
        if period.is_open() {
            Ok(())
        } else {
            Err(LedgerError::PeriodClosed {
                period_id: period.id,
                status: period.status,
            })
        }
    }

    /// Requires the period to be editable.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotEditable` unless the period is open.
    pub fn validate_editable(period: &Period) -> Result<(), LedgerError> {
        if period.status.is_editable() {
            Ok(())
        } else {
            Err(LedgerError::PeriodNotEditable {
                status: period.status,
            })
        }
    }
}
