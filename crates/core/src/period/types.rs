//! Accounting period types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use verity_shared::types::{OrganizationId, PeriodId};

/// Status of an accounting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Period is open for postings and edits.
    Open,
    /// Period is being closed; no postings, may still reopen.
    Closing,
    /// Period is closed. Terminal.
    Closed,
}

impl PeriodStatus {
    /// Returns true if the period accepts postings.
    #[must_use]
    pub fn allows_posting(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true if period attributes may still be edited.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// An accounting time interval owned by one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    /// Unique identifier.
    pub id: PeriodId,
    /// Organization this period belongs to.
    pub organization_id: OrganizationId,
    /// Period name (e.g., "2024-Q2").
    pub name: String,
    /// First day of the period (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the period (inclusive).
    pub end_date: NaiveDate,
    /// Current status.
    pub status: PeriodStatus,
    /// When the period was created.
    pub created_at: DateTime<Utc>,
    /// When the period was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Period {
    /// Returns true if postings may land in this period.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.allows_posting()
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if this period's interval intersects `[start, end]`.
    ///
    /// Both intervals are closed: sharing a single day counts as overlap.
    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(start: (i32, u32, u32), end: (i32, u32, u32)) -> Period {
        Period {
            id: PeriodId::new(),
            organization_id: OrganizationId::new(),
            name: "2024-Q2".to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            status: PeriodStatus::Open,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_contains_date_is_inclusive() {
        let p = period((2024, 4, 1), (2024, 6, 30));
        assert!(p.contains_date(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
        assert!(p.contains_date(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
        assert!(!p.contains_date(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
    }

    #[test]
    fn test_overlap_on_shared_day() {
        let p = period((2024, 1, 1), (2024, 3, 31));
        assert!(p.overlaps(
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()
        ));
        assert!(!p.overlaps(
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()
        ));
    }

    #[test]
    fn test_status_permissions() {
        assert!(PeriodStatus::Open.allows_posting());
        assert!(!PeriodStatus::Closing.allows_posting());
        assert!(!PeriodStatus::Closed.allows_posting());

        assert!(PeriodStatus::Open.is_editable());
        assert!(!PeriodStatus::Closing.is_editable());

        assert!(PeriodStatus::Closed.is_terminal());
        assert!(!PeriodStatus::Closing.is_terminal());
    }
}
