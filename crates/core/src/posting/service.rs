//! The posting transition.

use chrono::{DateTime, Utc};

use verity_shared::types::{JournalHash, UserId};

use crate::error::LedgerError;
use crate::hash::HashService;
use crate::journal::types::{Journal, JournalStatus};
use crate::journal::validation;
use crate::period::service::PeriodService;
use crate::period::types::Period;

/// Stateless service sealing draft journals onto the chain.
///
/// The caller (the storage layer) is responsible for serializing posts per
/// organization, rechecking uniqueness against racing writers, and reading
/// the clock exactly once for `posted_at`.
pub struct PostingService;

impl PostingService {
    /// Seals `journal` onto the chain behind `hash_prev`.
    ///
    /// Steps, in order: the journal must be a draft; every aggregate
    /// invariant is revalidated; the period must be open and contain the
    /// posting date; then `hash_self` is computed over the canonical
    /// serialization chained onto `hash_prev` and the status flips to
    /// `posted`.
    ///
    /// # Errors
    ///
    /// `JOURNAL_ALREADY_POSTED` for non-drafts, `PERIOD_CLOSED` for
    /// non-open periods, otherwise the violated invariant.
    pub fn post(
        journal: &mut Journal,
        period: &Period,
        hash_prev: Option<JournalHash>,
        posted_by: UserId,
        posted_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if journal.status != JournalStatus::Draft {
            return Err(LedgerError::JournalAlreadyPosted {
                journal_id: journal.id,
                status: journal.status,
            });
        }

        validation::validate_journal(journal)?;
        PeriodService::validate_for_posting(period)?;
        validation::validate_posting_date(journal, period)?;

        let hash_self = HashService::compute(journal, hash_prev.as_ref());

        journal.status = JournalStatus::Posted;
        journal.posted_by = Some(posted_by);
        journal.posted_at = Some(posted_at);
        journal.hash_prev = hash_prev;
        journal.hash_self = Some(hash_self);
        journal.updated_at = posted_at;

        Ok(())
    }

    /// Requires the journal to still be an editable draft.
    ///
    /// # Errors
    ///
    /// Returns `JournalNotEditable` for posted or reversed journals.
    pub fn validate_editable(journal: &Journal) -> Result<(), LedgerError> {
        if journal.status.is_editable() {
            Ok(())
        } else {
            Err(LedgerError::JournalNotEditable {
                status: journal.status,
            })
        }
    }

    /// Requires the journal to be a deletable draft.
    ///
    /// # Errors
    ///
    /// Returns `OnlyDraftDeletable` for posted or reversed journals.
    pub fn validate_deletable(journal: &Journal) -> Result<(), LedgerError> {
        if journal.status == JournalStatus::Draft {
            Ok(())
        } else {
            Err(LedgerError::OnlyDraftDeletable {
                status: journal.status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use verity_shared::types::{
        AccountId, Amount, Currency, ExchangeRate, JournalId, JournalLineId, Money,
        OrganizationId, PeriodId,
    };

    use crate::journal::types::JournalLine;
    use crate::period::types::PeriodStatus;

    fn eur(value: Decimal) -> Money {
        Money::new(Amount::new(value).unwrap(), Currency::Eur)
    }

    fn open_period(org: OrganizationId) -> Period {
        Period {
            id: PeriodId::new(),
            organization_id: org,
            name: "2024-Q2".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            status: PeriodStatus::Open,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn draft_in(period: &Period) -> Journal {
        let id = JournalId::new();
        let now = Utc::now();
        let mk_line = |line_number: u32, debit: Decimal, credit: Decimal| JournalLine {
            id: JournalLineId::new(),
            journal_id: id,
            account_id: AccountId::new(),
            line_number,
            description: format!("line {line_number}"),
            debit_amount: eur(debit),
            credit_amount: eur(credit),
            original_amount: eur(if debit.is_zero() { credit } else { debit }),
            exchange_rate: ExchangeRate::one(),
            tax_code: None,
            tax_amount: None,
            tax_rate: None,
        };

        Journal {
            id,
            organization_id: period.organization_id,
            period_id: period.id,
            journal_number: "JRN-2024-001".to_string(),
            description: "May sales".to_string(),
            reference: None,
            posting_date: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
            status: JournalStatus::Draft,
            currency: Currency::Eur,
            lines: vec![
                mk_line(1, dec!(1500), dec!(0)),
                mk_line(2, dec!(0), dec!(1500)),
            ],
            hash_prev: None,
            hash_self: None,
            reversal_journal_id: None,
            original_journal_id: None,
            ext_uid: None,
            created_by: UserId::new(),
            posted_by: None,
            posted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_post_seals_the_journal() {
        let period = open_period(OrganizationId::new());
        let mut journal = draft_in(&period);
        let poster = UserId::new();

        PostingService::post(&mut journal, &period, None, poster, fixed_clock()).unwrap();

        assert_eq!(journal.status, JournalStatus::Posted);
        assert_eq!(journal.posted_by, Some(poster));
        assert_eq!(journal.posted_at, Some(fixed_clock()));
        assert!(journal.hash_prev.is_none());
        assert_eq!(journal.hash_self.unwrap().to_hex().len(), 64);
        assert!(HashService::verify_journal(&journal));
    }

    #[test]
    fn test_post_chains_onto_previous_hash() {
        let period = open_period(OrganizationId::new());
        let mut first = draft_in(&period);
        PostingService::post(&mut first, &period, None, UserId::new(), fixed_clock()).unwrap();

        let mut second = draft_in(&period);
        second.journal_number = "JRN-2024-002".to_string();
        PostingService::post(
            &mut second,
            &period,
            first.hash_self,
            UserId::new(),
            fixed_clock(),
        )
        .unwrap();

        assert_eq!(second.hash_prev, first.hash_self);
        assert!(HashService::verify_journal(&second));
    }

    #[test]
    fn test_post_rejects_non_draft() {
        let period = open_period(OrganizationId::new());
        let mut journal = draft_in(&period);
        PostingService::post(&mut journal, &period, None, UserId::new(), fixed_clock()).unwrap();

        let result =
            PostingService::post(&mut journal, &period, None, UserId::new(), fixed_clock());
        assert!(matches!(
            result,
            Err(LedgerError::JournalAlreadyPosted { .. })
        ));
    }

    #[test]
    fn test_post_rejects_closed_period() {
        let mut period = open_period(OrganizationId::new());
        period.status = PeriodStatus::Closed;
        let mut journal = draft_in(&period);

        let result =
            PostingService::post(&mut journal, &period, None, UserId::new(), fixed_clock());
        assert!(matches!(result, Err(LedgerError::PeriodClosed { .. })));
        // Failed posting leaves the draft untouched.
        assert_eq!(journal.status, JournalStatus::Draft);
        assert!(journal.hash_self.is_none());
    }

    #[test]
    fn test_post_rejects_unbalanced() {
        let period = open_period(OrganizationId::new());
        let mut journal = draft_in(&period);
        journal.lines[1].credit_amount = eur(dec!(99.99));
        journal.lines[1].original_amount = eur(dec!(99.99));

        let result =
            PostingService::post(&mut journal, &period, None, UserId::new(), fixed_clock());
        assert!(matches!(result, Err(LedgerError::Unbalanced { .. })));
    }

    #[test]
    fn test_post_rejects_date_outside_period() {
        let period = open_period(OrganizationId::new());
        let mut journal = draft_in(&period);
        journal.posting_date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();

        let result =
            PostingService::post(&mut journal, &period, None, UserId::new(), fixed_clock());
        assert!(matches!(
            result,
            Err(LedgerError::PostingDateOutsidePeriod { .. })
        ));
    }

    #[test]
    fn test_editable_and_deletable_guards() {
        let period = open_period(OrganizationId::new());
        let mut journal = draft_in(&period);
        assert!(PostingService::validate_editable(&journal).is_ok());
        assert!(PostingService::validate_deletable(&journal).is_ok());

        PostingService::post(&mut journal, &period, None, UserId::new(), fixed_clock()).unwrap();
        assert!(matches!(
            PostingService::validate_editable(&journal),
            Err(LedgerError::JournalNotEditable { .. })
        ));
        assert!(matches!(
            PostingService::validate_deletable(&journal),
            Err(LedgerError::OnlyDraftDeletable { .. })
        ));
    }
}
