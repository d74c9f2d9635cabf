//! Journal domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use verity_shared::types::{
    AccountId, Amount, Currency, ExchangeRate, JournalHash, JournalId, JournalLineId, Money,
    OrganizationId, PeriodId, UserId,
};

use crate::error::LedgerError;

/// Lifecycle states of a journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalStatus {
    /// Journal is being drafted and can be modified or deleted.
    Draft,
    /// Journal has been posted to the ledger (immutable, hash sealed).
    Posted,
    /// Journal has been neutralized by a reversal (immutable, hash sealed).
    Reversed,
}

impl JournalStatus {
    /// Returns true if the journal can be modified.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the journal carries a sealed hash and participates
    /// in the organization's chain.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        matches!(self, Self::Posted | Self::Reversed)
    }
}

/// One debit or credit entry within a journal.
///
/// Exactly one of `debit_amount` and `credit_amount` is non-zero; both are
/// in the journal's booking currency. `original_amount` carries the value in
/// the (possibly foreign) source currency together with the rate that
/// produced the booked amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier.
    pub id: JournalLineId,
    /// The journal this line belongs to.
    pub journal_id: JournalId,
    /// The account this line posts to.
    pub account_id: AccountId,
    /// Position within the journal, 1-based and contiguous.
    pub line_number: u32,
    /// Line description.
    pub description: String,
    /// Debit amount in the journal currency (zero for credit lines).
    pub debit_amount: Money,
    /// Credit amount in the journal currency (zero for debit lines).
    pub credit_amount: Money,
    /// The value in the source currency.
    pub original_amount: Money,
    /// Rate from source to booking currency.
    pub exchange_rate: ExchangeRate,
    /// Optional tax code.
    pub tax_code: Option<String>,
    /// Optional tax amount in the booking currency.
    pub tax_amount: Option<Amount>,
    /// Optional tax rate in `[0, 1]`.
    pub tax_rate: Option<Decimal>,
}

impl JournalLine {
    /// Returns true if this is a debit line.
    #[must_use]
    pub fn is_debit(&self) -> bool {
        !self.debit_amount.is_zero()
    }

    /// Returns the booked (non-zero) side of the line.
    #[must_use]
    pub fn booked_amount(&self) -> Money {
        if self.is_debit() {
            self.debit_amount
        } else {
            self.credit_amount
        }
    }
}

/// Aggregate root: an immutable-once-posted double-entry transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    /// Unique identifier.
    pub id: JournalId,
    /// Organization this journal belongs to.
    pub organization_id: OrganizationId,
    /// The period this journal posts into (non-owning reference).
    pub period_id: PeriodId,
    /// Journal number, unique per organization (e.g., "JRN-2024-001").
    pub journal_number: String,
    /// Journal description (non-empty).
    pub description: String,
    /// Optional external reference.
    pub reference: Option<String>,
    /// Accounting date; must fall inside the period.
    pub posting_date: NaiveDate,
    /// Current status.
    pub status: JournalStatus,
    /// Booking currency of every line.
    pub currency: Currency,
    /// Ordered lines, numbers 1..N contiguous.
    pub lines: Vec<JournalLine>,
    /// Sealed hash of the chain predecessor; set at posting time.
    pub hash_prev: Option<JournalHash>,
    /// This journal's sealed hash; set iff posted or reversed.
    pub hash_self: Option<JournalHash>,
    /// The mirror journal that reversed this one, if any.
    pub reversal_journal_id: Option<JournalId>,
    /// The journal this one reverses, if it is a mirror.
    pub original_journal_id: Option<JournalId>,
    /// Optional caller-supplied UID, unique per organization when present.
    pub ext_uid: Option<String>,
    /// User who created the journal.
    pub created_by: UserId,
    /// User who posted the journal.
    pub posted_by: Option<UserId>,
    /// When the journal was posted; the chain order key.
    pub posted_at: Option<DateTime<Utc>>,
    /// When the journal was created.
    pub created_at: DateTime<Utc>,
    /// When the journal was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Journal {
    /// Sums all debit lines in the journal currency.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is booked in a foreign currency or the
    /// sum overflows.
    pub fn total_debit(&self) -> Result<Money, LedgerError> {
        self.lines
            .iter()
            .try_fold(Money::zero(self.currency), |acc, line| {
                acc.try_add(line.debit_amount).map_err(LedgerError::from)
            })
    }

    /// Sums all credit lines in the journal currency.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is booked in a foreign currency or the
    /// sum overflows.
    pub fn total_credit(&self) -> Result<Money, LedgerError> {
        self.lines
            .iter()
            .try_fold(Money::zero(self.currency), |acc, line| {
                acc.try_add(line.credit_amount).map_err(LedgerError::from)
            })
    }

    /// Builds a draft journal from caller input.
    ///
    /// The result still has to pass `validation::validate_journal`; this
    /// only assembles the aggregate.
    #[must_use]
    pub fn from_input(input: CreateJournalInput, id: JournalId, now: DateTime<Utc>) -> Self {
        let lines = input
            .lines
            .into_iter()
            .map(|line| JournalLine {
                id: JournalLineId::new(),
                journal_id: id,
                account_id: line.account_id,
                line_number: line.line_number,
                description: line.description,
                debit_amount: Money::new(line.debit_amount, input.currency),
                credit_amount: Money::new(line.credit_amount, input.currency),
                original_amount: line.original_amount,
                exchange_rate: line.exchange_rate,
                tax_code: line.tax_code,
                tax_amount: line.tax_amount,
                tax_rate: line.tax_rate,
            })
            .collect();

        Self {
            id,
            organization_id: input.organization_id,
            period_id: input.period_id,
            journal_number: input.journal_number,
            description: input.description,
            reference: input.reference,
            posting_date: input.posting_date,
            status: JournalStatus::Draft,
            currency: input.currency,
            lines,
            hash_prev: None,
            hash_self: None,
            reversal_journal_id: None,
            original_journal_id: None,
            ext_uid: input.ext_uid,
            created_by: input.created_by,
            posted_by: None,
            posted_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for a single line of a new draft.
#[derive(Debug, Clone)]
pub struct CreateJournalLineInput {
    /// The account to post to.
    pub account_id: AccountId,
    /// Position within the journal, 1-based.
    pub line_number: u32,
    /// Line description.
    pub description: String,
    /// Debit amount in the journal currency (zero for credit lines).
    pub debit_amount: Amount,
    /// Credit amount in the journal currency (zero for debit lines).
    pub credit_amount: Amount,
    /// The value in the source currency.
    pub original_amount: Money,
    /// Rate from source to booking currency.
    pub exchange_rate: ExchangeRate,
    /// Optional tax code.
    pub tax_code: Option<String>,
    /// Optional tax amount.
    pub tax_amount: Option<Amount>,
    /// Optional tax rate in `[0, 1]`.
    pub tax_rate: Option<Decimal>,
}

/// Input for creating a new draft journal.
#[derive(Debug, Clone)]
pub struct CreateJournalInput {
    /// The organization this journal belongs to.
    pub organization_id: OrganizationId,
    /// The period to post into.
    pub period_id: PeriodId,
    /// Journal number, unique per organization.
    pub journal_number: String,
    /// Journal description.
    pub description: String,
    /// Optional external reference.
    pub reference: Option<String>,
    /// Accounting date.
    pub posting_date: NaiveDate,
    /// Booking currency.
    pub currency: Currency,
    /// Optional caller-supplied UID.
    pub ext_uid: Option<String>,
    /// User creating the journal.
    pub created_by: UserId,
    /// The lines (at least two).
    pub lines: Vec<CreateJournalLineInput>,
}
