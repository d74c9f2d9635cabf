//! Conversions between `SeaORM` models and domain types.
//!
//! Stored rows that fail to parse back into domain values (unknown
//! currency, malformed hash) indicate corruption and surface as internal
//! errors rather than panics.

use chrono::Utc;
use sea_orm::Set;

use verity_core::journal::types::{Journal, JournalLine, JournalStatus};
use verity_core::period::types::{Period, PeriodStatus};
use verity_core::LedgerError;
use verity_shared::types::{
    AccountId, Amount, Currency, ExchangeRate, JournalHash, JournalId, JournalLineId, Money,
    OrganizationId, PeriodId, UserId,
};

use crate::entities::{journal_lines, journals, periods, sea_orm_active_enums};

pub fn period_status_from_db(status: &sea_orm_active_enums::PeriodStatus) -> PeriodStatus {
    match status {
        sea_orm_active_enums::PeriodStatus::Open => PeriodStatus::Open,
        sea_orm_active_enums::PeriodStatus::Closing => PeriodStatus::Closing,
        sea_orm_active_enums::PeriodStatus::Closed => PeriodStatus::Closed,
    }
}

pub fn period_status_to_db(status: PeriodStatus) -> sea_orm_active_enums::PeriodStatus {
    match status {
        PeriodStatus::Open => sea_orm_active_enums::PeriodStatus::Open,
        PeriodStatus::Closing => sea_orm_active_enums::PeriodStatus::Closing,
        PeriodStatus::Closed => sea_orm_active_enums::PeriodStatus::Closed,
    }
}

pub fn journal_status_from_db(status: &sea_orm_active_enums::JournalStatus) -> JournalStatus {
    match status {
        sea_orm_active_enums::JournalStatus::Draft => JournalStatus::Draft,
        sea_orm_active_enums::JournalStatus::Posted => JournalStatus::Posted,
        sea_orm_active_enums::JournalStatus::Reversed => JournalStatus::Reversed,
    }
}

pub fn journal_status_to_db(status: JournalStatus) -> sea_orm_active_enums::JournalStatus {
    match status {
        JournalStatus::Draft => sea_orm_active_enums::JournalStatus::Draft,
        JournalStatus::Posted => sea_orm_active_enums::JournalStatus::Posted,
        JournalStatus::Reversed => sea_orm_active_enums::JournalStatus::Reversed,
    }
}

pub fn period_from_model(model: periods::Model) -> Period {
    Period {
        id: PeriodId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        name: model.name,
        start_date: model.start_date,
        end_date: model.end_date,
        status: period_status_from_db(&model.status),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn period_to_active(period: &Period) -> periods::ActiveModel {
    periods::ActiveModel {
        id: Set(period.id.into_inner()),
        organization_id: Set(period.organization_id.into_inner()),
        name: Set(period.name.clone()),
        start_date: Set(period.start_date),
        end_date: Set(period.end_date),
        status: Set(period_status_to_db(period.status)),
        created_at: Set(period.created_at.into()),
        updated_at: Set(period.updated_at.into()),
    }
}

fn currency_from_column(raw: &str) -> Result<Currency, LedgerError> {
    raw.parse()
        .map_err(|_| LedgerError::Internal(format!("unknown currency in storage: {raw}")))
}

fn hash_from_column(raw: Option<&String>) -> Result<Option<JournalHash>, LedgerError> {
    raw.map(|value| {
        value
            .parse()
            .map_err(|_| LedgerError::Internal(format!("malformed hash in storage: {value}")))
    })
    .transpose()
}

fn line_from_model(model: journal_lines::Model, currency: Currency) -> Result<JournalLine, LedgerError> {
    let line_number = u32::try_from(model.line_number).map_err(|_| {
        LedgerError::Internal(format!("negative line number in storage: {}", model.line_number))
    })?;
    let original_currency = currency_from_column(&model.original_currency)?;

    Ok(JournalLine {
        id: JournalLineId::from_uuid(model.id),
        journal_id: JournalId::from_uuid(model.journal_id),
        account_id: AccountId::from_uuid(model.account_id),
        line_number,
        description: model.description,
        debit_amount: Money::new(Amount::new(model.debit_amount)?, currency),
        credit_amount: Money::new(Amount::new(model.credit_amount)?, currency),
        original_amount: Money::new(Amount::new(model.original_amount)?, original_currency),
        exchange_rate: ExchangeRate::new(model.exchange_rate)?,
        tax_code: model.tax_code,
        tax_amount: model.tax_amount.map(Amount::new).transpose()?,
        tax_rate: model.tax_rate,
    })
}

pub fn journal_from_models(
    model: journals::Model,
    line_models: Vec<journal_lines::Model>,
) -> Result<Journal, LedgerError> {
    let currency = currency_from_column(&model.currency)?;

    let mut lines = line_models
        .into_iter()
        .map(|line| line_from_model(line, currency))
        .collect::<Result<Vec<_>, _>>()?;
    lines.sort_by_key(|line| line.line_number);

    Ok(Journal {
        id: JournalId::from_uuid(model.id),
        organization_id: OrganizationId::from_uuid(model.organization_id),
        period_id: PeriodId::from_uuid(model.period_id),
        journal_number: model.journal_number,
        description: model.description,
        reference: model.reference,
        posting_date: model.posting_date,
        status: journal_status_from_db(&model.status),
        currency,
        lines,
        hash_prev: hash_from_column(model.hash_prev.as_ref())?,
        hash_self: hash_from_column(model.hash_self.as_ref())?,
        reversal_journal_id: model.reversal_journal_id.map(JournalId::from_uuid),
        original_journal_id: model.original_journal_id.map(JournalId::from_uuid),
        ext_uid: model.ext_uid,
        created_by: UserId::from_uuid(model.created_by),
        posted_by: model.posted_by.map(UserId::from_uuid),
        posted_at: model.posted_at.map(|at| at.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn journal_to_active(journal: &Journal) -> journals::ActiveModel {
    journals::ActiveModel {
        id: Set(journal.id.into_inner()),
        organization_id: Set(journal.organization_id.into_inner()),
        period_id: Set(journal.period_id.into_inner()),
        journal_number: Set(journal.journal_number.clone()),
        description: Set(journal.description.clone()),
        reference: Set(journal.reference.clone()),
        posting_date: Set(journal.posting_date),
        status: Set(journal_status_to_db(journal.status)),
        currency: Set(journal.currency.to_string()),
        hash_prev: Set(journal.hash_prev.map(|hash| hash.to_hex())),
        hash_self: Set(journal.hash_self.map(|hash| hash.to_hex())),
        reversal_journal_id: Set(journal.reversal_journal_id.map(JournalId::into_inner)),
        original_journal_id: Set(journal.original_journal_id.map(JournalId::into_inner)),
        ext_uid: Set(journal.ext_uid.clone()),
        created_by: Set(journal.created_by.into_inner()),
        posted_by: Set(journal.posted_by.map(UserId::into_inner)),
        posted_at: Set(journal.posted_at.map(Into::into)),
        created_at: Set(journal.created_at.into()),
        updated_at: Set(journal.updated_at.into()),
    }
}

pub fn line_to_active(
    line: &JournalLine,
    organization_id: OrganizationId,
) -> Result<journal_lines::ActiveModel, LedgerError> {
    let line_number = i32::try_from(line.line_number).map_err(|_| {
        LedgerError::Internal(format!("line number {} exceeds storage range", line.line_number))
    })?;

    Ok(journal_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        journal_id: Set(line.journal_id.into_inner()),
        organization_id: Set(organization_id.into_inner()),
        account_id: Set(line.account_id.into_inner()),
        line_number: Set(line_number),
        description: Set(line.description.clone()),
        debit_amount: Set(line.debit_amount.amount.into_inner()),
        credit_amount: Set(line.credit_amount.amount.into_inner()),
        original_currency: Set(line.original_amount.currency.to_string()),
        original_amount: Set(line.original_amount.amount.into_inner()),
        exchange_rate: Set(line.exchange_rate.into_inner()),
        tax_code: Set(line.tax_code.clone()),
        tax_amount: Set(line.tax_amount.map(Amount::into_inner)),
        tax_rate: Set(line.tax_rate),
    })
}
