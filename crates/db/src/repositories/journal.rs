//! Journal repository.
//!
//! Draft lifecycle (create, update, delete), tenant-scoped lookups, the
//! chronological chain scan, and journal-number series management. The
//! posting pipeline itself lives in `posting`.

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::info;

use verity_core::journal::number;
use verity_core::journal::types::{CreateJournalInput, Journal};
use verity_core::journal::validation;
use verity_core::period::service::PeriodService;
use verity_core::posting::service::PostingService;
use verity_core::LedgerError;
use verity_shared::error::ErrorResponse;
use verity_shared::types::{JournalHash, JournalId, OrganizationId, PeriodId};

use crate::entities::sea_orm_active_enums::JournalStatus as DbJournalStatus;
use crate::entities::{journal_lines, journals};
use crate::tenant::TenantSession;

use super::period::load_period;
use super::{convert, RepositoryError};

/// Keyset cursor into the chronological chain scan:
/// `(posted_at, journal_number)` of the last journal already seen.
#[derive(Debug, Clone)]
pub struct ChainCursor {
    /// `posted_at` of the last journal of the previous batch.
    pub posted_at: chrono::DateTime<Utc>,
    /// `journal_number` of the last journal of the previous batch.
    pub journal_number: String,
}

impl ChainCursor {
    /// Builds the cursor pointing just past `journal`.
    #[must_use]
    pub fn after(journal: &Journal) -> Option<Self> {
        journal.posted_at.map(|posted_at| Self {
            posted_at,
            journal_number: journal.journal_number.clone(),
        })
    }
}

/// One rejected entry of a batch validation.
#[derive(Debug, Clone)]
pub struct ImportIssue {
    /// Position of the offending input in the submitted batch.
    pub index: usize,
    /// Why it was rejected.
    pub error: ErrorResponse,
}

/// Tenant-scoped journal repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft journal.
    ///
    /// Pipeline: the period must exist and be open; the posting date must
    /// fall inside it; journal number and external UID must be free; the
    /// aggregate must validate. Persists with `status = draft` and no
    /// hashes.
    ///
    /// # Errors
    ///
    /// Surfaces the first violated rule with its canonical code.
    pub async fn create_draft(
        &self,
        input: CreateJournalInput,
    ) -> Result<Journal, RepositoryError> {
        let organization_id = input.organization_id;
        let session = TenantSession::begin(&self.db, organization_id).await?;

        let journal = prepare_draft(session.txn(), input, JournalId::new(), None).await?;
        insert_journal(session.txn(), &journal).await?;

        session.commit().await?;
        info!(journal_id = %journal.id, number = %journal.journal_number, "created draft journal");
        Ok(journal)
    }

    /// Replaces a draft's content, revalidating everything.
    ///
    /// # Errors
    ///
    /// Returns `BUSINESS_RULE_VIOLATION` if the journal is not a draft,
    /// otherwise the same failures as `create_draft`.
    pub async fn update_draft(
        &self,
        journal_id: JournalId,
        input: CreateJournalInput,
    ) -> Result<Journal, RepositoryError> {
        let organization_id = input.organization_id;
        let session = TenantSession::begin(&self.db, organization_id).await?;

        let current = load_journal(session.txn(), journal_id).await?;
        PostingService::validate_editable(&current)?;

        let mut updated =
            prepare_draft(session.txn(), input, journal_id, Some(journal_id)).await?;
        // Creation audit fields survive the update.
        updated.created_at = current.created_at;
        updated.created_by = current.created_by;
        updated.updated_at = Utc::now();

        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::JournalId.eq(journal_id.into_inner()))
            .exec(session.txn())
            .await?;
        convert::journal_to_active(&updated).update(session.txn()).await?;
        for line in &updated.lines {
            convert::line_to_active(line, organization_id)?
                .insert(session.txn())
                .await?;
        }

        session.commit().await?;
        Ok(updated)
    }

    /// Deletes a draft journal and its lines.
    ///
    /// # Errors
    ///
    /// Returns `BUSINESS_RULE_VIOLATION` for posted or reversed journals.
    pub async fn delete_draft(
        &self,
        organization_id: OrganizationId,
        journal_id: JournalId,
    ) -> Result<(), RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;

        let journal = load_journal(session.txn(), journal_id).await?;
        PostingService::validate_deletable(&journal)?;

        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::JournalId.eq(journal_id.into_inner()))
            .exec(session.txn())
            .await?;
        journals::Entity::delete_by_id(journal_id.into_inner())
            .exec(session.txn())
            .await?;

        session.commit().await?;
        info!(journal_id = %journal_id, "deleted draft journal");
        Ok(())
    }

    /// Finds a journal (with lines) by id.
    ///
    /// # Errors
    ///
    /// Returns a database error; a missing journal is `Ok(None)`.
    pub async fn find_by_id(
        &self,
        organization_id: OrganizationId,
        journal_id: JournalId,
    ) -> Result<Option<Journal>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let found = try_load_journal(session.txn(), journal_id).await?;
        session.commit().await?;
        Ok(found)
    }

    /// Finds a journal by its number.
    ///
    /// # Errors
    ///
    /// Returns a database error; a missing journal is `Ok(None)`.
    pub async fn find_by_journal_number(
        &self,
        organization_id: OrganizationId,
        journal_number: &str,
    ) -> Result<Option<Journal>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let model = journals::Entity::find()
            .filter(journals::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(journals::Column::JournalNumber.eq(journal_number))
            .one(session.txn())
            .await?;
        let found = attach_lines(session.txn(), model).await?;
        session.commit().await?;
        Ok(found)
    }

    /// Finds a journal by its external UID.
    ///
    /// # Errors
    ///
    /// Returns a database error; a missing journal is `Ok(None)`.
    pub async fn find_by_ext_uid(
        &self,
        organization_id: OrganizationId,
        ext_uid: &str,
    ) -> Result<Option<Journal>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let model = journals::Entity::find()
            .filter(journals::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(journals::Column::ExtUid.eq(ext_uid))
            .one(session.txn())
            .await?;
        let found = attach_lines(session.txn(), model).await?;
        session.commit().await?;
        Ok(found)
    }

    /// Lists the journals of a period, newest posting date first.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_period(
        &self,
        organization_id: OrganizationId,
        period_id: PeriodId,
    ) -> Result<Vec<Journal>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let models = journals::Entity::find()
            .filter(journals::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(journals::Column::PeriodId.eq(period_id.into_inner()))
            .order_by_desc(journals::Column::PostingDate)
            .order_by_desc(journals::Column::CreatedAt)
            .all(session.txn())
            .await?;
        let found = attach_lines_all(session.txn(), models).await?;
        session.commit().await?;
        Ok(found)
    }

    /// Lists journals whose posting date lies in `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_date_range(
        &self,
        organization_id: OrganizationId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Journal>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let models = journals::Entity::find()
            .filter(journals::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(journals::Column::PostingDate.gte(from))
            .filter(journals::Column::PostingDate.lte(to))
            .order_by_asc(journals::Column::PostingDate)
            .order_by_asc(journals::Column::JournalNumber)
            .all(session.txn())
            .await?;
        let found = attach_lines_all(session.txn(), models).await?;
        session.commit().await?;
        Ok(found)
    }

    /// Lists the draft journals of a period.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_draft_journals_by_period(
        &self,
        organization_id: OrganizationId,
        period_id: PeriodId,
    ) -> Result<Vec<Journal>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let models = journals::Entity::find()
            .filter(journals::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(journals::Column::PeriodId.eq(period_id.into_inner()))
            .filter(journals::Column::Status.eq(DbJournalStatus::Draft))
            .order_by_asc(journals::Column::JournalNumber)
            .all(session.txn())
            .await?;
        let found = attach_lines_all(session.txn(), models).await?;
        session.commit().await?;
        Ok(found)
    }

    /// Counts the draft journals of a period.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn count_draft_journals_in_period(
        &self,
        organization_id: OrganizationId,
        period_id: PeriodId,
    ) -> Result<u64, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let count = journals::Entity::find()
            .filter(journals::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(journals::Column::PeriodId.eq(period_id.into_inner()))
            .filter(journals::Column::Status.eq(DbJournalStatus::Draft))
            .count(session.txn())
            .await?;
        session.commit().await?;
        Ok(count)
    }

    /// Returns true if the journal number is taken in this organization.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn exists_by_journal_number(
        &self,
        organization_id: OrganizationId,
        journal_number: &str,
    ) -> Result<bool, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let exists =
            number_exists(session.txn(), organization_id, journal_number, None).await?;
        session.commit().await?;
        Ok(exists)
    }

    /// Returns true if the external UID is taken in this organization.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn exists_by_ext_uid(
        &self,
        organization_id: OrganizationId,
        ext_uid: &str,
    ) -> Result<bool, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let exists = ext_uid_exists(session.txn(), organization_id, ext_uid, None).await?;
        session.commit().await?;
        Ok(exists)
    }

    /// Scans the sealed journals in canonical chain order, one keyset
    /// batch at a time.
    ///
    /// Order is `posted_at` ascending, then `journal_number` ascending.
    /// Pass the `ChainCursor` of the previous batch's last journal to
    /// continue; `None` starts from the chain head.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_posted_journals_chronological(
        &self,
        organization_id: OrganizationId,
        after: Option<&ChainCursor>,
        limit: u64,
    ) -> Result<Vec<Journal>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let found = sealed_page(session.txn(), organization_id, after, limit).await?;
        session.commit().await?;
        Ok(found)
    }

    /// Finds the chain tail: the last sealed journal in canonical order.
    ///
    /// # Errors
    ///
    /// Returns a database error; an empty chain is `Ok(None)`.
    pub async fn find_last_posted_journal(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<Journal>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let model = last_sealed_model(session.txn(), organization_id).await?;
        let found = attach_lines(session.txn(), model).await?;
        session.commit().await?;
        Ok(found)
    }

    /// Returns the sealed hash of the chain tail, or `None` for an empty
    /// chain.
    ///
    /// # Errors
    ///
    /// Returns a database error, or an internal error for a sealed row
    /// missing its hash.
    pub async fn get_previous_hash(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Option<JournalHash>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let hash = previous_hash(session.txn(), organization_id).await?;
        session.commit().await?;
        Ok(hash)
    }

    /// Returns the next free number in the series, default prefix
    /// `JRN-{current year}`.
    ///
    /// The returned number is not reserved; the unique constraint on save
    /// settles races.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn get_next_journal_number(
        &self,
        organization_id: OrganizationId,
        prefix: Option<&str>,
    ) -> Result<String, RepositoryError> {
        let default_prefix = number::default_prefix(Utc::now().year());
        let prefix = prefix.unwrap_or(&default_prefix);

        let session = TenantSession::begin(&self.db, organization_id).await?;
        let taken: Vec<String> = journals::Entity::find()
            .filter(journals::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(journals::Column::JournalNumber.starts_with(format!("{prefix}-").as_str()))
            .all(session.txn())
            .await?
            .into_iter()
            .map(|model| model.journal_number)
            .collect();
        session.commit().await?;

        Ok(number::next_in_series(prefix, &taken))
    }

    /// Validates a batch of drafts without persisting anything: the same
    /// checks as `create_draft`, plus duplicate detection within the batch.
    ///
    /// Returns one issue per rejected input; an empty vector means the
    /// whole batch would be accepted.
    ///
    /// # Errors
    ///
    /// Returns a database error if a lookup fails.
    pub async fn validate_for_import(
        &self,
        organization_id: OrganizationId,
        inputs: &[CreateJournalInput],
    ) -> Result<Vec<ImportIssue>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;

        let mut issues = Vec::new();
        let mut seen_numbers: Vec<&str> = Vec::new();
        let mut seen_uids: Vec<&str> = Vec::new();

        for (index, input) in inputs.iter().enumerate() {
            let result = check_import_entry(
                session.txn(),
                organization_id,
                input,
                &seen_numbers,
                &seen_uids,
            )
            .await;

            match result {
                Ok(()) => {
                    seen_numbers.push(&input.journal_number);
                    if let Some(uid) = input.ext_uid.as_deref() {
                        seen_uids.push(uid);
                    }
                }
                Err(RepositoryError::Domain(error)) => issues.push(ImportIssue {
                    index,
                    error: error.to_response(),
                }),
                Err(database) => return Err(database),
            }
        }

        session.commit().await?;
        Ok(issues)
    }

    /// Persists several drafts atomically: either every input is accepted
    /// and saved, or none is.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule; nothing is persisted in that case.
    pub async fn save_multiple(
        &self,
        organization_id: OrganizationId,
        inputs: Vec<CreateJournalInput>,
    ) -> Result<Vec<Journal>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;

        let mut saved = Vec::with_capacity(inputs.len());
        for input in inputs {
            let journal = prepare_draft(session.txn(), input, JournalId::new(), None).await?;
            insert_journal(session.txn(), &journal).await?;
            saved.push(journal);
        }

        session.commit().await?;
        info!(count = saved.len(), "saved journal batch");
        Ok(saved)
    }
}

// ============================================================================
// Shared helpers (also used by the posting pipeline)
// ============================================================================

/// Validates an input against period, uniqueness, and aggregate rules and
/// assembles the draft. Does not persist.
async fn prepare_draft(
    txn: &DatabaseTransaction,
    input: CreateJournalInput,
    journal_id: JournalId,
    exclude: Option<JournalId>,
) -> Result<Journal, RepositoryError> {
    let organization_id = input.organization_id;
    let period = load_period(txn, input.period_id).await?;
    PeriodService::validate_for_posting(&period)?;

    ensure_unique(
        txn,
        organization_id,
        &input.journal_number,
        input.ext_uid.as_deref(),
        exclude,
    )
    .await?;

    let journal = Journal::from_input(input, journal_id, Utc::now());
    validation::validate_journal(&journal)?;
    validation::validate_posting_date(&journal, &period)?;
    Ok(journal)
}

async fn check_import_entry(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    input: &CreateJournalInput,
    seen_numbers: &[&str],
    seen_uids: &[&str],
) -> Result<(), RepositoryError> {
    if seen_numbers.contains(&input.journal_number.as_str()) {
        return Err(LedgerError::DuplicateJournalNumber {
            journal_number: input.journal_number.clone(),
        }
        .into());
    }
    if let Some(uid) = input.ext_uid.as_deref() {
        if seen_uids.contains(&uid) {
            return Err(LedgerError::DuplicateExtUid {
                ext_uid: uid.to_string(),
            }
            .into());
        }
    }

    prepare_draft(txn, input.clone(), JournalId::new(), None)
        .await
        .map(|_| ())
}

/// Loads a journal with its lines; missing journals are an error.
pub(crate) async fn load_journal(
    txn: &DatabaseTransaction,
    journal_id: JournalId,
) -> Result<Journal, RepositoryError> {
    try_load_journal(txn, journal_id)
        .await?
        .ok_or_else(|| LedgerError::JournalNotFound { journal_id }.into())
}

async fn try_load_journal(
    txn: &DatabaseTransaction,
    journal_id: JournalId,
) -> Result<Option<Journal>, RepositoryError> {
    let model = journals::Entity::find_by_id(journal_id.into_inner())
        .one(txn)
        .await?;
    attach_lines(txn, model).await
}

async fn attach_lines(
    txn: &DatabaseTransaction,
    model: Option<journals::Model>,
) -> Result<Option<Journal>, RepositoryError> {
    let Some(model) = model else {
        return Ok(None);
    };
    let lines = journal_lines::Entity::find()
        .filter(journal_lines::Column::JournalId.eq(model.id))
        .order_by_asc(journal_lines::Column::LineNumber)
        .all(txn)
        .await?;
    Ok(Some(convert::journal_from_models(model, lines)?))
}

async fn attach_lines_all(
    txn: &DatabaseTransaction,
    models: Vec<journals::Model>,
) -> Result<Vec<Journal>, RepositoryError> {
    let mut journals = Vec::with_capacity(models.len());
    for model in models {
        if let Some(journal) = attach_lines(txn, Some(model)).await? {
            journals.push(journal);
        }
    }
    Ok(journals)
}

/// Inserts a journal row and its full line set.
pub(crate) async fn insert_journal(
    txn: &DatabaseTransaction,
    journal: &Journal,
) -> Result<(), RepositoryError> {
    convert::journal_to_active(journal).insert(txn).await?;
    for line in &journal.lines {
        convert::line_to_active(line, journal.organization_id)?
            .insert(txn)
            .await?;
    }
    Ok(())
}

/// Rejects taken journal numbers and external UIDs.
pub(crate) async fn ensure_unique(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    journal_number: &str,
    ext_uid: Option<&str>,
    exclude: Option<JournalId>,
) -> Result<(), RepositoryError> {
    if number_exists(txn, organization_id, journal_number, exclude).await? {
        return Err(LedgerError::DuplicateJournalNumber {
            journal_number: journal_number.to_string(),
        }
        .into());
    }
    if let Some(uid) = ext_uid {
        if ext_uid_exists(txn, organization_id, uid, exclude).await? {
            return Err(LedgerError::DuplicateExtUid {
                ext_uid: uid.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

async fn number_exists(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    journal_number: &str,
    exclude: Option<JournalId>,
) -> Result<bool, RepositoryError> {
    let mut query = journals::Entity::find()
        .filter(journals::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(journals::Column::JournalNumber.eq(journal_number));
    if let Some(excluded) = exclude {
        query = query.filter(journals::Column::Id.ne(excluded.into_inner()));
    }
    Ok(query.count(txn).await? > 0)
}

async fn ext_uid_exists(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    ext_uid: &str,
    exclude: Option<JournalId>,
) -> Result<bool, RepositoryError> {
    let mut query = journals::Entity::find()
        .filter(journals::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(journals::Column::ExtUid.eq(ext_uid));
    if let Some(excluded) = exclude {
        query = query.filter(journals::Column::Id.ne(excluded.into_inner()));
    }
    Ok(query.count(txn).await? > 0)
}

/// One keyset batch of sealed journals in canonical chain order.
pub(crate) async fn sealed_page(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    after: Option<&ChainCursor>,
    limit: u64,
) -> Result<Vec<Journal>, RepositoryError> {
    let mut query = journals::Entity::find()
        .filter(journals::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(
            journals::Column::Status
                .is_in([DbJournalStatus::Posted, DbJournalStatus::Reversed]),
        )
        .order_by_asc(journals::Column::PostedAt)
        .order_by_asc(journals::Column::JournalNumber)
        .limit(limit);

    if let Some(cursor) = after {
        query = query.filter(
            Condition::any()
                .add(journals::Column::PostedAt.gt(cursor.posted_at))
                .add(
                    Condition::all()
                        .add(journals::Column::PostedAt.eq(cursor.posted_at))
                        .add(journals::Column::JournalNumber.gt(cursor.journal_number.clone())),
                ),
        );
    }

    let models = query.all(txn).await?;
    attach_lines_all(txn, models).await
}

async fn last_sealed_model(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
) -> Result<Option<journals::Model>, RepositoryError> {
    let model = journals::Entity::find()
        .filter(journals::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(
            journals::Column::Status
                .is_in([DbJournalStatus::Posted, DbJournalStatus::Reversed]),
        )
        .order_by_desc(journals::Column::PostedAt)
        .order_by_desc(journals::Column::JournalNumber)
        .one(txn)
        .await?;
    Ok(model)
}

/// Sealed hash of the chain tail within an existing transaction. Used by
/// the posting pipeline under the per-organization lock.
pub(crate) async fn previous_hash(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
) -> Result<Option<JournalHash>, RepositoryError> {
    let Some(model) = last_sealed_model(txn, organization_id).await? else {
        return Ok(None);
    };
    let raw = model.hash_self.ok_or_else(|| {
        LedgerError::MissingHash {
            journal_id: JournalId::from_uuid(model.id),
        }
    })?;
    let hash = raw.parse().map_err(|_| {
        LedgerError::Internal(format!("malformed hash in storage: {raw}"))
    })?;
    Ok(Some(hash))
}
