//! The posting pipeline and chain verification.
//!
//! Posting runs inside one tenant transaction under a per-organization
//! advisory lock, so reads of the chain head always observe the actual
//! latest sealed digest. Reversal saves the mirror and flips the original
//! in the same transaction: either both land or neither does.

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DatabaseTransaction, Set};
use tracing::{info, warn};

use verity_core::hash::{ChainVerification, ChainVerifier, HashService};
use verity_core::journal::types::Journal;
use verity_core::period::service::PeriodService;
use verity_core::posting::reversal::{ReversalInput, ReversalService};
use verity_core::posting::service::PostingService;
use verity_core::LedgerError;
use verity_shared::types::{JournalId, OrganizationId, UserId};

use crate::entities::journals;
use crate::tenant::TenantSession;

use super::journal::{
    ensure_unique, insert_journal, load_journal, previous_hash, sealed_page, ChainCursor,
};
use super::period::{find_period_for_date, load_period};
use super::{convert, RepositoryError};

/// Batch size of the streaming chain walk.
const CHAIN_SCAN_BATCH: u64 = 500;

/// Result of a reversal: both journals as persisted.
#[derive(Debug)]
pub struct ReversalOutcome {
    /// The original, now `reversed` and linked to the mirror.
    pub original: Journal,
    /// The posted mirror journal.
    pub reversal: Journal,
}

/// Tenant-scoped posting pipeline.
#[derive(Debug, Clone)]
pub struct PostingRepository {
    db: DatabaseConnection,
}

impl PostingRepository {
    /// Creates a new posting repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Posts a draft journal, sealing it onto the organization's chain.
    ///
    /// Pipeline: bind the tenant, take the per-organization lock, load and
    /// revalidate the draft, recheck uniqueness against racing writers,
    /// require the period open, read the chain head, seal, persist. The
    /// clock is read exactly once, at the transition.
    ///
    /// # Errors
    ///
    /// Surfaces the first violated gate with its canonical code; on any
    /// failure the transaction rolls back and the draft is untouched.
    pub async fn post(
        &self,
        organization_id: OrganizationId,
        journal_id: JournalId,
        posted_by: UserId,
    ) -> Result<Journal, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        session.lock_for_posting().await?;

        let mut journal = load_journal(session.txn(), journal_id).await?;
        ensure_unique(
            session.txn(),
            organization_id,
            &journal.journal_number,
            journal.ext_uid.as_deref(),
            Some(journal.id),
        )
        .await?;

        let period = load_period(session.txn(), journal.period_id).await?;
        let hash_prev = previous_hash(session.txn(), organization_id).await?;

        let posted_at = Utc::now();
        PostingService::post(&mut journal, &period, hash_prev, posted_by, posted_at)?;

        persist_seal(session.txn(), &journal).await?;
        session.commit().await?;

        info!(
            journal_id = %journal.id,
            number = %journal.journal_number,
            "posted journal"
        );
        Ok(journal)
    }

    /// Reverses a posted journal: posts the mirror and marks the original,
    /// atomically.
    ///
    /// The mirror is inserted first, then the original updated, inside one
    /// transaction; on failure neither is saved. The original's sealed
    /// hash is not recomputed.
    ///
    /// # Errors
    ///
    /// Surfaces the first violated gate with its canonical code.
    pub async fn reverse(
        &self,
        organization_id: OrganizationId,
        original_id: JournalId,
        description: &str,
        reversal_date: NaiveDate,
        reversed_by: UserId,
    ) -> Result<ReversalOutcome, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        session.lock_for_posting().await?;

        let mut original = load_journal(session.txn(), original_id).await?;
        ReversalService::validate_reversible(&original)?;
        ReversalService::validate_reversal_date(&original, reversal_date)?;

        let period = find_period_for_date(session.txn(), organization_id, reversal_date)
            .await?
            .ok_or(LedgerError::NoPeriodForDate {
                date: reversal_date,
            })?;
        PeriodService::validate_for_posting(&period)?;

        let now = Utc::now();
        let input = ReversalInput {
            description: description.to_string(),
            reversal_date,
            reversal_period_id: period.id,
            reversed_by,
        };
        let mut mirror =
            ReversalService::build_mirror(&original, JournalId::new(), &input, now)?;
        ensure_unique(
            session.txn(),
            organization_id,
            &mirror.journal_number,
            None,
            None,
        )
        .await?;

        let hash_prev = previous_hash(session.txn(), organization_id).await?;
        PostingService::post(&mut mirror, &period, hash_prev, reversed_by, now)?;

        // Mirror first, then the original's linkage; one transaction.
        insert_journal(session.txn(), &mirror).await?;
        ReversalService::mark_reversed(&mut original, mirror.id, now)?;
        persist_reversal_marker(session.txn(), &original).await?;

        session.commit().await?;

        info!(
            original = %original.id,
            reversal = %mirror.id,
            "reversed journal"
        );
        Ok(ReversalOutcome {
            original,
            reversal: mirror,
        })
    }

    /// Recomputes one sealed journal's digest against storage.
    ///
    /// # Errors
    ///
    /// Returns `ENTITY_NOT_FOUND` for a missing journal; a failed check is
    /// `Ok(false)`, not an error.
    pub async fn verify_journal(
        &self,
        organization_id: OrganizationId,
        journal_id: JournalId,
    ) -> Result<bool, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let journal = load_journal(session.txn(), journal_id).await?;
        session.commit().await?;

        let valid = HashService::verify_journal(&journal);
        if !valid {
            warn!(journal_id = %journal_id, "journal failed hash verification");
        }
        Ok(valid)
    }

    /// Walks the organization's whole chain from genesis, verifying every
    /// node and link.
    ///
    /// The walk streams in keyset batches and keeps only the running
    /// previous digest, so it stays O(1) in memory for arbitrarily long
    /// chains.
    ///
    /// # Errors
    ///
    /// Returns a database error if a batch read fails.
    pub async fn verify_organization_chain(
        &self,
        organization_id: OrganizationId,
    ) -> Result<ChainVerification, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;

        let mut verifier = ChainVerifier::new();
        let mut cursor: Option<ChainCursor> = None;

        loop {
            let batch = sealed_page(
                session.txn(),
                organization_id,
                cursor.as_ref(),
                CHAIN_SCAN_BATCH,
            )
            .await?;
            let Some(last) = batch.last() else {
                break;
            };
            cursor = ChainCursor::after(last);
            for journal in &batch {
                verifier.push(journal);
            }
            if batch.len() < CHAIN_SCAN_BATCH as usize {
                break;
            }
        }

        session.commit().await?;

        let result = verifier.finish();
        if !result.is_valid {
            warn!(
                %organization_id,
                invalid = result.invalid_journals.len(),
                broken_at = ?result.broken_chain_at,
                "hash chain verification failed"
            );
        }
        Ok(result)
    }
}

/// Writes the sealed state of a freshly posted journal.
async fn persist_seal(
    txn: &DatabaseTransaction,
    journal: &Journal,
) -> Result<(), RepositoryError> {
    let active = journals::ActiveModel {
        id: Set(journal.id.into_inner()),
        status: Set(convert::journal_status_to_db(journal.status)),
        hash_prev: Set(journal.hash_prev.map(|hash| hash.to_hex())),
        hash_self: Set(journal.hash_self.map(|hash| hash.to_hex())),
        posted_by: Set(journal.posted_by.map(UserId::into_inner)),
        posted_at: Set(journal.posted_at.map(Into::into)),
        updated_at: Set(journal.updated_at.into()),
        ..Default::default()
    };
    active.update(txn).await?;
    Ok(())
}

/// Writes the `reversed` marker and linkage of an original journal.
/// Deliberately touches nothing in the hashed field set.
async fn persist_reversal_marker(
    txn: &DatabaseTransaction,
    original: &Journal,
) -> Result<(), RepositoryError> {
    let active = journals::ActiveModel {
        id: Set(original.id.into_inner()),
        status: Set(convert::journal_status_to_db(original.status)),
        reversal_journal_id: Set(original.reversal_journal_id.map(JournalId::into_inner)),
        updated_at: Set(original.updated_at.into()),
        ..Default::default()
    };
    active.update(txn).await?;
    Ok(())
}
