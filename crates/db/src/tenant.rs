//! Tenant-scoped session binding for multi-tenant isolation.
//!
//! Every repository operation runs inside a transaction whose `PostgreSQL`
//! session variable `app.current_org_id` names exactly one organization;
//! row-level security policies key on it, so queries can only ever observe
//! rows of that tenant. The binding is scoped: it is established when the
//! session begins and torn down with the transaction on both commit and
//! rollback (dropping an uncommitted session rolls it back).

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use verity_shared::types::OrganizationId;

/// A transaction bound to one organization.
pub struct TenantSession {
    txn: DatabaseTransaction,
    organization_id: OrganizationId,
}

impl TenantSession {
    /// Begins a transaction and binds it to `organization_id`.
    ///
    /// Uses `SET LOCAL`, which scopes the binding to this transaction only.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the binding
    /// cannot be set.
    pub async fn begin(
        db: &DatabaseConnection,
        organization_id: OrganizationId,
    ) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        let sql = format!(
            "SET LOCAL app.current_org_id = '{}'",
            organization_id.into_inner()
        );
        txn.execute_unprepared(&sql).await?;
        Ok(Self {
            txn,
            organization_id,
        })
    }

    /// Returns the bound organization.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub fn txn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Serializes posting against other writers of the same organization.
    ///
    /// Takes `pg_advisory_xact_lock` keyed on the organization, held until
    /// the transaction ends. Concurrent `post` calls for one organization
    /// therefore observe the chain head one at a time; different
    /// organizations never contend.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock statement fails.
    pub async fn lock_for_posting(&self) -> Result<(), DbErr> {
        let sql = format!(
            "SELECT pg_advisory_xact_lock(hashtext('{}'))",
            self.organization_id.into_inner()
        );
        self.txn.execute_unprepared(&sql).await?;
        Ok(())
    }

    /// Commits the transaction, persisting all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction, discarding all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}
