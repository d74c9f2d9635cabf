//! Period repository.
//!
//! Orchestrates the pure period rules against tenant-scoped storage:
//! overlap checks on create/update, the open/closing/closed state machine,
//! and the delete guard for periods that journals still reference.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use tracing::info;

use verity_core::period::service::PeriodService;
use verity_core::period::types::{Period, PeriodStatus};
use verity_core::LedgerError;
use verity_shared::types::{OrganizationId, PeriodId};

use crate::entities::{journals, periods};
use crate::tenant::TenantSession;

use super::convert;
use super::RepositoryError;

/// Tenant-scoped period repository.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
}

impl PeriodRepository {
    /// Creates a new period repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a period, rejecting overlap with any existing period of the
    /// organization.
    ///
    /// # Errors
    ///
    /// Returns `VALIDATION_FAILED` for shape violations and
    /// `BUSINESS_RULE_VIOLATION` listing the conflicting periods on overlap.
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Period, RepositoryError> {
        PeriodService::validate_attributes(name, start_date, end_date)?;

        let session = TenantSession::begin(&self.db, organization_id).await?;

        let existing =
            find_overlapping(session.txn(), organization_id, start_date, end_date).await?;
        PeriodService::check_overlap(start_date, end_date, &existing, None)?;

        let now = Utc::now();
        let period = Period {
            id: PeriodId::new(),
            organization_id,
            name: name.to_string(),
            start_date,
            end_date,
            status: PeriodStatus::Open,
            created_at: now,
            updated_at: now,
        };
        convert::period_to_active(&period).insert(session.txn()).await?;
        session.commit().await?;

        info!(period_id = %period.id, %organization_id, "created period");
        Ok(period)
    }

    /// Updates an open period's attributes, re-running the overlap check
    /// against every other period.
    ///
    /// # Errors
    ///
    /// Returns `BUSINESS_RULE_VIOLATION` if the period is not open or the
    /// new interval overlaps.
    pub async fn update(
        &self,
        organization_id: OrganizationId,
        period_id: PeriodId,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Period, RepositoryError> {
        PeriodService::validate_attributes(name, start_date, end_date)?;

        let session = TenantSession::begin(&self.db, organization_id).await?;

        let current = load_period(session.txn(), period_id).await?;
        PeriodService::validate_editable(&current)?;

        let existing =
            find_overlapping(session.txn(), organization_id, start_date, end_date).await?;
        PeriodService::check_overlap(start_date, end_date, &existing, Some(period_id))?;

        let mut updated = current;
        updated.name = name.to_string();
        updated.start_date = start_date;
        updated.end_date = end_date;
        updated.updated_at = Utc::now();

        let active = convert::period_to_active(&updated);
        active.update(session.txn()).await?;
        session.commit().await?;

        Ok(updated)
    }

    /// Begins closing an open period.
    ///
    /// # Errors
    ///
    /// Returns `BUSINESS_RULE_VIOLATION` for wrong-state transitions.
    pub async fn start_closing(
        &self,
        organization_id: OrganizationId,
        period_id: PeriodId,
    ) -> Result<Period, RepositoryError> {
        self.transition(organization_id, period_id, PeriodStatus::Closing)
            .await
    }

    /// Closes a period that is in `closing`. Terminal.
    ///
    /// # Errors
    ///
    /// Returns `BUSINESS_RULE_VIOLATION` for wrong-state transitions.
    pub async fn close(
        &self,
        organization_id: OrganizationId,
        period_id: PeriodId,
    ) -> Result<Period, RepositoryError> {
        self.transition(organization_id, period_id, PeriodStatus::Closed)
            .await
    }

    /// Reopens a period that is in `closing`.
    ///
    /// # Errors
    ///
    /// Returns `BUSINESS_RULE_VIOLATION` for wrong-state transitions.
    pub async fn reopen(
        &self,
        organization_id: OrganizationId,
        period_id: PeriodId,
    ) -> Result<Period, RepositoryError> {
        self.transition(organization_id, period_id, PeriodStatus::Open)
            .await
    }

    async fn transition(
        &self,
        organization_id: OrganizationId,
        period_id: PeriodId,
        to: PeriodStatus,
    ) -> Result<Period, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;

        let current = load_period(session.txn(), period_id).await?;
        PeriodService::validate_transition(current.status, to)?;

        let mut updated = current;
        updated.status = to;
        updated.updated_at = Utc::now();

        convert::period_to_active(&updated).update(session.txn()).await?;
        session.commit().await?;

        info!(period_id = %period_id, status = ?to, "period transitioned");
        Ok(updated)
    }

    /// Finds a period by id.
    ///
    /// # Errors
    ///
    /// Returns a database error; a missing period is `Ok(None)`.
    pub async fn find_by_id(
        &self,
        organization_id: OrganizationId,
        period_id: PeriodId,
    ) -> Result<Option<Period>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let found = periods::Entity::find_by_id(period_id.into_inner())
            .one(session.txn())
            .await?
            .map(convert::period_from_model);
        session.commit().await?;
        Ok(found)
    }

    /// Lists all periods of the organization, most recent first.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Period>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let found = periods::Entity::find()
            .filter(periods::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_desc(periods::Column::StartDate)
            .all(session.txn())
            .await?
            .into_iter()
            .map(convert::period_from_model)
            .collect();
        session.commit().await?;
        Ok(found)
    }

    /// Finds the period containing `date`, if any.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_by_date(
        &self,
        organization_id: OrganizationId,
        date: NaiveDate,
    ) -> Result<Option<Period>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let found = find_period_for_date(session.txn(), organization_id, date).await?;
        session.commit().await?;
        Ok(found)
    }

    /// Lists the open periods of the organization.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_open_periods(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Period>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let found = periods::Entity::find()
            .filter(periods::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(
                periods::Column::Status
                    .eq(crate::entities::sea_orm_active_enums::PeriodStatus::Open),
            )
            .order_by_asc(periods::Column::StartDate)
            .all(session.txn())
            .await?
            .into_iter()
            .map(convert::period_from_model)
            .collect();
        session.commit().await?;
        Ok(found)
    }

    /// Lists periods intersecting `[start_date, end_date]`, optionally
    /// excluding one id (the period being updated).
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn find_overlapping_periods(
        &self,
        organization_id: OrganizationId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude: Option<PeriodId>,
    ) -> Result<Vec<Period>, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let mut found =
            find_overlapping(session.txn(), organization_id, start_date, end_date).await?;
        if let Some(excluded) = exclude {
            found.retain(|period| period.id != excluded);
        }
        session.commit().await?;
        Ok(found)
    }

    /// Resolves the period a posting on `date` would land in and requires
    /// it to be open.
    ///
    /// # Errors
    ///
    /// Returns `ENTITY_NOT_FOUND` if no period covers the date and
    /// `PERIOD_CLOSED` if the covering period is not open.
    pub async fn find_period_for_posting(
        &self,
        organization_id: OrganizationId,
        date: NaiveDate,
    ) -> Result<Period, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let period = find_period_for_date(session.txn(), organization_id, date)
            .await?
            .ok_or(LedgerError::NoPeriodForDate { date })?;
        PeriodService::validate_for_posting(&period)?;
        session.commit().await?;
        Ok(period)
    }

    /// Loads a period and requires it to be open for posting.
    ///
    /// # Errors
    ///
    /// Returns `ENTITY_NOT_FOUND` or `PERIOD_CLOSED`.
    pub async fn validate_for_posting(
        &self,
        organization_id: OrganizationId,
        period_id: PeriodId,
    ) -> Result<Period, RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;
        let period = load_period(session.txn(), period_id).await?;
        PeriodService::validate_for_posting(&period)?;
        session.commit().await?;
        Ok(period)
    }

    /// Deletes a period. Refused while any journal references it.
    ///
    /// # Errors
    ///
    /// Returns `BUSINESS_RULE_VIOLATION` carrying the journal count if the
    /// period is still referenced.
    pub async fn delete(
        &self,
        organization_id: OrganizationId,
        period_id: PeriodId,
    ) -> Result<(), RepositoryError> {
        let session = TenantSession::begin(&self.db, organization_id).await?;

        let period = load_period(session.txn(), period_id).await?;

        let journal_count = journals::Entity::find()
            .filter(journals::Column::PeriodId.eq(period_id.into_inner()))
            .count(session.txn())
            .await?;
        if journal_count > 0 {
            return Err(LedgerError::PeriodHasJournals {
                period_id,
                journal_count,
            }
            .into());
        }

        periods::Entity::delete_by_id(period.id.into_inner())
            .exec(session.txn())
            .await?;
        session.commit().await?;

        info!(period_id = %period_id, "deleted period");
        Ok(())
    }
}

/// Loads a period inside an existing tenant transaction.
pub(crate) async fn load_period(
    txn: &DatabaseTransaction,
    period_id: PeriodId,
) -> Result<Period, RepositoryError> {
    let model = periods::Entity::find_by_id(period_id.into_inner())
        .one(txn)
        .await?
        .ok_or(LedgerError::PeriodNotFound { period_id })?;
    Ok(convert::period_from_model(model))
}

/// Finds the period containing `date` inside an existing tenant transaction.
pub(crate) async fn find_period_for_date(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    date: NaiveDate,
) -> Result<Option<Period>, RepositoryError> {
    let model = periods::Entity::find()
        .filter(periods::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(periods::Column::StartDate.lte(date))
        .filter(periods::Column::EndDate.gte(date))
        .one(txn)
        .await?;
    Ok(model.map(convert::period_from_model))
}

async fn find_overlapping(
    txn: &DatabaseTransaction,
    organization_id: OrganizationId,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<Period>, RepositoryError> {
    let found = periods::Entity::find()
        .filter(periods::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(periods::Column::StartDate.lte(end_date))
        .filter(periods::Column::EndDate.gte(start_date))
        .all(txn)
        .await?
        .into_iter()
        .map(convert::period_from_model)
        .collect();
    Ok(found)
}
