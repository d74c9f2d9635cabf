//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for periods, journals, and journal lines
//! - Tenant-scoped repository implementations of the storage contract
//! - The per-organization posting pipeline and chain verification
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod tenant;

pub use repositories::{
    ChainCursor, JournalRepository, PeriodRepository, PostingRepository, RepositoryError,
};
pub use tenant::TenantSession;

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
