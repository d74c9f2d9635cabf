//! Schema migrations for the ledger database.
//!
//! One migration module per schema change, named `m{date}_{seq}_{slug}`.
//! The initial migration lays down the whole ledger core: enums, the
//! periods/journals/journal_lines tables, the sealed-journal immutability
//! triggers, and the row-level security policies. Later changes append to
//! the list below; the hash-chain serialization format must never change
//! inside an existing chain, so format revisions always arrive as new
//! migrations plus a new chain version, not edits to old ones.

pub use sea_orm_migration::prelude::*;

mod m20260214_000001_initial;

/// Applies the ledger schema in order.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260214_000001_initial::Migration)]
    }
}
