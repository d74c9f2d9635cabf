//! Schema management CLI for the Verity ledger database.
//!
//! Thin wrapper around the sea-orm-migration command line: `up`, `down`,
//! `status`, and `fresh` against the connection named by `DATABASE_URL`.
//! The ledger schema lives in `verity_db::migration`; this binary only
//! drives it.

use sea_orm_migration::prelude::*;

use verity_db::migration::Migrator;

#[tokio::main]
async fn main() {
    // Pick up DATABASE_URL from a local .env during development.
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}
