//! `SeaORM` active enums mapped onto `PostgreSQL` enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of an accounting period.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "period_status")]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Open for postings and edits.
    #[sea_orm(string_value = "open")]
    Open,
    /// Being closed; no postings, may still reopen.
    #[sea_orm(string_value = "closing")]
    Closing,
    /// Closed. Terminal.
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// Lifecycle status of a journal.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_status")]
#[serde(rename_all = "lowercase")]
pub enum JournalStatus {
    /// Mutable draft.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Posted and hash-sealed.
    #[sea_orm(string_value = "posted")]
    Posted,
    /// Neutralized by a reversal; still hash-sealed.
    #[sea_orm(string_value = "reversed")]
    Reversed,
}
