//! `SeaORM` entity definitions.

pub mod journal_lines;
pub mod journals;
pub mod periods;
pub mod sea_orm_active_enums;
