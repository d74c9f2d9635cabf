//! The journal aggregate and its validation rules.
//!
//! A journal is one double-entry transaction: an ordered set of balanced
//! debit and credit lines, immutable once posted. The journal exclusively
//! owns its lines; lines are only ever mutated through the aggregate.

pub mod number;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use types::{CreateJournalInput, CreateJournalLineInput, Journal, JournalLine, JournalStatus};
