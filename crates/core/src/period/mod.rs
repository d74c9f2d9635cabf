//! Accounting periods and their lifecycle.
//!
//! A period is the time window that controls whether postings are accepted.
//! Periods of one organization never overlap, and only open periods accept
//! postings or edits.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::PeriodService;
pub use types::{Period, PeriodStatus};
