//! Posting and reversal transitions.
//!
//! Posting seals a draft: revalidate every invariant, fold the previous
//! sealed digest into this journal's digest, and flip the status. A posted
//! journal is never edited again; mistakes are neutralized by posting a
//! mirror journal and marking the original `reversed`.

pub mod reversal;
pub mod service;


pub use reversal::{ReversalInput, ReversalService};
pub use service::PostingService;
