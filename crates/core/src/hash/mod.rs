//! Canonical serialization and the per-organization hash chain.
//!
//! Every posted or reversed journal carries a SHA-256 digest over a frozen,
//! deterministic rendering of its immutable fields folded together with the
//! previous journal's digest. The chain makes the ledger tamper-evident:
//! changing any sealed field changes the digest, and changing a digest
//! breaks the link to the successor.

pub mod serialize;
pub mod service;

#[cfg(test)]
mod service_props;

pub use service::{ChainVerification, ChainVerifier, HashService};
