//! Hash computation and chain verification.

use verity_shared::types::{JournalHash, JournalId};

use super::serialize::serialize_journal;
use crate::journal::types::Journal;

/// Stateless service computing and checking sealed journal digests.
pub struct HashService;

impl HashService {
    /// Computes the digest for `journal` chained onto `hash_prev`.
    #[must_use]
    pub fn compute(journal: &Journal, hash_prev: Option<&JournalHash>) -> JournalHash {
        JournalHash::compute(&serialize_journal(journal, hash_prev))
    }

    /// Recomputes a sealed journal's digest from its stored fields and
    /// compares it to the stored `hash_self`.
    ///
    /// Returns false for journals without a sealed hash.
    #[must_use]
    pub fn verify_journal(journal: &Journal) -> bool {
        match journal.hash_self {
            Some(stored) => Self::compute(journal, journal.hash_prev.as_ref()) == stored,
            None => false,
        }
    }

    /// Verifies a whole chain presented in canonical order
    /// (`posted_at` ascending, then `journal_number` ascending).
    #[must_use]
    pub fn verify_chain<'a, I>(journals: I) -> ChainVerification
    where
        I: IntoIterator<Item = &'a Journal>,
    {
        let mut verifier = ChainVerifier::new();
        for journal in journals {
            verifier.push(journal);
        }
        verifier.finish()
    }
}

/// Outcome of a chain walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerification {
    /// True iff every node verified and every link held.
    pub is_valid: bool,
    /// Number of sealed journals examined.
    pub total_journals: u64,
    /// Journals whose recomputed digest differs from the stored one.
    pub invalid_journals: Vec<JournalId>,
    /// First journal whose `hash_prev` does not match its predecessor's
    /// sealed digest, if any.
    pub broken_chain_at: Option<JournalId>,
}

/// Streaming chain verifier.
///
/// Holds only the running previous digest, so arbitrarily long chains can
/// be verified from a batched repository cursor without materializing them.
#[derive(Debug, Default)]
pub struct ChainVerifier {
    expected_prev: Option<JournalHash>,
    total: u64,
    invalid: Vec<JournalId>,
    broken_at: Option<JournalId>,
}

impl ChainVerifier {
    /// Creates a verifier positioned at the chain head
    /// (`hash_prev` expected to be absent).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next journal in canonical order.
    pub fn push(&mut self, journal: &Journal) {
        self.total += 1;

        if self.broken_at.is_none() && journal.hash_prev != self.expected_prev {
            self.broken_at = Some(journal.id);
        }

        if !HashService::verify_journal(journal) {
            self.invalid.push(journal.id);
        }

        // Advance along the stored digests: a single bad node must not
        // cascade into failures for every successor.
        self.expected_prev = journal.hash_self;
    }

    /// Closes the walk and returns the verdict.
    #[must_use]
    pub fn finish(self) -> ChainVerification {
        ChainVerification {
            is_valid: self.invalid.is_empty() && self.broken_at.is_none(),
            total_journals: self.total,
            invalid_journals: self.invalid,
            broken_chain_at: self.broken_at,
        }
    }
}
