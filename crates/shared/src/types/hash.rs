//! The SHA-256 digest type backing the journal hash chain.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Error parsing a stored hash column.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashParseError {
    /// The string is not 64 characters long.
    #[error("Journal hash must be 64 hex characters, got {0}")]
    InvalidLength(usize),

    /// The string contains a non-lowercase-hex character.
    #[error("Journal hash must be lowercase hex: {0}")]
    InvalidCharacter(String),
}

/// A sealed journal digest: 32 bytes of SHA-256, carried as 64-char
/// lowercase hex wherever it crosses a storage or wire boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JournalHash([u8; 32]);

impl JournalHash {
    /// Computes the SHA-256 digest of the given canonical bytes.
    #[must_use]
    pub fn compute(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(digest.into())
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Renders the digest as 64-char lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for JournalHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for JournalHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(HashParseError::InvalidLength(s.len()));
        }
        if s.bytes()
            .any(|b| !matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(HashParseError::InvalidCharacter(s.to_string()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| HashParseError::InvalidCharacter(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for JournalHash {
    type Error = HashParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JournalHash> for String {
    fn from(hash: JournalHash) -> Self {
        hash.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_compute_matches_known_vector() {
        // SHA-256 of the empty string.
        let hash = JournalHash::compute(b"");
        assert_eq!(
            hash.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_display_is_64_lowercase_hex() {
        let hash = JournalHash::compute(b"verity");
        let hex = hash.to_string();
        assert_eq!(hex.len(), 64);
        assert!(hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
    }

    #[test]
    fn test_from_str_roundtrip() {
        let hash = JournalHash::compute(b"roundtrip");
        let parsed = JournalHash::from_str(&hash.to_string()).unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn test_from_str_rejects_uppercase_and_short() {
        assert!(matches!(
            JournalHash::from_str("abc"),
            Err(HashParseError::InvalidLength(3))
        ));
        let uppercase = "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855";
        assert!(matches!(
            JournalHash::from_str(uppercase),
            Err(HashParseError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn test_distinct_inputs_distinct_digests() {
        assert_ne!(JournalHash::compute(b"a"), JournalHash::compute(b"b"));
    }
}
