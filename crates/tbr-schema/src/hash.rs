//! Content hashes for release archives

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Newtype for a hex SHA-256 digest as it appears in a `SHA256SUMS` manifest.
///
/// Not validated on construction: manifest lines are trusted for shape only,
/// and comparisons go through [`Sha256Hash::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Wrap an existing hex string without validation.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Compute the SHA-256 of `data` as lowercase hex.
    pub fn compute(data: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(data)))
    }

    /// Case-insensitive comparison of two digests.
    pub fn matches(&self, other: &Sha256Hash) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the hash, returning the hex string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Hash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Sha256Hash {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Sha256Hash {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
