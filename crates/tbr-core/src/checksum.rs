//! `SHA256SUMS` manifest parsing.
//!
//! The manifest is produced by the release build (`sha256sum` output), one
//! `{digest}  {filename}` line per archive. It is machine generated, so any
//! line that does not have exactly that shape is a hard error rather than
//! something to skip.

use tbr_schema::Sha256Hash;

/// Separator between digest and filename on a manifest line.
const FIELD_SEPARATOR: &str = "  ";

/// Errors raised while reading a checksum manifest.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChecksumError {
    /// A non-empty line is not `{digest}  {filename}`.
    #[error("malformed checksum manifest at line {line}: {content:?}")]
    MalformedManifest {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        content: String,
    },

    /// The manifest has no entry for the artifact.
    #[error("couldn't match shasum for {artifact}")]
    ChecksumNotFound {
        /// Archive filename that was looked up.
        artifact: String,
    },
}

/// One manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumEntry {
    /// Hex digest as written in the manifest.
    pub digest: Sha256Hash,
    /// Archive filename.
    pub filename: String,
}

/// A parsed `SHA256SUMS` manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: Vec<ChecksumEntry>,
}

impl ChecksumManifest {
    /// Parse manifest bytes.
    ///
    /// Blank lines are ignored and a trailing `\r` is tolerated; every other
    /// line must hold exactly two non-empty fields.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::MalformedManifest`] for the first line that
    /// does not have that shape.
    pub fn parse(content: &[u8]) -> Result<Self, ChecksumError> {
        let text = String::from_utf8_lossy(content);
        let mut entries = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
            match fields.as_slice() {
                [digest, filename] if !digest.is_empty() && !filename.is_empty() => {
                    entries.push(ChecksumEntry {
                        digest: Sha256Hash::new(*digest),
                        filename: (*filename).to_string(),
                    });
                }
                _ => {
                    return Err(ChecksumError::MalformedManifest {
                        line: idx + 1,
                        content: line.to_string(),
                    });
                }
            }
        }

        Ok(Self { entries })
    }

    /// Digest listed for `filename`. The first matching line wins.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::ChecksumNotFound`] if no line names the file.
    pub fn shasum_for(&self, filename: &str) -> Result<&Sha256Hash, ChecksumError> {
        self.entries
            .iter()
            .find(|entry| entry.filename == filename)
            .map(|entry| &entry.digest)
            .ok_or_else(|| ChecksumError::ChecksumNotFound {
                artifact: filename.to_string(),
            })
    }

    /// All entries in manifest order.
    pub fn entries(&self) -> &[ChecksumEntry] {
        &self.entries
    }
}

/// Parse `manifest` and look up the digest for `artifact_filename`.
///
/// # Errors
///
/// See [`ChecksumManifest::parse`] and [`ChecksumManifest::shasum_for`].
pub fn shasum_for(artifact_filename: &str, manifest: &[u8]) -> Result<Sha256Hash, ChecksumError> {
    ChecksumManifest::parse(manifest)?
        .shasum_for(artifact_filename)
        .cloned()
}
