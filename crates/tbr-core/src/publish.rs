//! Publishing a provider release into a bucket.
//!
//! A release directory produced by the provider build looks like:
//!
//! ```text
//! dist/
//! ├── terraform-provider-foo_1.2.0_darwin_arm64.zip
//! ├── terraform-provider-foo_1.2.0_linux_amd64.zip
//! ├── terraform-provider-foo_1.2.0_SHA256SUMS
//! └── terraform-provider-foo_1.2.0_SHA256SUMS.sig
//! ```
//!
//! [`publish`] uploads each archive with its download metadata, then the
//! checksum files, then regenerates the provider's `versions` document from
//! whatever the bucket now holds. Uploads are independent writes; a failed
//! run is recovered by running it again.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;
use tbr_schema::layout::platform_from_filename;
use tbr_schema::{
    DISCOVERY_PATH, DiscoveryDocument, Platform, ProviderPackage, ProviderVersions, Sha256Hash,
    SigningKeys,
};
use tracing::{debug, info};

use crate::checksum::{ChecksumError, ChecksumManifest};
use crate::config::PublishConfig;
use crate::indexer::{IndexError, build_index};
use crate::store::{ObjectStore, StoreError};

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_ZIP: &str = "application/zip";
const CONTENT_TYPE_TEXT: &str = "text/plain";
const CONTENT_TYPE_BINARY: &str = "application/octet-stream";

/// Errors that abort a publish run.
#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    /// The dist directory holds no archives for this name and version.
    #[error("no files found matching {pattern}")]
    NoArtifactsFound {
        /// Glob that was searched.
        pattern: String,
    },

    /// The archive glob could not be compiled.
    #[error("invalid artifact pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A local file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The checksum manifest is malformed or lacks an archive.
    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    /// An archive does not hash to the digest its manifest lists.
    #[error("checksum mismatch for {artifact}: manifest lists {expected}, file hashes to {actual}")]
    ChecksumMismatch {
        /// Archive filename.
        artifact: String,
        /// Digest from the manifest.
        expected: Sha256Hash,
        /// Digest of the local file.
        actual: Sha256Hash,
    },

    /// An upload failed.
    #[error("upload failed: {0}")]
    Store(#[from] StoreError),

    /// Rebuilding the version index failed.
    #[error("failed to rebuild version index: {0}")]
    Index(#[from] IndexError),

    /// A document could not be serialised.
    #[error("failed to encode {what}: {source}")]
    Encode {
        /// Kind of document.
        what: &'static str,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    /// Platforms uploaded in this run, in upload order.
    pub published: Vec<Platform>,
    /// Archives whose names did not decompose into an os and arch.
    pub skipped: Vec<String>,
    /// The regenerated version index, as uploaded.
    pub index: ProviderVersions,
}

/// Publish one provider release from `config.dist_dir` into `store`.
///
/// Local inputs (archives, checksum manifest, signature) are all located and
/// the manifest parsed before anything is written.
///
/// # Errors
///
/// Returns [`PublishError::NoArtifactsFound`] before any write if the dist
/// directory has no matching archives. Checksum problems, local I/O and
/// store failures abort the run wherever they happen, leaving earlier writes
/// in place.
pub async fn publish(
    store: &dyn ObjectStore,
    config: &PublishConfig,
) -> Result<PublishReport, PublishError> {
    let layout = config.layout();
    let version = config.version.as_str();

    let artifacts = find_artifacts(config)?;

    let shasums = read_local(&config.shasums_path()).await?;
    let signature = read_local(&config.shasums_signature_path()).await?;
    let manifest = ChecksumManifest::parse(&shasums)?;

    let shasums_key = layout.shasums_key(version);
    let signature_key = layout.shasums_signature_key(version);
    let signing_keys = SigningKeys {
        gpg_public_keys: vec![config.signing_key.clone()],
    };

    write_json(store, DISCOVERY_PATH, &DiscoveryDocument::default(), "discovery document").await?;

    let mut report = PublishReport::default();

    for path in &artifacts {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            debug!(path = %path.display(), "skipping artifact with non UTF-8 name");
            report.skipped.push(path.display().to_string());
            continue;
        };

        let Some(platform) = platform_from_filename(filename, &config.name, version) else {
            debug!(file = %filename, "skipping artifact without os/arch suffix");
            report.skipped.push(filename.to_string());
            continue;
        };

        let expected = manifest.shasum_for(filename)?.clone();
        let body = read_local(path).await?;
        let actual = Sha256Hash::compute(&body);
        if !expected.matches(&actual) {
            return Err(PublishError::ChecksumMismatch {
                artifact: filename.to_string(),
                expected,
                actual,
            });
        }

        let download_key = layout.artifact_key(version, filename);
        upload(store, &download_key, body, CONTENT_TYPE_ZIP).await?;

        let package = ProviderPackage {
            protocols: config.protocols.clone(),
            os: platform.os.clone(),
            arch: platform.arch.clone(),
            filename: filename.to_string(),
            download_url: config.public_url(&download_key),
            shasums_url: config.public_url(&shasums_key),
            shasums_signature_url: config.public_url(&signature_key),
            shasum: expected.into_inner(),
            signing_keys: signing_keys.clone(),
        };
        write_json(store, &layout.platform_key(version, &platform), &package, "package metadata").await?;

        report.published.push(platform);
    }

    upload(store, &shasums_key, shasums, CONTENT_TYPE_TEXT).await?;
    upload(store, &signature_key, signature, CONTENT_TYPE_BINARY).await?;

    let index = build_index(store, layout.namespace(), layout.name()).await?;
    write_json(store, &layout.versions_key(), &index, "version index").await?;
    report.index = index;

    info!(
        provider = %format!("{}/{}", config.namespace, config.name),
        version = %version,
        platforms = report.published.len(),
        skipped = report.skipped.len(),
        "published release"
    );

    Ok(report)
}

/// Archives in the dist directory for this name and version, sorted by path.
fn find_artifacts(config: &PublishConfig) -> Result<Vec<PathBuf>, PublishError> {
    let pattern = config.artifact_pattern();

    let mut paths = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(|e| PublishError::Io {
            path: e.path().to_path_buf(),
            source: e.into(),
        })?;
        if path.is_file() {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(PublishError::NoArtifactsFound { pattern });
    }

    paths.sort();
    Ok(paths)
}

async fn read_local(path: &Path) -> Result<Bytes, PublishError> {
    tokio::fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|source| PublishError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn upload(
    store: &dyn ObjectStore,
    key: &str,
    body: Bytes,
    content_type: &str,
) -> Result<(), StoreError> {
    info!(key = %key, bytes = body.len(), "uploading");
    store.write(key, body, content_type).await
}

async fn write_json<T: Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    document: &T,
    what: &'static str,
) -> Result<(), PublishError> {
    let body = serde_json::to_vec_pretty(document).map_err(|source| PublishError::Encode { what, source })?;
    upload(store, key, Bytes::from(body), CONTENT_TYPE_JSON).await?;
    Ok(())
}
