//! Object storage abstraction.
//!
//! The registry keeps no state of its own: every document lives in a bucket
//! and is reached through [`ObjectStore`]. Two backends are provided:
//!
//! - [`OperatorStore`] wraps an `opendal` operator (S3, GCS, Azure Blob,
//!   local files).
//! - [`MemoryStore`] keeps objects in process, for tests and `mem://` buckets.
//!
//! Keys use `/` as the hierarchy separator. Leading slashes are stripped so
//! that an HTTP request path maps onto the same key the publisher wrote.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use futures::stream::{BoxStream, Stream};
use opendal::Operator;
use opendal::services::{Azblob, Fs, Gcs, S3};
use url::Url;

mod memory;
mod operator;

pub use memory::{MemoryObject, MemoryStore};
pub use operator::OperatorStore;

/// Content type used when a backend does not record one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Streamed object body.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Errors returned by object store backends.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// No object exists at `key`.
    #[error("object not found: {key}")]
    NotFound {
        /// Normalised key that was requested.
        key: String,
    },

    /// The backend refused or failed the operation.
    #[error("{message}")]
    Unavailable {
        /// Normalised key that was requested.
        key: String,
        /// Backend supplied detail.
        message: String,
    },

    /// Error raised by an `opendal` service.
    #[error(transparent)]
    Backend(#[from] opendal::Error),

    /// The bucket URL names a driver this build does not support.
    #[error("unsupported bucket scheme '{0}' (expected s3, gs, azblob, file or mem)")]
    UnsupportedScheme(String),

    /// The bucket URL could not be interpreted.
    #[error("invalid bucket url '{url}': {reason}")]
    InvalidUrl {
        /// URL as given.
        url: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl StoreError {
    /// Whether this error means the key simply does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Backend(err) => err.kind() == opendal::ErrorKind::NotFound,
            _ => false,
        }
    }

    pub(crate) fn from_opendal(key: &str, err: opendal::Error) -> Self {
        if err.kind() == opendal::ErrorKind::NotFound {
            Self::NotFound {
                key: key.to_string(),
            }
        } else {
            Self::Backend(err)
        }
    }
}

/// An object opened for streaming.
pub struct StoredObject {
    /// Content type recorded when the object was written.
    pub content_type: String,
    /// Object bytes. Dropping the stream abandons the backend read.
    pub body: ByteStream,
}

impl StoredObject {
    /// Wrap a byte stream.
    pub fn new<S>(content_type: impl Into<String>, body: S) -> Self
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + 'static,
    {
        Self {
            content_type: content_type.into(),
            body: Box::pin(body),
        }
    }

    /// Drain the body into a single buffer.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error raised by the stream.
    pub async fn into_bytes(self) -> std::io::Result<Bytes> {
        let chunks: Vec<Bytes> = self.body.try_collect().await?;
        Ok(Bytes::from(chunks.concat()))
    }
}

impl std::fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredObject")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Minimal bucket capability the registry is built on.
///
/// There is deliberately no delete: published objects are only ever
/// overwritten.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// List the immediate children of `prefix`, using `/` as delimiter.
    ///
    /// Child directories are returned with a trailing `/`, leaf objects
    /// without. The prefix itself is never returned, and a prefix with no
    /// children yields an empty list. Order is backend defined.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Read a whole object.
    async fn read(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Open an object for streaming, together with its content type.
    async fn open(&self, key: &str) -> Result<StoredObject, StoreError>;

    /// Create or overwrite an object.
    async fn write(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError>;
}

/// Strip leading `/` so request paths and stored keys agree.
pub fn normalize_key(key: &str) -> &str {
    key.trim_start_matches('/')
}

/// Normalise a key that must name a leaf object.
///
/// Empty keys and directory-shaped keys cannot hold objects and are reported
/// as not found.
pub(crate) fn object_key(key: &str) -> Result<&str, StoreError> {
    let key = normalize_key(key);
    if key.is_empty() || key.ends_with('/') {
        return Err(StoreError::NotFound {
            key: key.to_string(),
        });
    }
    Ok(key)
}

/// Open a bucket from a URL.
///
/// Supported schemes:
///
/// - `s3://bucket?region=us-east-1&endpoint=https://...` (credentials from
///   the usual AWS environment variables)
/// - `gs://bucket` (credentials from the environment)
/// - `azblob://container?endpoint=https://...` (account and key from
///   `AZURE_STORAGE_ACCOUNT` and `AZURE_STORAGE_KEY`; the endpoint defaults to
///   the account's public blob endpoint)
/// - `file:///absolute/path`
/// - `mem://` (process local, empty on open)
///
/// # Errors
///
/// Returns [`StoreError::InvalidUrl`] or [`StoreError::UnsupportedScheme`]
/// for URLs that cannot be mapped onto a backend, and
/// [`StoreError::Backend`] if the backend rejects its configuration.
pub fn open_bucket(bucket_url: &str) -> Result<Arc<dyn ObjectStore>, StoreError> {
    let url = Url::parse(bucket_url).map_err(|e| StoreError::InvalidUrl {
        url: bucket_url.to_string(),
        reason: e.to_string(),
    })?;

    let invalid = |reason: &str| StoreError::InvalidUrl {
        url: bucket_url.to_string(),
        reason: reason.to_string(),
    };

    let store: Arc<dyn ObjectStore> = match url.scheme() {
        "mem" => Arc::new(MemoryStore::new()),
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|()| invalid("file url must name an absolute path"))?;
            let mut builder = Fs::default();
            builder.root(&path.to_string_lossy());
            Arc::new(OperatorStore::new(Operator::new(builder)?.finish()))
        }
        "s3" => {
            let bucket = url
                .host_str()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| invalid("missing bucket name"))?;
            let mut builder = S3::default();
            builder.bucket(bucket);
            for (key, value) in url.query_pairs() {
                match key.as_ref() {
                    "region" => {
                        builder.region(&value);
                    }
                    "endpoint" => {
                        builder.endpoint(&value);
                    }
                    _ => {}
                }
            }
            Arc::new(OperatorStore::new(Operator::new(builder)?.finish()))
        }
        "gs" => {
            let bucket = url
                .host_str()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| invalid("missing bucket name"))?;
            let mut builder = Gcs::default();
            builder.bucket(bucket);
            Arc::new(OperatorStore::new(Operator::new(builder)?.finish()))
        }
        "azblob" => {
            let container = url
                .host_str()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| invalid("missing container name"))?;
            let account = std::env::var("AZURE_STORAGE_ACCOUNT").ok();
            let endpoint = url
                .query_pairs()
                .find(|(key, _)| key == "endpoint")
                .map(|(_, value)| value.into_owned())
                .or_else(|| {
                    account
                        .as_ref()
                        .map(|name| format!("https://{name}.blob.core.windows.net"))
                })
                .ok_or_else(|| invalid("set AZURE_STORAGE_ACCOUNT or an endpoint query parameter"))?;

            let mut builder = Azblob::default();
            builder.container(container).endpoint(&endpoint);
            if let Some(name) = &account {
                builder.account_name(name);
            }
            if let Ok(key) = std::env::var("AZURE_STORAGE_KEY") {
                builder.account_key(&key);
            }
            Arc::new(OperatorStore::new(Operator::new(builder)?.finish()))
        }
        other => return Err(StoreError::UnsupportedScheme(other.to_string())),
    };

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_slashes_are_stripped() {
        assert_eq!(normalize_key("/v1/providers/"), "v1/providers/");
        assert_eq!(normalize_key("v1/providers"), "v1/providers");
    }

    #[test]
    fn directory_keys_are_not_objects() {
        assert!(object_key("/").unwrap_err().is_not_found());
        assert!(object_key("v1/providers/").unwrap_err().is_not_found());
        assert_eq!(object_key("/v1/x").unwrap(), "v1/x");
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let err = open_bucket("ftp://bucket").unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn azblob_url_requires_container() {
        let err = open_bucket("azblob:///path").unwrap_err();
        assert!(matches!(err, StoreError::InvalidUrl { .. }));
    }

    #[test]
    fn s3_url_requires_bucket() {
        let err = open_bucket("s3:///path").unwrap_err();
        assert!(matches!(err, StoreError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn mem_url_opens_empty_store() {
        let store = open_bucket("mem://").unwrap();
        assert!(store.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_url_round_trips_objects() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_directory_path(dir.path()).unwrap();
        let store = open_bucket(url.as_str()).unwrap();

        store
            .write("a/b/c", Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();

        assert_eq!(store.read("/a/b/c").await.unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(store.list("a/").await.unwrap(), vec!["a/b/".to_string()]);
        assert!(store.read("a/missing").await.unwrap_err().is_not_found());
        assert!(store.list("nothing/here/").await.unwrap().is_empty());
    }
}
