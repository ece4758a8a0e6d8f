//! `opendal` backed store.
//!
//! Services that record a content type with the object (S3, GCS, Azure)
//! get it sent on write and read back from `stat`. Services that cannot,
//! such as the local filesystem, keep it in a `{key}.attrs` JSON sidecar
//! next to the object. Sidecars never appear in listings.

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{ErrorKind, Operator};
use serde::{Deserialize, Serialize};

use super::{DEFAULT_CONTENT_TYPE, ObjectStore, StoreError, StoredObject, normalize_key, object_key};

/// Suffix of the attribute sidecar written beside each object.
const ATTRS_SUFFIX: &str = ".attrs";

/// Object attributes kept in a sidecar when the service has no metadata.
#[derive(Debug, Serialize, Deserialize)]
struct Attributes {
    content_type: String,
}

/// [`ObjectStore`] backed by an `opendal` operator.
#[derive(Debug, Clone)]
pub struct OperatorStore {
    op: Operator,
    sidecar: bool,
}

impl OperatorStore {
    /// Wrap a configured operator.
    pub fn new(op: Operator) -> Self {
        let sidecar = !op.info().full_capability().write_with_content_type;
        Self { op, sidecar }
    }

    fn attrs_key(key: &str) -> String {
        format!("{key}{ATTRS_SUFFIX}")
    }

    async fn sidecar_content_type(&self, key: &str) -> Result<String, StoreError> {
        let attrs_key = Self::attrs_key(key);
        match self.op.read(&attrs_key).await {
            Ok(data) => serde_json::from_slice::<Attributes>(&data)
                .map(|attrs| attrs.content_type)
                .map_err(|e| StoreError::Unavailable {
                    key: attrs_key,
                    message: format!("corrupt attributes for {key}: {e}"),
                }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(DEFAULT_CONTENT_TYPE.to_string()),
            Err(e) => Err(StoreError::from_opendal(&attrs_key, e)),
        }
    }
}

#[async_trait]
impl ObjectStore for OperatorStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let prefix = normalize_key(prefix);
        let entries = match self.op.list(prefix).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::from_opendal(prefix, e)),
        };

        // Some services echo the directory itself back as its first entry.
        Ok(entries
            .into_iter()
            .map(|entry| entry.path().to_string())
            .filter(|path| path != prefix)
            .filter(|path| !(self.sidecar && path.ends_with(ATTRS_SUFFIX)))
            .collect())
    }

    async fn read(&self, key: &str) -> Result<Bytes, StoreError> {
        let key = object_key(key)?;
        let data = self
            .op
            .read(key)
            .await
            .map_err(|e| StoreError::from_opendal(key, e))?;
        Ok(Bytes::from(data))
    }

    async fn open(&self, key: &str) -> Result<StoredObject, StoreError> {
        let key = object_key(key)?;
        let meta = self
            .op
            .stat(key)
            .await
            .map_err(|e| StoreError::from_opendal(key, e))?;
        if meta.is_dir() {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }

        let content_type = if self.sidecar {
            self.sidecar_content_type(key).await?
        } else {
            meta.content_type()
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string()
        };
        let reader = self
            .op
            .reader(key)
            .await
            .map_err(|e| StoreError::from_opendal(key, e))?;

        Ok(StoredObject::new(content_type, reader))
    }

    async fn write(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
        let key = normalize_key(key);
        if !self.sidecar {
            return self
                .op
                .write_with(key, body)
                .content_type(content_type)
                .await
                .map_err(|e| StoreError::from_opendal(key, e));
        }

        self.op
            .write(key, body)
            .await
            .map_err(|e| StoreError::from_opendal(key, e))?;

        let attrs_key = Self::attrs_key(key);
        let attrs = serde_json::to_vec(&Attributes {
            content_type: content_type.to_string(),
        })
        .map_err(|e| StoreError::Unavailable {
            key: attrs_key.clone(),
            message: e.to_string(),
        })?;
        self.op
            .write(&attrs_key, attrs)
            .await
            .map_err(|e| StoreError::from_opendal(&attrs_key, e))
    }
}
