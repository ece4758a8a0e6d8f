//! In-process bucket

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use super::{ObjectStore, StoreError, StoredObject, normalize_key, object_key};

/// A stored object and the content type it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryObject {
    /// Object bytes.
    pub body: Bytes,
    /// Content type given at write time.
    pub content_type: String,
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<String, MemoryObject>,
    // Keys (or list prefixes) whose operations fail with the given message.
    failures: HashMap<String, String>,
}

/// In-process [`ObjectStore`].
///
/// Clones share the same objects. Unlike most `opendal` services this keeps
/// the content type of every object, and failures can be injected per key to
/// exercise backend error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object without going through the async trait.
    pub fn insert(&self, key: &str, body: impl Into<Bytes>, content_type: &str) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.objects.insert(
            normalize_key(key).to_string(),
            MemoryObject {
                body: body.into(),
                content_type: content_type.to_string(),
            },
        );
    }

    /// Make every later read, open or list of `key` fail with `message`.
    pub fn fail(&self, key: &str, message: &str) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner
            .failures
            .insert(normalize_key(key).to_string(), message.to_string());
    }

    /// Copy of every stored object, keyed and ordered by key.
    pub fn snapshot(&self) -> BTreeMap<String, MemoryObject> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.objects.clone()
    }

    /// Every stored key, in lexical order.
    pub fn keys(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.objects.keys().cloned().collect()
    }

    fn lookup(&self, key: &str) -> Result<MemoryObject, StoreError> {
        let key = object_key(key)?;
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        check_failure(&inner, key)?;
        inner
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }
}

fn check_failure(inner: &Inner, key: &str) -> Result<(), StoreError> {
    match inner.failures.get(key) {
        Some(message) => Err(StoreError::Unavailable {
            key: key.to_string(),
            message: message.clone(),
        }),
        None => Ok(()),
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let prefix = normalize_key(prefix);
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        check_failure(&inner, prefix)?;

        let mut children = BTreeSet::new();
        for key in inner.objects.keys().filter(|k| k.starts_with(prefix)) {
            let rest = &key[prefix.len()..];
            match rest.find('/') {
                Some(end) => {
                    children.insert(format!("{prefix}{}", &rest[..=end]));
                }
                None if !rest.is_empty() => {
                    children.insert(key.clone());
                }
                None => {}
            }
        }

        Ok(children.into_iter().collect())
    }

    async fn read(&self, key: &str) -> Result<Bytes, StoreError> {
        self.lookup(key).map(|object| object.body)
    }

    async fn open(&self, key: &str) -> Result<StoredObject, StoreError> {
        let MemoryObject { body, content_type } = self.lookup(key)?;
        let body = futures::stream::once(async move { Ok::<_, std::io::Error>(body) });
        Ok(StoredObject::new(content_type, body))
    }

    async fn write(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
        self.insert(key, body, content_type);
        Ok(())
    }
}
