//! Version index reconstruction.
//!
//! The `versions` document is never edited in place. Each publish rebuilds it
//! by walking the provider's keys three levels deep:
//!
//! ```text
//! v1/providers/{ns}/{name}/           -> version directories
//!   {version}/download/               -> os directories
//!     {os}/                           -> arch metadata objects
//! ```
//!
//! Every level is sorted before use so the output does not depend on the
//! order a backend happens to list keys in.

use tbr_schema::layout::{ARCH_SEGMENT, OS_SEGMENT, VERSION_SEGMENT, dir_segment, leaf_segment};
use tbr_schema::{Platform, ProviderLayout, ProviderPackage, ProviderVersion, ProviderVersions};
use tracing::{debug, trace};

use crate::store::{ObjectStore, StoreError};

/// Errors that abort an index build.
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// Listing or reading the bucket failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A platform metadata document is not valid JSON.
    #[error("failed to decode package metadata at {key}: {source}")]
    Decode {
        /// Key of the document.
        key: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// What a listed key must look like to count at a given level.
#[derive(Debug, Clone, Copy)]
enum Shape {
    Dir(usize),
    Leaf(usize),
}

impl Shape {
    fn decode(self, key: &str) -> Option<&str> {
        match self {
            Self::Dir(index) => dir_segment(key, index),
            Self::Leaf(index) => leaf_segment(key, index),
        }
    }
}

/// Rebuild the version index for `namespace/name` from the bucket contents.
///
/// Versions without any platform metadata are left out. The protocols of a
/// version are taken from its first platform only.
///
/// # Errors
///
/// Any listing, read or decode failure aborts the whole build.
pub async fn build_index(
    store: &dyn ObjectStore,
    namespace: &str,
    name: &str,
) -> Result<ProviderVersions, IndexError> {
    let layout = ProviderLayout::new(namespace, name);
    let mut index = ProviderVersions::default();

    let versions = children(store, &layout.provider_prefix(), Shape::Dir(VERSION_SEGMENT)).await?;
    for version in versions {
        let mut platforms = Vec::new();

        let systems = children(store, &layout.download_prefix(&version), Shape::Dir(OS_SEGMENT)).await?;
        for os in systems {
            let archs = children(store, &layout.os_prefix(&version, &os), Shape::Leaf(ARCH_SEGMENT)).await?;
            platforms.extend(archs.into_iter().map(|arch| Platform::new(os.clone(), arch)));
        }

        let Some(first) = platforms.first() else {
            debug!(version = %version, "skipping version without platforms");
            continue;
        };

        let protocols = read_protocols(store, &layout.platform_key(&version, first)).await?;
        debug!(version = %version, platforms = platforms.len(), "indexed version");

        index.versions.push(ProviderVersion {
            version,
            protocols,
            platforms,
        });
    }

    Ok(index)
}

/// Names of the children of `prefix` that have the expected shape, sorted.
async fn children(
    store: &dyn ObjectStore,
    prefix: &str,
    shape: Shape,
) -> Result<Vec<String>, StoreError> {
    let mut names: Vec<String> = store
        .list(prefix)
        .await?
        .iter()
        .filter_map(|key| {
            let name = shape.decode(key);
            if name.is_none() {
                trace!(key = %key, "ignoring key with unexpected shape");
            }
            name.map(str::to_string)
        })
        .collect();

    names.sort();
    names.dedup();
    Ok(names)
}

async fn read_protocols(store: &dyn ObjectStore, key: &str) -> Result<Vec<String>, IndexError> {
    let data = store.read(key).await?;
    let package: ProviderPackage = serde_json::from_slice(&data).map_err(|source| IndexError::Decode {
        key: key.to_string(),
        source,
    })?;
    Ok(package.protocols)
}
