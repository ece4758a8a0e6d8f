//! JSON documents of the Terraform provider registry protocol.
//!
//! Field names follow the protocol exactly; these types are written by the
//! publisher and served back untouched.

use serde::{Deserialize, Serialize};

use crate::PROVIDERS_V1_PATH;

/// Service discovery document served from [`crate::DISCOVERY_PATH`].
///
/// Terraform fetches this first to learn where the provider registry
/// protocol lives on this host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    /// Base path of the `providers.v1` protocol.
    #[serde(rename = "providers.v1")]
    pub providers_v1: String,
}

impl Default for DiscoveryDocument {
    fn default() -> Self {
        Self {
            providers_v1: PROVIDERS_V1_PATH.to_string(),
        }
    }
}

/// Download metadata for one (version, os, arch) build of a provider.
///
/// Written once by the publisher at `.../download/{os}/{arch}` and served
/// verbatim afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPackage {
    /// Provider protocol versions this build speaks (e.g. `"5.1"`).
    pub protocols: Vec<String>,

    /// Target operating system (e.g. `"linux"`).
    pub os: String,

    /// Target CPU architecture (e.g. `"amd64"`).
    pub arch: String,

    /// Archive filename (e.g. `"terraform-provider-foo_1.2.0_linux_amd64.zip"`).
    pub filename: String,

    /// Public URL of the archive.
    pub download_url: String,

    /// Public URL of the `SHA256SUMS` manifest for this version.
    pub shasums_url: String,

    /// Public URL of the detached signature over the `SHA256SUMS` manifest.
    pub shasums_signature_url: String,

    /// Hex SHA-256 of the archive, as listed in the manifest.
    pub shasum: String,

    /// Keys that may have produced the manifest signature.
    pub signing_keys: SigningKeys,
}

/// Key bundle attached to every package published in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKeys {
    /// ASCII-armored GPG public keys.
    #[serde(default)]
    pub gpg_public_keys: Vec<GpgPublicKey>,
}

/// A single GPG public key as advertised to Terraform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpgPublicKey {
    /// Key identifier (e.g. `"51852D87348FFC4C"`).
    pub key_id: String,

    /// ASCII-armored public key block.
    pub ascii_armor: String,

    /// Optional trust signature for partner providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_signature: Option<String>,

    /// Optional human readable attribution of the key owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Optional URL with more information about the key owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl GpgPublicKey {
    /// Create a key with no trust signature or source attribution.
    pub fn new(key_id: impl Into<String>, ascii_armor: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            ascii_armor: ascii_armor.into(),
            ..Default::default()
        }
    }
}

/// The `versions` document listing every published version of a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderVersions {
    /// Published versions, in lexical order.
    pub versions: Vec<ProviderVersion>,
}

impl ProviderVersions {
    /// Look up a version entry by its version string.
    pub fn get(&self, version: &str) -> Option<&ProviderVersion> {
        self.versions.iter().find(|v| v.version == version)
    }
}

/// One entry of [`ProviderVersions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderVersion {
    /// Version string, taken verbatim from the key layout.
    pub version: String,

    /// Protocols advertised by the first platform of this version.
    pub protocols: Vec<String>,

    /// Every platform with published download metadata.
    #[serde(rename = "platform")]
    pub platforms: Vec<Platform>,
}

/// An (operating system, CPU architecture) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system (e.g. `"darwin"`).
    pub os: String,
    /// CPU architecture (e.g. `"arm64"`).
    pub arch: String,
}

impl Platform {
    /// Create a platform from its parts.
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}
