//! Bucket key layout.
//!
//! ```text
//! .well-known/terraform.json
//! v1/providers/{namespace}/{name}/versions
//! v1/providers/{namespace}/{name}/{version}/terraform-provider-{name}_{version}_SHA256SUMS
//! v1/providers/{namespace}/{name}/{version}/terraform-provider-{name}_{version}_SHA256SUMS.sig
//! v1/providers/{namespace}/{name}/{version}/download/{filename}
//! v1/providers/{namespace}/{name}/{version}/download/{os}/{arch}
//! ```
//!
//! Every key splits on `/` into fixed positions, which is how the index
//! builder recovers versions and platforms without any side index.

use crate::Platform;

/// Root of the provider registry protocol inside the bucket.
pub const PROVIDERS_ROOT: &str = "v1/providers";

/// Segment index of the version in a provider key.
pub const VERSION_SEGMENT: usize = 4;
/// Segment index of the operating system in a platform metadata key.
pub const OS_SEGMENT: usize = 6;
/// Segment index of the architecture in a platform metadata key.
pub const ARCH_SEGMENT: usize = 7;

/// Key builder for one `{namespace}/{name}` provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderLayout<'a> {
    namespace: &'a str,
    name: &'a str,
}

impl<'a> ProviderLayout<'a> {
    /// Layout for the provider `namespace/name`.
    pub fn new(namespace: &'a str, name: &'a str) -> Self {
        Self { namespace, name }
    }

    /// Provider namespace.
    pub fn namespace(&self) -> &'a str {
        self.namespace
    }

    /// Provider type name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// `v1/providers/{ns}/{name}/`, the parent of every version.
    pub fn provider_prefix(&self) -> String {
        format!("{PROVIDERS_ROOT}/{}/{}/", self.namespace, self.name)
    }

    /// Key of the `versions` index document.
    pub fn versions_key(&self) -> String {
        format!("{PROVIDERS_ROOT}/{}/{}/versions", self.namespace, self.name)
    }

    /// `.../{version}/`
    pub fn version_prefix(&self, version: &str) -> String {
        format!("{}{version}/", self.provider_prefix())
    }

    /// `.../{version}/download/`, the parent of archives and OS directories.
    pub fn download_prefix(&self, version: &str) -> String {
        format!("{}download/", self.version_prefix(version))
    }

    /// `.../{version}/download/{os}/`
    pub fn os_prefix(&self, version: &str, os: &str) -> String {
        format!("{}{os}/", self.download_prefix(version))
    }

    /// Key of the download metadata document for one platform.
    pub fn platform_key(&self, version: &str, platform: &Platform) -> String {
        format!(
            "{}{}",
            self.os_prefix(version, &platform.os),
            platform.arch
        )
    }

    /// Key the archive `filename` is uploaded to.
    pub fn artifact_key(&self, version: &str, filename: &str) -> String {
        format!("{}{filename}", self.download_prefix(version))
    }

    /// Key of the checksum manifest.
    pub fn shasums_key(&self, version: &str) -> String {
        format!(
            "{}{}",
            self.version_prefix(version),
            shasums_filename(self.name, version)
        )
    }

    /// Key of the detached checksum manifest signature.
    pub fn shasums_signature_key(&self, version: &str) -> String {
        format!("{}.sig", self.shasums_key(version))
    }
}

/// `terraform-provider-{name}_{version}_`, the prefix every archive shares.
pub fn artifact_prefix(name: &str, version: &str) -> String {
    format!("terraform-provider-{name}_{version}_")
}

/// Filename of the checksum manifest produced by the release build.
pub fn shasums_filename(name: &str, version: &str) -> String {
    format!("terraform-provider-{name}_{version}_SHA256SUMS")
}

/// Recover the platform from an archive filename.
///
/// Returns `None` unless the part between the archive prefix and `.zip` is
/// exactly two non-empty `_`-separated components.
///
/// ```
/// use tbr_schema::layout::platform_from_filename;
///
/// let p = platform_from_filename("terraform-provider-foo_1.2.0_linux_amd64.zip", "foo", "1.2.0").unwrap();
/// assert_eq!((p.os.as_str(), p.arch.as_str()), ("linux", "amd64"));
/// assert!(platform_from_filename("terraform-provider-foo_1.2.0_linux.zip", "foo", "1.2.0").is_none());
/// ```
pub fn platform_from_filename(filename: &str, name: &str, version: &str) -> Option<Platform> {
    let os_arch = filename
        .strip_prefix(&artifact_prefix(name, version))?
        .strip_suffix(".zip")?;

    let mut parts = os_arch.split('_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(os), Some(arch), None) if !os.is_empty() && !arch.is_empty() => {
            Some(Platform::new(os, arch))
        }
        _ => None,
    }
}

/// Segment `index` of a listed child directory key.
///
/// The key must have exactly `index + 1` non-empty segments followed by a
/// trailing `/`; anything else is not a directory at that depth.
pub fn dir_segment(key: &str, index: usize) -> Option<&str> {
    let trimmed = key.strip_suffix('/')?;
    leaf_segment(trimmed, index)
}

/// Segment `index` of a listed leaf object key.
///
/// The key must have exactly `index + 1` non-empty segments and no trailing
/// `/`.
pub fn leaf_segment(key: &str, index: usize) -> Option<&str> {
    let segments: Vec<&str> = key.split('/').collect();
    if segments.len() != index + 1 || segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ProviderLayout<'static> {
        ProviderLayout::new("acme", "foo")
    }

    #[test]
    fn keys_follow_registry_layout() {
        let l = layout();
        assert_eq!(l.versions_key(), "v1/providers/acme/foo/versions");
        assert_eq!(
            l.platform_key("1.2.0", &Platform::new("linux", "amd64")),
            "v1/providers/acme/foo/1.2.0/download/linux/amd64"
        );
        assert_eq!(
            l.artifact_key("1.2.0", "terraform-provider-foo_1.2.0_linux_amd64.zip"),
            "v1/providers/acme/foo/1.2.0/download/terraform-provider-foo_1.2.0_linux_amd64.zip"
        );
        assert_eq!(
            l.shasums_signature_key("1.2.0"),
            "v1/providers/acme/foo/1.2.0/terraform-provider-foo_1.2.0_SHA256SUMS.sig"
        );
    }

    #[test]
    fn segments_decode_at_fixed_positions() {
        let l = layout();
        let version_dir = l.version_prefix("1.2.0");
        assert_eq!(dir_segment(&version_dir, VERSION_SEGMENT), Some("1.2.0"));

        let os_dir = l.os_prefix("1.2.0", "darwin");
        assert_eq!(dir_segment(&os_dir, OS_SEGMENT), Some("darwin"));

        let leaf = l.platform_key("1.2.0", &Platform::new("darwin", "arm64"));
        assert_eq!(leaf_segment(&leaf, ARCH_SEGMENT), Some("arm64"));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let l = layout();
        // The versions document sits beside version directories but is a leaf.
        assert_eq!(dir_segment(&l.versions_key(), VERSION_SEGMENT), None);
        // Archives sit beside OS directories but are leaves.
        let archive = l.artifact_key("1.2.0", "x.zip");
        assert_eq!(dir_segment(&archive, OS_SEGMENT), None);
        // A nested directory under an OS is not an arch.
        assert_eq!(
            leaf_segment("v1/providers/acme/foo/1.2.0/download/linux/amd64/", ARCH_SEGMENT),
            None
        );
        assert_eq!(dir_segment("v1/providers/acme/foo//", VERSION_SEGMENT), None);
    }

    #[test]
    fn filename_without_arch_is_skipped() {
        assert!(platform_from_filename("terraform-provider-foo_1.2.0_linux.zip", "foo", "1.2.0").is_none());
        assert!(
            platform_from_filename("terraform-provider-foo_1.2.0_linux_amd64_v2.zip", "foo", "1.2.0")
                .is_none()
        );
        assert!(platform_from_filename("terraform-provider-bar_1.2.0_linux_amd64.zip", "foo", "1.2.0").is_none());
        assert!(platform_from_filename("terraform-provider-foo_1.2.0__amd64.zip", "foo", "1.2.0").is_none());
    }
}
