//! Shared fixtures for publisher and server tests.

#![allow(dead_code)]

use std::path::Path;

use tbr_core::PublishConfig;
use tbr_schema::{GpgPublicKey, Sha256Hash};
use tempfile::TempDir;

pub const NAMESPACE: &str = "acme";
pub const NAME: &str = "foo";
pub const BUCKET_URL: &str = "https://registry.example.com";
pub const KEY_ID: &str = "51852D87348FFC4C";
pub const ARMOR: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----\nmQENBF\n-----END PGP PUBLIC KEY BLOCK-----\n";

/// A release build directory on disk.
pub struct Release {
    pub dir: TempDir,
    pub version: String,
}

impl Release {
    /// Write archives for `platforms` plus a matching SHA256SUMS and signature.
    pub fn new(version: &str, platforms: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().expect("failed to create dist dir");
        let mut sums = String::new();

        for (os, arch) in platforms {
            let filename = format!("terraform-provider-{NAME}_{version}_{os}_{arch}.zip");
            let body = archive_body(version, os, arch);
            std::fs::write(dir.path().join(&filename), &body).expect("failed to write archive");
            sums.push_str(&format!("{}  {filename}\n", Sha256Hash::compute(&body)));
        }

        std::fs::write(dir.path().join(shasums_name(version)), sums).expect("failed to write sums");
        std::fs::write(
            dir.path().join(format!("{}.sig", shasums_name(version))),
            format!("signature over {version}"),
        )
        .expect("failed to write signature");

        Self {
            dir,
            version: version.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Drop a file into the dist directory.
    pub fn add_file(&self, filename: &str, body: &[u8]) {
        std::fs::write(self.dir.path().join(filename), body).expect("failed to write file");
    }

    /// Replace the checksum manifest.
    pub fn set_shasums(&self, content: &str) {
        std::fs::write(self.dir.path().join(shasums_name(&self.version)), content)
            .expect("failed to write sums");
    }

    pub fn config(&self) -> PublishConfig {
        PublishConfig {
            namespace: NAMESPACE.to_string(),
            name: NAME.to_string(),
            version: self.version.clone(),
            dist_dir: self.dir.path().to_path_buf(),
            bucket_url: BUCKET_URL.to_string(),
            signing_key: GpgPublicKey::new(KEY_ID, ARMOR),
            protocols: vec!["4.0".to_string(), "5.1".to_string()],
        }
    }
}

pub fn shasums_name(version: &str) -> String {
    format!("terraform-provider-{NAME}_{version}_SHA256SUMS")
}

/// Deterministic fake archive contents.
pub fn archive_body(version: &str, os: &str, arch: &str) -> Vec<u8> {
    format!("PK\u{3}\u{4} {NAME} {version} {os} {arch}").into_bytes()
}
