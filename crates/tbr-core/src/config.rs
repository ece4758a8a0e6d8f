//! Run configuration.
//!
//! Built once from the command line and passed by reference into the
//! publisher and the server; nothing here changes after startup.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use tbr_schema::GpgPublicKey;
use tbr_schema::layout::{ProviderLayout, artifact_prefix, shasums_filename};

/// Everything a single `publish` run needs.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Provider namespace (e.g. `"acme"`).
    pub namespace: String,
    /// Provider type name, without the `terraform-provider-` prefix.
    pub name: String,
    /// Version being published.
    pub version: String,
    /// Directory holding the release archives and checksum files.
    pub dist_dir: PathBuf,
    /// Public base URL Terraform uses to reach the bucket.
    pub bucket_url: String,
    /// Key advertised as having signed the checksum manifest.
    pub signing_key: GpgPublicKey,
    /// Provider protocol versions the release supports.
    pub protocols: Vec<String>,
}

impl PublishConfig {
    /// Key layout for this provider.
    pub fn layout(&self) -> ProviderLayout<'_> {
        ProviderLayout::new(&self.namespace, &self.name)
    }

    /// Glob matching the release archives in `dist_dir`.
    pub fn artifact_pattern(&self) -> String {
        let dir = glob::Pattern::escape(&self.dist_dir.to_string_lossy());
        let prefix = glob::Pattern::escape(&artifact_prefix(&self.name, &self.version));
        format!("{dir}/{prefix}*.zip")
    }

    /// Local path of the checksum manifest.
    pub fn shasums_path(&self) -> PathBuf {
        self.dist_dir
            .join(shasums_filename(&self.name, &self.version))
    }

    /// Local path of the detached checksum manifest signature.
    pub fn shasums_signature_path(&self) -> PathBuf {
        self.dist_dir.join(format!(
            "{}.sig",
            shasums_filename(&self.name, &self.version)
        ))
    }

    /// Public URL of a bucket key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.bucket_url.trim_end_matches('/'))
    }
}

/// PEM certificate chain and private key for the HTTPS listener.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Certificate chain (the "public key" file).
    pub cert_path: PathBuf,
    /// Private key.
    pub key_path: PathBuf,
}

/// Registry server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bucket to serve, as accepted by [`crate::store::open_bucket`].
    pub bucket_url: String,
    /// Serve HTTPS when set.
    pub tls: Option<TlsConfig>,
    /// Override of the listening port.
    pub port: Option<u16>,
}

impl ServerConfig {
    /// 443 with TLS, 80 without, unless overridden.
    pub fn port(&self) -> u16 {
        self.port
            .unwrap_or(if self.tls.is_some() { 443 } else { 80 })
    }

    /// Address to bind on all interfaces.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port()))
    }
}
