//! terraform-bucket-registry - Terraform providers served straight from a bucket
//!
//! # Overview
//!
//! `publish` uploads a provider release built by the usual goreleaser setup
//! and regenerates the provider's version index. `server` exposes the bucket
//! over HTTP(S) so Terraform can use it as a registry host. Hosts that can
//! serve the bucket directly (a static website bucket behind a CDN) do not
//! need `server` at all.
//!
//! # Bucket URLs
//!
//! ```text
//! s3://my-bucket?region=eu-west-1
//! gs://my-bucket
//! file:///var/lib/registry
//! mem://
//! ```

#![allow(clippy::missing_errors_doc)]

pub mod cmd;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tbr_core::{PublishConfig, ServerConfig, TlsConfig};
use tbr_schema::{DEFAULT_PROTOCOLS, GpgPublicKey};

/// Release tag this binary was built from.
pub const VERSION: &str = env!("TBR_VERSION");

/// Commit this binary was built from.
pub const COMMIT: &str = env!("TBR_COMMIT");

/// Terraform Bucket Registry publishes Terraform providers to blob storage
#[derive(Debug, Parser)]
#[command(name = "terraform-bucket-registry")]
#[command(author, version = VERSION)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Publish a built Terraform provider to a bucket
    Publish(PublishArgs),
    /// Serve a Terraform registry from a bucket
    Server(ServerArgs),
    /// Print the version number of terraform-bucket-registry
    Version,
}

/// Publish a built Terraform provider to a bucket
#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Name of the Terraform provider to publish
    #[arg(long, env = "TBR_NAME")]
    pub name: String,

    /// Namespace of the Terraform provider to publish
    #[arg(long, env = "TBR_NAMESPACE")]
    pub namespace: String,

    /// Version of the provider to publish
    #[arg(long, env = "TBR_PROVIDER_VERSION")]
    pub version: String,

    /// Directory of the built provider to publish
    #[arg(long, env = "TBR_DIST_DIR", default_value = "./dist")]
    pub dist_dir: PathBuf,

    /// Destination bucket to publish the provider to
    #[arg(long, env = "TBR_DESTINATION")]
    pub destination: String,

    /// URL Terraform uses to reach the bucket
    #[arg(long, env = "TBR_BUCKET_URL")]
    pub bucket_url: String,

    /// GPG key id that signed the SHA256SUMS file
    #[arg(long, env = "TBR_GPG_KEY_ID")]
    pub gpg_key_id: String,

    /// ASCII-armored public key file
    #[arg(long, env = "TBR_GPG_PUBLIC_KEY_FILE")]
    pub gpg_public_key_file: PathBuf,

    /// Supported provider protocols
    #[arg(
        long = "provider-protocol",
        env = "TBR_PROVIDER_PROTOCOLS",
        value_delimiter = ',',
        default_values_t = DEFAULT_PROTOCOLS.map(String::from)
    )]
    pub provider_protocols: Vec<String>,
}

impl PublishArgs {
    /// Freeze the arguments into a run configuration.
    pub fn into_config(self, ascii_armor: String) -> PublishConfig {
        PublishConfig {
            namespace: self.namespace,
            name: self.name,
            version: self.version,
            dist_dir: self.dist_dir,
            bucket_url: self.bucket_url,
            signing_key: GpgPublicKey::new(self.gpg_key_id, ascii_armor),
            protocols: self.provider_protocols,
        }
    }
}

/// Serve a Terraform registry from a bucket
#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Bucket to serve, in the same form as `publish --destination`
    #[arg(long, env = "TBR_SERVER_BUCKET")]
    pub bucket_url: String,

    /// Path to the TLS certificate (public key) in PEM format
    #[arg(long, env = "TBR_TLS_PUBLIC_KEY", requires = "tls_private_key")]
    pub tls_public_key: Option<PathBuf>,

    /// Path to the TLS private key in PEM format
    #[arg(long, env = "TBR_TLS_PRIVATE_KEY", requires = "tls_public_key")]
    pub tls_private_key: Option<PathBuf>,

    /// Port to listen on (defaults to 443 with TLS, 80 without)
    #[arg(long, env = "TBR_PORT")]
    pub port: Option<u16>,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        let tls = match (args.tls_public_key, args.tls_private_key) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path,
                key_path,
            }),
            _ => None,
        };
        Self {
            bucket_url: args.bucket_url,
            tls,
            port: args.port,
        }
    }
}

/// Line printed by the `version` command.
pub fn version_line() -> String {
    format!("Terraform Bucket Registry {VERSION} -- {COMMIT}")
}
