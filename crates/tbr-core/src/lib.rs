//! Core library for the Terraform bucket registry.
//!
//! A provider registry that lives entirely in an object storage bucket:
//!
//! - [`publish`] uploads a release and regenerates the provider's index,
//! - [`indexer`] rebuilds that index from nothing but key listings,
//! - [`server`] republishes bucket objects over HTTP, path for key.
//!
//! There is no database and no cache. Every publish re-lists the bucket and
//! every request re-reads it, which keeps the design trivially consistent
//! and is fine for low traffic internal registries.

pub mod checksum;
pub mod config;
pub mod indexer;
pub mod publish;
pub mod server;
pub mod store;

pub use checksum::{ChecksumError, ChecksumManifest, shasum_for};
pub use config::{PublishConfig, ServerConfig, TlsConfig};
pub use indexer::{IndexError, build_index};
pub use publish::{PublishError, PublishReport, publish};
pub use store::{MemoryStore, ObjectStore, OperatorStore, StoreError, open_bucket};
