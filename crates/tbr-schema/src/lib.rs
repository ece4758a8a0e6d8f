//! Shared wire documents and key layout for the Terraform bucket registry.
//!
//! Everything a publisher writes and a registry server hands back is one of
//! the documents in [`types`], stored at a key produced by [`layout`]. The
//! layout is the only index the registry has: versions and platforms are
//! recovered by splitting keys on `/` at fixed positions.

pub mod hash;
pub mod layout;
pub mod types;

// Re-exports
pub use hash::Sha256Hash;
pub use layout::ProviderLayout;
pub use types::*;

/// Path of the service discovery document, relative to the bucket root.
pub const DISCOVERY_PATH: &str = ".well-known/terraform.json";

/// Base path advertised for the `providers.v1` protocol.
pub const PROVIDERS_V1_PATH: &str = "/v1/providers/";

/// Provider protocol versions advertised when none are given explicitly.
pub const DEFAULT_PROTOCOLS: [&str; 2] = ["4.0", "5.1"];
