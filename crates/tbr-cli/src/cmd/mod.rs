//! Subcommand implementations

pub mod publish;
pub mod server;
pub mod version;
