//! Publish command

use anyhow::{Context, Result};
use tbr_core::open_bucket;

use crate::PublishArgs;

/// Publish a release from the dist directory and rebuild the version index.
pub async fn publish(args: PublishArgs) -> Result<()> {
    let destination = args.destination.clone();
    let key_file = args.gpg_public_key_file.clone();

    let store = open_bucket(&destination)
        .with_context(|| format!("failed to open bucket {destination}"))?;

    let ascii_armor = tokio::fs::read_to_string(&key_file)
        .await
        .with_context(|| format!("failed to read public key {}", key_file.display()))?;

    let config = args.into_config(ascii_armor);
    let report = tbr_core::publish(store.as_ref(), &config).await?;

    for skipped in &report.skipped {
        tracing::warn!(file = %skipped, "skipped artifact without os/arch suffix");
    }
    for platform in &report.published {
        println!("  published {}/{} {} ({platform})", config.namespace, config.name, config.version);
    }
    println!("  index: {} versions", report.index.versions.len());

    Ok(())
}
