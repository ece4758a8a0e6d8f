//! Build script to derive version and commit from git
//!
//! Lets `terraform-bucket-registry version` report the release tag and
//! commit it was built from without keeping Cargo.toml in sync with tags.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn main() {
    // Rerun if git HEAD changes. The repository root is two levels up.
    let head = std::path::Path::new("../../.git/HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    } else {
        println!("cargo:rerun-if-changed=build.rs");
    }

    let version = git(&["describe", "--tags", "--dirty=-dev"])
        .map(|v| format!("v{}", v.trim_start_matches('v')))
        .unwrap_or_else(|| format!("v{}", env!("CARGO_PKG_VERSION")));
    let commit = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "HEAD".to_string());

    println!("cargo:rustc-env=TBR_VERSION={version}");
    println!("cargo:rustc-env=TBR_COMMIT={commit}");
}
