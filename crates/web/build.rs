//! Build script for the web crate.
//!
//! Stamps the build time and source revision into the binary for the
//! `/api/version` endpoint.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=HRTAJ_COMMIT_SHA");
    println!("cargo:rerun-if-changed=../../.git/HEAD");

    let commit = env::var("HRTAJ_COMMIT_SHA")
        .ok()
        .filter(|sha| !sha.is_empty())
        .or_else(git_head)
        .unwrap_or_else(|| "unknown".to_owned());
    println!("cargo:rustc-env=HRTAJ_BUILD_COMMIT={commit}");

    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    println!("cargo:rustc-env=HRTAJ_BUILD_TIMESTAMP={timestamp}");
}

/// Short hash of the checked-out commit, if this is a git checkout.
fn git_head() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let sha = String::from_utf8(output.stdout).ok()?;
    let sha = sha.trim();
    (!sha.is_empty()).then(|| sha.to_owned())
}
