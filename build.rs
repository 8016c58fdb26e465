//! Stamps `lu --version` with the source revision and build date.
//!
//! Exposed to the crate as `LU_GIT_DESCRIBE` and `LU_BUILD_DATE`. Honors
//! `SOURCE_DATE_EPOCH` so packaged builds are reproducible.

use chrono::{DateTime, Utc};
use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let revision = describe_revision().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=LU_GIT_DESCRIBE={}", revision);
    println!("cargo:rustc-env=LU_BUILD_DATE={}", build_date().format("%Y-%m-%d"));
}

/// Tag-relative revision, e.g. `v0.1.0-3-gabc1234-dirty`, or a bare hash.
fn describe_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn build_date() -> DateTime<Utc> {
    env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}
