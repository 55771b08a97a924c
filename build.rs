//! Embeds `GIT_SHA` and `BUILD_TIME` for the `/build-info` endpoint.
//!
//! CI can pin both through the environment; local builds ask git and the
//! clock.

use std::env;
use std::process::Command;

use chrono::{SecondsFormat, Utc};

fn main() {
    for var in ["GIT_SHA", "BUILD_TIME"] {
        println!("cargo:rerun-if-env-changed={var}");
    }
    println!("cargo:rerun-if-changed=.git/HEAD");

    println!("cargo:rustc-env=GIT_SHA={}", git_sha());
    println!("cargo:rustc-env=BUILD_TIME={}", build_time());
}

/// Short commit id, suffixed with `-dirty` when tracked files have local
/// changes.
fn git_sha() -> String {
    if let Some(sha) = non_empty_env("GIT_SHA") {
        return sha;
    }
    let Some(sha) = git(&["rev-parse", "--short=12", "HEAD"]) else {
        return "unknown".to_string();
    };
    match git(&["status", "--porcelain", "--untracked-files=no"]) {
        Some(changes) if !changes.is_empty() => format!("{sha}-dirty"),
        _ => sha,
    }
}

fn build_time() -> String {
    non_empty_env("BUILD_TIME")
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|stdout| stdout.trim().to_string())
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
