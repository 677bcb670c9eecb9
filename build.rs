//! Stamps git state into the binary for `parley --version`.

use std::process::Command;

/// Run git with `args`, returning trimmed stdout on success.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    for path in [".git/HEAD", ".git/refs/heads/", ".git/refs/tags/"] {
        println!("cargo:rerun-if-changed={path}");
    }

    let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
    let dirty = git(&["status", "--porcelain"]).is_some_and(|status| !status.is_empty());
    let tagged = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();

    let suffix = if dirty { "-dirty" } else { "" };
    println!("cargo:rustc-env=PARLEY_GIT_HASH={hash}{suffix}");
    println!("cargo:rustc-env=PARLEY_IS_RELEASE={tagged}");
}
