use std::path::Path;
use std::process::Command;

/// Short commit hash of the checkout, if this is a git checkout.
fn git_short_sha(repo_root: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8(out.stdout).ok()?.trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    println!("cargo:rerun-if-env-changed=BILLSCAN_BUILD_SHA");

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let repo_root = Path::new(&manifest_dir).join("..");
    let head = repo_root.join(".git").join("HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }

    // Packaged builds without .git can pass the hash in explicitly.
    let sha = std::env::var("BILLSCAN_BUILD_SHA")
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| git_short_sha(&repo_root))
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=BILLSCAN_BUILD_SHA={sha}");
}
