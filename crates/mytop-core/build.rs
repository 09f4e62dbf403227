use std::process::Command;

/// Runs a git command and returns its trimmed stdout, if git succeeded.
fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
}

fn main() {
    // Header shows "<version> (<sha>)"; a dirty tree gets a "+" suffix.
    let sha = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".into());
    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|out| !out.is_empty());
    let build_id = if dirty { format!("{sha}+") } else { sha };

    println!("cargo:rustc-env=MYTOP_BUILD_ID={build_id}");
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/index");
}
