//! Build metadata for `carjoin --version`.

use std::env;
use std::process::Command;

/// Trimmed stdout of a successful `git` invocation.
fn git(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout).ok().map(|s| s.trim().to_owned())
}

fn main() {
    for path in ["../../.git/HEAD", "../../.git/refs/heads", "../../.git/index"] {
        println!("cargo:rerun-if-changed={path}");
    }
    println!("cargo:rerun-if-env-changed=CARJOIN_BUILD_REV");

    // Source tarballs have no .git; packagers can pass the revision in.
    let revision = env::var("CARJOIN_BUILD_REV")
        .ok()
        .filter(|rev| !rev.is_empty())
        .or_else(|| {
            let hash = git(&["rev-parse", "--short=7", "HEAD"])?;
            let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
                .is_some_and(|status| !status.is_empty());
            Some(if dirty { format!("{hash}-dirty") } else { hash })
        })
        .unwrap_or_else(|| "unknown".into());

    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".into());
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".into());

    println!("cargo:rustc-env=CARJOIN_GIT_HASH={revision}");
    println!("cargo:rustc-env=CARJOIN_TARGET={target}");
    println!("cargo:rustc-env=CARJOIN_PROFILE={profile}");
}
