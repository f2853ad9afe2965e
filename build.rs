use std::process::Command;

fn git(args: &[&str]) -> Option<std::process::Output> {
    Command::new("git").args(args).output().ok()
}

fn main() {
    let pkg_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();

    // `<crate version>+<short hash>[-dirty]`, or just the crate version outside git
    let build_version = match git(&["rev-parse", "--short", "HEAD"]) {
        Some(out) if out.status.success() => {
            let hash = String::from_utf8_lossy(&out.stdout).trim().to_string();
            let dirty = git(&["diff", "--quiet"])
                .map(|o| !o.status.success())
                .unwrap_or(false);
            if dirty {
                format!("{}+{}-dirty", pkg_version, hash)
            } else {
                format!("{}+{}", pkg_version, hash)
            }
        }
        _ => pkg_version,
    };

    println!("cargo:rustc-env=GIT_HASH={}", build_version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
}
