use std::process::Command;

fn main() {
    let base = env!("CARGO_PKG_VERSION");

    // Try to get short git sha if available
    let mut sha: Option<String> = None;
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        && output.status.success()
    {
        let s = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !s.is_empty() {
            sha = Some(s);
        }
    }
    // Allow override via env (useful in CI without git)
    if sha.is_none()
        && let Ok(s) = std::env::var("GIT_SHA")
        && !s.is_empty()
    {
        sha = Some(s);
    }

    let version = match sha {
        Some(s) => format!("{}+{}", base, s),
        None => base.to_string(),
    };

    println!("cargo:rustc-env=APP_VERSION={}", version);

    println!("cargo:rerun-if-env-changed=GIT_SHA");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
}
