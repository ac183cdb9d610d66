use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=RAINSTORM_BUILD");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");

    let build = std::env::var("RAINSTORM_BUILD")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(target_label);
    println!("cargo:rustc-env=RAINSTORM_BUILD={build}");

    let sha = git_head()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .and_then(|s| short_hex(&s))
        .unwrap_or_default();
    println!("cargo:rustc-env=RAINSTORM_GIT_SHA={sha}");
}

/// `<os>-<arch>`, e.g. `linux-x86_64`.
fn target_label() -> String {
    let env = |name: &str| std::env::var(name).unwrap_or_else(|_| "unknown".to_string());
    let os = match env("CARGO_CFG_TARGET_OS").as_str() {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    };
    format!("{os}-{}", env("CARGO_CFG_TARGET_ARCH"))
}

fn git_head() -> Option<String> {
    let out = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout).ok()
}

fn short_hex(s: &str) -> Option<String> {
    let s = s.trim();
    let short = &s[..s.len().min(7)];
    if short.is_empty() || !short.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(short.to_ascii_lowercase())
}
