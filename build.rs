//! Build script: embeds the git hash and sanity-checks GPU feature flags
//! before whisper-rs-sys starts its long compile.

use std::process::Command;

fn main() {
    // Embed git short hash for version string
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        && output.status.success()
    {
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=GIT_HASH={}", hash);
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");

    if cfg!(feature = "cuda") {
        check_tool(
            "nvcc",
            &["--version"],
            "CUDA toolkit not found (nvcc missing). Install cuda-toolkit or build without --features cuda.",
        );
    }
    if cfg!(feature = "vulkan") {
        check_tool(
            "glslc",
            &["--version"],
            "Vulkan shader compiler not found (glslc missing). Install shaderc/vulkan-sdk or build without --features vulkan.",
        );
    }
}

/// Warn early when a required build tool is absent; whisper-rs-sys would
/// otherwise fail minutes later with a much less helpful error.
fn check_tool(tool: &str, args: &[&str], hint: &str) {
    match Command::new(tool).args(args).output() {
        Ok(out) if out.status.success() => {}
        _ => {
            println!("cargo::warning={}", hint);
        }
    }
}
