// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helper utilities for Docker-based integration tests.

use std::sync::OnceLock;

/// Cached result of Docker availability check.
#[allow(dead_code)]
static DOCKER_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Checks if Docker is available on the system.
///
/// This check is cached after the first call.
#[allow(dead_code)]
pub fn is_docker_available() -> bool {
    *DOCKER_AVAILABLE.get_or_init(|| {
        std::process::Command::new("docker")
            .args(["ps"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    })
}

/// Prints a warning that a test is skipped because Docker is unavailable.
#[allow(dead_code)]
pub fn print_docker_unavailable_warning(test_name: &str) {
    eprintln!("\nSKIPPED: {} - Docker is not available", test_name);
    eprintln!("   Start Docker to run the Redis store tests.\n");
}
