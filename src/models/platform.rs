use std::collections::HashMap;
use std::fmt;

static ARCH_MAPPING: std::sync::LazyLock<HashMap<&str, &str>> = std::sync::LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("x86_64", "amd64");
    map.insert("aarch64", "arm64");
    map
});

static OS_MAPPING: std::sync::LazyLock<HashMap<&str, &str>> = std::sync::LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("macos", "darwin");
    map
});

/// Only amd64 archives are published for auth_server.
pub const DEFAULT_ARCH: &str = "amd64";

/// OS and CPU architecture as they appear in release archive names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Platform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Host OS with the published architecture, regardless of the host CPU.
    pub fn host() -> Self {
        Platform::new(release_os(std::env::consts::OS), DEFAULT_ARCH)
    }

    /// Host OS and host CPU architecture.
    pub fn native() -> Self {
        Platform::new(
            release_os(std::env::consts::OS),
            release_arch(std::env::consts::ARCH),
        )
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::host()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}

/// Maps a Rust OS name to the release naming, e.g. `macos` to `darwin`.
pub fn release_os(os: &str) -> String {
    OS_MAPPING.get(os).copied().unwrap_or(os).to_string()
}

/// Maps a Rust architecture name to the release naming, e.g. `x86_64` to `amd64`.
pub fn release_arch(arch: &str) -> String {
    ARCH_MAPPING.get(arch).copied().unwrap_or(arch).to_string()
}
