use std::path::PathBuf;

use crate::models::platform::{Platform, release_os};
use crate::providers::binary_fetcher::DEFAULT_BINARY_NAME;

/// Launcher configuration, read from a YAML file.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct File {
    pub version: String,
    #[serde(rename = "destDir")]
    pub dest_dir: String,
    #[serde(default = "default_dest_file", rename = "destFile")]
    pub dest_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "authToken")]
    pub auth_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "stripPrefix")]
    pub strip_prefix: Option<String>,
}

const NATIVE_ARCH: &str = "native";

fn default_dest_file() -> String {
    DEFAULT_BINARY_NAME.to_string()
}

impl File {
    /// Destination directory with a leading `~` expanded.
    pub fn dest_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.dest_dir).as_ref())
    }

    /// Release platform for the host OS. `arch: native` follows the host CPU,
    /// no `arch` at all means the published amd64 build.
    pub fn platform(&self) -> Platform {
        match self.arch.as_deref() {
            Some(NATIVE_ARCH) => Platform::native(),
            Some(arch) => Platform::new(release_os(std::env::consts::OS), arch),
            None => Platform::host(),
        }
    }
}
