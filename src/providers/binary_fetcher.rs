use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use log::{debug, info};
use sha2::Digest;

use crate::error::Error;
use crate::models::platform::Platform;
use crate::providers::downloader::Downloader;
use crate::providers::extractor::{ExtractOptions, Extractor};
use crate::providers::http_downloader::HttpDownloader;
use crate::providers::tar_gz_extractor::TarGzExtractor;

/// Name of the executable inside the release archive.
pub const DEFAULT_ARCHIVED_BINARY_NAME: &str = "auth_server.stripped";
pub const DEFAULT_BINARY_NAME: &str = "auth_server";

// e.g. https://github.com/dio/authservice/releases/download/v0.6.0-rc0/auth_server_0.6.0-rc0_darwin_amd64.tar.gz
const RELEASES_URL: &str = "https://github.com/dio/authservice/releases/download";

/// Archive URL of `version` for the host OS.
pub fn archive_url(version: &str) -> String {
    archive_url_for(version, &Platform::host())
}

pub fn archive_url_for(version: &str, platform: &Platform) -> String {
    format!(
        "{}/v{}/auth_server_{}_{}_{}.tar.gz",
        RELEASES_URL, version, version, platform.os, platform.arch
    )
}

/// Downloads `version` into `dest_dir` with the default HTTP client and
/// returns the path of `dest_dir/dest_file`.
pub async fn versioned_binary(
    version: &str,
    dest_dir: &Path,
    dest_file: &str,
) -> Result<PathBuf, Error> {
    let fetcher: BinaryFetcher = BinaryFetcher::default();
    fetcher
        .ensure_versioned_binary(version, dest_dir, dest_file)
        .await
}

#[derive(Debug, Clone, Default)]
pub struct BinaryFetcher<D = HttpDownloader, E = TarGzExtractor> {
    downloader: D,
    extractor: E,
    platform: Platform,
    auth_token: Option<String>,
    sha256: Option<String>,
    extract_options: Option<ExtractOptions>,
}

impl<D, E> BinaryFetcher<D, E>
where
    D: Downloader,
    E: Extractor,
{
    pub fn new(downloader: D, extractor: E) -> Self {
        BinaryFetcher {
            downloader,
            extractor,
            platform: Platform::host(),
            auth_token: None,
            sha256: None,
            extract_options: None,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Rejects archives whose SHA-256 differs from `sha256` (hex).
    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract_options = Some(options);
        self
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Makes sure `dest_dir/dest_file` holds an executable `auth_server` of
    /// `version` and returns that path.
    ///
    /// Every step whose result is already on disk is skipped, so repeated
    /// calls download at most once. A staging file left by an interrupted
    /// call is picked up instead of downloading again. Concurrent calls on
    /// the same directory are not coordinated.
    pub async fn ensure_versioned_binary(
        &self,
        version: &str,
        dest_dir: &Path,
        dest_file: &str,
    ) -> Result<PathBuf, Error> {
        tokio::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o750)
            .create(dest_dir)
            .await
            .map_err(|source| Error::DirectoryCreate {
                path: dest_dir.to_path_buf(),
                source,
            })?;

        let destination_path = dest_dir.join(dest_file);
        if exists(&destination_path).await {
            debug!("{} is already installed", destination_path.display());
            return Ok(destination_path);
        }

        let downloaded_binary_path = dest_dir.join(DEFAULT_ARCHIVED_BINARY_NAME);
        if exists(&downloaded_binary_path).await {
            debug!(
                "reusing previously extracted {}",
                downloaded_binary_path.display()
            );
        } else {
            self.download_and_extract(version, dest_dir, &downloaded_binary_path)
                .await?;
        }
        make_executable(&downloaded_binary_path).await?;

        if !exists(&destination_path).await {
            tokio::fs::rename(&downloaded_binary_path, &destination_path)
                .await
                .map_err(|source| Error::Rename {
                    from: downloaded_binary_path.clone(),
                    to: destination_path.clone(),
                    source,
                })?;
        }
        info!("auth_server {} installed at {}", version, destination_path.display());
        Ok(destination_path)
    }

    async fn download_and_extract(
        &self,
        version: &str,
        dest_dir: &Path,
        downloaded_binary_path: &Path,
    ) -> Result<(), Error> {
        let url = archive_url_for(version, &self.platform);
        info!("Downloading {}", url);
        let remote_file = self
            .downloader
            .fetch(&url, self.auth_token.as_deref())
            .await
            .map_err(|source| Error::RemoteFetch {
                url: url.clone(),
                source,
            })?;

        if let Some(expected) = &self.sha256 {
            verify_sha256(&url, &remote_file.content, expected)?;
        }

        if let Err(source) = self
            .extractor
            .extract(&remote_file.content, dest_dir, self.extract_options.as_ref())
            .await
        {
            // A half-written staging file would be picked up by the next call.
            let _ = tokio::fs::remove_file(downloaded_binary_path).await;
            return Err(Error::Extraction { url, source });
        }

        if !exists(downloaded_binary_path).await {
            return Err(Error::ExtractionVerification {
                url,
                path: downloaded_binary_path.to_path_buf(),
            });
        }
        Ok(())
    }
}

async fn make_executable(path: &Path) -> Result<(), Error> {
    let permissions = std::fs::Permissions::from_mode(0o755);
    tokio::fs::set_permissions(path, permissions)
        .await
        .map_err(|source| Error::Permission {
            path: path.to_path_buf(),
            source,
        })
}

fn verify_sha256(url: &str, content: &Bytes, expected: &str) -> Result<(), Error> {
    let mut hasher = sha2::Sha256::new();
    hasher.update(content);
    let actual = format!("{:x}", hasher.finalize());
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(Error::ChecksumMismatch {
            url: url.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

async fn exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}
