use crate::error::DownloadError;
use crate::models::remote_file::RemoteFile;

pub trait Downloader {
    /// Fetches `url`, sending `auth_token` as a bearer token when present.
    fn fetch(
        &self,
        url: &str,
        auth_token: Option<&str>,
    ) -> impl std::future::Future<Output = Result<RemoteFile, DownloadError>> + Send;
}
