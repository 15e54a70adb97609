use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Failure of a single `ensure_versioned_binary` call. Nothing is retried or rolled back.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not create directory {}: {source}", path.display())]
    DirectoryCreate { path: PathBuf, source: io::Error },

    #[error("failed to read remote file: {url}: {source}")]
    RemoteFetch { url: String, source: DownloadError },

    #[error("SHA256 mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("failed to extract the remote file from: {url}: {source}")]
    Extraction { url: String, source: ExtractError },

    #[error("archive from {url} did not contain {}", path.display())]
    ExtractionVerification { url: String, path: PathBuf },

    #[error("could not chmod file {}: {source}", path.display())]
    Permission { path: PathBuf, source: io::Error },

    #[error("failed to rename {} to: {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Failure reported by a `Downloader` after its own retries.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: TransportError },

    #[error("unexpected status code while reading {url}: {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("unable to complete request to {url} after {retries} retries. Most recent status: {last_status}")]
    RetriesExhausted {
        url: String,
        retries: u32,
        last_status: String,
    },

    #[error("unable to complete request to {url} within {limit:?}")]
    DeadlineExceeded { url: String, limit: Duration },
}

/// Failure of a single HTTP exchange.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Connection and timeout failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("archive is corrupted: {0}")]
    Corrupted(io::Error),

    #[error("entry '{}' escapes {}", entry.display(), folder.display())]
    UnsafePath { entry: PathBuf, folder: PathBuf },

    #[error("failed to write {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
