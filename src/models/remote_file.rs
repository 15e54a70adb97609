use bytes::Bytes;
use reqwest::header::HeaderMap;

/// Body and response headers of a successful fetch.
#[derive(Debug, Clone, Default)]
pub struct RemoteFile {
    pub content: Bytes,
    pub headers: HeaderMap,
}
