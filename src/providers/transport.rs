use bytes::Bytes;
use reqwest::header::{HeaderMap, USER_AGENT};

use crate::error::TransportError;

/// Status, headers and body of one HTTP exchange.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Issues a single GET. Retrying is the caller's business.
pub trait Transport {
    fn get(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> impl std::future::Future<Output = Result<TransportResponse, TransportError>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        ReqwestTransport { client }
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<TransportResponse, TransportError> {
        let user_agent = format!("authservice-binary/{}", env!("CARGO_PKG_VERSION"));
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .headers(headers)
            .send()
            .await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
