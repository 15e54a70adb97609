use std::time::{Duration, SystemTime};

use log::{debug, warn};
use rand::Rng;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};

use crate::error::{DownloadError, TransportError};
use crate::models::remote_file::RemoteFile;
use crate::providers::clock::{Clock, SystemClock};
use crate::providers::downloader::Downloader;
use crate::providers::transport::{ReqwestTransport, Transport};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Upper bound for the whole request including every wait.
    pub max_request_duration: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 4,
            max_request_duration: Duration::from_secs(30),
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// 1s, 2s, 4s, ... plus a random jitter below `max_jitter`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = Duration::from_secs(1u64 << attempt.min(32));
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::rng().random_range(0..jitter_ms))
    }
}

/// GET with retries on throttling, server errors and connection failures.
#[derive(Debug, Clone, Default)]
pub struct HttpDownloader<T = ReqwestTransport, C = SystemClock> {
    transport: T,
    clock: C,
    policy: RetryPolicy,
}

impl<T, C> HttpDownloader<T, C> {
    pub fn new(transport: T, clock: C) -> Self {
        HttpDownloader {
            transport,
            clock,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

fn should_retry(status: u16) -> bool {
    status == 429 || (500..=504).contains(&status)
}

/// Reads `Retry-After` as either delta-seconds or an HTTP-date.
fn retry_after(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    Some(
        SystemTime::from(date)
            .duration_since(now)
            .unwrap_or(Duration::ZERO),
    )
}

fn request_headers(url: &str, auth_token: Option<&str>) -> Result<HeaderMap, DownloadError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = auth_token.filter(|token| !token.is_empty()) {
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            DownloadError::Transport {
                url: url.to_string(),
                source: TransportError::Other(format!("invalid auth token: {}", e)),
            }
        })?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

impl<T, C> Downloader for HttpDownloader<T, C>
where
    T: Transport + Send + Sync,
    C: Clock + Send + Sync,
{
    async fn fetch(&self, url: &str, auth_token: Option<&str>) -> Result<RemoteFile, DownloadError> {
        let headers = request_headers(url, auth_token)?;
        let deadline = self.clock.now() + self.policy.max_request_duration;
        let mut last_status = String::new();

        for attempt in 0..=self.policy.max_retries {
            let server_wait = match self.transport.get(url, headers.clone()).await {
                Ok(response) if !should_retry(response.status) => {
                    if !(200..300).contains(&response.status) {
                        return Err(DownloadError::UnexpectedStatus {
                            url: url.to_string(),
                            status: response.status,
                        });
                    }
                    debug!("fetched {} ({} bytes)", url, response.body.len());
                    return Ok(RemoteFile {
                        content: response.body,
                        headers: response.headers,
                    });
                }
                Ok(response) => {
                    last_status = response.status.to_string();
                    retry_after(&response.headers, self.clock.now())
                }
                Err(e) if e.is_retryable() => {
                    last_status = e.to_string();
                    None
                }
                Err(e) => {
                    return Err(DownloadError::Transport {
                        url: url.to_string(),
                        source: e,
                    });
                }
            };

            if attempt < self.policy.max_retries {
                let wait = server_wait.unwrap_or_else(|| self.policy.backoff(attempt));
                if self.clock.now() + wait > deadline {
                    return Err(DownloadError::DeadlineExceeded {
                        url: url.to_string(),
                        limit: self.policy.max_request_duration,
                    });
                }
                warn!(
                    "request to {} failed ({}), retrying in {:?}",
                    url, last_status, wait
                );
                self.clock.sleep(wait).await;
            }
        }

        Err(DownloadError::RetriesExhausted {
            url: url.to_string(),
            retries: self.policy.max_retries,
            last_status,
        })
    }
}
