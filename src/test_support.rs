use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use reqwest::header::HeaderMap;

use crate::error::TransportError;
use crate::providers::clock::Clock;
use crate::providers::transport::{Transport, TransportResponse};

type Outcome = Result<TransportResponse, TransportError>;

/// Serves queued responses per URL; the last one keeps repeating.
/// Unknown URLs answer 404.
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<HashMap<String, VecDeque<Outcome>>>,
    requests: Mutex<Vec<(String, HeaderMap)>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        FakeTransport::default()
    }

    pub(crate) fn add_response(&self, url: &str, status: u16, body: &[u8]) {
        self.add_response_with_headers(url, status, body, HeaderMap::new());
    }

    pub(crate) fn add_response_with_headers(
        &self,
        url: &str,
        status: u16,
        body: &[u8],
        headers: HeaderMap,
    ) {
        self.push(
            url,
            Ok(TransportResponse {
                status,
                headers,
                body: Bytes::copy_from_slice(body),
            }),
        );
    }

    pub(crate) fn add_error(&self, url: &str, error: TransportError) {
        self.push(url, Err(error));
    }

    fn push(&self, url: &str, outcome: Outcome) {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub(crate) fn requests(&self) -> Vec<(String, HeaderMap)> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for FakeTransport {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<TransportResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers));

        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Ok(TransportResponse {
                status: 404,
                ..TransportResponse::default()
            }),
        }
    }
}

/// Clock that only moves when slept on.
pub(crate) struct FakeClock {
    now: Mutex<SystemTime>,
    sleep_periods: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub(crate) fn new() -> Self {
        FakeClock {
            now: Mutex::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_650_000_000)),
            sleep_periods: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn sleep_periods(&self) -> Vec<Duration> {
        self.sleep_periods.lock().unwrap().clone()
    }

    pub(crate) fn times_slept(&self) -> usize {
        self.sleep_periods.lock().unwrap().len()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
        self.sleep_periods.lock().unwrap().push(duration);
    }
}

/// Builds a `.tar.gz` holding `(path, content, mode)` members.
pub(crate) fn tar_gz(members: &[(&str, &str, u32)]) -> Bytes {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, content, mode) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(*mode);
        builder.append_data(&mut header, path, content.as_bytes()).unwrap();
    }
    Bytes::from(builder.into_inner().unwrap().finish().unwrap())
}

/// Single-member archive whose name is written verbatim, bypassing the
/// builder's path validation.
pub(crate) fn tar_gz_with_raw_name(name: &str, content: &[u8]) -> Bytes {
    let mut header = tar::Header::new_old();
    header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(tar::EntryType::Regular);
    header.set_cksum();

    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    builder.append(&header, content).unwrap();
    Bytes::from(builder.into_inner().unwrap().finish().unwrap())
}

/// Hex text that gzip can barely shrink, so cutting an archive in half
/// lands inside the member data.
pub(crate) fn incompressible(len: usize) -> String {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            char::from_digit((state % 16) as u32, 16).unwrap()
        })
        .collect()
}
