//! Scripted in-memory transport for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{Result, TrendfeedError};
use crate::fetcher::{FetchResponse, Fetcher};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Status(u16, String),
    NetworkError,
    /// The transport itself panics.
    Panic,
}

impl Reply {
    pub(crate) fn ok(body: &str) -> Self {
        Reply::Status(200, body.to_string())
    }

    pub(crate) fn not_found() -> Self {
        Reply::Status(404, "Not Found".to_string())
    }
}

/// Replies are consumed in order per URL; the last one repeats. Unknown URLs
/// get a 404.
pub(crate) struct FakeFetcher {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Duration,
}

impl FakeFetcher {
    pub(crate) fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn route(self, url: &str, replies: Vec<Reply>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == url).count()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, url: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or_else(Reply::not_found),
            None => Reply::not_found(),
        }
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        self.calls.lock().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }

        let reply = self.next_reply(url);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Reply::Status(200, body) => Ok(FetchResponse::ok(body)),
            Reply::Status(status, body) => Ok(FetchResponse {
                status,
                reason: "Error".to_string(),
                body,
            }),
            Reply::NetworkError => Err(TrendfeedError::Other("connection reset".to_string())),
            Reply::Panic => panic!("transport bug fetching {}", url),
        }
    }
}

/// Backoff sleeper that returns immediately.
pub(crate) struct InstantSleeper;

#[async_trait]
impl crate::readme::Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}
