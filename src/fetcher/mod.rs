pub mod http_fetcher;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::app::Result;

/// A completed HTTP exchange. Non-success statuses are returned here rather
/// than as errors so callers can decide whether to retry or fail.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Fetcher {
    /// Issue a GET request. Transport-level failures are `Err`.
    async fn get(&self, url: &str) -> Result<FetchResponse>;
}
