use std::sync::Arc;

use crate::app::Result;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::readme::{Sleeper, TokioSleeper};

/// Shared collaborators for one process run: the HTTP transport and the
/// backoff sleeper used by the README enricher.
#[derive(Clone)]
pub struct AppContext {
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub sleeper: Arc<dyn Sleeper + Send + Sync>,
}

impl AppContext {
    pub fn new() -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new()?);
        Ok(Self::with_parts(fetcher, Arc::new(TokioSleeper)))
    }

    pub fn with_parts(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        sleeper: Arc<dyn Sleeper + Send + Sync>,
    ) -> Self {
        Self { fetcher, sleeper }
    }
}
