//! README enrichment.
//!
//! Each record's README is fetched from the raw content host, trying the
//! `main` branch and then `master`. Every branch gets a first attempt plus
//! `max_retries` retries with exponential backoff. A record whose README
//! cannot be fetched gets [`README_PLACEHOLDER`]; enrichment never fails.
//!
//! Records are processed either one at a time or as tokio tasks gated by a
//! semaphore. Each result is written back to the record it came from, so
//! output order always matches input order. A record whose fetch panics
//! gets the placeholder in either mode.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::domain::TrendingRecord;
use crate::fetcher::Fetcher;

pub const README_PLACEHOLDER: &str = "README not available.";
pub const TRUNCATION_NOTICE: &str = "\n\n... (README truncated)";
pub const BRANCHES: [&str; 2] = ["main", "master"];

/// Delay before retry number `retry` (0-based): 1s, 2s, 4s, ...
pub fn backoff_delay(retry: u32) -> Duration {
    Duration::from_secs(1u64 << retry.min(20))
}

/// Cut `text` to `max` characters and append [`TRUNCATION_NOTICE`]. Text at
/// or under the limit is returned unchanged.
pub fn summarize(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_NOTICE),
    }
}

/// Waits between retries. Injected so tests do not spend wall-clock time.
#[async_trait]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichOptions {
    pub readme_base_url: String,
    pub max_length: usize,
    pub max_retries: u32,
    pub concurrency: usize,
    pub parallel: bool,
}

impl From<&Settings> for EnrichOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            readme_base_url: settings.readme_base_url.clone(),
            max_length: settings.max_readme_length,
            max_retries: settings.max_retries,
            concurrency: settings.concurrency.max(1),
            parallel: settings.parallel,
        }
    }
}

#[derive(Clone)]
pub struct ReadmeEnricher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    sleeper: Arc<dyn Sleeper + Send + Sync>,
    options: EnrichOptions,
}

impl ReadmeEnricher {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        sleeper: Arc<dyn Sleeper + Send + Sync>,
        options: EnrichOptions,
    ) -> Self {
        Self {
            fetcher,
            sleeper,
            options,
        }
    }

    pub fn readme_url(&self, owner: &str, repo: &str, branch: &str) -> String {
        format!(
            "{}/{}/{}/{}/README.md",
            self.options.readme_base_url.trim_end_matches('/'),
            owner,
            repo,
            branch
        )
    }

    /// Fill in `record.readme`.
    pub async fn enrich(&self, record: &mut TrendingRecord) {
        record.readme = self.readme_for(record).await;
    }

    /// Enrich every record, sequentially or concurrently per the options.
    pub async fn enrich_all(&self, records: &mut [TrendingRecord]) {
        if records.is_empty() {
            return;
        }

        if self.options.parallel {
            info!(
                "Fetching {} READMEs with up to {} in flight",
                records.len(),
                self.options.concurrency
            );
            self.enrich_concurrent(records).await;
        } else {
            info!("Fetching {} READMEs sequentially", records.len());
            for record in records.iter_mut() {
                let fetch = AssertUnwindSafe(self.readme_for(record)).catch_unwind();
                record.readme = match fetch.await {
                    Ok(readme) => readme,
                    Err(_) => {
                        error!("README fetch for {} panicked", record.identifier);
                        README_PLACEHOLDER.to_string()
                    }
                };
            }
        }
    }

    async fn enrich_concurrent(&self, records: &mut [TrendingRecord]) {
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut handles = Vec::with_capacity(records.len());

        for record in records.iter() {
            let enricher = self.clone();
            let semaphore = semaphore.clone();
            let record = record.clone();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return README_PLACEHOLDER.to_string();
                };
                enricher.readme_for(&record).await
            }));
        }

        // Handles come back in submission order, so each result lands on the
        // record it was spawned for.
        for (record, result) in records.iter_mut().zip(join_all(handles).await) {
            record.readme = match result {
                Ok(readme) => readme,
                Err(e) => {
                    error!("README task for {} failed: {}", record.identifier, e);
                    README_PLACEHOLDER.to_string()
                }
            };
        }
    }

    /// The README text to attach to `record`: fetched and summarized, or the
    /// placeholder.
    pub async fn readme_for(&self, record: &TrendingRecord) -> String {
        match self.fetch_readme(record).await {
            Some(text) if !text.trim().is_empty() => summarize(&text, self.options.max_length),
            Some(_) => {
                warn!("README for {} is empty", record.identifier);
                README_PLACEHOLDER.to_string()
            }
            None => {
                warn!("README for {} not available", record.identifier);
                README_PLACEHOLDER.to_string()
            }
        }
    }

    /// Raw README text from the first branch that answers.
    pub async fn fetch_readme(&self, record: &TrendingRecord) -> Option<String> {
        let Some((owner, repo)) = record.owner_and_repo() else {
            warn!("Cannot derive README location from {:?}", record.identifier);
            return None;
        };

        for branch in BRANCHES {
            let url = self.readme_url(owner, repo, branch);
            if let Some(text) = self.fetch_with_retry(&url).await {
                debug!("Fetched README for {} from {}", record.identifier, branch);
                return Some(text);
            }
            debug!("No README for {} on {}", record.identifier, branch);
        }

        None
    }

    async fn fetch_with_retry(&self, url: &str) -> Option<String> {
        for attempt in 0..=self.options.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt - 1);
                debug!(
                    "Retrying {} in {:?} ({}/{})",
                    url, delay, attempt, self.options.max_retries
                );
                self.sleeper.sleep(delay).await;
            }

            match self.fetcher.get(url).await {
                Ok(response) if response.is_success() => return Some(response.body),
                Ok(response) => debug!("{} returned {} {}", url, response.status, response.reason),
                Err(e) => debug!("Request to {} failed: {}", url, e),
            }
        }

        None
    }
}
