//! Trending listing retrieval.
//!
//! ```text
//! base URL [+ /language] [+ ?since=range] → GET → markup → TrendingRecord*
//! ```
//!
//! Markup extraction is driven by a [`SelectorSet`], so a change in the
//! listing's HTML means swapping selectors rather than code.

mod parser;

pub use parser::{SelectorSet, TrendingSelectors, GITHUB_SELECTORS};

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::app::{Result, TrendfeedError};
use crate::domain::{TimeRange, TrendingRecord};
use crate::fetcher::Fetcher;

/// Build the listing URL for a language and time range.
///
/// A non-empty language is appended as an escaped path segment. The
/// `since` parameter is only added for a recognized [`TimeRange`]; any other
/// value is silently left out.
pub fn build_url(base_url: &str, language: &str, time_range: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;

    if !language.is_empty() {
        url.path_segments_mut()
            .map_err(|_| TrendfeedError::Other(format!("Cannot append a path to {}", base_url)))?
            .pop_if_empty()
            .push(language);
    }

    match TimeRange::parse(time_range) {
        Some(range) => {
            url.query_pairs_mut().append_pair("since", range.as_str());
        }
        None => debug!("Unrecognized time range {:?}, omitting since parameter", time_range),
    }

    Ok(url)
}

pub struct TrendingFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    selectors: TrendingSelectors,
}

impl TrendingFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Result<Self> {
        Ok(Self::with_selectors(fetcher, TrendingSelectors::github()?))
    }

    pub fn with_selectors(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        selectors: TrendingSelectors,
    ) -> Self {
        Self { fetcher, selectors }
    }

    /// Fetch and parse one listing page.
    ///
    /// A non-success status is a [`TrendfeedError::FetchFailure`]; it is not
    /// retried here.
    pub async fn fetch(
        &self,
        time_range: &str,
        language: &str,
        base_url: &str,
    ) -> Result<Vec<TrendingRecord>> {
        let url = build_url(base_url, language, time_range)?;
        info!("Fetching trending listing {}", url);

        let response = self.fetcher.get(url.as_str()).await?;
        if !response.is_success() {
            return Err(TrendfeedError::FetchFailure {
                url: url.to_string(),
                status: response.status,
                reason: response.reason,
            });
        }

        let records = self.selectors.parse(&response.body, &url);
        info!("Found {} repositories at {}", records.len(), url);
        Ok(records)
    }
}
