use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One repository entry scraped from the trending listing.
///
/// Every field other than `identifier` defaults to an empty string when the
/// corresponding markup is missing. `readme` stays empty until the enricher
/// fills it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingRecord {
    /// `owner/name`
    pub identifier: String,
    pub url: String,
    pub description: String,
    pub language: String,
    pub stars: String,
    pub forks: String,
    pub stars_in_range: String,
    pub readme: String,
}

impl TrendingRecord {
    pub fn new(identifier: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Split the identifier into `(owner, repo)`.
    pub fn owner_and_repo(&self) -> Option<(&str, &str)> {
        let (owner, repo) = self.identifier.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some((owner, repo))
    }

    /// Deterministic feed item id for this record within a given listing.
    pub fn item_id(&self, listing_url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(listing_url.as_bytes());
        hasher.update(self.identifier.as_bytes());
        hex::encode(hasher.finalize())
    }
}
