//! On-disk cache of scraped listings.
//!
//! One JSON file per key under the cache directory. The cache is purely an
//! optimization: every failure is logged and treated as a miss or a no-op.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app::Result;
use crate::config::DEFAULT_BASE_URL;
use crate::domain::TrendingRecord;

/// A timestamped snapshot of one listing fetch, in scrape order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub captured_at: DateTime<Utc>,
    pub records: Vec<TrendingRecord>,
}

impl CacheEntry {
    pub fn new(records: Vec<TrendingRecord>) -> Self {
        Self {
            captured_at: Utc::now(),
            records,
        }
    }

    /// Fresh while `now - captured_at <= max_age`. A capture time in the
    /// future counts as zero elapsed.
    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        let elapsed = now
            .signed_duration_since(self.captured_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        elapsed <= max_age
    }
}

/// Build the cache key for a listing.
///
/// Language and time range are form-encoded with `_` escaped as `%5F`, so
/// the `_` separating them is unambiguous. The default base URL is left out
/// of the key so default-source keys stay short; any other base URL is
/// embedded after `__` with every non-alphanumeric character replaced by `_`.
pub fn make_key(language: &str, time_range: &str, base_url: &str) -> String {
    let language = if language.is_empty() {
        "all".to_string()
    } else {
        encode_part(language)
    };

    let mut key = format!("{}_{}", language, encode_part(time_range));

    if base_url.trim_end_matches('/') != DEFAULT_BASE_URL {
        key.push_str("__");
        key.push_str(&sanitize(base_url));
    }

    key
}

fn encode_part(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('_', "%5F")
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Return the entry for `key` if it exists, parses and is still fresh.
    pub fn read(&self, key: &str, max_age: Duration) -> Option<CacheEntry> {
        let path = self.path_for(key);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Cache miss for {}: {}", key, e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring unreadable cache file {}: {}", path.display(), e);
                return None;
            }
        };

        if !entry.is_fresh(max_age, Utc::now()) {
            debug!("Cache entry for {} expired (captured {})", key, entry.captured_at);
            return None;
        }

        debug!("Cache hit for {} ({} records)", key, entry.records.len());
        Some(entry)
    }

    /// Store `records` under `key`, stamped with the current time.
    pub fn write(&self, key: &str, records: &[TrendingRecord]) {
        let entry = CacheEntry::new(records.to_vec());
        self.write_entry(key, &entry);
    }

    /// Store a prepared entry. Failures are logged and swallowed.
    pub fn write_entry(&self, key: &str, entry: &CacheEntry) {
        if let Err(e) = self.try_write(key, entry) {
            warn!("Failed to write cache entry {}: {}", key, e);
        }
    }

    fn try_write(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string(entry)?;
        fs::write(self.path_for(key), content)?;
        debug!("Cached {} records under {}", entry.records.len(), key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records(n: usize) -> Vec<TrendingRecord> {
        (0..n)
            .map(|i| {
                let mut record = TrendingRecord::new(
                    format!("owner{i}/repo{i}"),
                    format!("https://github.com/owner{i}/repo{i}"),
                );
                record.stars = format!("{}", i * 10);
                record
            })
            .collect()
    }

    #[test]
    fn test_make_key_is_deterministic() {
        let a = make_key("rust", "daily", DEFAULT_BASE_URL);
        let b = make_key("rust", "daily", DEFAULT_BASE_URL);
        assert_eq!(a, b);
        assert_eq!(a, "rust_daily");
    }

    #[test]
    fn test_make_key_empty_language() {
        assert_eq!(make_key("", "weekly", DEFAULT_BASE_URL), "all_weekly");
    }

    #[test]
    fn test_make_key_default_base_url_with_trailing_slash() {
        let with_slash = format!("{}/", DEFAULT_BASE_URL);
        assert_eq!(make_key("go", "daily", &with_slash), "go_daily");
    }

    #[test]
    fn test_make_key_custom_base_urls_do_not_collide() {
        let default = make_key("rust", "daily", DEFAULT_BASE_URL);
        let a = make_key("rust", "daily", "https://mirror-a.example.com/trending");
        let b = make_key("rust", "daily", "https://mirror-b.example.com/trending");
        assert_ne!(default, a);
        assert_ne!(a, b);
        assert!(a.starts_with("rust_daily__"));
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn test_make_key_underscores_do_not_shift_the_separator() {
        let a = make_key("a_b", "c", DEFAULT_BASE_URL);
        let b = make_key("a", "b_c", DEFAULT_BASE_URL);
        assert_ne!(a, b);
        assert_eq!(a, "a%5Fb_c");
        assert_eq!(b, "a_b%5Fc");
    }

    #[test]
    fn test_make_key_passes_unknown_time_range_through_encoded() {
        assert_eq!(make_key("rust", "last week", DEFAULT_BASE_URL), "rust_last+week");
        assert_ne!(
            make_key("rust", "x_y", DEFAULT_BASE_URL),
            make_key("rust_x", "y", DEFAULT_BASE_URL)
        );
    }

    #[test]
    fn test_make_key_language_is_escaped() {
        let plus = make_key("c++", "daily", DEFAULT_BASE_URL);
        let minus = make_key("c--", "daily", DEFAULT_BASE_URL);
        assert_ne!(plus, minus);
        assert!(!plus.contains('/'));
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("nested").join("cache"));
        let records = sample_records(5);

        store.write("rust_daily", &records);
        let entry = store
            .read("rust_daily", Duration::from_secs(3600))
            .expect("fresh entry should be returned");

        assert_eq!(entry.records, records);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let entry = CacheEntry {
            captured_at: Utc::now() - chrono::Duration::hours(2),
            records: sample_records(3),
        };

        store.write_entry("old", &entry);

        assert!(store.read("old", Duration::from_secs(3600)).is_none());
        assert!(store.read("old", Duration::from_secs(3 * 3600)).is_some());
    }

    #[test]
    fn test_missing_and_corrupt_entries_are_misses() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());

        assert!(store.read("absent", Duration::from_secs(60)).is_none());

        fs::write(dir.path().join("corrupt.json"), "{ not json").unwrap();
        assert!(store.read("corrupt", Duration::from_secs(60)).is_none());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        // The cache directory path runs through a regular file.
        let store = CacheStore::new(blocker.join("cache"));
        store.write("key", &sample_records(1));
        assert!(store.read("key", Duration::from_secs(60)).is_none());
    }

    #[test]
    fn test_is_fresh_boundary() {
        let now = Utc::now();
        let entry = CacheEntry {
            captured_at: now - chrono::Duration::seconds(60),
            records: Vec::new(),
        };
        assert!(entry.is_fresh(Duration::from_secs(60), now));
        assert!(!entry.is_fresh(Duration::from_secs(59), now));
    }
}
