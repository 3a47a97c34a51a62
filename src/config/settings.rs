use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::config::GlobalConfig;

/// Optional values for every tunable setting.
///
/// Used twice: as the per-source block of a configuration file and as the
/// caller's explicit overrides (command-line flags).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Overrides {
    #[serde(alias = "cacheDir")]
    pub cache_dir: Option<PathBuf>,
    #[serde(alias = "cacheEnabled", alias = "useCache")]
    pub cache_enabled: Option<bool>,
    #[serde(alias = "cacheMaxAgeSecs", alias = "cacheExpiry")]
    pub cache_max_age_secs: Option<u64>,
    #[serde(alias = "maxReadmeLength")]
    pub max_readme_length: Option<usize>,
    pub concurrency: Option<usize>,
    pub parallel: Option<bool>,
    #[serde(alias = "maxRetries")]
    pub max_retries: Option<u32>,
    #[serde(alias = "baseUrl")]
    pub base_url: Option<String>,
    #[serde(alias = "readmeBaseUrl")]
    pub readme_base_url: Option<String>,
}

/// Effective settings for one source after merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub cache_enabled: bool,
    pub cache_max_age: Duration,
    pub max_readme_length: usize,
    /// Always at least 1.
    pub concurrency: usize,
    pub parallel: bool,
    pub max_retries: u32,
    pub base_url: String,
    pub readme_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(&GlobalConfig::default(), &Overrides::default(), &Overrides::default())
    }
}

impl Settings {
    /// Merge settings field by field.
    ///
    /// Precedence, lowest to highest: built-in defaults (already folded into
    /// `global` by its `Default`), the `global` block, the source's own
    /// values, then the caller's overrides.
    pub fn resolve(global: &GlobalConfig, source: &Overrides, caller: &Overrides) -> Self {
        fn pick<T: Clone>(caller: &Option<T>, source: &Option<T>, global: T) -> T {
            caller.clone().or_else(|| source.clone()).unwrap_or(global)
        }

        let cache_dir = caller
            .cache_dir
            .clone()
            .or_else(|| source.cache_dir.clone())
            .or_else(|| global.cache_dir.clone())
            .unwrap_or_else(default_cache_dir);

        Self {
            cache_dir,
            cache_enabled: pick(&caller.cache_enabled, &source.cache_enabled, global.cache_enabled),
            cache_max_age: Duration::from_secs(pick(
                &caller.cache_max_age_secs,
                &source.cache_max_age_secs,
                global.cache_max_age_secs,
            )),
            max_readme_length: pick(
                &caller.max_readme_length,
                &source.max_readme_length,
                global.max_readme_length,
            ),
            concurrency: pick(&caller.concurrency, &source.concurrency, global.concurrency).max(1),
            parallel: pick(&caller.parallel, &source.parallel, global.parallel),
            max_retries: pick(&caller.max_retries, &source.max_retries, global.max_retries),
            base_url: pick(&caller.base_url, &source.base_url, global.base_url.clone()),
            readme_base_url: pick(
                &caller.readme_base_url,
                &source.readme_base_url,
                global.readme_base_url.clone(),
            ),
        }
    }
}

/// `<user cache dir>/trendfeed`, or `.cache/trendfeed` when the platform has
/// no cache directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("trendfeed"))
        .unwrap_or_else(|| PathBuf::from(".cache").join("trendfeed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_BASE_URL, DEFAULT_CONCURRENCY};

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.cache_enabled);
        assert_eq!(settings.cache_max_age, Duration::from_secs(3600));
        assert_eq!(settings.concurrency, DEFAULT_CONCURRENCY);
        assert!(settings.parallel);
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.cache_dir, default_cache_dir());
    }

    #[test]
    fn test_source_overrides_global() {
        let global = GlobalConfig {
            concurrency: 8,
            max_readme_length: 100,
            ..Default::default()
        };
        let source = Overrides {
            concurrency: Some(2),
            ..Default::default()
        };
        let settings = Settings::resolve(&global, &source, &Overrides::default());
        assert_eq!(settings.concurrency, 2);
        assert_eq!(settings.max_readme_length, 100);
    }

    #[test]
    fn test_caller_overrides_source_and_global() {
        let global = GlobalConfig {
            cache_enabled: true,
            cache_dir: Some(PathBuf::from("/global")),
            ..Default::default()
        };
        let source = Overrides {
            cache_enabled: Some(true),
            cache_dir: Some(PathBuf::from("/source")),
            parallel: Some(true),
            ..Default::default()
        };
        let caller = Overrides {
            cache_enabled: Some(false),
            parallel: Some(false),
            ..Default::default()
        };
        let settings = Settings::resolve(&global, &source, &caller);
        assert!(!settings.cache_enabled);
        assert!(!settings.parallel);
        assert_eq!(settings.cache_dir, PathBuf::from("/source"));
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let caller = Overrides {
            concurrency: Some(0),
            ..Default::default()
        };
        let settings = Settings::resolve(&GlobalConfig::default(), &Overrides::default(), &caller);
        assert_eq!(settings.concurrency, 1);
    }
}
