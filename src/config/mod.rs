//! Configuration loading for multi-source runs.
//!
//! A configuration file holds an optional `[global]` table and a list of
//! `[[sources]]`. TOML is the native format; files ending in `.json` are read
//! as JSON with the same shape. camelCase keys are accepted as aliases.

pub mod settings;

pub use settings::{Overrides, Settings};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::SourceSpec;

pub const DEFAULT_BASE_URL: &str = "https://github.com/trending";
pub const DEFAULT_README_BASE_URL: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 3600;
pub const DEFAULT_MAX_README_LENGTH: usize = 5000;
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Settings shared by every source unless a source or the caller overrides
/// them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Cache directory (default: `<user cache dir>/trendfeed`)
    #[serde(alias = "cacheDir")]
    pub cache_dir: Option<PathBuf>,

    /// Maximum age of a cached listing in seconds (default: 3600)
    #[serde(alias = "cacheMaxAgeSecs", alias = "cacheExpiry")]
    pub cache_max_age_secs: u64,

    /// Whether the listing cache is consulted at all (default: true)
    #[serde(alias = "cacheEnabled", alias = "useCache")]
    pub cache_enabled: bool,

    /// README length in characters before truncation (default: 5000)
    #[serde(alias = "maxReadmeLength")]
    pub max_readme_length: usize,

    /// Maximum simultaneous README fetches (default: 5)
    pub concurrency: usize,

    /// Fetch READMEs concurrently instead of one at a time (default: true)
    pub parallel: bool,

    /// Retries per README branch after the first attempt (default: 3)
    #[serde(alias = "maxRetries")]
    pub max_retries: u32,

    #[serde(alias = "baseUrl")]
    pub base_url: String,

    #[serde(alias = "readmeBaseUrl")]
    pub readme_base_url: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
            cache_enabled: true,
            max_readme_length: DEFAULT_MAX_README_LENGTH,
            concurrency: DEFAULT_CONCURRENCY,
            parallel: true,
            max_retries: DEFAULT_MAX_RETRIES,
            base_url: DEFAULT_BASE_URL.to_string(),
            readme_base_url: DEFAULT_README_BASE_URL.to_string(),
        }
    }
}

/// A validated source plus the settings it overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub spec: SourceSpec,
    pub overrides: Overrides,
}

/// A fully validated configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub global: GlobalConfig,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    global: Option<GlobalConfig>,
    sources: Vec<RawSource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSource {
    name: Option<String>,
    language: Option<String>,
    #[serde(alias = "timeRange")]
    time_range: Option<String>,
    #[serde(alias = "outputPath")]
    output_path: Option<PathBuf>,
    #[serde(flatten)]
    overrides: Overrides,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let raw: RawConfig = if is_json {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        Self::validate(raw)
    }

    /// Parse and validate TOML configuration text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let global = match raw.global {
            Some(global) => global,
            None => {
                tracing::info!("No global settings in configuration, using defaults");
                GlobalConfig::default()
            }
        };

        if raw.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }

        let mut missing = Vec::new();
        let mut sources = Vec::with_capacity(raw.sources.len());

        for (index, source) in raw.sources.into_iter().enumerate() {
            let label = match source.name.as_deref() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => format!("#{}", index + 1),
            };

            let name = required(source.name, &label, "name", &mut missing);
            let time_range = required(source.time_range, &label, "time_range", &mut missing);
            let output_path = required(source.output_path, &label, "output_path", &mut missing);
            // May be empty, but must be present.
            if source.language.is_none() {
                missing.push(MissingField::new(&label, "language"));
            }

            if let (Some(name), Some(time_range), Some(output_path)) =
                (name, time_range, output_path)
            {
                let overrides = source.overrides;
                sources.push(SourceConfig {
                    spec: SourceSpec {
                        name,
                        language: source.language.unwrap_or_default(),
                        time_range,
                        output_path,
                        base_url: overrides.base_url.clone(),
                    },
                    overrides,
                });
            }
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingFields(missing));
        }

        Ok(Self { global, sources })
    }
}

fn required<T: IsBlank>(
    value: Option<T>,
    source: &str,
    field: &'static str,
    missing: &mut Vec<MissingField>,
) -> Option<T> {
    match value {
        Some(v) if !v.is_blank() => Some(v),
        _ => {
            missing.push(MissingField::new(source, field));
            None
        }
    }
}

trait IsBlank {
    fn is_blank(&self) -> bool;
}

impl IsBlank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl IsBlank for PathBuf {
    fn is_blank(&self) -> bool {
        self.as_os_str().is_empty()
    }
}

/// A mandatory field absent from one source entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub source: String,
    pub field: &'static str,
}

impl MissingField {
    fn new(source: &str, field: &'static str) -> Self {
        Self {
            source: source.to_string(),
            field,
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source {} is missing `{}`", self.source, self.field)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Configuration defines no sources")]
    NoSources,

    #[error("Invalid configuration: {}", join_missing(.0))]
    MissingFields(Vec<MissingField>),
}

fn join_missing(missing: &[MissingField]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
