//! Source orchestration.
//!
//! Each source moves through
//!
//! ```text
//! Pending → Fetching → Enriching → Rendering → Writing → Done
//! ```
//!
//! and may fail at any step; the failure is reported as
//! [`SourceStatus::Failed`] along with the step it happened in. In a
//! multi-source run a failed source is recorded and the next one starts;
//! sources never overlap.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::app::{AppContext, Result};
use crate::cache::{make_key, CacheStore};
use crate::config::{Config, GlobalConfig, Overrides, Settings};
use crate::domain::{SourceSpec, TrendingRecord};
use crate::readme::{EnrichOptions, ReadmeEnricher};
use crate::render::{ChannelMeta, FeedRenderer};
use crate::trending::{build_url, TrendingFetcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Pending,
    Fetching,
    Enriching,
    Rendering,
    Writing,
    Done,
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Enriching => "enriching",
            Self::Rendering => "rendering",
            Self::Writing => "writing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of one successfully processed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub output_path: PathBuf,
    pub items: usize,
    pub from_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Succeeded(SourceReport),
    Failed {
        /// Step that was running when the error occurred
        during: SourceState,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub name: String,
    pub status: SourceStatus,
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, SourceStatus::Succeeded(_))
    }
}

/// Per-source outcomes of a multi-source run, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<SourceOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

pub struct Orchestrator {
    ctx: AppContext,
    renderer: FeedRenderer,
}

impl Orchestrator {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            renderer: FeedRenderer::new(),
        }
    }

    /// Process every configured source in order. Never fails as a whole.
    pub async fn run(&self, config: &Config, overrides: &Overrides) -> RunReport {
        let mut report = RunReport::default();

        for (index, source) in config.sources.iter().enumerate() {
            info!(
                "Processing source {}/{}: {}",
                index + 1,
                config.sources.len(),
                source.spec.name
            );

            let settings = Settings::resolve(&config.global, &source.overrides, overrides);
            let mut state = SourceState::Pending;

            let status = match self.process(&source.spec, &settings, &mut state).await {
                Ok(source_report) => SourceStatus::Succeeded(source_report),
                Err(e) => {
                    error!("Source {} failed while {}: {}", source.spec.name, state, e);
                    SourceStatus::Failed {
                        during: state,
                        error: e.to_string(),
                    }
                }
            };

            report.outcomes.push(SourceOutcome {
                name: source.spec.name.clone(),
                status,
            });
        }

        if report.failed() > 0 {
            warn!(
                "{} of {} sources failed",
                report.failed(),
                report.outcomes.len()
            );
        }

        report
    }

    /// Process one source built from direct options. Errors propagate.
    pub async fn run_single(&self, source: &SourceSpec, overrides: &Overrides) -> Result<SourceReport> {
        let source_level = Overrides {
            base_url: source.base_url.clone(),
            ..Default::default()
        };
        let settings = Settings::resolve(&GlobalConfig::default(), &source_level, overrides);
        let mut state = SourceState::Pending;

        let result = self.process(source, &settings, &mut state).await;
        if let Err(e) = &result {
            error!("Source {} failed while {}: {}", source.name, state, e);
        }
        result
    }

    async fn process(
        &self,
        source: &SourceSpec,
        settings: &Settings,
        state: &mut SourceState,
    ) -> Result<SourceReport> {
        let base_url = settings.base_url.as_str();

        *state = SourceState::Fetching;
        let (mut records, from_cache) = self.load_records(source, base_url, settings).await?;

        *state = SourceState::Enriching;
        let enricher = ReadmeEnricher::new(
            self.ctx.fetcher.clone(),
            self.ctx.sleeper.clone(),
            EnrichOptions::from(settings),
        );
        enricher.enrich_all(&mut records).await;

        *state = SourceState::Rendering;
        let listing_url = build_url(base_url, &source.language, &source.time_range)?;
        let meta = ChannelMeta::for_source(source, listing_url.as_str());
        let xml = self.renderer.render(&records, &meta)?;

        *state = SourceState::Writing;
        if let Some(parent) = source.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&source.output_path, xml)?;

        *state = SourceState::Done;
        info!(
            "Wrote {} items to {}",
            records.len(),
            source.output_path.display()
        );

        Ok(SourceReport {
            output_path: source.output_path.clone(),
            items: records.len(),
            from_cache,
        })
    }

    /// Cached listing if fresh, otherwise a live fetch (then cached).
    async fn load_records(
        &self,
        source: &SourceSpec,
        base_url: &str,
        settings: &Settings,
    ) -> Result<(Vec<TrendingRecord>, bool)> {
        let cache = settings
            .cache_enabled
            .then(|| CacheStore::new(&settings.cache_dir));
        let key = make_key(&source.language, &source.time_range, base_url);

        if let Some(cache) = &cache {
            if let Some(entry) = cache.read(&key, settings.cache_max_age) {
                info!(
                    "Using cached listing for {} ({} records, captured {})",
                    source.name,
                    entry.records.len(),
                    entry.captured_at
                );
                return Ok((entry.records, true));
            }
        }

        let fetcher = TrendingFetcher::new(self.ctx.fetcher.clone())?;
        let records = fetcher
            .fetch(&source.time_range, &source.language, base_url)
            .await?;

        if let Some(cache) = &cache {
            cache.write(&key, &records);
        }

        Ok((records, false))
    }
}
