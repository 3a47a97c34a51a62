pub mod commands;

use std::path::PathBuf;

use clap::Parser;

use crate::config::Overrides;
use crate::domain::SourceSpec;

#[derive(Parser, Debug)]
#[command(name = "trendfeed")]
#[command(about = "Turn trending repository listings into RSS feeds", long_about = None)]
pub struct Cli {
    /// Configuration file describing several sources; single-source flags
    /// are ignored when given
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Language to list (empty for all languages)
    #[arg(short, long, default_value = "")]
    pub language: String,

    /// Trending window: daily, weekly or monthly
    #[arg(short = 's', long = "since", default_value = "daily")]
    pub time_range: String,

    /// Where to write the feed
    #[arg(short, long, default_value = "trending.xml")]
    pub output: PathBuf,

    /// Listing page to scrape instead of GitHub's
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory for cached listings
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Maximum age of a cached listing in seconds
    #[arg(long)]
    pub cache_max_age: Option<u64>,

    /// Always fetch the listing, never read or write the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Maximum simultaneous README fetches
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Fetch READMEs one at a time
    #[arg(long)]
    pub sequential: bool,

    /// README length in characters before truncation
    #[arg(long)]
    pub max_readme_length: Option<usize>,

    /// Retries per README branch
    #[arg(long)]
    pub max_retries: Option<u32>,
}

impl Cli {
    /// Settings given explicitly on the command line.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            cache_dir: self.cache_dir.clone(),
            cache_enabled: self.no_cache.then_some(false),
            cache_max_age_secs: self.cache_max_age,
            max_readme_length: self.max_readme_length,
            concurrency: self.concurrency,
            parallel: self.sequential.then_some(false),
            max_retries: self.max_retries,
            base_url: self.base_url.clone(),
            readme_base_url: None,
        }
    }

    /// The source described by the single-source flags.
    pub fn single_source(&self) -> SourceSpec {
        SourceSpec {
            name: if self.language.is_empty() {
                format!("all-{}", self.time_range)
            } else {
                format!("{}-{}", self.language, self.time_range)
            },
            language: self.language.clone(),
            time_range: self.time_range.clone(),
            output_path: self.output.clone(),
            base_url: self.base_url.clone(),
        }
    }
}
