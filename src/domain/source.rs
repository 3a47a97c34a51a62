use std::path::PathBuf;

/// Trending window recognized by the listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Daily,
    Weekly,
    Monthly,
}

impl TimeRange {
    /// Returns `None` for anything other than `daily`, `weekly` or `monthly`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// One feed to produce: a (language, time range, output) combination.
///
/// `time_range` is kept as the raw configured string; unrecognized values
/// are passed through to the fetcher untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    /// Empty means all languages.
    pub language: String,
    pub time_range: String,
    pub output_path: PathBuf,
    pub base_url: Option<String>,
}

impl SourceSpec {
    pub fn display_language(&self) -> &str {
        if self.language.is_empty() {
            "All languages"
        } else {
            &self.language
        }
    }
}
