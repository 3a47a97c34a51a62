use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::app::{Result, TrendfeedError};
use crate::domain::TrendingRecord;

/// CSS selectors describing the listing markup.
#[derive(Debug, Clone, Copy)]
pub struct SelectorSet<'a> {
    /// One element per repository
    pub block: &'a str,
    /// Heading link holding the `/owner/repo` href (mandatory)
    pub name_link: &'a str,
    pub description: &'a str,
    pub language: &'a str,
    pub stars: &'a str,
    pub forks: &'a str,
    pub stars_in_range: &'a str,
}

pub const GITHUB_SELECTORS: SelectorSet<'static> = SelectorSet {
    block: "article.Box-row",
    name_link: "h2 a",
    description: "p",
    language: "[itemprop=\"programmingLanguage\"]",
    stars: "a[href$=\"/stargazers\"]",
    forks: "a[href$=\"/forks\"]",
    stars_in_range: "span.float-sm-right",
};

/// Compiled selectors for one markup shape.
#[derive(Debug, Clone)]
pub struct TrendingSelectors {
    block: Selector,
    name_link: Selector,
    description: Selector,
    language: Selector,
    stars: Selector,
    forks: Selector,
    stars_in_range: Selector,
}

impl TrendingSelectors {
    pub fn compile(set: &SelectorSet<'_>) -> Result<Self> {
        Ok(Self {
            block: compile(set.block)?,
            name_link: compile(set.name_link)?,
            description: compile(set.description)?,
            language: compile(set.language)?,
            stars: compile(set.stars)?,
            forks: compile(set.forks)?,
            stars_in_range: compile(set.stars_in_range)?,
        })
    }

    pub fn github() -> Result<Self> {
        Self::compile(&GITHUB_SELECTORS)
    }

    /// Extract records from listing markup in document order.
    ///
    /// Repository links are resolved against `page_url`. Blocks without a
    /// usable name link are skipped; finding no blocks at all is logged but
    /// still returns an empty list.
    pub fn parse(&self, html: &str, page_url: &Url) -> Vec<TrendingRecord> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();
        let mut blocks = 0;

        for block in document.select(&self.block) {
            blocks += 1;
            match self.parse_block(block, page_url) {
                Some(record) => records.push(record),
                None => debug!("Skipping repository block {} without a name link", blocks),
            }
        }

        if blocks == 0 {
            warn!(
                "No repository blocks found at {}; the page markup may have changed",
                page_url
            );
        }

        records
    }

    fn parse_block(&self, block: ElementRef<'_>, page_url: &Url) -> Option<TrendingRecord> {
        let link = block.select(&self.name_link).next()?;
        let href = link.value().attr("href")?;
        let identifier = href.trim().trim_matches('/');

        let mut parts = identifier.split('/');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty()
        );
        if !valid {
            return None;
        }

        let url = page_url
            .join(&format!("/{}", identifier))
            .map(String::from)
            .unwrap_or_else(|_| format!("https://github.com/{}", identifier));

        Some(TrendingRecord {
            identifier: identifier.to_string(),
            url,
            description: first_text(block, &self.description),
            language: first_text(block, &self.language),
            stars: first_text(block, &self.stars),
            forks: first_text(block, &self.forks),
            stars_in_range: first_text(block, &self.stars_in_range),
            readme: String::new(),
        })
    }
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| TrendfeedError::Other(format!("Invalid selector {:?}: {}", css, e)))
}

/// Whitespace-collapsed text of the first match, or empty.
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
