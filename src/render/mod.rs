use chrono::Utc;
use html_escape::encode_text;
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, Item, ItemBuilder};

use crate::app::{Result, TrendfeedError};
use crate::domain::{SourceSpec, TrendingRecord};

/// Channel-level metadata of a rendered feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMeta {
    pub title: String,
    /// The listing page the feed was built from.
    pub link: String,
    pub description: String,
}

impl ChannelMeta {
    pub fn for_source(source: &SourceSpec, listing_url: &str) -> Self {
        let language = source.display_language();
        Self {
            title: format!("GitHub Trending: {} ({})", language, source.time_range),
            link: listing_url.to_string(),
            description: format!(
                "Trending repositories for {} ({}), with README excerpts",
                language, source.time_range
            ),
        }
    }
}

/// Serializes enriched records as an RSS 2.0 document.
#[derive(Clone, Default)]
pub struct FeedRenderer;

impl FeedRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Items appear in record order.
    pub fn render(&self, records: &[TrendingRecord], meta: &ChannelMeta) -> Result<String> {
        let now = Utc::now().to_rfc2822();
        let items: Vec<Item> = records
            .iter()
            .map(|record| self.item(record, meta, &now))
            .collect();

        let channel = ChannelBuilder::default()
            .title(meta.title.clone())
            .link(meta.link.clone())
            .description(meta.description.clone())
            .generator(Some(format!("trendfeed {}", env!("CARGO_PKG_VERSION"))))
            .last_build_date(Some(now.clone()))
            .items(items)
            .build();

        let bytes = channel
            .write_to(Vec::new())
            .map_err(|e| TrendfeedError::Render(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| TrendfeedError::Render(e.to_string()))
    }

    fn item(&self, record: &TrendingRecord, meta: &ChannelMeta, pub_date: &str) -> Item {
        let guid = GuidBuilder::default()
            .value(record.item_id(&meta.link))
            .permalink(false)
            .build();

        let categories = if record.language.is_empty() {
            Vec::new()
        } else {
            vec![CategoryBuilder::default().name(record.language.clone()).build()]
        };

        ItemBuilder::default()
            .title(Some(record.identifier.clone()))
            .link(Some(record.url.clone()))
            .guid(Some(guid))
            .description(Some(item_description(record)))
            .categories(categories)
            .pub_date(Some(pub_date.to_string()))
            .build()
    }
}

/// HTML body of one item: description, stats line, README.
fn item_description(record: &TrendingRecord) -> String {
    let mut html = String::new();

    if !record.description.is_empty() {
        html.push_str(&format!("<p>{}</p>\n", encode_text(&record.description)));
    }

    let mut stats: Vec<String> = [
        ("Language", &record.language),
        ("Stars", &record.stars),
        ("Forks", &record.forks),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| format!("{}: {}", label, encode_text(value)))
    .collect();

    if !record.stars_in_range.is_empty() {
        stats.push(encode_text(&record.stars_in_range).into_owned());
    }

    if !stats.is_empty() {
        html.push_str(&format!("<p>{}</p>\n", stats.join(" | ")));
    }

    if !record.readme.is_empty() {
        html.push_str(&format!("<pre>{}</pre>", encode_text(&record.readme)));
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn source(language: &str) -> SourceSpec {
        SourceSpec {
            name: "test".into(),
            language: language.into(),
            time_range: "daily".into(),
            output_path: PathBuf::from("out.xml"),
            base_url: None,
        }
    }

    fn enriched(identifier: &str) -> TrendingRecord {
        TrendingRecord {
            identifier: identifier.into(),
            url: format!("https://github.com/{}", identifier),
            description: "Fast & <safe>".into(),
            language: "Rust".into(),
            stars: "1,024".into(),
            forks: "64".into(),
            stars_in_range: "12 stars today".into(),
            readme: "# Title\n<script>alert(1)</script>".into(),
        }
    }

    #[test]
    fn test_channel_meta_titles() {
        let meta = ChannelMeta::for_source(&source(""), "https://github.com/trending?since=daily");
        assert_eq!(meta.title, "GitHub Trending: All languages (daily)");

        let meta = ChannelMeta::for_source(&source("rust"), "https://github.com/trending/rust");
        assert_eq!(meta.title, "GitHub Trending: rust (daily)");
        assert_eq!(meta.link, "https://github.com/trending/rust");
    }

    #[test]
    fn test_render_parses_back_in_order() {
        let meta = ChannelMeta::for_source(&source("rust"), "https://github.com/trending/rust");
        let records = vec![enriched("a/first"), enriched("b/second")];

        let xml = FeedRenderer::new().render(&records, &meta).unwrap();
        let feed = feed_rs::parser::parse(xml.as_bytes()).expect("rendered feed should parse");

        assert_eq!(feed.title.unwrap().content, "GitHub Trending: rust (daily)");
        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.entries[0].title.as_ref().unwrap().content, "a/first");
        assert_eq!(feed.entries[0].links[0].href, "https://github.com/a/first");
        assert_eq!(feed.entries[1].title.as_ref().unwrap().content, "b/second");
        assert_ne!(feed.entries[0].id, feed.entries[1].id);
    }

    #[test]
    fn test_render_empty_feed_is_valid() {
        let meta = ChannelMeta::for_source(&source(""), "https://github.com/trending");
        let xml = FeedRenderer::new().render(&[], &meta).unwrap();
        let feed = feed_rs::parser::parse(xml.as_bytes()).unwrap();
        assert!(feed.entries.is_empty());
    }

    #[test]
    fn test_item_description_escapes_content() {
        let html = item_description(&enriched("a/b"));
        assert!(html.contains("<p>Fast &amp; &lt;safe&gt;</p>"));
        assert!(html.contains("Language: Rust | Stars: 1,024 | Forks: 64 | 12 stars today"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_item_description_skips_empty_fields() {
        let record = TrendingRecord::new("a/b", "https://github.com/a/b");
        assert_eq!(item_description(&record), "");
    }
}
