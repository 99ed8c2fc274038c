use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::parse_date_at;

/// A configured feed origin
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// `<media:thumbnail>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaThumbnail {
    pub url: Option<String>,
}

/// `<media:content>`; `medium` is "image", "video", ...
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaContent {
    pub url: Option<String>,
    pub medium: Option<String>,
}

/// A `<link>` element; `mime_type` is its `type` attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryLink {
    pub href: Option<String>,
    pub mime_type: Option<String>,
}

/// One unprocessed feed item, as handed over by a fetcher.
///
/// Every field is optional; feeds routinely leave any of them out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub media_thumbnail: Vec<MediaThumbnail>,
    pub media_content: Vec<MediaContent>,
    pub links: Vec<EntryLink>,
}

/// A normalized feed item, ready for the snapshot
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Raw date string exactly as the feed wrote it
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    pub source: String,
    pub thumbnail: Option<String>,
}

impl Article {
    /// Canonical timestamp of `pub_date`, or `now` if it can't be read
    pub fn published_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        parse_date_at(Some(&self.pub_date), now)
    }

    pub fn with_thumbnail(self, thumbnail: Option<String>) -> Self {
        Self { thumbnail, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_serializes_with_snapshot_field_names() {
        let article = Article {
            title: "Title".into(),
            link: "https://example.com/a".into(),
            description: "Body".into(),
            pub_date: "Tue, 10 Jun 2025 14:30:00 +0000".into(),
            source: "Example".into(),
            thumbnail: None,
        };

        let value = serde_json::to_value(&article).unwrap();
        assert_eq!(value["pubDate"], "Tue, 10 Jun 2025 14:30:00 +0000");
        assert!(value["thumbnail"].is_null());
        assert!(value.get("pub_date").is_none());
    }
}
