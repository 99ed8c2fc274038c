use chrono::{DateTime, Utc};

use crate::model::{Article, RawEntry};
use crate::sanitize::TextSanitizer;
use crate::thumbnail::extract_thumbnail;

pub const DEFAULT_TITLE: &str = "No title";
pub const DEFAULT_LINK: &str = "#";

/// Builds [`Article`]s out of raw entries. Never fails: missing fields get
/// their defaults.
#[derive(Debug, Clone, Default)]
pub struct ArticleBuilder {
    sanitizer: TextSanitizer,
}

impl ArticleBuilder {
    pub fn new(sanitizer: TextSanitizer) -> Self {
        Self { sanitizer }
    }

    pub fn build(&self, entry: &RawEntry, source: &str) -> Article {
        self.build_at(entry, source, Utc::now())
    }

    /// Like [`build`](Self::build), with `now` standing in for a missing date
    pub fn build_at(&self, entry: &RawEntry, source: &str, now: DateTime<Utc>) -> Article {
        let pub_date = non_blank(&entry.published)
            .or_else(|| non_blank(&entry.updated))
            .map(str::to_string)
            .unwrap_or_else(|| now.to_rfc3339());

        Article {
            title: entry
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            link: entry.link.clone().unwrap_or_else(|| DEFAULT_LINK.to_string()),
            description: self.sanitizer.clean(entry.summary.as_deref()),
            pub_date,
            source: source.to_string(),
            thumbnail: extract_thumbnail(entry),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}
