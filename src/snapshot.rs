use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::PersistenceError;
use crate::model::Article;

/// The JSON document the static site reads
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub generated_at: String,
    pub article_count: usize,
    pub articles: Vec<Article>,
}

impl Snapshot {
    pub fn new(articles: Vec<Article>, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Micros, false),
            article_count: articles.len(),
            articles,
        }
    }
}

/// Save the snapshot as pretty JSON, creating parent directories as needed
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json).map_err(|source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn article(title: &str) -> Article {
        Article {
            title: title.into(),
            link: format!("https://example.com/{title}"),
            description: "Café & crème".into(),
            pub_date: "Tue, 10 Jun 2025 14:30:00 +0000".into(),
            source: "Example".into(),
            thumbnail: None,
        }
    }

    #[test]
    fn count_matches_articles() {
        let at = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let snapshot = Snapshot::new(vec![article("a"), article("b")], at);
        assert_eq!(snapshot.article_count, snapshot.articles.len());
        assert_eq!(snapshot.generated_at, "2025-06-10T12:00:00.000000+00:00");

        let empty = Snapshot::new(Vec::new(), at);
        assert_eq!(empty.article_count, 0);
    }

    #[test]
    fn writes_into_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs").join("nested").join("news.json");
        let snapshot = Snapshot::new(vec![article("a")], Utc::now());

        write_snapshot(&path, &snapshot).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Café & crème"));
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["article_count"], 1);
        assert_eq!(value["articles"][0]["pubDate"], "Tue, 10 Jun 2025 14:30:00 +0000");
        assert!(value["articles"][0]["thumbnail"].is_null());
        assert_eq!(serde_json::from_value::<Snapshot>(value).unwrap(), snapshot);
    }

    #[test]
    fn unwritable_target_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a dir").unwrap();

        let err = write_snapshot(&blocker.join("news.json"), &Snapshot::new(Vec::new(), Utc::now()))
            .unwrap_err();
        assert!(matches!(err, PersistenceError::CreateDir { .. }));
    }
}
