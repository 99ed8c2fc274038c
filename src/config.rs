use anyhow::{Context, Result};
use dirs::config_dir;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregate::AggregateOptions;
use crate::model::FeedSource;
use crate::rank::DEFAULT_MAX_ARTICLES;
use crate::sanitize::{DEFAULT_MIN_LEN, TextSanitizer};

const DEFAULT_OUTPUT: &str = "docs/mma-news.json";
const DEFAULT_IMAGE_DIR: &str = "docs/images";
const DEFAULT_IMAGE_PREFIX: &str = "images";
const DEFAULT_RECENCY_DAYS: u32 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Shape of config.toml on disk
///
/// Example:
/// output = "docs/mma-news.json"
/// max_total_articles = 50
/// max_articles_per_source = 10
/// recency_days = 5
/// description_fallback = "Read more..."
///
/// [[feeds]]
/// name = "Sherdog"
/// url = "https://sherdog.com/rss/news.xml"
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub output: Option<String>,
    pub max_total_articles: Option<usize>,
    pub max_articles_per_source: Option<usize>,
    pub recency_days: Option<u32>,
    pub description_fallback: Option<String>,
    pub description_min_len: Option<usize>,
    pub download_images: Option<bool>,
    pub image_dir: Option<String>,
    pub image_url_prefix: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
    pub feeds: Option<Vec<FeedSource>>,
}

/// Resolved config used by the app
#[derive(Debug, Clone)]
pub struct Config {
    pub output_path: PathBuf,
    pub max_total_articles: usize,
    pub max_articles_per_source: Option<usize>,
    pub recency_days: Option<u32>,
    pub description_fallback: Option<String>,
    pub description_min_len: usize,
    pub download_images: bool,
    pub image_dir: PathBuf,
    pub image_url_prefix: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub feeds: Vec<FeedSource>,
}

impl Config {
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            max_per_source: self.max_articles_per_source,
            recency_window: self
                .recency_days
                .map(|days| chrono::Duration::days(i64::from(days))),
        }
    }

    pub fn sanitizer(&self) -> TextSanitizer {
        TextSanitizer::new(self.description_fallback.clone(), self.description_min_len)
    }
}

impl Default for Config {
    fn default() -> Self {
        resolve(RawConfig::default())
    }
}

/// The feeds polled when config.toml doesn't list any
pub fn default_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource::new("Lowkick MMA", "https://lowkickmma.com/feed"),
        FeedSource::new("BJPENN", "https://bjpenn.com/feed"),
        FeedSource::new("Sherdog", "https://sherdog.com/rss/news.xml"),
        FeedSource::new(
            "UFC Official YouTube",
            "https://www.youtube.com/feeds/videos.xml?channel_id=UCPQDDlGe7lbgmEJ0ge7a_JA",
        ),
        FeedSource::new(
            "ESPN MMA YouTube",
            "https://www.youtube.com/feeds/videos.xml?channel_id=UCiWLfSweyRNmLpgEHekhoAg",
        ),
    ]
}

/// Load config from `path` if given, otherwise from
/// ~/.config/rssnap/config.toml if it exists, otherwise use defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let default_path = config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rssnap")
                .join("config.toml");
            default_path.exists().then_some(default_path)
        }
    };

    let raw = match config_path {
        Some(path) => {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
            parse_config(&contents)
                .with_context(|| format!("Failed to parse config file '{}'", path.display()))?
        }
        None => RawConfig::default(),
    };

    Ok(resolve(raw))
}

pub fn parse_config(contents: &str) -> Result<RawConfig> {
    Ok(toml::from_str(contents)?)
}

pub fn resolve(raw: RawConfig) -> Config {
    let output_path = PathBuf::from(raw.output.unwrap_or_else(|| DEFAULT_OUTPUT.to_string()));

    let feeds = raw
        .feeds
        .filter(|f| !f.is_empty())
        .unwrap_or_else(default_feeds);

    Config {
        output_path,
        max_total_articles: raw.max_total_articles.unwrap_or(DEFAULT_MAX_ARTICLES),
        max_articles_per_source: raw.max_articles_per_source,
        recency_days: raw.recency_days.or(Some(DEFAULT_RECENCY_DAYS)).filter(|d| *d > 0),
        description_fallback: raw.description_fallback,
        description_min_len: raw.description_min_len.unwrap_or(DEFAULT_MIN_LEN),
        download_images: raw.download_images.unwrap_or(false),
        image_dir: PathBuf::from(
            raw.image_dir
                .unwrap_or_else(|| DEFAULT_IMAGE_DIR.to_string()),
        ),
        image_url_prefix: raw
            .image_url_prefix
            .unwrap_or_else(|| DEFAULT_IMAGE_PREFIX.to_string()),
        user_agent: raw
            .user_agent
            .unwrap_or_else(|| format!("rssnap/{}", env!("CARGO_PKG_VERSION"))),
        timeout: Duration::from_secs(raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        feeds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_mma_snapshot() {
        let cfg = Config::default();
        assert_eq!(cfg.output_path, PathBuf::from("docs/mma-news.json"));
        assert_eq!(cfg.max_total_articles, 50);
        assert_eq!(cfg.max_articles_per_source, None);
        assert_eq!(cfg.recency_days, Some(5));
        assert_eq!(cfg.description_fallback, None);
        assert!(!cfg.download_images);
        assert_eq!(cfg.feeds.len(), 5);
        assert_eq!(cfg.feeds[2].name, "Sherdog");
    }

    #[test]
    fn file_values_override_defaults() {
        let raw = parse_config(
            r#"
            output = "public/news.json"
            max_total_articles = 30
            max_articles_per_source = 10
            recency_days = 0
            description_fallback = "Read more..."
            download_images = true
            timeout_secs = 3

            [[feeds]]
            name = "Only"
            url = "https://only.test/feed"
            "#,
        )
        .unwrap();
        let cfg = resolve(raw);

        assert_eq!(cfg.output_path, PathBuf::from("public/news.json"));
        assert_eq!(cfg.max_total_articles, 30);
        assert_eq!(cfg.max_articles_per_source, Some(10));
        assert_eq!(cfg.recency_days, None);
        assert_eq!(cfg.sanitizer().fallback.as_deref(), Some("Read more..."));
        assert!(cfg.download_images);
        assert_eq!(cfg.timeout, Duration::from_secs(3));
        assert_eq!(cfg.feeds, vec![FeedSource::new("Only", "https://only.test/feed")]);

        let options = cfg.aggregate_options();
        assert_eq!(options.max_per_source, Some(10));
        assert!(options.recency_window.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("max_articles = 5").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_total_articles = 7\n").unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.max_total_articles, 7);
        assert_eq!(cfg.feeds, default_feeds());
    }
}
