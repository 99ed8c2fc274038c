use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use tracing::{error, info, warn};

use crate::aggregate::{Aggregator, FeedFetcher};
use crate::article::ArticleBuilder;
use crate::cli::{Cli, Cmd};
use crate::config::Config;
use crate::fetch::HttpFetcher;
use crate::images::ImageCache;
use crate::model::Article;
use crate::rank::rank_articles;
use crate::snapshot::{Snapshot, write_snapshot};

pub fn run_command(cli: &Cli, cfg: &Config) -> Result<()> {
    match cli.command {
        Some(Cmd::Sources) => cmd_sources(cfg),
        Some(Cmd::Preview) => {
            let fetcher = http_fetcher(cfg)?;
            cmd_preview(cfg, &fetcher)
        }
        None => {
            // default: fetch everything and write the snapshot
            let fetcher = http_fetcher(cfg)?;
            cmd_snapshot(cfg, &fetcher)
        }
    }
}

fn http_fetcher(cfg: &Config) -> Result<HttpFetcher> {
    HttpFetcher::new(&cfg.user_agent, cfg.timeout).context("Failed to build HTTP client")
}

fn build_aggregator(cfg: &Config) -> Aggregator {
    let aggregator = Aggregator::new(
        ArticleBuilder::new(cfg.sanitizer()),
        cfg.aggregate_options(),
    );

    if cfg.download_images {
        aggregator.with_images(Box::new(ImageCache::new(
            &cfg.image_dir,
            cfg.image_url_prefix.clone(),
            &cfg.user_agent,
            cfg.timeout,
        )))
    } else {
        aggregator
    }
}

/// Fetch, normalize and rank articles from every configured feed
pub fn collect_articles(cfg: &Config, fetcher: &dyn FeedFetcher) -> Vec<Article> {
    let articles = build_aggregator(cfg).run(&cfg.feeds, fetcher);
    info!(total = articles.len(), "fetched articles from all feeds");

    rank_articles(articles, cfg.max_total_articles)
}

/// Default `rssnap` behaviour: write the snapshot file. An empty run leaves
/// the previous snapshot in place.
pub fn cmd_snapshot(cfg: &Config, fetcher: &dyn FeedFetcher) -> Result<()> {
    let articles = collect_articles(cfg, fetcher);
    if articles.is_empty() {
        warn!(
            path = %cfg.output_path.display(),
            "no articles collected; keeping existing snapshot"
        );
        println!("No articles to save!");
        return Ok(());
    }

    let snapshot = Snapshot::new(articles, Utc::now());

    if let Err(err) = write_snapshot(&cfg.output_path, &snapshot) {
        error!(
            count = snapshot.article_count,
            path = %cfg.output_path.display(),
            error = %err,
            "snapshot not saved"
        );
        return Err(err).with_context(|| {
            format!(
                "Failed to save {} article(s) to '{}'",
                snapshot.article_count,
                cfg.output_path.display()
            )
        });
    }

    println!(
        "Saved {} article(s) to {}",
        snapshot.article_count,
        cfg.output_path.display()
    );
    Ok(())
}

/// Print ranked articles in pipe-friendly format
pub fn cmd_preview(cfg: &Config, fetcher: &dyn FeedFetcher) -> Result<()> {
    let now = Utc::now();
    for article in collect_articles(cfg, fetcher) {
        let date = article.published_at(now).format("%d %b %y").to_string();
        println!(
            "{} | {} | {} | {}",
            date,
            article.source,
            article.title.bold(),
            article.link.blue()
        );
    }
    Ok(())
}

/// List configured feeds
fn cmd_sources(cfg: &Config) -> Result<()> {
    for feed in &cfg.feeds {
        println!("{} | {}", feed.name.bold(), feed.url);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::FetchedFeed;
    use crate::error::SourceError;
    use crate::model::{FeedSource, RawEntry};
    use std::fs;

    fn config_with(output: std::path::PathBuf) -> Config {
        let mut cfg = Config::default();
        cfg.output_path = output;
        cfg.recency_days = None;
        cfg.max_total_articles = 2;
        cfg.feeds = vec![
            FeedSource::new("Down", "https://down.test/feed"),
            FeedSource::new("Up", "https://up.test/feed"),
        ];
        cfg
    }

    fn fetcher(url: &str) -> Result<FetchedFeed, SourceError> {
        if url.contains("down") {
            return Err(SourceError::Parse("connection refused".into()));
        }
        let entries = ["2025-01-01T00:00:00Z", "2025-01-03T00:00:00Z", "2025-01-02T00:00:00Z"]
            .iter()
            .map(|date| {
                Ok(RawEntry {
                    title: Some(format!("Story {date}")),
                    published: Some(date.to_string()),
                    ..Default::default()
                })
            })
            .collect();
        Ok(FetchedFeed {
            entries,
            malformed: None,
        })
    }

    #[test]
    fn snapshot_contains_ranked_capped_articles() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_with(dir.path().join("docs").join("news.json"));

        cmd_snapshot(&cfg, &fetcher).unwrap();

        let saved: Snapshot =
            serde_json::from_str(&fs::read_to_string(&cfg.output_path).unwrap()).unwrap();
        assert_eq!(saved.article_count, saved.articles.len());
        let dates: Vec<_> = saved.articles.iter().map(|a| a.pub_date.as_str()).collect();
        assert_eq!(dates, ["2025-01-03T00:00:00Z", "2025-01-02T00:00:00Z"]);
        assert!(saved.articles.iter().all(|a| a.source == "Up"));
    }

    #[test]
    fn empty_run_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_with(dir.path().join("news.json"));
        cfg.feeds = vec![FeedSource::new("Down", "https://down.test/feed")];
        fs::write(&cfg.output_path, r#"{"previous":"good snapshot"}"#).unwrap();

        cmd_snapshot(&cfg, &fetcher).unwrap();

        assert_eq!(
            fs::read_to_string(&cfg.output_path).unwrap(),
            r#"{"previous":"good snapshot"}"#
        );
    }

    #[test]
    fn empty_run_writes_nothing_when_no_snapshot_exists() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_with(dir.path().join("docs").join("news.json"));
        cfg.feeds.clear();

        cmd_snapshot(&cfg, &fetcher).unwrap();
        assert!(!cfg.output_path.exists());
    }

    #[test]
    fn persistence_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let cfg = config_with(blocker.join("news.json"));

        let err = cmd_snapshot(&cfg, &fetcher).unwrap_err();
        assert!(err.to_string().contains("Failed to save 2 article(s)"));
    }
}
