use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::article::ArticleBuilder;
use crate::dates::parse_date_at;
use crate::error::{EntryError, SourceError};
use crate::images::ImageDownloader;
use crate::model::{Article, FeedSource, RawEntry};

/// What a fetcher hands back for one feed
#[derive(Debug, Default)]
pub struct FetchedFeed {
    pub entries: Vec<Result<RawEntry, EntryError>>,
    /// Parser complaint when the feed was only readable after repair
    pub malformed: Option<String>,
}

/// Retrieves and parses the feed behind a URL.
pub trait FeedFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedFeed, SourceError>;
}

impl<F> FeedFetcher for F
where
    F: Fn(&str) -> Result<FetchedFeed, SourceError>,
{
    fn fetch(&self, url: &str) -> Result<FetchedFeed, SourceError> {
        self(url)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateOptions {
    /// Only the first N entries of each feed; `None` takes them all
    pub max_per_source: Option<usize>,
    /// Skip entries older than `now - window`
    pub recency_window: Option<Duration>,
}

/// Collects articles from every configured source, one source at a time.
///
/// A failing source or entry is logged and skipped; it never aborts the run.
pub struct Aggregator {
    builder: ArticleBuilder,
    options: AggregateOptions,
    images: Option<Box<dyn ImageDownloader>>,
}

impl Aggregator {
    pub fn new(builder: ArticleBuilder, options: AggregateOptions) -> Self {
        Self {
            builder,
            options,
            images: None,
        }
    }

    /// Replace remote thumbnails with locally cached copies
    pub fn with_images(mut self, images: Box<dyn ImageDownloader>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn run(&self, sources: &[FeedSource], fetcher: &dyn FeedFetcher) -> Vec<Article> {
        self.run_at(sources, fetcher, Utc::now())
    }

    pub fn run_at(
        &self,
        sources: &[FeedSource],
        fetcher: &dyn FeedFetcher,
        now: DateTime<Utc>,
    ) -> Vec<Article> {
        let mut articles = Vec::new();

        for source in sources {
            info!(source = %source.name, url = %source.url, "fetching feed");

            match fetcher.fetch(&source.url) {
                Ok(feed) => {
                    let before = articles.len();
                    self.collect_source(source, feed, now, &mut articles);
                    info!(
                        source = %source.name,
                        count = articles.len() - before,
                        "collected articles"
                    );
                }
                Err(err) => {
                    warn!(source = %source.name, error = %err, "skipping feed");
                }
            }
        }

        articles
    }

    fn collect_source(
        &self,
        source: &FeedSource,
        feed: FetchedFeed,
        now: DateTime<Utc>,
        out: &mut Vec<Article>,
    ) {
        if let Some(reason) = &feed.malformed {
            warn!(source = %source.name, %reason, "feed is malformed; continuing anyway");
        }

        let cutoff = self.options.recency_window.map(|window| now - window);
        let limit = self.options.max_per_source.unwrap_or(usize::MAX);

        for entry in feed.entries.into_iter().take(limit) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(source = %source.name, error = %err, "skipping entry");
                    continue;
                }
            };

            let article = self.builder.build_at(&entry, &source.name, now);

            if let Some(cutoff) = cutoff {
                if parse_date_at(Some(&article.pub_date), now) < cutoff {
                    debug!(source = %source.name, title = %article.title, "entry outside recency window");
                    continue;
                }
            }

            out.push(self.localize(article));
        }
    }

    fn localize(&self, article: Article) -> Article {
        let Some(images) = &self.images else {
            return article;
        };

        match article.thumbnail.as_deref().map(|url| images.download(url)) {
            Some(Some(local)) => article.with_thumbnail(Some(local)),
            _ => article,
        }
    }
}
