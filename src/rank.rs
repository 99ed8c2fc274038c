use chrono::{DateTime, Utc};
use std::cmp::Reverse;

use crate::model::Article;

pub const DEFAULT_MAX_ARTICLES: usize = 50;

/// Newest first, capped at `max_count`
pub fn rank_articles(articles: Vec<Article>, max_count: usize) -> Vec<Article> {
    rank_articles_at(articles, max_count, Utc::now())
}

/// Stable: articles with equal timestamps keep their relative order. Dates
/// that can't be read all sort as `now`.
pub fn rank_articles_at(
    mut articles: Vec<Article>,
    max_count: usize,
    now: DateTime<Utc>,
) -> Vec<Article> {
    articles.sort_by_cached_key(|a| Reverse(a.published_at(now)));
    articles.truncate(max_count);
    articles
}
