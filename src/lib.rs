//! Feed normalization pipeline behind the `rssnap` binary.
//!
//! Raw feed entries go through [`article::ArticleBuilder`] (dates, thumbnails,
//! description cleanup), are collected per source by
//! [`aggregate::Aggregator`], ranked by [`rank::rank_articles`] and written
//! out as a [`snapshot::Snapshot`].

pub mod aggregate;
pub mod article;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dates;
pub mod error;
pub mod fetch;
pub mod images;
pub mod model;
pub mod rank;
pub mod sanitize;
pub mod snapshot;
pub mod thumbnail;
