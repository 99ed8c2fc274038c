use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// Command-line arguments for rssnap
#[derive(Parser, Debug)]
#[command(name = "rssnap", version)]
#[command(about = "Poll RSS/Atom feeds and write a JSON news snapshot")]
pub struct Cli {
    /// Path to config.toml (defaults to ~/.config/rssnap/config.toml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Where to write the snapshot (overrides config)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Maximum number of articles to keep (overrides config)
    #[arg(short = 'n', long = "limit", global = true)]
    pub limit: Option<usize>,

    /// Only keep entries from the last N days (overrides config)
    #[arg(long, global = true, conflicts_with = "all_dates")]
    pub days: Option<u32>,

    /// Keep entries regardless of age
    #[arg(long, global = true)]
    pub all_dates: bool,

    /// Only look at the first N entries of each feed
    #[arg(long, global = true)]
    pub per_source: Option<usize>,

    /// Download thumbnails next to the snapshot instead of hotlinking them
    #[arg(long)]
    pub download_images: bool,

    #[command(subcommand)]
    pub command: Option<Cmd>,
}

/// Subcommands for rssnap
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmd {
    /// List configured feeds
    Sources,

    /// Print ranked articles instead of writing the snapshot
    Preview,
    // No subcommand -> default: fetch everything and write the snapshot
}

impl Cli {
    /// Flags win over whatever config.toml says
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(output) = &self.output {
            cfg.output_path = output.clone();
        }
        if let Some(limit) = self.limit {
            cfg.max_total_articles = limit;
        }
        if let Some(days) = self.days {
            cfg.recency_days = Some(days).filter(|d| *d > 0);
        }
        if self.all_dates {
            cfg.recency_days = None;
        }
        if let Some(per_source) = self.per_source {
            cfg.max_articles_per_source = Some(per_source);
        }
        if self.download_images {
            cfg.download_images = true;
        }
    }
}
