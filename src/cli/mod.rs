pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{SearchMode, SearchOptions};
use crate::ranking::SortMode;

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "Headlines, videos and blog posts from the terminal", long_about = None)]
pub struct Cli {
    /// Database file (default: <data dir>/newsdesk/newsdesk.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Keep everything in memory; nothing is persisted
    #[arg(long, global = true, conflicts_with = "db")]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Technology, general and video headlines
    Headlines {
        /// Drop stored headline and category collections and fetch again
        #[arg(long)]
        refresh: bool,
    },
    /// Articles for one news category
    Category {
        /// Category name, e.g. "sports"
        name: String,

        #[arg(short, long, default_value_t = SortMode::New)]
        sort: SortMode,

        #[arg(long)]
        refresh: bool,
    },
    /// Search news articles
    Search {
        /// Search text
        query: String,

        #[command(flatten)]
        filters: SearchArgs,
    },
    /// Latest news videos
    Videos {
        #[arg(long)]
        refresh: bool,
    },
    /// Blog posts ranked by engagement
    Blogs {
        /// Number of posts to request
        #[arg(short, long)]
        number: Option<u32>,

        #[arg(short, long, default_value_t = SortMode::Trendy)]
        sort: SortMode,

        #[arg(long)]
        refresh: bool,
    },
    /// Show a stored article by id or link
    Show {
        id: String,
    },
    /// Save a stored article by id or link
    Save {
        id: String,
    },
    /// Remove a saved article
    Unsave {
        id: String,
    },
    /// List saved articles
    Saved {
        #[arg(short, long, default_value_t = SortMode::New)]
        sort: SortMode,
    },
}

#[derive(clap::Args)]
pub struct SearchArgs {
    /// Where the text must match: q, qInTitle or qInMeta
    #[arg(short, long, default_value_t = SearchMode::Q)]
    pub mode: SearchMode,

    #[arg(long)]
    pub language: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Comma-separated domains
    #[arg(long)]
    pub domains: Option<String>,

    /// Earliest publish date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Latest publish date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Result pages to fetch (1-10)
    #[arg(short, long)]
    pub pages: Option<u32>,
}

impl From<SearchArgs> for SearchOptions {
    fn from(args: SearchArgs) -> Self {
        SearchOptions {
            mode: args.mode,
            language: args.language,
            country: args.country,
            category: args.category,
            domains: args.domains,
            from_date: args.from,
            to_date: args.to,
            max_pages: args.pages,
        }
    }
}
