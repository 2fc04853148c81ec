//! Command line argument definitions.

use crate::models::config::SortBy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Catalog Sync - Fill a local movie catalog from TMDB
#[derive(Parser, Debug)]
#[command(name = "catalog-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip preflight checks
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import new movies from TMDB
    Sync {
        /// Number of new movies to create
        #[arg(short, long)]
        target: Option<usize>,

        /// Discover sort order
        #[arg(long, value_enum)]
        sort_by: Option<SortBy>,

        /// Movies processed at the same time
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// Only movies with at least this many votes
        #[arg(long, value_name = "COUNT")]
        min_votes: Option<u32>,

        /// Only movies released within the last N months
        #[arg(long, value_name = "MONTHS")]
        released_within_months: Option<u32>,

        /// Catalog store file
        #[arg(short, long, value_name = "STORE")]
        store: Option<PathBuf>,

        /// Write a JSON run report to this path
        #[arg(short, long, value_name = "REPORT")]
        report: Option<PathBuf>,

        /// Do not create categories for the full genre list first
        #[arg(long)]
        skip_genres: bool,
    },

    /// Create a category for every TMDB movie genre
    Genres {
        /// Catalog store file
        #[arg(short, long, value_name = "STORE")]
        store: Option<PathBuf>,
    },

    /// Show catalog statistics
    Stats {
        /// Catalog store file
        #[arg(short, long, value_name = "STORE")]
        store: Option<PathBuf>,
    },

    /// Delete every row of the catalog
    Reset {
        /// Catalog store file
        #[arg(short, long, value_name = "STORE")]
        store: Option<PathBuf>,

        /// Required to actually delete anything
        #[arg(long)]
        confirm: bool,
    },
}
