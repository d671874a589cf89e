//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use covercrawl_core::validator::{DEFAULT_MAX_DURATION_SECS, DEFAULT_MIN_DURATION_SECS};
use covercrawl_core::{DEFAULT_CONCURRENCY, DiscoveryPlan, DurationWindow, FileConfig};

/// Default settle delay in seconds.
const DEFAULT_WAIT_SECS: u64 = 5;
/// Default report directory.
const DEFAULT_REPORT_DIR: &str = "logs";
/// Stub sink file.
pub const STUB_FILE: &str = "stub.txt";

/// Crawl for music covers and originals and queue them for archival.
///
/// By default, index search pages are crawled and accepted videos are posted
/// to the archive queue API. Use --youtube to crawl channels from a list, or
/// --playlist to queue a curated playlist.
#[derive(Parser, Debug)]
#[command(name = "covercrawl")]
#[command(author, version, about)]
pub struct Args {
    /// First index search page to crawl
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub start_page: u32,

    /// Last index search page to crawl (inclusive)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub end_page: u32,

    /// Minimum video length in seconds, exclusive [default: 65]
    #[arg(long)]
    pub min_time: Option<u64>,

    /// Maximum video length in seconds, exclusive [default: 480]
    #[arg(long)]
    pub max_time: Option<u64>,

    /// Seconds to wait for dynamic content after each page load [default: 5]
    #[arg(long, alias = "wait_time", value_parser = clap::value_parser!(u64).range(0..=300))]
    pub wait_time: Option<u64>,

    /// Crawl channels from --channel-id-source instead of the index
    #[arg(long, conflicts_with = "playlist")]
    pub youtube: bool,

    /// Queue every video of one playlist
    #[arg(long, value_name = "ID")]
    pub playlist: Option<String>,

    /// File with one channel id per line
    #[arg(long, alias = "channel_id_source", default_value = "channels.txt")]
    pub channel_id_source: PathBuf,

    /// Queue into a local SQLite database instead of the API
    #[arg(long, value_name = "PATH", conflicts_with = "stub")]
    pub db: Option<PathBuf>,

    /// Append accepted ids to stub.txt instead of queuing
    #[arg(long)]
    pub stub: bool,

    /// Directory for run reports [default: logs]
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Keyword list (one per line) replacing the built-in title keywords
    #[arg(long)]
    pub keywords_file: Option<PathBuf>,

    /// Concurrent validation lookups (1-32) [default: 4]
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub concurrency: Option<u8>,

    /// Config file (defaults to $XDG_CONFIG_HOME/covercrawl/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Default tracing level for the verbosity flags.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// The discovery plan without the channel list contents.
    #[must_use]
    pub fn plan(&self, channel_ids: Vec<String>) -> DiscoveryPlan {
        if let Some(id) = &self.playlist {
            DiscoveryPlan::Playlist { id: id.clone() }
        } else if self.youtube {
            DiscoveryPlan::Channels { ids: channel_ids }
        } else {
            DiscoveryPlan::Index {
                start_page: self.start_page,
                end_page: self.end_page,
            }
        }
    }
}

/// Effective run settings: CLI over config file over built-in defaults.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub window: DurationWindow,
    pub settle_delay: Duration,
    pub concurrency: usize,
    pub report_dir: PathBuf,
    pub keywords_file: Option<PathBuf>,
}

impl RunSettings {
    pub fn resolve(args: &Args, file: Option<&FileConfig>) -> Result<Self> {
        let min = args
            .min_time
            .or_else(|| file.and_then(|f| f.min_time))
            .unwrap_or(DEFAULT_MIN_DURATION_SECS);
        let max = args
            .max_time
            .or_else(|| file.and_then(|f| f.max_time))
            .unwrap_or(DEFAULT_MAX_DURATION_SECS);
        let window = DurationWindow::new(min, max).context("Invalid --min-time/--max-time")?;

        let wait = args
            .wait_time
            .or_else(|| file.and_then(|f| f.wait_time))
            .unwrap_or(DEFAULT_WAIT_SECS);
        let concurrency = args
            .concurrency
            .map(usize::from)
            .or_else(|| file.and_then(|f| f.concurrency))
            .unwrap_or(DEFAULT_CONCURRENCY);

        Ok(Self {
            window,
            settle_delay: Duration::from_secs(wait),
            concurrency,
            report_dir: args
                .report_dir
                .clone()
                .or_else(|| file.and_then(|f| f.report_dir.clone()))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR)),
            keywords_file: args
                .keywords_file
                .clone()
                .or_else(|| file.and_then(|f| f.keywords_file.clone())),
        })
    }
}
