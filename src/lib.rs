//! Covercrawl Core Library
//!
//! This library discovers candidate music videos (covers, originals, MVs)
//! from an index site and from channel/playlist pages, validates each one
//! against a duration window and publication status, and partitions the
//! run into accepted and rejected sets ready for archival queuing.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`candidate`] - Candidate, outcome and run result value types
//! - [`identifier`] - Channel/video/playlist identifier shape checks
//! - [`extract`] - Candidate extraction from rendered page markup
//! - [`classifier`] - Keyword-based title pre-filter
//! - [`validator`] - Duration/status validation against the index API or a metadata provider
//! - [`fetcher`] - Rendered-page fetching through a browser session
//! - [`discovery`] - Run orchestration: fetch, extract, classify, validate, partition
//! - [`sink`] - Report files and queue forwarding
//! - [`db`] - Local archive queue database
//! - [`channel_list`] - Channel list file bookkeeping
//! - [`config`] - Credentials and file-based defaults

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod candidate;
pub mod channel_list;
pub mod classifier;
pub mod config;
pub mod db;
pub mod discovery;
pub mod extract;
pub mod fetcher;
pub(crate) mod http_client;
pub mod identifier;
pub mod sink;
pub(crate) mod user_agent;
pub mod validator;

// Re-export commonly used types
pub use candidate::{Candidate, CandidateSource, DiscoveryResult, Reason, ValidationOutcome};
pub use classifier::{CaseFolding, Classification, DEFAULT_KEYWORDS, KeywordClassifier, KeywordsError};
pub use config::{ConfigError, Credentials, Endpoints, FileConfig};
pub use db::{Database, DbError};
pub use discovery::{
    DEFAULT_CONCURRENCY, Discovery, DiscoveryError, DiscoveryOptions, DiscoveryPlan,
};
pub use extract::{ExtractMode, extract};
pub use fetcher::{
    BrowserlessLauncher, DriverEndpoint, FetchError, FetcherLauncher, PageFetcher, WebDriverLauncher,
};
pub use identifier::{IdentifierError, validate_channel_id, validate_playlist_id, is_video_id};
pub use sink::{
    ApiQueueSink, DatabaseSink, EnqueueOutcome, EnqueueSummary, QueueSink, ReportError, SinkError,
    StubFileSink, forward_accepted, parse_report, render_report, write_report,
};
pub use validator::{
    DurationWindow, IndexValidator, MetadataProvider, MetadataValidator, ValidationError,
    ValidationStrategy, Validator, Validators, VideoMetadata, YtDlpProvider,
};
