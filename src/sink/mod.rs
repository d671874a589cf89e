//! Run output: report files and queue forwarding.
//!
//! - [`render_report`] / [`parse_report`] / [`write_report`] - timestamped run report
//! - [`QueueSink`] - where accepted ids go: [`ApiQueueSink`], [`StubFileSink`], [`DatabaseSink`]
//! - [`forward_accepted`] - sequential, non-retrying hand-off to a sink

mod queue;
mod report;

pub use queue::{
    ARCHIVE_MODE, ApiQueueSink, DatabaseSink, EnqueueOutcome, EnqueueSummary, QueueSink,
    StubFileSink, forward_accepted,
};
pub use report::{
    ReportError, parse_report, render_report, report_file_name, write_report, write_report_at,
};

use std::path::PathBuf;

use thiserror::Error;

use crate::db::DbError;

/// Queue sink errors. Per-id and never fatal to forwarding.
#[derive(Debug, Error)]
pub enum SinkError {
    /// HTTP client could not be constructed
    #[error("failed to build queue HTTP client: {0}")]
    Client(String),

    /// Request did not complete
    #[error("queue request for {video_id} failed: {source}")]
    Request {
        /// Video id being queued
        video_id: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// Stub file could not be written
    #[error("failed to write stub file '{path}': {source}")]
    Io {
        /// Stub file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Database query failed
    #[error(transparent)]
    Db(#[from] DbError),
}
