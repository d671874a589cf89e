//! Error types for validation backends.
//!
//! Lookup errors never escape a built-in validator: they are folded into a
//! rejection reason. [`ValidationError`] is what a validator returns when it
//! cannot produce an outcome at all; the orchestrator contains it.

use thiserror::Error;

/// Errors from the index status/duration API.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Request could not be sent or the body could not be read
    #[error("index request for '{video_id}' failed: {source}")]
    Request {
        /// Video being looked up
        video_id: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// Index answered with a non-success status
    #[error("index returned HTTP {status} for '{video_id}'")]
    Status {
        /// Video being looked up
        video_id: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body is not a record with `status` and `duration`
    #[error("index record for '{video_id}' could not be decoded: {reason}")]
    Decode {
        /// Video being looked up
        video_id: String,
        /// Decoder message
        reason: String,
    },
}

/// Errors from a metadata provider lookup.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Provider process could not be started
    #[error("failed to launch metadata provider '{program}': {source}\n  Suggestion: Install yt-dlp or set YT_DLP_PATH")]
    Launch {
        /// Program that failed to start
        program: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Provider ran but reported failure
    #[error("metadata lookup for '{video_id}' failed: {message}")]
    Lookup {
        /// Video being looked up
        video_id: String,
        /// Provider diagnostic
        message: String,
    },

    /// Provider did not answer in time
    #[error("metadata lookup for '{video_id}' timed out after {secs}s")]
    Timeout {
        /// Video being looked up
        video_id: String,
        /// Timeout that elapsed
        secs: u64,
    },

    /// Provider output is not valid metadata JSON
    #[error("metadata for '{video_id}' could not be decoded: {reason}")]
    Decode {
        /// Video being looked up
        video_id: String,
        /// Decoder message
        reason: String,
    },
}

/// A validator could not produce an outcome.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// Duration window bounds are unusable
    #[error("invalid duration window: min {min}s must be below max {max}s\n  Suggestion: Check --min-time and --max-time")]
    InvalidWindow {
        /// Lower bound
        min: u64,
        /// Upper bound
        max: u64,
    },

    /// Backend failed in a way that is not a lookup verdict
    #[error("validator '{validator}' failed on '{candidate}': {message}")]
    Backend {
        /// Validator name
        validator: String,
        /// Candidate id
        candidate: String,
        /// What went wrong
        message: String,
    },
}
