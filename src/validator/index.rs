//! Index-backed validation.
//!
//! The index exposes one record per video id with a lifecycle status and a
//! duration in seconds. Only `past` videos inside the window are accepted.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::candidate::{Candidate, Reason, ValidationOutcome};
use crate::http_client::{HttpTimeouts, build_http_client};
use crate::user_agent;

use super::{DurationWindow, IndexError, ValidationError, Validator, judge_duration};

/// Default index API base URL.
pub const DEFAULT_INDEX_API_URL: &str = "https://holodex.net/api/v2";

/// Header carrying the static API key.
const API_KEY_HEADER: &str = "X-APIKEY";

/// Lifecycle status of an indexed video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    /// Newly indexed, not yet scheduled.
    New,
    /// Scheduled premiere or stream.
    Upcoming,
    /// Currently live or premiering.
    Live,
    /// Published and finished.
    Past,
    /// Removed from the platform.
    Missing,
    /// Any status this client does not know.
    #[serde(other)]
    Unknown,
}

/// The subset of an index record used for validation.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexRecord {
    /// Lifecycle status.
    pub status: VideoStatus,
    /// Duration in seconds.
    pub duration: u64,
}

/// Validator backed by the index status/duration API.
pub struct IndexValidator {
    client: Client,
    base_url: String,
    api_key: String,
}

impl IndexValidator {
    /// Creates a validator against the public index API.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Backend`] when the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ValidationError> {
        Self::with_base_url(api_key, DEFAULT_INDEX_API_URL)
    }

    /// Creates a validator against a custom base URL (tests, mirrors).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Backend`] when the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let client = build_http_client(
            "index",
            &user_agent::default_api_user_agent(),
            HttpTimeouts::default(),
        )
        .map_err(|message| ValidationError::Backend {
            validator: "index".to_string(),
            candidate: String::new(),
            message,
        })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Fetches the index record for `video_id`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] on transport failure, non-success status or an
    /// undecodable body.
    #[tracing::instrument(skip(self), fields(validator = "index"))]
    pub async fn lookup(&self, video_id: &str) -> Result<IndexRecord, IndexError> {
        let url = format!("{}/videos/{video_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| IndexError::Request {
                video_id: video_id.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexError::Status {
                video_id: video_id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| IndexError::Request {
            video_id: video_id.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|e| IndexError::Decode {
            video_id: video_id.to_string(),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for IndexValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexValidator")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Validator for IndexValidator {
    fn name(&self) -> &'static str {
        "index"
    }

    #[tracing::instrument(skip(self, candidate), fields(validator = "index", video_id = %candidate.id))]
    async fn validate(
        &self,
        candidate: &Candidate,
        window: DurationWindow,
    ) -> Result<ValidationOutcome, ValidationError> {
        let record = match self.lookup(&candidate.id).await {
            Ok(record) => record,
            Err(error) => {
                warn!(error = %error, "index lookup failed");
                return Ok(ValidationOutcome::reject(&candidate.id, Reason::LookupFailed));
            }
        };

        debug!(status = ?record.status, duration = record.duration, "index record");
        if record.status != VideoStatus::Past {
            return Ok(ValidationOutcome::reject(
                &candidate.id,
                Reason::NotYetPublished,
            ));
        }
        #[allow(clippy::cast_precision_loss)]
        let duration_secs = record.duration as f64;
        Ok(judge_duration(&candidate.id, duration_secs, window))
    }
}
