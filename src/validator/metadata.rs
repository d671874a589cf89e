//! Metadata-provider-backed validation for channel sourced candidates.
//!
//! The provider answers with an optional duration; a missing duration is a
//! normal outcome ("no duration found"), a failed lookup rejects with
//! "unable to get video info".

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::candidate::{Candidate, Reason, ValidationOutcome, watch_url};

use super::{DurationWindow, MetadataError, ValidationError, Validator, judge_duration};

/// Default provider executable.
pub const DEFAULT_YT_DLP_PROGRAM: &str = "yt-dlp";

/// Upper bound for one provider invocation.
const LOOKUP_TIMEOUT_SECS: u64 = 60;

/// What the provider knows about a video.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoMetadata {
    /// Duration in seconds as reported, fractions kept.
    pub duration_secs: Option<f64>,
    /// Video title, when known.
    pub title: Option<String>,
}

/// Looks up video metadata by id.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Returns the provider's name for logs.
    fn name(&self) -> &str;

    /// Looks up metadata for `video_id`.
    async fn lookup(&self, video_id: &str) -> Result<VideoMetadata, MetadataError>;
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    title: Option<String>,
}

/// Decodes the JSON document printed by `yt-dlp --dump-single-json`.
///
/// Fractional durations are kept as reported; negative or non-finite values
/// are treated as unknown.
///
/// # Errors
///
/// Returns [`MetadataError::Decode`] when `raw` is not a JSON object.
pub fn parse_ytdlp_json(video_id: &str, raw: &[u8]) -> Result<VideoMetadata, MetadataError> {
    let info: YtDlpInfo = serde_json::from_slice(raw).map_err(|e| MetadataError::Decode {
        video_id: video_id.to_string(),
        reason: e.to_string(),
    })?;

    let duration_secs = info.duration.filter(|d| d.is_finite() && *d >= 0.0);

    Ok(VideoMetadata {
        duration_secs,
        title: info.title,
    })
}

/// Metadata provider backed by the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlpProvider {
    program: String,
    timeout: Duration,
}

impl YtDlpProvider {
    /// Uses `program` (path or name on `PATH`).
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_secs(LOOKUP_TIMEOUT_SECS),
        }
    }
}

impl Default for YtDlpProvider {
    fn default() -> Self {
        Self::new(DEFAULT_YT_DLP_PROGRAM)
    }
}

#[async_trait]
impl MetadataProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    #[tracing::instrument(skip(self), fields(provider = "yt-dlp"))]
    async fn lookup(&self, video_id: &str) -> Result<VideoMetadata, MetadataError> {
        let child = Command::new(&self.program)
            .args([
                "--dump-single-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
            ])
            .arg(watch_url(video_id))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MetadataError::Launch {
                program: self.program.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| MetadataError::Timeout {
                video_id: video_id.to_string(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| MetadataError::Lookup {
                video_id: video_id.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MetadataError::Lookup {
                video_id: video_id.to_string(),
                message: stderr.lines().last().unwrap_or("provider exited with error").to_string(),
            });
        }

        parse_ytdlp_json(video_id, &output.stdout)
    }
}

/// Validator backed by a [`MetadataProvider`].
pub struct MetadataValidator<P> {
    provider: P,
}

impl<P: MetadataProvider> MetadataValidator<P> {
    /// Wraps `provider`.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P> std::fmt::Debug for MetadataValidator<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataValidator").finish_non_exhaustive()
    }
}

#[async_trait]
impl<P: MetadataProvider> Validator for MetadataValidator<P> {
    fn name(&self) -> &'static str {
        "metadata"
    }

    #[tracing::instrument(skip(self, candidate), fields(validator = "metadata", video_id = %candidate.id))]
    async fn validate(
        &self,
        candidate: &Candidate,
        window: DurationWindow,
    ) -> Result<ValidationOutcome, ValidationError> {
        let metadata = match self.provider.lookup(&candidate.id).await {
            Ok(metadata) => metadata,
            Err(error) => {
                warn!(provider = self.provider.name(), error = %error, "metadata lookup failed");
                return Ok(ValidationOutcome::reject(
                    &candidate.id,
                    Reason::VideoInfoUnavailable,
                ));
            }
        };

        let Some(duration) = metadata.duration_secs else {
            debug!("provider returned no duration");
            return Ok(ValidationOutcome::reject(
                &candidate.id,
                Reason::NoDurationFound,
            ));
        };
        Ok(judge_duration(&candidate.id, duration, window))
    }
}
