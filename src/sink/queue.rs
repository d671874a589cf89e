//! Queue sinks for accepted candidates.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::candidate::watch_url;
use crate::db::Database;
use crate::http_client::{HttpTimeouts, build_http_client};
use crate::user_agent::BROWSER_USER_AGENT;

use super::SinkError;

/// Archive mode tag sent with every queued URL.
pub const ARCHIVE_MODE: i64 = 0;

const AUTH_HEADER: &str = "X-AUTHENTICATION";
const STUB_HEADER: &str = "Stub file for Patchwork Archive";

/// Result of handing one id to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Accepted by the queue.
    Enqueued,
    /// Not queued because the sink already knows it.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
    /// The queue answered with a non-success status.
    Refused {
        /// HTTP status.
        status: u16,
    },
}

/// Counts from [`forward_accepted`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnqueueSummary {
    /// Newly queued.
    pub enqueued: usize,
    /// Already known to the sink.
    pub skipped: usize,
    /// Refused or errored. Not retried.
    pub failed: usize,
}

/// Destination for accepted candidate ids.
#[async_trait]
pub trait QueueSink: Send + Sync {
    /// Returns the sink's name for logs.
    fn name(&self) -> &str;

    /// Queues one video id.
    async fn enqueue(&self, video_id: &str) -> Result<EnqueueOutcome, SinkError>;

    /// Releases whatever the sink holds open. Defaults to a no-op.
    async fn close(&self) {}
}

/// Forwards every id in `accepted` to `sink`, once each, in order.
///
/// Failures are logged and counted; they never stop the loop.
#[instrument(skip(sink, accepted), fields(sink = sink.name(), count = accepted.len()))]
pub async fn forward_accepted(sink: &dyn QueueSink, accepted: &[String]) -> EnqueueSummary {
    let mut summary = EnqueueSummary::default();
    for video_id in accepted {
        match sink.enqueue(video_id).await {
            Ok(EnqueueOutcome::Enqueued) => {
                info!(video_id = %video_id, "enqueued");
                summary.enqueued += 1;
            }
            Ok(EnqueueOutcome::Skipped { reason }) => {
                info!(video_id = %video_id, reason = %reason, "skipped");
                summary.skipped += 1;
            }
            Ok(EnqueueOutcome::Refused { status }) => {
                warn!(video_id = %video_id, status, "queue refused");
                summary.failed += 1;
            }
            Err(error) => {
                warn!(video_id = %video_id, error = %error, "enqueue failed");
                summary.failed += 1;
            }
        }
    }
    info!(
        enqueued = summary.enqueued,
        skipped = summary.skipped,
        failed = summary.failed,
        "forwarding finished"
    );
    summary
}

/// Posts canonical URLs to the archive queue API.
pub struct ApiQueueSink {
    client: Client,
    endpoint: String,
    auth: String,
}

impl ApiQueueSink {
    /// Creates a sink posting to `endpoint` with `auth` in `X-AUTHENTICATION`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Client`] when the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, auth: impl Into<String>) -> Result<Self, SinkError> {
        let client = build_http_client("queue-api", BROWSER_USER_AGENT, HttpTimeouts::default())
            .map_err(SinkError::Client)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            auth: auth.into(),
        })
    }
}

impl std::fmt::Debug for ApiQueueSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiQueueSink")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl QueueSink for ApiQueueSink {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn enqueue(&self, video_id: &str) -> Result<EnqueueOutcome, SinkError> {
        let mode = ARCHIVE_MODE.to_string();
        let form = [("url", watch_url(video_id)), ("mode", mode)];
        let response = self
            .client
            .post(&self.endpoint)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(AUTH_HEADER, &self.auth)
            .form(&form)
            .send()
            .await
            .map_err(|source| SinkError::Request {
                video_id: video_id.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        if status == 200 {
            Ok(EnqueueOutcome::Enqueued)
        } else {
            Ok(EnqueueOutcome::Refused { status })
        }
    }
}

/// Appends ids to a local stub file, one per line.
#[derive(Debug, Clone)]
pub struct StubFileSink {
    path: PathBuf,
}

impl StubFileSink {
    /// Opens the stub file at `path`, writing a header line if it is new.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] when the file cannot be created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::write(&path, format!("{STUB_HEADER}\n"))
                .await
                .map_err(|source| SinkError::Io {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), "stub file created");
        }
        Ok(Self { path })
    }

    /// Stub file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QueueSink for StubFileSink {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn enqueue(&self, video_id: &str) -> Result<EnqueueOutcome, SinkError> {
        let io_error = |source| SinkError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_error)?;
        file.write_all(format!("{video_id}\n").as_bytes())
            .await
            .map_err(io_error)?;
        file.flush().await.map_err(io_error)?;
        Ok(EnqueueOutcome::Enqueued)
    }
}

/// Inserts canonical URLs into the local `archive_queue` table.
#[derive(Debug, Clone)]
pub struct DatabaseSink {
    db: Database,
}

impl DatabaseSink {
    /// Wraps an open database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QueueSink for DatabaseSink {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn enqueue(&self, video_id: &str) -> Result<EnqueueOutcome, SinkError> {
        if self.db.is_archived(video_id).await? {
            return Ok(EnqueueOutcome::Skipped {
                reason: "already archived".to_string(),
            });
        }
        let url = watch_url(video_id);
        if self.db.is_queued(&url).await? {
            return Ok(EnqueueOutcome::Skipped {
                reason: "already queued".to_string(),
            });
        }
        self.db.enqueue(&url, ARCHIVE_MODE).await?;
        Ok(EnqueueOutcome::Enqueued)
    }

    async fn close(&self) {
        self.db.close().await;
    }
}
