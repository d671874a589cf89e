//! Value types flowing through a discovery run.
//!
//! A [`Candidate`] is produced by extraction, judged into a
//! [`ValidationOutcome`], and the outcomes are folded into a
//! [`DiscoveryResult`] that is handed to the report and queue sinks.

use std::collections::HashSet;
use std::fmt;

use tracing::warn;

/// Where a candidate was discovered. Also selects the validation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    /// Index search page (status + duration API available).
    Index,
    /// Channel video grid.
    Channel,
    /// Curated playlist.
    Playlist,
}

impl CandidateSource {
    /// Returns the stable string label for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Channel => "channel",
            Self::Playlist => "playlist",
        }
    }
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content identifier discovered on a page, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Platform video identifier. Identity of the candidate.
    pub id: String,
    /// Display title when the page exposes one.
    pub title: Option<String>,
    /// Page type the candidate came from.
    pub source: CandidateSource,
}

impl Candidate {
    /// Creates a candidate without a title.
    #[must_use]
    pub fn new(id: impl Into<String>, source: CandidateSource) -> Self {
        Self {
            id: id.into(),
            title: None,
            source,
        }
    }

    /// Creates a candidate carrying its display title.
    #[must_use]
    pub fn with_title(id: impl Into<String>, title: impl Into<String>, source: CandidateSource) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            source,
        }
    }

    /// Canonical watch URL used when enqueuing.
    #[must_use]
    pub fn watch_url(&self) -> String {
        watch_url(&self.id)
    }
}

/// Canonical watch URL for a video id.
#[must_use]
pub fn watch_url(video_id: &str) -> String {
    format!("https://youtube.com/watch?v={video_id}")
}

/// Why a candidate was accepted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Passed every check.
    Success,
    /// Index status was `upcoming` or `live`.
    NotYetPublished,
    /// Duration at or below the lower bound.
    TooShort,
    /// Duration at or above the upper bound.
    TooLong,
    /// Title matched none of the classifier keywords.
    NotMusicContent,
    /// Index lookup failed (network, HTTP status, decode).
    LookupFailed,
    /// Metadata provider returned a record without a duration.
    NoDurationFound,
    /// Metadata provider lookup failed.
    VideoInfoUnavailable,
    /// Validator returned an unexpected error; contained by the orchestrator.
    ValidationError,
}

impl Reason {
    /// Human-readable reason text written to logs and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotYetPublished => "not yet published",
            Self::TooShort => "too short",
            Self::TooLong => "too long",
            Self::NotMusicContent => "not music content",
            Self::LookupFailed => "lookup failed",
            Self::NoDurationFound => "no duration found",
            Self::VideoInfoUnavailable => "unable to get video info",
            Self::ValidationError => "an error occurred during validation",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Id of the judged candidate.
    pub candidate_id: String,
    /// Whether the candidate goes to the queue.
    pub accepted: bool,
    /// Human-readable classification of the verdict.
    pub reason: String,
}

impl ValidationOutcome {
    /// An accepted outcome with reason `success`.
    #[must_use]
    pub fn accept(candidate_id: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            accepted: true,
            reason: Reason::Success.as_str().to_string(),
        }
    }

    /// A rejected outcome with the given reason.
    #[must_use]
    pub fn reject(candidate_id: impl Into<String>, reason: Reason) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            accepted: false,
            reason: reason.as_str().to_string(),
        }
    }
}

/// Partitioned result of one discovery run.
///
/// Outcomes are append-only. Each candidate id lands in exactly one of the
/// two lists; a second outcome for an id already recorded is ignored.
/// Ids must be non-empty and free of whitespace and `':'`; line breaks in
/// reasons are stored as spaces, so every result renders as a line-based
/// report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryResult {
    accepted: Vec<String>,
    rejected: Vec<(String, String)>,
    seen: HashSet<String>,
}

impl DiscoveryResult {
    /// Creates an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if an outcome for `candidate_id` is already recorded.
    #[must_use]
    pub fn contains(&self, candidate_id: &str) -> bool {
        self.seen.contains(candidate_id)
    }

    /// Accepted candidate ids in recording order.
    #[must_use]
    pub fn accepted(&self) -> &[String] {
        &self.accepted
    }

    /// Rejected candidate ids with their reasons, in recording order.
    #[must_use]
    pub fn rejected(&self) -> &[(String, String)] {
        &self.rejected
    }

    /// Records an outcome. Returns false when the id was already recorded
    /// or is not a recordable id.
    pub fn record(&mut self, outcome: ValidationOutcome) -> bool {
        if !is_recordable_id(&outcome.candidate_id) {
            warn!(candidate_id = ?outcome.candidate_id, "outcome with unrecordable id dropped");
            return false;
        }
        if !self.seen.insert(outcome.candidate_id.clone()) {
            return false;
        }
        if outcome.accepted {
            self.accepted.push(outcome.candidate_id);
        } else {
            let reason = outcome.reason.replace(['\r', '\n'], " ");
            self.rejected.push((outcome.candidate_id, reason));
        }
        true
    }

    /// Total number of recorded outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_recordable_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(|c: char| c.is_whitespace() || c == ':')
}
