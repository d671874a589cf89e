//! Candidate validation against authoritative sources.
//!
//! Two backends apply the same strict duration window:
//! - [`IndexValidator`] reads status and duration from the index API
//! - [`MetadataValidator`] reads duration from a [`MetadataProvider`] such as [`YtDlpProvider`]
//!
//! [`ValidationStrategy`] maps a candidate's source to the backend that
//! judges it; [`Validators`] holds one instance of each.
//!
//! # Example
//!
//! ```
//! use covercrawl_core::validator::DurationWindow;
//! use covercrawl_core::Reason;
//!
//! let window = DurationWindow::new(65, 480).unwrap();
//! assert_eq!(window.check(70.0), Ok(()));
//! assert_eq!(window.check(65.0), Err(Reason::TooShort));
//! assert_eq!(window.check(479.6), Ok(()));
//! assert_eq!(window.check(480.0), Err(Reason::TooLong));
//! ```

mod error;
mod index;
mod metadata;

pub use error::{IndexError, MetadataError, ValidationError};
pub use index::{DEFAULT_INDEX_API_URL, IndexRecord, IndexValidator, VideoStatus};
pub use metadata::{MetadataProvider, MetadataValidator, VideoMetadata, YtDlpProvider, parse_ytdlp_json};

use std::sync::Arc;

use async_trait::async_trait;

use crate::candidate::{Candidate, CandidateSource, Reason, ValidationOutcome};

/// Default lower duration bound in seconds.
pub const DEFAULT_MIN_DURATION_SECS: u64 = 65;

/// Default upper duration bound in seconds.
pub const DEFAULT_MAX_DURATION_SECS: u64 = 480;

/// Exclusive duration window `(min, max)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationWindow {
    min_secs: u64,
    max_secs: u64,
}

impl DurationWindow {
    /// Creates a window; a duration is accepted iff `min < d < max`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidWindow`] when `min >= max`.
    pub fn new(min_secs: u64, max_secs: u64) -> Result<Self, ValidationError> {
        if min_secs >= max_secs {
            return Err(ValidationError::InvalidWindow {
                min: min_secs,
                max: max_secs,
            });
        }
        Ok(Self { min_secs, max_secs })
    }

    /// Lower bound (exclusive).
    #[must_use]
    pub fn min_secs(self) -> u64 {
        self.min_secs
    }

    /// Upper bound (exclusive).
    #[must_use]
    pub fn max_secs(self) -> u64 {
        self.max_secs
    }

    /// Checks a duration, fractional seconds included. Bounds themselves
    /// are rejected.
    ///
    /// # Errors
    ///
    /// [`Reason::TooShort`] for `d <= min`, [`Reason::TooLong`] for `d >= max`.
    #[allow(clippy::cast_precision_loss)]
    pub fn check(self, duration_secs: f64) -> Result<(), Reason> {
        if duration_secs <= self.min_secs as f64 {
            Err(Reason::TooShort)
        } else if duration_secs >= self.max_secs as f64 {
            Err(Reason::TooLong)
        } else {
            Ok(())
        }
    }
}

impl Default for DurationWindow {
    fn default() -> Self {
        Self {
            min_secs: DEFAULT_MIN_DURATION_SECS,
            max_secs: DEFAULT_MAX_DURATION_SECS,
        }
    }
}

/// Judges a candidate into an outcome.
///
/// Lookup failures are verdicts (rejections with a reason), not errors.
/// An `Err` means the validator could not judge at all.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Returns the validator's name for logs (e.g. "index", "metadata").
    fn name(&self) -> &str;

    /// Validates one candidate against `window`.
    async fn validate(
        &self,
        candidate: &Candidate,
        window: DurationWindow,
    ) -> Result<ValidationOutcome, ValidationError>;
}

/// How candidates from a given source are judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStrategy {
    /// Index API record: status must be `past`, duration inside the window.
    IndexRecord,
    /// Metadata provider duration inside the window.
    Metadata,
    /// Curated source, accepted without lookups.
    Curated,
}

impl ValidationStrategy {
    /// Strategy for a candidate source.
    #[must_use]
    pub fn for_source(source: CandidateSource) -> Self {
        match source {
            CandidateSource::Index => Self::IndexRecord,
            CandidateSource::Channel => Self::Metadata,
            CandidateSource::Playlist => Self::Curated,
        }
    }
}

/// One validator per lookup strategy.
#[derive(Clone)]
pub struct Validators {
    index: Arc<dyn Validator>,
    metadata: Arc<dyn Validator>,
}

impl Validators {
    /// Bundles the index-backed and metadata-backed validators.
    #[must_use]
    pub fn new(index: Arc<dyn Validator>, metadata: Arc<dyn Validator>) -> Self {
        Self { index, metadata }
    }

    /// Validator for `source`, or `None` for curated sources.
    #[must_use]
    pub fn for_source(&self, source: CandidateSource) -> Option<Arc<dyn Validator>> {
        match ValidationStrategy::for_source(source) {
            ValidationStrategy::IndexRecord => Some(Arc::clone(&self.index)),
            ValidationStrategy::Metadata => Some(Arc::clone(&self.metadata)),
            ValidationStrategy::Curated => None,
        }
    }
}

impl std::fmt::Debug for Validators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validators")
            .field("index", &self.index.name())
            .field("metadata", &self.metadata.name())
            .finish()
    }
}

/// Applies the window to a looked-up duration; shared by both backends.
pub(crate) fn judge_duration(
    candidate_id: &str,
    duration_secs: f64,
    window: DurationWindow,
) -> ValidationOutcome {
    match window.check(duration_secs) {
        Ok(()) => ValidationOutcome::accept(candidate_id),
        Err(reason) => ValidationOutcome::reject(candidate_id, reason),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_window_rejects_inverted_bounds() {
        assert!(DurationWindow::new(480, 65).is_err());
        assert!(DurationWindow::new(65, 65).is_err());
        assert!(DurationWindow::new(64, 65).is_ok());
    }

    #[test]
    fn test_window_is_strict_on_both_sides() {
        let w = DurationWindow::new(65, 480).unwrap();
        assert_eq!(w.check(0.0), Err(Reason::TooShort));
        assert_eq!(w.check(64.0), Err(Reason::TooShort));
        assert_eq!(w.check(65.0), Err(Reason::TooShort));
        assert_eq!(w.check(66.0), Ok(()));
        assert_eq!(w.check(479.0), Ok(()));
        assert_eq!(w.check(480.0), Err(Reason::TooLong));
        assert_eq!(w.check(10_000.0), Err(Reason::TooLong));
    }

    #[test]
    fn test_window_compares_fractional_seconds() {
        let w = DurationWindow::new(65, 480).unwrap();
        assert_eq!(w.check(65.4), Ok(()));
        assert_eq!(w.check(479.6), Ok(()));
        assert_eq!(w.check(64.9), Err(Reason::TooShort));
        assert_eq!(w.check(480.1), Err(Reason::TooLong));
    }

    #[test]
    fn test_window_accepts_iff_strictly_inside() {
        let w = DurationWindow::new(10, 20).unwrap();
        for d in 0..40u32 {
            assert_eq!(w.check(f64::from(d)).is_ok(), 10 < d && d < 20, "duration {d}");
        }
    }

    #[test]
    fn test_default_window() {
        let w = DurationWindow::default();
        assert_eq!(w.min_secs(), 65);
        assert_eq!(w.max_secs(), 480);
    }

    #[test]
    fn test_strategy_per_source() {
        assert_eq!(
            ValidationStrategy::for_source(CandidateSource::Index),
            ValidationStrategy::IndexRecord
        );
        assert_eq!(
            ValidationStrategy::for_source(CandidateSource::Channel),
            ValidationStrategy::Metadata
        );
        assert_eq!(
            ValidationStrategy::for_source(CandidateSource::Playlist),
            ValidationStrategy::Curated
        );
    }

    #[test]
    fn test_judge_duration_reasons() {
        let w = DurationWindow::default();
        assert!(judge_duration("aaaaaaaaaaa", 70.0, w).accepted);
        assert_eq!(judge_duration("aaaaaaaaaaa", 30.0, w).reason, "too short");
        assert_eq!(judge_duration("aaaaaaaaaaa", 500.0, w).reason, "too long");
    }
}
