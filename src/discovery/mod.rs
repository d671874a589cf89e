//! Discovery run orchestration.
//!
//! A run acquires one page-fetching session, walks the pages named by its
//! [`DiscoveryPlan`], extracts candidates, pre-filters channel titles,
//! validates what is left and folds every verdict into a
//! [`DiscoveryResult`]. The session is released on every exit path.
//!
//! Page fetches are sequential because the session serves one navigation
//! at a time. Validation of the candidates found on one page fans out over
//! a bounded pool; each lookup runs in its own task so a panicking or
//! failing validator only costs its own candidate.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{FutureExt, StreamExt, stream};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::candidate::{Candidate, DiscoveryResult, Reason, ValidationOutcome};
use crate::classifier::KeywordClassifier;
use crate::config::Endpoints;
use crate::extract::{ExtractMode, extract};
use crate::fetcher::{FetchError, FetcherLauncher, PageFetcher};
use crate::identifier::{validate_channel_id, validate_playlist_id};
use crate::validator::{DurationWindow, Validators};

/// Default number of concurrent validation lookups.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Upper bound accepted for validation concurrency.
pub const MAX_CONCURRENCY: usize = 32;

/// Default settle delay after each navigation.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// What a run enumerates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryPlan {
    /// Index search pages `start_page..=end_page`.
    Index {
        /// First page (inclusive).
        start_page: u32,
        /// Last page (inclusive).
        end_page: u32,
    },
    /// Channel video grids, in order. Malformed ids are skipped.
    Channels {
        /// Raw channel identifiers.
        ids: Vec<String>,
    },
    /// One curated playlist; every entry is accepted.
    Playlist {
        /// Playlist identifier.
        id: String,
    },
}

/// A plan with its identifiers checked.
enum Targets<'a> {
    Pages(RangeInclusive<u32>),
    Channels(Vec<&'a str>),
    Playlist(&'a str),
}

impl<'a> Targets<'a> {
    /// Checks `plan`; `None` when nothing in it is worth a session.
    fn resolve(plan: &'a DiscoveryPlan) -> Result<Option<Self>, DiscoveryError> {
        match plan {
            DiscoveryPlan::Index {
                start_page,
                end_page,
            } => {
                if *start_page == 0 || start_page > end_page {
                    return Err(DiscoveryError::InvalidPageRange {
                        start: *start_page,
                        end: *end_page,
                    });
                }
                Ok(Some(Self::Pages(*start_page..=*end_page)))
            }
            DiscoveryPlan::Channels { ids } => {
                let channels: Vec<&str> = ids
                    .iter()
                    .filter_map(|raw| match validate_channel_id(raw) {
                        Ok(channel_id) => Some(channel_id),
                        Err(error) => {
                            warn!(error = %error, "skipping malformed channel id");
                            None
                        }
                    })
                    .collect();
                if channels.is_empty() {
                    warn!(listed = ids.len(), "no well-formed channel ids to crawl");
                    return Ok(None);
                }
                Ok(Some(Self::Channels(channels)))
            }
            DiscoveryPlan::Playlist { id } => match validate_playlist_id(id) {
                Ok(playlist_id) => Ok(Some(Self::Playlist(playlist_id))),
                Err(error) => {
                    warn!(error = %error, "skipping malformed playlist id");
                    Ok(None)
                }
            },
        }
    }
}

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Accepted duration window.
    pub window: DurationWindow,
    /// Wait after each navigation before reading the page.
    pub settle_delay: Duration,
    /// Concurrent validation lookups (clamped to `1..=MAX_CONCURRENCY`).
    pub concurrency: usize,
    /// Page and API base URLs.
    pub endpoints: Endpoints,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            window: DurationWindow::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            concurrency: DEFAULT_CONCURRENCY,
            endpoints: Endpoints::default(),
        }
    }
}

/// Run-level failures. Per-candidate problems never surface here.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Page range is empty or starts at zero
    #[error("invalid page range {start}..={end}\n  Suggestion: Pages start at 1 and --start-page must not exceed --end-page")]
    InvalidPageRange {
        /// First page
        start: u32,
        /// Last page
        end: u32,
    },

    /// The browser session could not be acquired
    #[error(transparent)]
    Session(#[from] FetchError),
}

/// Drives discovery runs.
pub struct Discovery {
    launcher: Arc<dyn FetcherLauncher>,
    validators: Validators,
    classifier: KeywordClassifier,
    options: DiscoveryOptions,
}

impl std::fmt::Debug for Discovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discovery")
            .field("validators", &self.validators)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Discovery {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        launcher: Arc<dyn FetcherLauncher>,
        validators: Validators,
        classifier: KeywordClassifier,
        options: DiscoveryOptions,
    ) -> Self {
        Self {
            launcher,
            validators,
            classifier,
            options,
        }
    }

    /// Runs `plan` to completion.
    ///
    /// Identifiers are checked before the session is acquired; a plan with
    /// nothing well-formed to visit returns an empty result without
    /// launching anything.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] for an empty page range or when the
    /// session cannot be acquired. Nothing after acquisition is fatal.
    #[instrument(skip(self, plan), fields(plan = plan_label(plan)))]
    pub async fn discover(&self, plan: &DiscoveryPlan) -> Result<DiscoveryResult, DiscoveryError> {
        let Some(targets) = Targets::resolve(plan)? else {
            return Ok(DiscoveryResult::new());
        };

        let session = self.launcher.launch().await?;
        info!(backend = session.name(), "session acquired");

        let run = AssertUnwindSafe(self.run(session.as_ref(), &targets)).catch_unwind().await;
        session.close().await;

        match run {
            Ok(result) => {
                info!(
                    accepted = result.accepted().len(),
                    rejected = result.rejected().len(),
                    "discovery finished"
                );
                Ok(result)
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn run(&self, session: &dyn PageFetcher, targets: &Targets<'_>) -> DiscoveryResult {
        let mut result = DiscoveryResult::new();
        match targets {
            Targets::Pages(pages) => {
                for page in pages.clone() {
                    self.index_page(session, page, &mut result).await;
                }
            }
            Targets::Channels(ids) => {
                for channel_id in ids {
                    self.channel(session, channel_id, &mut result).await;
                }
            }
            Targets::Playlist(id) => self.playlist(session, id, &mut result).await,
        }
        result
    }

    #[instrument(skip(self, session, result))]
    async fn index_page(&self, session: &dyn PageFetcher, page: u32, result: &mut DiscoveryResult) {
        let url = self.options.endpoints.index_page_url(page);
        let markup = session.fetch(&url, self.options.settle_delay).await;
        let candidates = extract(&markup, ExtractMode::Index);
        info!(found = candidates.len(), "index page scanned");
        self.validate_batch(candidates, result).await;
    }

    #[instrument(skip(self, session, result))]
    async fn channel(&self, session: &dyn PageFetcher, channel_id: &str, result: &mut DiscoveryResult) {
        let url = self.options.endpoints.channel_videos_url(channel_id);
        let markup = session.fetch(&url, self.options.settle_delay).await;
        let candidates = extract(&markup, ExtractMode::Channel);
        info!(found = candidates.len(), "channel page scanned");

        let mut plausible = Vec::new();
        for candidate in candidates {
            if result.contains(&candidate.id) {
                continue;
            }
            let verdict = self
                .classifier
                .is_plausible(candidate.title.as_deref().unwrap_or_default());
            if verdict.plausible {
                plausible.push(candidate);
            } else {
                debug!(video_id = %candidate.id, reason = verdict.reason, "title filtered");
                record(result, ValidationOutcome::reject(&candidate.id, Reason::NotMusicContent));
            }
        }
        self.validate_batch(plausible, result).await;
    }

    #[instrument(skip(self, session, result))]
    async fn playlist(&self, session: &dyn PageFetcher, playlist_id: &str, result: &mut DiscoveryResult) {
        let url = self.options.endpoints.playlist_url(playlist_id);
        let markup = session.fetch(&url, self.options.settle_delay).await;
        let candidates = extract(&markup, ExtractMode::Playlist);
        info!(found = candidates.len(), "playlist scanned");
        self.validate_batch(candidates, result).await;
    }

    /// Validates candidates not yet judged in this run and records the
    /// verdicts in candidate order.
    async fn validate_batch(&self, candidates: Vec<Candidate>, result: &mut DiscoveryResult) {
        let mut queued = HashSet::new();
        let pending: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| !result.contains(&c.id) && queued.insert(c.id.clone()))
            .collect();
        if pending.is_empty() {
            return;
        }

        let window = self.options.window;
        let concurrency = self.options.concurrency.clamp(1, MAX_CONCURRENCY);
        let outcomes: Vec<ValidationOutcome> = stream::iter(pending.into_iter().map(|candidate| {
            let validator = self.validators.for_source(candidate.source);
            async move {
                let Some(validator) = validator else {
                    return ValidationOutcome::accept(&candidate.id);
                };
                let candidate_id = candidate.id.clone();
                let task = tokio::spawn(async move { validator.validate(&candidate, window).await });
                match task.await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(error)) => {
                        warn!(video_id = %candidate_id, error = %error, "validation error");
                        ValidationOutcome::reject(&candidate_id, Reason::ValidationError)
                    }
                    Err(join_error) => {
                        warn!(video_id = %candidate_id, error = %join_error, "validation task failed");
                        ValidationOutcome::reject(&candidate_id, Reason::ValidationError)
                    }
                }
            }
        }))
        .buffered(concurrency)
        .collect()
        .await;

        for outcome in outcomes {
            record(result, outcome);
        }
    }
}

fn record(result: &mut DiscoveryResult, outcome: ValidationOutcome) {
    if outcome.accepted {
        info!(video_id = %outcome.candidate_id, "accepted");
    } else {
        info!(video_id = %outcome.candidate_id, reason = %outcome.reason, "rejected");
    }
    if !result.record(outcome) {
        debug!("duplicate outcome ignored");
    }
}

fn plan_label(plan: &DiscoveryPlan) -> &'static str {
    match plan {
        DiscoveryPlan::Index { .. } => "index",
        DiscoveryPlan::Channels { .. } => "channels",
        DiscoveryPlan::Playlist { .. } => "playlist",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::validator::{ValidationError, Validator};

    /// Page content that makes [`FakeSession::fetch`] panic.
    const CRASH_PAGE: &str = "<crash/>";

    #[derive(Default)]
    struct Calls {
        launches: AtomicUsize,
        fetched: Mutex<Vec<String>>,
        closes: AtomicUsize,
    }

    struct FakeSession {
        pages: HashMap<String, String>,
        calls: Arc<Calls>,
    }

    #[async_trait]
    impl PageFetcher for FakeSession {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn fetch(&self, url: &str, _settle: Duration) -> String {
            self.calls.fetched.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(markup) if markup == CRASH_PAGE => panic!("renderer crashed on {url}"),
                Some(markup) => markup.clone(),
                None => String::new(),
            }
        }

        async fn close(&self) {
            self.calls.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeLauncher {
        pages: HashMap<String, String>,
        calls: Arc<Calls>,
    }

    #[async_trait]
    impl FetcherLauncher for FakeLauncher {
        async fn launch(&self) -> Result<Box<dyn PageFetcher>, FetchError> {
            self.calls.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                pages: self.pages.clone(),
                calls: Arc::clone(&self.calls),
            }))
        }
    }

    /// Judges by a fixed duration table; unknown ids panic, `None` errors.
    struct TableValidator {
        durations: HashMap<String, Option<u64>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Validator for TableValidator {
        fn name(&self) -> &'static str {
            "table"
        }

        async fn validate(
            &self,
            candidate: &Candidate,
            window: DurationWindow,
        ) -> Result<ValidationOutcome, ValidationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.durations.get(&candidate.id) {
                Some(Some(d)) => Ok(crate::validator::judge_duration(&candidate.id, *d as f64, window)),
                Some(None) => Err(ValidationError::Backend {
                    validator: "table".to_string(),
                    candidate: candidate.id.clone(),
                    message: "boom".to_string(),
                }),
                None => panic!("unexpected candidate {}", candidate.id),
            }
        }
    }

    fn table(entries: &[(&str, Option<u64>)]) -> Arc<TableValidator> {
        Arc::new(TableValidator {
            durations: entries
                .iter()
                .map(|(id, d)| ((*id).to_string(), *d))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn discovery(
        pages: &[(String, String)],
        index: Arc<TableValidator>,
        metadata: Arc<TableValidator>,
    ) -> (Discovery, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let launcher = FakeLauncher {
            pages: pages.iter().cloned().collect(),
            calls: Arc::clone(&calls),
        };
        let options = DiscoveryOptions {
            settle_delay: Duration::ZERO,
            ..DiscoveryOptions::default()
        };
        let d = Discovery::new(
            Arc::new(launcher),
            Validators::new(index, metadata),
            KeywordClassifier::default(),
            options,
        );
        (d, calls)
    }

    fn index_markup(ids: &[&str]) -> String {
        ids.iter()
            .map(|id| format!(r#"<a href="/watch/{id}">x</a>"#))
            .collect()
    }

    fn channel_markup(items: &[(&str, &str)]) -> String {
        let mut html = String::from(r#"<div class="ytd-rich-grid-renderer">"#);
        for (id, title) in items {
            html.push_str(&format!(
                r#"<a id="video-title-link" title="{title}" href="/watch?v={id}">{title}</a>"#
            ));
        }
        html.push_str("</div>");
        html
    }

    #[tokio::test]
    async fn test_index_run_partitions_by_window() {
        let endpoints = Endpoints::default();
        let pages = [(
            endpoints.index_page_url(1),
            index_markup(&["aaaaaaaaaaa", "bbbbbbbbbbb", "aaaaaaaaaaa", "ccccccccccc"]),
        )];
        let index = table(&[
            ("aaaaaaaaaaa", Some(70)),
            ("bbbbbbbbbbb", Some(500)),
            ("ccccccccccc", Some(30)),
        ]);
        let (d, calls) = discovery(&pages, Arc::clone(&index), table(&[]));

        let result = d
            .discover(&DiscoveryPlan::Index {
                start_page: 1,
                end_page: 1,
            })
            .await
            .unwrap();

        assert_eq!(result.accepted(), vec!["aaaaaaaaaaa"]);
        assert_eq!(
            result.rejected(),
            vec![
                ("bbbbbbbbbbb".to_string(), "too long".to_string()),
                ("ccccccccccc".to_string(), "too short".to_string()),
            ]
        );
        assert_eq!(index.calls.load(Ordering::SeqCst), 3);
        assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_index_pages_inclusive_and_deduped_across_pages() {
        let endpoints = Endpoints::default();
        let pages = [
            (endpoints.index_page_url(2), index_markup(&["aaaaaaaaaaa"])),
            (endpoints.index_page_url(3), index_markup(&["aaaaaaaaaaa", "bbbbbbbbbbb"])),
        ];
        let index = table(&[("aaaaaaaaaaa", Some(100)), ("bbbbbbbbbbb", Some(100))]);
        let (d, calls) = discovery(&pages, Arc::clone(&index), table(&[]));

        let result = d
            .discover(&DiscoveryPlan::Index {
                start_page: 2,
                end_page: 3,
            })
            .await
            .unwrap();

        assert_eq!(result.accepted(), vec!["aaaaaaaaaaa", "bbbbbbbbbbb"]);
        assert_eq!(index.calls.load(Ordering::SeqCst), 2);
        assert_eq!(calls.fetched.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_channel_run_filters_titles_then_validates() {
        let endpoints = Endpoints::default();
        let channel = "UCabcdefghijklmnopqrstuv";
        let pages = [(
            endpoints.channel_videos_url(channel),
            channel_markup(&[
                ("aaaaaaaaaaa", "Official Cover ver."),
                ("bbbbbbbbbbb", "Minecraft stream highlights"),
            ]),
        )];
        let metadata = table(&[("aaaaaaaaaaa", Some(200))]);
        let (d, _) = discovery(&pages, table(&[]), Arc::clone(&metadata));

        let result = d
            .discover(&DiscoveryPlan::Channels {
                ids: vec![channel.to_string()],
            })
            .await
            .unwrap();

        assert_eq!(result.accepted(), vec!["aaaaaaaaaaa"]);
        assert_eq!(
            result.rejected(),
            vec![("bbbbbbbbbbb".to_string(), "not music content".to_string())]
        );
        assert_eq!(metadata.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_channel_is_skipped_without_fetch() {
        let endpoints = Endpoints::default();
        let good = "UCabcdefghijklmnopqrstuv";
        let pages = [(
            endpoints.channel_videos_url(good),
            channel_markup(&[("aaaaaaaaaaa", "歌ってみた")]),
        )];
        let (d, calls) = discovery(&pages, table(&[]), table(&[("aaaaaaaaaaa", Some(200))]));

        let result = d
            .discover(&DiscoveryPlan::Channels {
                ids: vec!["XYZ123".to_string(), good.to_string()],
            })
            .await
            .unwrap();

        let fetched = calls.fetched.lock().unwrap().clone();
        assert_eq!(fetched, vec![endpoints.channel_videos_url(good)]);
        assert_eq!(result.accepted(), vec!["aaaaaaaaaaa"]);
    }

    #[tokio::test]
    async fn test_playlist_entries_accepted_without_validation() {
        let endpoints = Endpoints::default();
        let playlist = "PLabcdefghij";
        let html = r#"<div class="ytd-playlist-video-list-renderer">
            <a id="video-title" title="one" href="/watch?v=aaaaaaaaaaa&list=PLabcdefghij&index=1">one</a>
            <a id="video-title" title="two" href="/watch?v=bbbbbbbbbbb&list=PLabcdefghij&index=2">two</a>
        </div>"#;
        let pages = [(endpoints.playlist_url(playlist), html.to_string())];
        let index = table(&[]);
        let metadata = table(&[]);
        let (d, _) = discovery(&pages, Arc::clone(&index), Arc::clone(&metadata));

        let result = d
            .discover(&DiscoveryPlan::Playlist {
                id: playlist.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.accepted(), vec!["aaaaaaaaaaa", "bbbbbbbbbbb"]);
        assert!(result.rejected().is_empty());
        assert_eq!(index.calls.load(Ordering::SeqCst), 0);
        assert_eq!(metadata.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validator_error_and_panic_are_contained() {
        let endpoints = Endpoints::default();
        let pages = [(
            endpoints.index_page_url(1),
            index_markup(&["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"]),
        )];
        // bbbbbbbbbbb errors, ccccccccccc is absent from the table and panics.
        let index = table(&[("aaaaaaaaaaa", Some(120)), ("bbbbbbbbbbb", None)]);
        let (d, calls) = discovery(&pages, index, table(&[]));

        let result = d
            .discover(&DiscoveryPlan::Index {
                start_page: 1,
                end_page: 1,
            })
            .await
            .unwrap();

        assert_eq!(result.accepted(), vec!["aaaaaaaaaaa"]);
        assert_eq!(
            result.rejected(),
            vec![
                (
                    "bbbbbbbbbbb".to_string(),
                    "an error occurred during validation".to_string()
                ),
                (
                    "ccccccccccc".to_string(),
                    "an error occurred during validation".to_string()
                ),
            ]
        );
        assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_inverted_page_range_fails_before_launch() {
        let (d, calls) = discovery(&[], table(&[]), table(&[]));
        let err = d
            .discover(&DiscoveryPlan::Index {
                start_page: 5,
                end_page: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidPageRange { .. }));
        assert_eq!(calls.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_page_yields_empty_result() {
        let (d, calls) = discovery(&[], table(&[]), table(&[]));
        let result = d
            .discover(&DiscoveryPlan::Index {
                start_page: 1,
                end_page: 2,
            })
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(calls.fetched.lock().unwrap().len(), 2);
        assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_closed_once_when_fetch_panics() {
        let endpoints = Endpoints::default();
        let pages = [
            (endpoints.index_page_url(1), index_markup(&["aaaaaaaaaaa"])),
            (endpoints.index_page_url(2), CRASH_PAGE.to_string()),
        ];
        let index = table(&[("aaaaaaaaaaa", Some(100))]);
        let (d, calls) = discovery(&pages, index, table(&[]));

        let outcome = AssertUnwindSafe(d.discover(&DiscoveryPlan::Index {
            start_page: 1,
            end_page: 3,
        }))
        .catch_unwind()
        .await;

        assert!(outcome.is_err(), "panic should propagate out of discover");
        assert_eq!(calls.closes.load(Ordering::SeqCst), 1);
        // Page 3 is never reached.
        assert_eq!(calls.fetched.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_all_malformed_channels_launch_nothing() {
        let (d, calls) = discovery(&[], table(&[]), table(&[]));
        let result = d
            .discover(&DiscoveryPlan::Channels {
                ids: vec!["XYZ123".to_string(), "UCshort".to_string()],
            })
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(calls.launches.load(Ordering::SeqCst), 0);
        assert_eq!(calls.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_playlist_launches_nothing() {
        let (d, calls) = discovery(&[], table(&[]), table(&[]));
        let result = d
            .discover(&DiscoveryPlan::Playlist {
                id: "not a playlist".to_string(),
            })
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(calls.launches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_page_zero_is_invalid() {
        let (d, calls) = discovery(&[], table(&[]), table(&[]));
        let err = d
            .discover(&DiscoveryPlan::Index {
                start_page: 0,
                end_page: 2,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidPageRange { start: 0, end: 2 }));
        assert_eq!(calls.launches.load(Ordering::SeqCst), 0);
    }
}
