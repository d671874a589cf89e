//! Candidate extraction from rendered page markup.
//!
//! Index pages are scanned with a regex over the raw markup (no DOM needed,
//! tolerant of broken HTML). Channel and playlist pages are parsed into a
//! DOM and the per-video title links inside the grid container are read.
//!
//! Extraction never fails: empty markup or missing structure yields an
//! empty candidate list.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, trace};
use url::Url;

use crate::candidate::{Candidate, CandidateSource};
use crate::identifier::is_video_id;

/// Base used to absolutize relative `/watch?v=` links.
const PLATFORM_BASE_URL: &str = "https://www.youtube.com/";

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Compiles a CSS selector at static init; panics on invalid selector.
fn compile_static_selector(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| panic!("invalid static selector '{selector}': {e}"))
}

/// Anchor references on index search pages: `href="/watch/<id>"`.
static INDEX_ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"href\s*=\s*["']/watch/([A-Za-z0-9_-]+)["']"#)
});

/// Title links inside the channel video grid.
static CHANNEL_TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    compile_static_selector(".ytd-rich-grid-renderer a#video-title-link")
});

/// Title links inside the playlist video list.
static PLAYLIST_TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    compile_static_selector(".ytd-playlist-video-list-renderer a#video-title")
});

/// Structural assumptions used to read a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Index search results: ids only, regex over raw markup.
    Index,
    /// Channel video grid: ids and titles from the DOM.
    Channel,
    /// Playlist video list: ids and titles from the DOM.
    Playlist,
}

/// Extracts unique candidates from `markup`.
///
/// The result holds each id once, in first-seen order. Ids that do not have
/// the video id shape are dropped silently.
///
/// # Examples
///
/// ```
/// use covercrawl_core::extract::{ExtractMode, extract};
///
/// let html = r#"<a href="/watch/dQw4w9WgXcQ"></a><a href="/watch/dQw4w9WgXcQ"></a>"#;
/// let found = extract(html, ExtractMode::Index);
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].id, "dQw4w9WgXcQ");
/// ```
#[tracing::instrument(skip(markup), fields(markup_len = markup.len(), mode = ?mode))]
#[must_use]
pub fn extract(markup: &str, mode: ExtractMode) -> Vec<Candidate> {
    if markup.trim().is_empty() {
        debug!("empty markup, no candidates");
        return Vec::new();
    }

    let found = match mode {
        ExtractMode::Index => extract_index(markup),
        ExtractMode::Channel => extract_grid(markup, &CHANNEL_TITLE_LINK, CandidateSource::Channel),
        ExtractMode::Playlist => {
            extract_grid(markup, &PLAYLIST_TITLE_LINK, CandidateSource::Playlist)
        }
    };
    debug!(count = found.len(), "extracted candidates");
    found
}

fn extract_index(markup: &str) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    INDEX_ANCHOR_RE
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|id| {
            let ok = is_video_id(id);
            if !ok {
                trace!(id, "dropping malformed id");
            }
            ok
        })
        .filter(|id| seen.insert((*id).to_string()))
        .map(|id| Candidate::new(id, CandidateSource::Index))
        .collect()
}

fn extract_grid(markup: &str, link: &Selector, source: CandidateSource) -> Vec<Candidate> {
    let document = Html::parse_document(markup);
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for element in document.select(link) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(id) = video_id_from_href(href) else {
            trace!(href, "title link without a usable video id");
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }

        let title = element
            .value()
            .attr("title")
            .map(str::to_string)
            .unwrap_or_else(|| element.text().collect::<String>())
            .trim()
            .to_string();

        let candidate = if title.is_empty() {
            Candidate::new(id, source)
        } else {
            Candidate::with_title(id, title, source)
        };
        found.push(candidate);
    }
    found
}

/// Reads the `v` query parameter of a (possibly relative) watch link.
fn video_id_from_href(href: &str) -> Option<String> {
    let base = Url::parse(PLATFORM_BASE_URL).ok()?;
    let url = base.join(href).ok()?;
    if url.path() != "/watch" {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|id| is_video_id(id))
}
