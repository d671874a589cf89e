//! Channel list file bookkeeping.
//!
//! A channel list is plain text, one channel id per line. Annotated lists
//! carry a display name after the id (`UC... - Name`); lines whose name was
//! flagged (`Topic` auto-channels, `[Error]` lookups) are dropped.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::debug;

/// Markers that disqualify an annotated line.
pub const FLAGGED_MARKERS: &[&str] = &["Topic", "[Error]"];

const ANNOTATION_SEPARATOR: &str = " - ";

/// Channel list IO errors.
#[derive(Debug, Error)]
pub enum ChannelListError {
    /// File could not be read
    #[error("failed to read channel list '{path}': {source}\n  Suggestion: Pass an existing file with --channel-id-source")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// File could not be written
    #[error("failed to write channel list '{path}': {source}")]
    Write {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Reads non-blank lines, trimmed, in file order.
///
/// # Errors
///
/// Returns [`ChannelListError::Read`] when the file cannot be read.
pub fn read_channel_list(path: &Path) -> Result<Vec<String>, ChannelListError> {
    let raw = fs::read_to_string(path).map_err(|source| ChannelListError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let lines: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    debug!(path = %path.display(), count = lines.len(), "channel list read");
    Ok(lines)
}

/// Writes one entry per line.
///
/// # Errors
///
/// Returns [`ChannelListError::Write`] when the file cannot be written.
pub fn write_channel_list(path: &Path, entries: &[String]) -> Result<(), ChannelListError> {
    let mut out = String::with_capacity(entries.iter().map(|e| e.len() + 1).sum());
    for entry in entries {
        out.push_str(entry);
        out.push('\n');
    }
    fs::write(path, out).map_err(|source| ChannelListError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Removes duplicates, keeping the first occurrence.
#[must_use]
pub fn dedupe(entries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.clone()))
        .collect()
}

/// Drops lines containing any of [`FLAGGED_MARKERS`].
#[must_use]
pub fn remove_flagged(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .filter(|e| !FLAGGED_MARKERS.iter().any(|m| e.contains(m)))
        .collect()
}

/// Returns the id part of an annotated line.
#[must_use]
pub fn strip_annotation(line: &str) -> &str {
    line.split(ANNOTATION_SEPARATOR).next().unwrap_or(line).trim()
}

/// Shuffles entries in place.
pub fn shuffle<R: Rng + ?Sized>(entries: &mut [String], rng: &mut R) {
    entries.shuffle(rng);
}

/// Full clean-up: drop flagged lines, strip annotations, dedupe, shuffle.
#[must_use]
pub fn tidy<R: Rng + ?Sized>(entries: Vec<String>, rng: &mut R) -> Vec<String> {
    let stripped = remove_flagged(entries)
        .iter()
        .map(|e| strip_annotation(e).to_string())
        .filter(|e| !e.is_empty())
        .collect();
    let mut cleaned = dedupe(stripped);
    shuffle(&mut cleaned, rng);
    cleaned
}
