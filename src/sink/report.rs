//! Run report files.
//!
//! Layout:
//!
//! ```text
//! Succeeded:
//! <id>
//!
//! Failed:
//! <id>: <reason>
//! ```

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::info;

use crate::candidate::{DiscoveryResult, ValidationOutcome};

const SUCCEEDED_HEADER: &str = "Succeeded:";
const FAILED_HEADER: &str = "Failed:";

/// Report errors.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Report file or directory could not be written
    #[error("failed to write report '{path}': {source}")]
    Io {
        /// Target path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Text does not follow the report layout
    #[error("malformed report on line {line}: {reason}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// What was expected
        reason: &'static str,
    },
}

/// Renders `result` in report layout.
#[must_use]
pub fn render_report(result: &DiscoveryResult) -> String {
    let mut out = String::new();
    out.push_str(SUCCEEDED_HEADER);
    out.push('\n');
    for id in result.accepted() {
        out.push_str(id);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(FAILED_HEADER);
    out.push('\n');
    for (id, reason) in result.rejected() {
        let _ = writeln!(out, "{id}: {reason}");
    }
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Start,
    Succeeded,
    Gap,
    Failed,
}

/// Rebuilds the partition from report text produced by [`render_report`].
///
/// # Errors
///
/// Returns [`ReportError::Malformed`] when a header is missing or a failed
/// line has no `": "` separator.
pub fn parse_report(text: &str) -> Result<DiscoveryResult, ReportError> {
    let mut result = DiscoveryResult::new();
    let mut section = Section::Start;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        section = match section {
            Section::Start if line == SUCCEEDED_HEADER => Section::Succeeded,
            Section::Start => {
                return Err(ReportError::Malformed {
                    line: line_no,
                    reason: "expected 'Succeeded:' header",
                });
            }
            Section::Succeeded if line.is_empty() => Section::Gap,
            Section::Succeeded => {
                result.record(ValidationOutcome::accept(line));
                Section::Succeeded
            }
            Section::Gap if line == FAILED_HEADER => Section::Failed,
            Section::Gap => {
                return Err(ReportError::Malformed {
                    line: line_no,
                    reason: "expected 'Failed:' header",
                });
            }
            Section::Failed => {
                let Some((id, reason)) = line.split_once(": ") else {
                    return Err(ReportError::Malformed {
                        line: line_no,
                        reason: "expected '<id>: <reason>'",
                    });
                };
                result.record(ValidationOutcome {
                    candidate_id: id.to_string(),
                    accepted: false,
                    reason: reason.to_string(),
                });
                Section::Failed
            }
        };
    }

    if section != Section::Failed {
        return Err(ReportError::Malformed {
            line: text.lines().count(),
            reason: "report ended before the 'Failed:' section",
        });
    }
    Ok(result)
}

/// File name for a report written at `at`, to the millisecond.
#[must_use]
pub fn report_file_name(at: DateTime<Local>) -> String {
    format!("report_{}.txt", at.format("%Y-%m-%d %H-%M-%S%.3f"))
}

/// Writes `result` to `dir/report_<timestamp>.txt`, creating `dir`.
///
/// # Errors
///
/// Returns [`ReportError::Io`] when the directory or file cannot be written.
pub fn write_report(dir: &Path, result: &DiscoveryResult) -> Result<PathBuf, ReportError> {
    write_report_at(dir, result, Local::now())
}

/// [`write_report`] with an explicit timestamp. An existing report with the
/// same name is never overwritten.
///
/// # Errors
///
/// Returns [`ReportError::Io`] when the directory or file cannot be written,
/// including when the file already exists.
pub fn write_report_at(
    dir: &Path,
    result: &DiscoveryResult,
    at: DateTime<Local>,
) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(report_file_name(at));
    let io_error = |source| ReportError::Io {
        path: path.clone(),
        source,
    };
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(io_error)?;
    file.write_all(render_report(result).as_bytes())
        .map_err(io_error)?;
    info!(path = %path.display(), "report written");
    Ok(path)
}
