//! Title-based pre-filter for music content.
//!
//! A cheap substring check run before validation so obviously out-of-scope
//! titles never spend a metadata lookup. False positives are fine (the
//! duration check catches them); a title without any keyword is never
//! escalated.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

/// Default keyword set: English and Japanese vernacular for covers,
/// originals and music videos.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "cover",
    "covered",
    "original",
    "music video",
    "mv",
    "song",
    "sing",
    "歌ってみた",
    "歌って",
    "オリジナル",
    "オリジナル曲",
    "オリ曲",
    "カバー",
    "弾き語り",
    "歌",
];

const NO_MATCH: &str = "no keyword match";
const MATCH: &str = "plausible match";

/// Case-folding rule applied to both keywords and titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseFolding {
    /// Compare after Unicode lowercasing.
    #[default]
    Insensitive,
    /// Compare as-is.
    Sensitive,
}

impl CaseFolding {
    fn fold(self, value: &str) -> String {
        match self {
            Self::Insensitive => value.to_lowercase(),
            Self::Sensitive => value.to_string(),
        }
    }
}

/// Verdict of the pre-filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Whether the title may be music content.
    pub plausible: bool,
    /// `"plausible match"` or `"no keyword match"`.
    pub reason: &'static str,
}

/// Errors loading a keywords file.
#[derive(Debug, Error)]
pub enum KeywordsError {
    /// File could not be read
    #[error("failed to read keywords file '{path}': {source}")]
    Read {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File had no usable keyword lines
    #[error("keywords file '{path}' contains no keywords\n  Suggestion: Put one keyword per line; lines starting with '#' are comments")]
    Empty {
        /// Path that was empty
        path: String,
    },
}

/// Keyword classifier with an injectable keyword set.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
    folding: CaseFolding,
}

impl KeywordClassifier {
    /// Creates a classifier over `keywords` with the given folding rule.
    /// Blank keywords are ignored.
    #[must_use]
    pub fn new<I, S>(keywords: I, folding: CaseFolding) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| folding.fold(k.as_ref().trim()))
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords, folding }
    }

    /// Loads one keyword per line from `path` (`#` comments allowed).
    ///
    /// # Errors
    ///
    /// Returns [`KeywordsError`] when the file is unreadable or empty.
    pub fn from_file(path: &Path, folding: CaseFolding) -> Result<Self, KeywordsError> {
        let raw = fs::read_to_string(path).map_err(|source| KeywordsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let classifier = Self::new(
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
            folding,
        );
        if classifier.keywords.is_empty() {
            return Err(KeywordsError::Empty {
                path: path.display().to_string(),
            });
        }
        debug!(count = classifier.keywords.len(), path = %path.display(), "loaded keywords");
        Ok(classifier)
    }

    /// Folded keywords in configuration order.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Decides whether `title` is plausibly music content.
    #[must_use]
    pub fn is_plausible(&self, title: &str) -> Classification {
        let folded = self.folding.fold(title);
        if self.keywords.iter().any(|k| folded.contains(k.as_str())) {
            Classification {
                plausible: true,
                reason: MATCH,
            }
        } else {
            Classification {
                plausible: false,
                reason: NO_MATCH,
            }
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS, CaseFolding::Insensitive)
    }
}
