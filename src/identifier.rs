//! Identifier shape checks.
//!
//! Channel identifiers are checked before any network call is attempted;
//! malformed values never reach the page fetcher.

use thiserror::Error;

/// Fixed prefix of platform channel identifiers.
pub const CHANNEL_ID_PREFIX: &str = "UC";

/// Fixed length of platform channel identifiers.
pub const CHANNEL_ID_LEN: usize = 24;

/// Fixed length of platform video identifiers.
pub const VIDEO_ID_LEN: usize = 11;

/// Longest playlist identifier accepted.
const MAX_PLAYLIST_ID_LEN: usize = 64;

/// Errors for malformed identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Channel id does not match the platform scheme
    #[error("invalid channel id '{value}': {reason}\n  Suggestion: {suggestion}")]
    InvalidChannel {
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: String,
        /// How to fix it
        suggestion: String,
    },

    /// Playlist id is empty or contains characters outside the URL-safe alphabet
    #[error("invalid playlist id '{value}': {reason}\n  Suggestion: Pass the value of the `list=` URL parameter")]
    InvalidPlaylist {
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

impl IdentifierError {
    fn channel(value: &str, reason: String) -> Self {
        Self::InvalidChannel {
            value: value.to_string(),
            reason,
            suggestion: format!(
                "Channel ids start with '{CHANNEL_ID_PREFIX}' and are {CHANNEL_ID_LEN} characters long"
            ),
        }
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Checks a channel identifier against the platform scheme.
///
/// # Errors
///
/// Returns [`IdentifierError::InvalidChannel`] when the prefix, length or
/// alphabet does not match.
pub fn validate_channel_id(value: &str) -> Result<&str, IdentifierError> {
    if !value.starts_with(CHANNEL_ID_PREFIX) {
        return Err(IdentifierError::channel(
            value,
            format!("missing '{CHANNEL_ID_PREFIX}' prefix"),
        ));
    }
    let len = value.chars().count();
    if len != CHANNEL_ID_LEN {
        return Err(IdentifierError::channel(
            value,
            format!("length {len}, expected {CHANNEL_ID_LEN}"),
        ));
    }
    if !value.chars().all(is_id_char) {
        return Err(IdentifierError::channel(
            value,
            "contains characters outside [A-Za-z0-9_-]".to_string(),
        ));
    }
    Ok(value)
}

/// Checks a playlist identifier.
///
/// # Errors
///
/// Returns [`IdentifierError::InvalidPlaylist`] for empty, oversized or
/// non URL-safe values.
pub fn validate_playlist_id(value: &str) -> Result<&str, IdentifierError> {
    let invalid = |reason: &str| IdentifierError::InvalidPlaylist {
        value: value.to_string(),
        reason: reason.to_string(),
    };
    if value.is_empty() {
        return Err(invalid("empty"));
    }
    if value.len() > MAX_PLAYLIST_ID_LEN {
        return Err(invalid("too long"));
    }
    if !value.chars().all(is_id_char) {
        return Err(invalid("contains characters outside [A-Za-z0-9_-]"));
    }
    Ok(value)
}

/// Returns true if `value` has the shape of a video identifier.
#[must_use]
pub fn is_video_id(value: &str) -> bool {
    value.len() == VIDEO_ID_LEN && value.chars().all(is_id_char)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_channel_id_accepted() {
        assert!(validate_channel_id("UCabcdefghijklmnopqrstuv").is_ok());
        assert!(validate_channel_id("UC-_0123456789ABCDEFGHIJ").is_ok());
    }

    #[test]
    fn test_channel_id_wrong_prefix_rejected() {
        let err = validate_channel_id("XYabcdefghijklmnopqrstuv").unwrap_err();
        assert!(err.to_string().contains("prefix"));
    }

    #[test]
    fn test_channel_id_wrong_length_rejected() {
        let err = validate_channel_id("XYZ123").unwrap_err();
        assert!(matches!(err, IdentifierError::InvalidChannel { .. }));
        assert!(validate_channel_id("UCshort").is_err());
        assert!(validate_channel_id("UCabcdefghijklmnopqrstuvw").is_err());
    }

    #[test]
    fn test_channel_id_bad_alphabet_rejected() {
        let err = validate_channel_id("UCabcdefghijklmnopqrst/v").unwrap_err();
        assert!(err.to_string().contains("characters"));
    }

    #[test]
    fn test_channel_error_has_suggestion() {
        let msg = validate_channel_id("").unwrap_err().to_string();
        assert!(msg.contains("Suggestion"));
        assert!(msg.contains("24"));
    }

    #[test]
    fn test_playlist_id_checks() {
        assert!(validate_playlist_id("PLx0sYbCqOb8TBPRdmBHs5Iftvv9TPboYG").is_ok());
        assert!(validate_playlist_id("").is_err());
        assert!(validate_playlist_id("PL bad").is_err());
        assert!(validate_playlist_id(&"P".repeat(65)).is_err());
    }

    #[test]
    fn test_video_id_shape() {
        assert!(is_video_id("dQw4w9WgXcQ"));
        assert!(is_video_id("a-b_c1234XY"));
        assert!(!is_video_id("short"));
        assert!(!is_video_id("dQw4w9WgXcQQ"));
        assert!(!is_video_id("dQw4w9WgX.Q"));
    }
}
