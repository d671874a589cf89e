//! Process configuration.
//!
//! [`Credentials`] are read once from the environment (optionally seeded
//! from a `.env` file) and passed explicitly to the components that need
//! them. [`FileConfig`] holds optional run defaults from a `key = value`
//! file. [`Endpoints`] are the base URLs of the index site and the video
//! platform.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::validator::DEFAULT_INDEX_API_URL;

/// Default chromedriver location.
pub const DEFAULT_CHROME_DRIVER_PATH: &str = "/usr/bin/chromedriver";
/// Default metadata provider executable.
pub const DEFAULT_YT_DLP_PATH: &str = "yt-dlp";

/// Index search listing restricted to covers and original songs. The page
/// number is appended.
pub const DEFAULT_INDEX_SEARCH_URL: &str = "https://holodex.net/search?q=type,value,text%0Atopic,Music_Cover,Music_Cover%0Atopic,Original_Song,Original_Song&page=";
/// Video platform base URL.
pub const DEFAULT_PLATFORM_URL: &str = "https://www.youtube.com";

/// Configuration errors. All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is absent or empty
    #[error("missing required setting {var}\n  Suggestion: {suggestion}")]
    Missing {
        /// Variable name
        var: &'static str,
        /// What to do about it
        suggestion: &'static str,
    },

    /// Config file could not be read
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Line is not `key = value`
    #[error("invalid config syntax on line {line}: expected key = value")]
    Syntax {
        /// 1-based line number
        line: usize,
    },

    /// Unrecognized key
    #[error("unknown configuration key: '{key}' on line {line}")]
    UnknownKey {
        /// Key as written
        key: String,
        /// 1-based line number
        line: usize,
    },

    /// Value could not be parsed for its key
    #[error("invalid `{key}` value on line {line}: {reason}")]
    InvalidValue {
        /// Key
        key: &'static str,
        /// 1-based line number
        line: usize,
        /// Parse diagnostic
        reason: String,
    },

    /// Value parsed but is out of range
    #[error("invalid config value for `{key}`: {value}. Expected range: {expected}")]
    OutOfRange {
        /// Key
        key: &'static str,
        /// Offending value
        value: String,
        /// Accepted range
        expected: &'static str,
    },
}

/// Credentials and external tool locations.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Index API key (`HOLODEX_API_KEY`).
    pub index_api_key: Option<String>,
    /// Queue API endpoint (`PATCHWORK_API`).
    pub queue_api_url: Option<String>,
    /// Queue API auth token (`WORKER_AUTH`).
    pub worker_auth: Option<String>,
    /// chromedriver executable (`CHROME_DRIVER_PATH`).
    pub chrome_driver_path: PathBuf,
    /// Already running WebDriver endpoint (`WEBDRIVER_URL`).
    pub webdriver_url: Option<String>,
    /// Browserless base URL (`BROWSERLESS_URL`).
    pub browserless_url: Option<String>,
    /// Browserless token (`BROWSERLESS_TOKEN`).
    pub browserless_token: Option<String>,
    /// Metadata provider executable (`YT_DLP_PATH`).
    pub yt_dlp_path: String,
}

impl Credentials {
    /// Loads `.env` if present, then reads the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(error) if error.not_found() => debug!("no .env file"),
            Err(error) => info!(error = %error, "ignoring unreadable .env file"),
        }
        let credentials = Self::from_lookup(|name| env::var(name).ok());
        credentials.log_keys();
        credentials
    }

    /// Builds credentials from an arbitrary variable lookup. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            index_api_key: get("HOLODEX_API_KEY"),
            queue_api_url: get("PATCHWORK_API"),
            worker_auth: get("WORKER_AUTH"),
            chrome_driver_path: get("CHROME_DRIVER_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_CHROME_DRIVER_PATH), PathBuf::from),
            webdriver_url: get("WEBDRIVER_URL"),
            browserless_url: get("BROWSERLESS_URL"),
            browserless_token: get("BROWSERLESS_TOKEN"),
            yt_dlp_path: get("YT_DLP_PATH").unwrap_or_else(|| DEFAULT_YT_DLP_PATH.to_string()),
        }
    }

    /// Returns the index API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `HOLODEX_API_KEY` is unset.
    pub fn require_index_api_key(&self) -> Result<&str, ConfigError> {
        self.index_api_key.as_deref().ok_or(ConfigError::Missing {
            var: "HOLODEX_API_KEY",
            suggestion: "Set HOLODEX_API_KEY in the environment or .env to crawl the index",
        })
    }

    /// Returns the queue API URL and its auth token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first unset variable.
    pub fn require_queue_api(&self) -> Result<(&str, &str), ConfigError> {
        let url = self.queue_api_url.as_deref().ok_or(ConfigError::Missing {
            var: "PATCHWORK_API",
            suggestion: "Set PATCHWORK_API, or use --stub / --db to queue locally",
        })?;
        let auth = self.worker_auth.as_deref().ok_or(ConfigError::Missing {
            var: "WORKER_AUTH",
            suggestion: "Set WORKER_AUTH to the queue worker token",
        })?;
        Ok((url, auth))
    }

    fn log_keys(&self) {
        fn preview(value: Option<&str>) -> String {
            match value {
                Some(v) => {
                    let head: String = v.chars().take(4).collect();
                    format!("{head}...({} chars)", v.chars().count())
                }
                None => "<not set>".to_string(),
            }
        }

        debug!(
            holodex_api_key = %preview(self.index_api_key.as_deref()),
            patchwork_api = self.queue_api_url.as_deref().unwrap_or("<not set>"),
            worker_auth = %preview(self.worker_auth.as_deref()),
            chrome_driver_path = %self.chrome_driver_path.display(),
            webdriver_url = self.webdriver_url.as_deref().unwrap_or("<not set>"),
            browserless_url = self.browserless_url.as_deref().unwrap_or("<not set>"),
            yt_dlp_path = %self.yt_dlp_path,
            "credentials loaded"
        );
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("index_api_key", &self.index_api_key.as_ref().map(|_| "<redacted>"))
            .field("queue_api_url", &self.queue_api_url)
            .field("worker_auth", &self.worker_auth.as_ref().map(|_| "<redacted>"))
            .field("chrome_driver_path", &self.chrome_driver_path)
            .field("webdriver_url", &self.webdriver_url)
            .field("browserless_url", &self.browserless_url)
            .field("yt_dlp_path", &self.yt_dlp_path)
            .finish_non_exhaustive()
    }
}

/// Base URLs for the pages and APIs a run talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Index API base, e.g. `https://holodex.net/api/v2`.
    pub index_api_url: String,
    /// Index search listing; the page number is appended.
    pub index_search_url: String,
    /// Video platform base, e.g. `https://www.youtube.com`.
    pub platform_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            index_api_url: DEFAULT_INDEX_API_URL.to_string(),
            index_search_url: DEFAULT_INDEX_SEARCH_URL.to_string(),
            platform_url: DEFAULT_PLATFORM_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Index search page `page`.
    #[must_use]
    pub fn index_page_url(&self, page: u32) -> String {
        format!("{}{page}", self.index_search_url)
    }

    /// Video grid of a channel.
    #[must_use]
    pub fn channel_videos_url(&self, channel_id: &str) -> String {
        format!("{}/channel/{channel_id}/videos", self.platform_url.trim_end_matches('/'))
    }

    /// Playlist page.
    #[must_use]
    pub fn playlist_url(&self, playlist_id: &str) -> String {
        format!("{}/playlist?list={playlist_id}", self.platform_url.trim_end_matches('/'))
    }
}

/// Optional run defaults loaded from a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Lower duration bound in seconds.
    pub min_time: Option<u64>,
    /// Upper duration bound in seconds.
    pub max_time: Option<u64>,
    /// Settle delay in seconds.
    pub wait_time: Option<u64>,
    /// Validation worker count.
    pub concurrency: Option<usize>,
    /// Keyword list replacing the built-in classifier keywords.
    pub keywords_file: Option<PathBuf>,
    /// Where reports are written.
    pub report_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Validates value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(concurrency) = self.concurrency
            && !(1..=32).contains(&concurrency)
        {
            return Err(ConfigError::OutOfRange {
                key: "concurrency",
                value: concurrency.to_string(),
                expected: "1..=32",
            });
        }
        if let Some(wait_time) = self.wait_time
            && wait_time > 300
        {
            return Err(ConfigError::OutOfRange {
                key: "wait_time",
                value: wait_time.to_string(),
                expected: "0..=300",
            });
        }
        if let (Some(min), Some(max)) = (self.min_time, self.max_time)
            && min >= max
        {
            return Err(ConfigError::OutOfRange {
                key: "max_time",
                value: max.to_string(),
                expected: "greater than min_time",
            });
        }
        Ok(())
    }

    /// Loads and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable or invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Loads the default config file when it exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but is invalid.
    pub fn load_default() -> Result<Option<Self>, ConfigError> {
        let Some(path) = resolve_default_config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        info!(path = %path.display(), "loading config file");
        Self::load(&path).map(Some)
    }

    /// Parses `key = value` lines. `#` starts a comment outside quotes;
    /// string values are double-quoted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on syntax errors, unknown keys or bad values.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        for (line_index, raw_line) in raw.lines().enumerate() {
            let line_no = line_index + 1;
            let line = strip_inline_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }
            let Some((raw_key, raw_value)) = line.split_once('=') else {
                return Err(ConfigError::Syntax { line: line_no });
            };
            let value = raw_value.trim();
            match raw_key.trim() {
                "min_time" => cfg.min_time = Some(parse_integer("min_time", line_no, value)?),
                "max_time" => cfg.max_time = Some(parse_integer("max_time", line_no, value)?),
                "wait_time" => cfg.wait_time = Some(parse_integer("wait_time", line_no, value)?),
                "concurrency" => {
                    let parsed = parse_integer("concurrency", line_no, value)?;
                    cfg.concurrency = Some(usize::try_from(parsed).map_err(|_| {
                        ConfigError::InvalidValue {
                            key: "concurrency",
                            line: line_no,
                            reason: "out of range".to_string(),
                        }
                    })?);
                }
                "keywords_file" => {
                    let parsed = parse_string_literal("keywords_file", line_no, value)?;
                    cfg.keywords_file = Some(PathBuf::from(parsed));
                }
                "report_dir" => {
                    let parsed = parse_string_literal("report_dir", line_no, value)?;
                    cfg.report_dir = Some(PathBuf::from(parsed));
                }
                unknown => {
                    return Err(ConfigError::UnknownKey {
                        key: unknown.to_string(),
                        line: line_no,
                    });
                }
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/covercrawl/config.toml`
/// 2. `$HOME/.config/covercrawl/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join("covercrawl").join("config.toml"));
    }
    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("covercrawl")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(key: &'static str, line: usize, raw: &str) -> Result<String, ConfigError> {
    if raw.len() < 2 || !raw.starts_with('"') || !raw.ends_with('"') {
        return Err(ConfigError::InvalidValue {
            key,
            line,
            reason: "expected double-quoted string".to_string(),
        });
    }
    Ok(raw[1..raw.len() - 1].to_string())
}

fn parse_integer(key: &'static str, line: usize, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            line,
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_credentials_defaults() {
        let creds = Credentials::from_lookup(lookup(&[]));
        assert_eq!(creds.chrome_driver_path, PathBuf::from(DEFAULT_CHROME_DRIVER_PATH));
        assert_eq!(creds.yt_dlp_path, "yt-dlp");
        assert!(creds.index_api_key.is_none());
    }

    #[test]
    fn test_credentials_empty_values_are_unset() {
        let creds = Credentials::from_lookup(lookup(&[("HOLODEX_API_KEY", "  ")]));
        let err = creds.require_index_api_key().unwrap_err();
        assert!(err.to_string().contains("HOLODEX_API_KEY"));
    }

    #[test]
    fn test_require_queue_api_names_missing_variable() {
        let creds = Credentials::from_lookup(lookup(&[("PATCHWORK_API", "http://queue")]));
        let err = creds.require_queue_api().unwrap_err();
        assert!(err.to_string().contains("WORKER_AUTH"));

        let creds = Credentials::from_lookup(lookup(&[
            ("PATCHWORK_API", "http://queue"),
            ("WORKER_AUTH", "secret"),
        ]));
        assert_eq!(creds.require_queue_api().unwrap(), ("http://queue", "secret"));
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = Credentials::from_lookup(lookup(&[
            ("HOLODEX_API_KEY", "hk-123456"),
            ("WORKER_AUTH", "wa-987654"),
        ]));
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("hk-123456"));
        assert!(!dbg.contains("wa-987654"));
    }

    #[test]
    fn test_endpoint_urls() {
        let endpoints = Endpoints::default();
        assert!(endpoints.index_page_url(3).ends_with("Original_Song&page=3"));
        assert_eq!(
            endpoints.channel_videos_url("UCabcdefghijklmnopqrstuv"),
            "https://www.youtube.com/channel/UCabcdefghijklmnopqrstuv/videos"
        );
        assert_eq!(
            endpoints.playlist_url("PL123"),
            "https://www.youtube.com/playlist?list=PL123"
        );
    }

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = FileConfig::parse(
            r#"
min_time = 90
report_dir = "/var/log/covercrawl" # reports
"#,
        )
        .unwrap();
        assert_eq!(cfg.min_time, Some(90));
        assert_eq!(cfg.report_dir, Some(PathBuf::from("/var/log/covercrawl")));
        assert!(cfg.max_time.is_none());
    }

    #[test]
    fn test_parse_config_rejects_invalid_concurrency() {
        let err = FileConfig::parse("concurrency = 0").unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_parse_config_rejects_inverted_window() {
        let err = FileConfig::parse("min_time = 480\nmax_time = 65").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { key: "max_time", .. }));
    }

    #[test]
    fn test_parse_config_rejects_trailing_tokens() {
        let err = FileConfig::parse("wait_time = 4 seconds").unwrap_err();
        assert!(err.to_string().contains("wait_time"));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_path() {
        let err = FileConfig::parse("keywords_file = words.txt").unwrap_err();
        assert!(err.to_string().contains("keywords_file"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = FileConfig::parse("output_dir = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { line: 1, .. }));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = FileConfig::parse("\nmin_time 65").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 2 }));
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let err = FileConfig::load(Path::new("/nonexistent/covercrawl.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
