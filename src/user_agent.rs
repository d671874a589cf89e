//! Shared User-Agent strings for outbound HTTP clients.
//!
//! Single source for the project URL and UA format so index, queue and
//! WebDriver traffic stay consistent.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/patchwork-archive/covercrawl";

/// Default User-Agent for API clients (index lookups, queue submissions).
#[must_use]
pub(crate) fn default_api_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("covercrawl/{version} (archival-crawler; +{PROJECT_UA_URL})")
}

/// Browser-like User-Agent required by the queue API's front proxy.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
