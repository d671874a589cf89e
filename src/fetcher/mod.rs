//! Rendered-page fetching.
//!
//! A [`FetcherLauncher`] opens one browser session per discovery run; the
//! resulting [`PageFetcher`] navigates, waits a settle delay for dynamic
//! content, and returns the page markup. Navigation failures are logged and
//! yield an empty string so the run can continue.
//!
//! Backends:
//! - [`WebDriverLauncher`] - W3C WebDriver (spawned chromedriver or remote endpoint)
//! - [`BrowserlessLauncher`] - Browserless `/content` rendering API

mod browserless;
mod webdriver;

pub use browserless::{BrowserlessFetcher, BrowserlessLauncher};
pub use webdriver::{DriverEndpoint, WebDriverLauncher, WebDriverSession};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors acquiring or driving a browser session.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP client could not be constructed
    #[error("failed to build HTTP client for {backend}: {message}")]
    Client {
        /// Backend name
        backend: String,
        /// Builder message
        message: String,
    },

    /// Driver executable could not be started
    #[error("failed to launch browser driver '{program}': {source}\n  Suggestion: Install chromedriver or set CHROME_DRIVER_PATH / WEBDRIVER_URL")]
    DriverLaunch {
        /// Driver program path
        program: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Driver did not report ready in time
    #[error("browser driver at {url} not ready after {secs}s\n  Suggestion: Check that the driver version matches the installed browser")]
    DriverNotReady {
        /// Driver base URL
        url: String,
        /// Seconds waited
        secs: u64,
    },

    /// Session could not be created
    #[error("failed to start browser session at {url}: {message}")]
    SessionStart {
        /// Driver base URL
        url: String,
        /// Driver diagnostic
        message: String,
    },

    /// Navigation or source retrieval failed
    #[error("failed to load '{url}': {message}")]
    Navigation {
        /// Page URL
        url: String,
        /// Driver diagnostic
        message: String,
    },
}

/// Fetches rendered markup for a URL.
///
/// Implementations hold at most one browser session and are driven
/// sequentially by the orchestrator.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the backend's name for logs.
    fn name(&self) -> &str;

    /// Navigates to `url`, waits `settle`, and returns the page markup.
    /// Returns an empty string when the page cannot be loaded.
    async fn fetch(&self, url: &str, settle: Duration) -> String;

    /// Releases the session. Must be safe to call more than once.
    async fn close(&self) {}
}

/// Acquires a [`PageFetcher`] for the duration of one run.
#[async_trait]
pub trait FetcherLauncher: Send + Sync {
    /// Opens a session.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the session cannot be acquired; this is
    /// fatal for the run.
    async fn launch(&self) -> Result<Box<dyn PageFetcher>, FetchError>;
}
