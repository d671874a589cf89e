//! W3C WebDriver session backend.
//!
//! Either spawns a local chromedriver on a free port (killed when the
//! session closes) or attaches to an already running WebDriver endpoint.

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::http_client::{HttpTimeouts, build_http_client};
use crate::user_agent;

use super::{FetchError, FetcherLauncher, PageFetcher};

/// How long a spawned driver has to report ready.
const DRIVER_STARTUP_TIMEOUT: Duration = Duration::from_secs(15);
/// Poll interval while waiting for the driver.
const DRIVER_POLL_INTERVAL: Duration = Duration::from_millis(200);
/// Page loads can be slow; give navigation a longer read timeout.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(90);

const CHROME_ARGS: &[&str] = &[
    "--headless=new",
    "--no-sandbox",
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--window-size=1920,1080",
];

/// Where the WebDriver endpoint comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEndpoint {
    /// Spawn the driver executable locally.
    Spawn {
        /// Path to chromedriver.
        program: PathBuf,
    },
    /// Use an already running driver at this base URL.
    Remote {
        /// Base URL, e.g. `http://localhost:9515`.
        url: String,
    },
}

/// Opens WebDriver sessions.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    endpoint: DriverEndpoint,
    startup_timeout: Duration,
}

impl WebDriverLauncher {
    /// Creates a launcher for `endpoint`.
    #[must_use]
    pub fn new(endpoint: DriverEndpoint) -> Self {
        Self {
            endpoint,
            startup_timeout: DRIVER_STARTUP_TIMEOUT,
        }
    }

    /// Overrides how long to wait for the driver to report ready.
    #[must_use]
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    fn spawn_driver(program: &Path) -> Result<(String, Child), FetchError> {
        let port = free_local_port().map_err(|source| FetchError::DriverLaunch {
            program: program.display().to_string(),
            source,
        })?;
        let child = Command::new(program)
            .arg(format!("--port={port}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FetchError::DriverLaunch {
                program: program.display().to_string(),
                source,
            })?;
        info!(program = %program.display(), port, "browser driver started");
        Ok((format!("http://127.0.0.1:{port}"), child))
    }
}

#[async_trait]
impl FetcherLauncher for WebDriverLauncher {
    #[instrument(skip(self), fields(backend = "webdriver"))]
    async fn launch(&self) -> Result<Box<dyn PageFetcher>, FetchError> {
        let client = build_http_client(
            "webdriver",
            &user_agent::default_api_user_agent(),
            HttpTimeouts::with_read(NAVIGATION_TIMEOUT),
        )
        .map_err(|message| FetchError::Client {
            backend: "webdriver".to_string(),
            message,
        })?;

        let (base_url, driver) = match &self.endpoint {
            DriverEndpoint::Remote { url } => (url.trim_end_matches('/').to_string(), None),
            DriverEndpoint::Spawn { program } => {
                let (url, child) = Self::spawn_driver(program)?;
                (url, Some(child))
            }
        };

        // A spawned child is dropped (and killed) on any early return below.
        wait_until_ready(&client, &base_url, self.startup_timeout).await?;
        let session_id = create_session(&client, &base_url).await?;
        info!(session_id = %session_id, "browser session opened");

        Ok(Box::new(WebDriverSession {
            client,
            base_url,
            session_id,
            driver: Mutex::new(driver),
            closed: AtomicBool::new(false),
        }))
    }
}

/// One open WebDriver session.
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
    driver: Mutex<Option<Child>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverSession")
            .field("base_url", &self.base_url)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    value: Value,
}

impl WebDriverSession {
    fn session_url(&self, suffix: &str) -> String {
        format!("{}/session/{}{suffix}", self.base_url, self.session_id)
    }

    async fn navigate(&self, url: &str) -> Result<(), FetchError> {
        let response = self
            .client
            .post(self.session_url("/url"))
            .json(&json!({ "url": url }))
            .send()
            .await
            .map_err(|e| navigation_error(url, &e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(navigation_error(
                url,
                &format!("HTTP {status}: {}", wire_error_message(&body)),
            ));
        }
        Ok(())
    }

    async fn page_source(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(self.session_url("/source"))
            .send()
            .await
            .map_err(|e| navigation_error(url, &e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(navigation_error(url, &format!("page source returned HTTP {status}")));
        }
        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| navigation_error(url, &e.to_string()))?;
        match wire.value {
            Value::String(markup) => Ok(markup),
            other => Err(navigation_error(
                url,
                &format!("unexpected page source payload: {other}"),
            )),
        }
    }
}

#[async_trait]
impl PageFetcher for WebDriverSession {
    fn name(&self) -> &'static str {
        "webdriver"
    }

    #[instrument(skip(self), fields(backend = "webdriver"))]
    async fn fetch(&self, url: &str, settle: Duration) -> String {
        if let Err(error) = self.navigate(url).await {
            warn!(error = %error, "navigation failed");
            return String::new();
        }
        if !settle.is_zero() {
            debug!(settle_ms = settle.as_millis(), "waiting for dynamic content");
            tokio::time::sleep(settle).await;
        }
        match self.page_source(url).await {
            Ok(markup) => markup,
            Err(error) => {
                warn!(error = %error, "failed to read page source");
                String::new()
            }
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.client.delete(self.session_url("")).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(session_id = %self.session_id, "browser session deleted");
            }
            Ok(response) => warn!(
                session_id = %self.session_id,
                status = response.status().as_u16(),
                "driver refused session delete"
            ),
            Err(error) => warn!(session_id = %self.session_id, error = %error, "session delete failed"),
        }
        if let Some(mut child) = self.driver.lock().await.take()
            && let Err(error) = child.kill().await
        {
            warn!(error = %error, "failed to stop browser driver");
        }
        info!(session_id = %self.session_id, "browser session closed");
    }
}

fn navigation_error(url: &str, message: &str) -> FetchError {
    FetchError::Navigation {
        url: url.to_string(),
        message: message.to_string(),
    }
}

/// Extracts `value.message` from a WebDriver error body, or the raw body.
fn wire_error_message(body: &str) -> String {
    serde_json::from_str::<WireResponse>(body)
        .ok()
        .and_then(|wire| {
            wire.value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn free_local_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

async fn wait_until_ready(client: &Client, base_url: &str, timeout: Duration) -> Result<(), FetchError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(response) = client.get(format!("{base_url}/status")).send().await
            && response.status().is_success()
            && let Ok(wire) = response.json::<WireResponse>().await
            && wire.value.get("ready").and_then(Value::as_bool).unwrap_or(false)
        {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(FetchError::DriverNotReady {
                url: base_url.to_string(),
                secs: timeout.as_secs(),
            });
        }
        tokio::time::sleep(DRIVER_POLL_INTERVAL).await;
    }
}

async fn create_session(client: &Client, base_url: &str) -> Result<String, FetchError> {
    let start_error = |message: String| FetchError::SessionStart {
        url: base_url.to_string(),
        message,
    };
    let body = json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": CHROME_ARGS }
            }
        }
    });
    let response = client
        .post(format!("{base_url}/session"))
        .json(&body)
        .send()
        .await
        .map_err(|e| start_error(e.to_string()))?;
    let status = response.status();
    let text = response.text().await.map_err(|e| start_error(e.to_string()))?;
    if !status.is_success() {
        return Err(start_error(format!(
            "HTTP {}: {}",
            status.as_u16(),
            wire_error_message(&text)
        )));
    }
    let wire: WireResponse =
        serde_json::from_str(&text).map_err(|e| start_error(e.to_string()))?;
    wire.value
        .get("sessionId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| start_error("response has no sessionId".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_error_message_extracts_message() {
        let body = r#"{"value":{"error":"unknown error","message":"net::ERR_NAME_NOT_RESOLVED","stacktrace":""}}"#;
        assert_eq!(wire_error_message(body), "net::ERR_NAME_NOT_RESOLVED");
    }

    #[test]
    fn test_wire_error_message_falls_back_to_body() {
        assert_eq!(wire_error_message("gateway down"), "gateway down");
    }

    #[test]
    fn test_free_local_port_is_nonzero() {
        if TcpListener::bind("127.0.0.1:0").is_err() {
            return;
        }
        assert_ne!(free_local_port().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_spawn_missing_driver_fails_with_launch_error() {
        let launcher = WebDriverLauncher::new(DriverEndpoint::Spawn {
            program: PathBuf::from("/nonexistent/chromedriver"),
        });
        let Err(err) = launcher.launch().await else {
            panic!("launch should fail for a missing driver");
        };
        // Port allocation can fail first in socket-less sandboxes; both are launch errors.
        assert!(matches!(err, FetchError::DriverLaunch { .. }));
    }
}
