//! Browserless `/content` backend.
//!
//! Rendering happens on the Browserless side; there is no local session to
//! release, so [`PageFetcher::close`] is a no-op.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{instrument, warn};
use url::Url;

use crate::http_client::{HttpTimeouts, build_http_client};
use crate::user_agent;

use super::{FetchError, FetcherLauncher, PageFetcher};

/// Rendering plus settle delay can take a while.
const CONTENT_TIMEOUT: Duration = Duration::from_secs(90);

/// Launches [`BrowserlessFetcher`]s.
#[derive(Debug, Clone)]
pub struct BrowserlessLauncher {
    base_url: String,
    token: Option<String>,
}

impl BrowserlessLauncher {
    /// Creates a launcher for the Browserless instance at `base_url`.
    #[must_use]
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }
}

#[async_trait]
impl FetcherLauncher for BrowserlessLauncher {
    async fn launch(&self) -> Result<Box<dyn PageFetcher>, FetchError> {
        let client = build_http_client(
            "browserless",
            &user_agent::default_api_user_agent(),
            HttpTimeouts::with_read(CONTENT_TIMEOUT),
        )
        .map_err(|message| FetchError::Client {
            backend: "browserless".to_string(),
            message,
        })?;
        let endpoint = content_endpoint(&self.base_url, self.token.as_deref()).map_err(|e| {
            FetchError::Client {
                backend: "browserless".to_string(),
                message: format!("invalid Browserless URL '{}': {e}", self.base_url),
            }
        })?;
        Ok(Box::new(BrowserlessFetcher {
            client,
            base_url: self.base_url.clone(),
            endpoint,
        }))
    }
}

/// `{base}/content`, with the token as a query pair when present.
fn content_endpoint(base_url: &str, token: Option<&str>) -> Result<Url, url::ParseError> {
    let mut endpoint = Url::parse(&format!("{base_url}/content"))?;
    if let Some(token) = token {
        endpoint.query_pairs_mut().append_pair("token", token);
    }
    Ok(endpoint)
}

/// Fetches fully rendered HTML through Browserless.
pub struct BrowserlessFetcher {
    client: Client,
    base_url: String,
    // Carries the token; kept out of Debug.
    endpoint: Url,
}

impl std::fmt::Debug for BrowserlessFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserlessFetcher")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BrowserlessFetcher {
    async fn content(&self, url: &str, settle: Duration) -> Result<String, FetchError> {
        let mut body = json!({ "url": url });
        if !settle.is_zero() {
            let millis = u64::try_from(settle.as_millis()).unwrap_or(u64::MAX);
            body["waitForTimeout"] = json!(millis);
        }

        let request = self.client.post(self.endpoint.clone()).json(&body);

        let navigation = |message: String| FetchError::Navigation {
            url: url.to_string(),
            message,
        };
        let response = request.send().await.map_err(|e| navigation(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(navigation(format!("API error (status {}): {message}", status.as_u16())));
        }
        response.text().await.map_err(|e| navigation(e.to_string()))
    }
}

#[async_trait]
impl PageFetcher for BrowserlessFetcher {
    fn name(&self) -> &'static str {
        "browserless"
    }

    #[instrument(skip(self), fields(backend = "browserless"))]
    async fn fetch(&self, url: &str, settle: Duration) -> String {
        match self.content(url, settle).await {
            Ok(markup) => markup,
            Err(error) => {
                warn!(error = %error, "browserless fetch failed");
                String::new()
            }
        }
    }
}
