//! End-to-end discovery runs over HTTP.
//!
//! Pages are rendered by a mocked Browserless endpoint (or a mocked
//! WebDriver for session lifecycle checks) and index records come from a
//! mocked index API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use covercrawl_core::validator::MetadataError;
use covercrawl_core::{
    BrowserlessLauncher, DriverEndpoint, Discovery, DiscoveryOptions, DiscoveryPlan, Endpoints,
    IndexValidator, KeywordClassifier, MetadataProvider, MetadataValidator, Validators,
    VideoMetadata, WebDriverLauncher,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

const GOOD_CHANNEL: &str = "UCabcdefghijklmnopqrstuv";

/// Metadata provider that never knows a duration.
struct NoDuration;

#[async_trait]
impl MetadataProvider for NoDuration {
    fn name(&self) -> &'static str {
        "no-duration"
    }

    async fn lookup(&self, _video_id: &str) -> Result<VideoMetadata, MetadataError> {
        Ok(VideoMetadata::default())
    }
}

fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints {
        index_api_url: format!("{}/api/v2", server.uri()),
        index_search_url: "https://index.test/search?page=".to_string(),
        platform_url: "https://platform.test".to_string(),
    }
}

fn discovery(server: &MockServer, launcher: Arc<dyn covercrawl_core::FetcherLauncher>) -> Discovery {
    let endpoints = endpoints(server);
    let validators = Validators::new(
        Arc::new(IndexValidator::with_base_url("test-key", endpoints.index_api_url.clone()).unwrap()),
        Arc::new(MetadataValidator::new(NoDuration)),
    );
    let options = DiscoveryOptions {
        settle_delay: Duration::ZERO,
        concurrency: 2,
        endpoints,
        ..DiscoveryOptions::default()
    };
    Discovery::new(launcher, validators, KeywordClassifier::default(), options)
}

async fn mount_page(server: &MockServer, url: &str, html: &str) {
    Mock::given(method("POST"))
        .and(path("/content"))
        .and(body_partial_json(json!({ "url": url })))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

async fn mount_record(server: &MockServer, id: &str, duration: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/videos/{id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": id, "status": "past", "duration": duration })),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_index_run_partitions_candidates() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let html = r#"<div class="search-results">
        <a href="/watch/aaaaaaaaaaa" class="video-card">A</a>
        <a href="/watch/bbbbbbbbbbb" class="video-card">B</a>
        <a href="/watch/aaaaaaaaaaa" class="thumbnail"><img src="a.jpg"></a>
        <a href="/watch/ccccccccccc" class="video-card">C</a>
    </div>"#;
    mount_page(&server, "https://index.test/search?page=1", html).await;
    mount_record(&server, "aaaaaaaaaaa", 70).await;
    mount_record(&server, "bbbbbbbbbbb", 500).await;
    mount_record(&server, "ccccccccccc", 30).await;

    let launcher = Arc::new(BrowserlessLauncher::new(&server.uri(), None));
    let result = discovery(&server, launcher)
        .discover(&DiscoveryPlan::Index {
            start_page: 1,
            end_page: 1,
        })
        .await
        .unwrap();

    assert_eq!(result.accepted(), vec!["aaaaaaaaaaa"]);
    assert_eq!(
        result.rejected(),
        vec![
            ("bbbbbbbbbbb".to_string(), "too long".to_string()),
            ("ccccccccccc".to_string(), "too short".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_channel_candidate_without_duration_rejected() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let html = r#"<div id="contents" class="style-scope ytd-rich-grid-renderer">
        <ytd-rich-item-renderer>
            <a id="video-title-link" title="Official Cover ver." href="/watch?v=aaaaaaaaaaa">Official Cover ver.</a>
        </ytd-rich-item-renderer>
    </div>"#;
    mount_page(
        &server,
        &format!("https://platform.test/channel/{GOOD_CHANNEL}/videos"),
        html,
    )
    .await;

    let launcher = Arc::new(BrowserlessLauncher::new(&server.uri(), None));
    let result = discovery(&server, launcher)
        .discover(&DiscoveryPlan::Channels {
            ids: vec![GOOD_CHANNEL.to_string()],
        })
        .await
        .unwrap();

    assert!(result.accepted().is_empty());
    assert_eq!(
        result.rejected(),
        vec![("aaaaaaaaaaa".to_string(), "no duration found".to_string())]
    );
}

#[tokio::test]
async fn test_malformed_channel_issues_no_fetch() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/content"))
        .and(body_partial_json(json!({ "url": "https://platform.test/channel/XYZ123/videos" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/content"))
        .and(body_partial_json(
            json!({ "url": format!("https://platform.test/channel/{GOOD_CHANNEL}/videos") }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let launcher = Arc::new(BrowserlessLauncher::new(&server.uri(), None));
    let result = discovery(&server, launcher)
        .discover(&DiscoveryPlan::Channels {
            ids: vec!["XYZ123".to_string(), GOOD_CHANNEL.to_string()],
        })
        .await
        .unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn test_webdriver_session_released_when_every_page_fails() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": { "ready": true } })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "value": { "sessionId": "run-1" } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/run-1/url"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "value": { "error": "timeout", "message": "page load timed out" }
        })))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(&server)
        .await;

    let launcher = Arc::new(
        WebDriverLauncher::new(DriverEndpoint::Remote { url: server.uri() })
            .with_startup_timeout(Duration::from_secs(2)),
    );
    let result = discovery(&server, launcher)
        .discover(&DiscoveryPlan::Index {
            start_page: 1,
            end_page: 3,
        })
        .await
        .unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn test_unreachable_driver_is_fatal() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let launcher = Arc::new(
        WebDriverLauncher::new(DriverEndpoint::Remote {
            url: "http://127.0.0.1:9".to_string(),
        })
        .with_startup_timeout(Duration::from_millis(300)),
    );
    let err = discovery(&server, launcher)
        .discover(&DiscoveryPlan::Index {
            start_page: 1,
            end_page: 1,
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not ready"));
}
