//! CLI entry point for covercrawl.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use covercrawl_core::channel_list::read_channel_list;
use covercrawl_core::{
    ApiQueueSink, BrowserlessLauncher, CaseFolding, Credentials, DatabaseSink, Database, Discovery,
    DiscoveryOptions, DiscoveryPlan, DriverEndpoint, Endpoints, FetcherLauncher, FileConfig,
    IndexValidator, KeywordClassifier, MetadataValidator, QueueSink, StubFileSink, Validators,
    WebDriverLauncher, YtDlpProvider, forward_accepted, write_report,
};
use tracing::{debug, info};

mod cli;

use cli::{Args, RunSettings, STUB_FILE};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    init_tracing(args.log_level(), no_color_env_requested());
    debug!(?args, "CLI arguments parsed");

    let file_config = match &args.config {
        Some(path) => Some(
            FileConfig::load(path)
                .with_context(|| format!("Failed to load config file '{}'", path.display()))?,
        ),
        None => FileConfig::load_default().context("Failed to load default config file")?,
    };
    let settings = RunSettings::resolve(&args, file_config.as_ref())?;
    let credentials = Credentials::from_env();

    let plan = if args.youtube {
        args.plan(read_channel_list(&args.channel_id_source)?)
    } else {
        args.plan(Vec::new())
    };
    if matches!(plan, DiscoveryPlan::Index { .. }) {
        credentials.require_index_api_key()?;
    }

    // Resolve the sink before crawling so configuration errors fail fast.
    let sink = build_sink(&args, &credentials).await?;

    let classifier = match &settings.keywords_file {
        Some(path) => KeywordClassifier::from_file(path, CaseFolding::Insensitive)?,
        None => KeywordClassifier::default(),
    };
    let endpoints = Endpoints::default();
    let validators = Validators::new(
        Arc::new(IndexValidator::with_base_url(
            credentials.index_api_key.clone().unwrap_or_default(),
            endpoints.index_api_url.clone(),
        )?),
        Arc::new(MetadataValidator::new(YtDlpProvider::new(
            credentials.yt_dlp_path.clone(),
        ))),
    );
    let options = DiscoveryOptions {
        window: settings.window,
        settle_delay: settings.settle_delay,
        concurrency: settings.concurrency,
        endpoints,
    };

    info!(
        min_secs = settings.window.min_secs(),
        max_secs = settings.window.max_secs(),
        concurrency = settings.concurrency,
        sink = sink.name(),
        "covercrawl starting"
    );

    let discovery = Discovery::new(launcher(&credentials), validators, classifier, options);
    let result = discovery.discover(&plan).await?;

    let report = write_report(&settings.report_dir, &result)?;
    let summary = forward_accepted(sink.as_ref(), result.accepted()).await;
    sink.close().await;

    info!(
        accepted = result.accepted().len(),
        rejected = result.rejected().len(),
        enqueued = summary.enqueued,
        skipped = summary.skipped,
        failed = summary.failed,
        report = %report.display(),
        "Run complete"
    );
    Ok(())
}

async fn build_sink(args: &Args, credentials: &Credentials) -> Result<Box<dyn QueueSink>> {
    if let Some(path) = &args.db {
        let db = Database::new(path)
            .await
            .with_context(|| format!("Failed to open database '{}'", path.display()))?;
        return Ok(Box::new(DatabaseSink::new(db)));
    }
    if args.stub {
        return Ok(Box::new(StubFileSink::open(Path::new(STUB_FILE)).await?));
    }
    let (url, auth) = credentials.require_queue_api()?;
    Ok(Box::new(ApiQueueSink::new(url, auth)?))
}

/// Remote WebDriver wins over Browserless, which wins over a local driver.
fn launcher(credentials: &Credentials) -> Arc<dyn FetcherLauncher> {
    if let Some(url) = &credentials.webdriver_url {
        return Arc::new(WebDriverLauncher::new(DriverEndpoint::Remote { url: url.clone() }));
    }
    if let Some(url) = &credentials.browserless_url {
        return Arc::new(BrowserlessLauncher::new(
            url,
            credentials.browserless_token.as_deref(),
        ));
    }
    Arc::new(WebDriverLauncher::new(DriverEndpoint::Spawn {
        program: credentials.chrome_driver_path.clone(),
    }))
}

fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

/// Priority: `RUST_LOG` > -q > -v > info. Logs go to stderr.
fn init_tracing(default_level: &str, no_color: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}
