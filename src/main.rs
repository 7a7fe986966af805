//! # Musings Scraper
//!
//! Archives every article of an infinite-scroll blog into a tab-separated
//! file.
//!
//! ## Usage
//!
//! ```sh
//! chromedriver --port=4444 &
//! musings_scraper -o blog_articles.tsv
//! ```
//!
//! ## Architecture
//!
//! The run is strictly sequential:
//! 1. **Discovery**: a WebDriver browser loads the index page and scrolls it
//!    until no new post links appear ([`discover`])
//! 2. **Fetching**: each discovered post is fetched over plain HTTP and parsed
//!    ([`article`]); failures are logged and skipped
//! 3. **Export**: all records are written once to a TSV file ([`export`])
//!
//! The browser session is closed whether or not the run succeeds.

use chrono::NaiveDate;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};
use url::Url;

mod article;
mod cli;
mod config;
mod discover;
mod export;
mod models;
mod session;
mod utils;

use article::{ArticleFetcher, fetch_articles};
use cli::Cli;
use config::ScrapeConfig;
use discover::discover_links;
use export::write_tsv;
use models::ArticleRecord;
use session::{PageSession, WebDriverSession};
use utils::ensure_parent_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("musings_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = ScrapeConfig::load(args.config.as_deref())?;
    let base = Url::parse(&args.base_url)?;

    // Fail before opening a browser if the result could never be saved.
    if let Err(e) = ensure_parent_dir(&args.output).await {
        error!(
            path = %args.output.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let fetcher = ArticleFetcher::new(&config.fetch, &config.site)?;
    let session = WebDriverSession::connect(&args.webdriver_url, !args.headed).await?;

    let records = harvest(session, &base, &config, &fetcher, &args.output).await?;

    let dates: Vec<NaiveDate> = records.iter().filter_map(ArticleRecord::published_on).collect();
    let elapsed = start_time.elapsed();
    info!(
        articles = records.len(),
        dated = dates.len(),
        earliest = ?dates.iter().min(),
        latest = ?dates.iter().max(),
        path = %args.output.display(),
        ?elapsed,
        "Execution complete"
    );

    Ok(())
}

/// Run the scrape and release `session` afterwards, whatever the outcome.
///
/// The error from the run, if any, is returned after the session is closed.
/// A failure to close is only logged.
async fn harvest<S: PageSession>(
    session: S,
    base: &Url,
    config: &ScrapeConfig,
    fetcher: &ArticleFetcher,
    output: &Path,
) -> Result<Vec<ArticleRecord>, Box<dyn Error>> {
    let outcome = run(&session, base, config, fetcher, output).await;
    if let Err(e) = session.close().await {
        warn!(error = %e, "Failed to close browser session cleanly");
    }
    outcome
}

/// Everything that happens while the browser session is held.
#[instrument(level = "info", skip_all, fields(base = %base))]
async fn run<S: PageSession>(
    session: &S,
    base: &Url,
    config: &ScrapeConfig,
    fetcher: &ArticleFetcher,
    output: &Path,
) -> Result<Vec<ArticleRecord>, Box<dyn Error>> {
    session
        .open(
            base.as_str(),
            &config.site.post_path_pattern,
            config.scroll.ready_timeout(),
        )
        .await?;

    let discovery = discover_links(session, base, &config.site, &config.scroll).await?;
    info!(
        links = discovery.links.len(),
        rounds = discovery.rounds,
        stop = ?discovery.stop,
        "Discovery finished"
    );
    debug!(growth = ?discovery.growth, "Known links after each round");

    let records = fetch_articles(fetcher, &discovery.links, config.fetch.delay()).await;

    write_tsv(&records, output)?;
    info!(count = records.len(), path = %output.display(), "Saved articles to file");
    Ok(records)
}
