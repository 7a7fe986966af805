//! Article fetching and parsing.
//!
//! Articles are fetched with plain HTTP, independent of the browser session:
//! the post pages are server-rendered, so there is no need to drive a browser
//! for each one.
//!
//! # Extraction Rules
//!
//! | Field | Source |
//! |-------|--------|
//! | title | first `<h1>`, else the configured fallback |
//! | author | configured constant |
//! | date | `Month Day, Year` inside the element carrying the "min read" marker |
//! | content | `p`, `h2`, `h3`, `li` text minus boilerplate, whitespace-collapsed |
//! | categories | text of the category tag elements, comma-joined |

use crate::config::{FetchSettings, SiteProfile};
use crate::models::ArticleRecord;
use crate::utils::{normalize_whitespace, truncate_for_log};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][a-z]+ \d+, \d{4})").expect("valid date regex"));

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static CONTENT_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, h2, h3, li").expect("valid selector"));
static ANY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("*").expect("valid selector"));

/// Elements whose text is code or markup, not prose.
const NON_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Find the publication date.
///
/// The date sits next to the reading-time marker ("5 min read · March 3,
/// 2021"). Candidates are elements whose own text nodes contain the marker,
/// in document order; script-like elements are never candidates. The first
/// candidate whose text holds a `Month Day, Year` pattern wins.
fn extract_date(document: &Html, marker: &str) -> Option<String> {
    document
        .select(&ANY_SEL)
        .filter(|el| !NON_TEXT_ELEMENTS.contains(&el.value().name()))
        .filter(|el| {
            el.children()
                .filter_map(|child| child.value().as_text())
                .any(|text| text.contains(marker))
        })
        .find_map(|el| {
            let text = element_text(el);
            DATE_RE
                .captures(&text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        })
}

fn extract_content(document: &Html, boilerplate: &[String]) -> String {
    let blocks = document
        .select(&CONTENT_SEL)
        .map(|el| element_text(el).trim().to_string())
        .filter(|text| !text.is_empty())
        .filter(|text| {
            let lower = text.to_lowercase();
            !boilerplate.iter().any(|skip| lower.contains(skip.as_str()))
        })
        .join("\n\n");
    normalize_whitespace(&blocks)
}

fn extract_categories(document: &Html, selector: &str) -> Result<String, Box<dyn Error>> {
    let category_selector =
        Selector::parse(selector).map_err(|e| format!("invalid category selector {selector:?}: {e}"))?;
    Ok(document
        .select(&category_selector)
        .map(|el| element_text(el).trim().to_string())
        .join(", "))
}

/// Parse one article page into a record.
///
/// # Errors
///
/// Only fails when the configured category selector is not valid CSS.
pub fn parse_article(url: &str, html: &str, site: &SiteProfile) -> Result<ArticleRecord, Box<dyn Error>> {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SEL)
        .next()
        .map(|h| element_text(h).trim().to_string())
        .unwrap_or_else(|| site.title_fallback.clone());

    Ok(ArticleRecord {
        url: url.to_string(),
        title,
        author: site.author.clone(),
        date: extract_date(&document, &site.date_marker),
        content: extract_content(&document, &site.boilerplate),
        categories: extract_categories(&document, &site.category_selector)?,
    })
}

/// Stateless article fetcher sharing one HTTP connection pool.
#[derive(Debug, Clone)]
pub struct ArticleFetcher {
    client: Client,
    site: SiteProfile,
}

impl ArticleFetcher {
    /// Build a fetcher that identifies itself with the site's user agent.
    pub fn new(settings: &FetchSettings, site: &SiteProfile) -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&site.user_agent)?);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout())
            .build()?;
        Ok(Self {
            client,
            site: site.clone(),
        })
    }

    /// Fetch and parse a single article.
    ///
    /// Non-success HTTP statuses are errors, so an error page never becomes a
    /// record with the fallback title. A plain GET that parsed whatever came
    /// back would keep such pages; this fetcher drops them instead.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<ArticleRecord, Box<dyn Error>> {
        info!("Scraping article");
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let record = parse_article(url, &body, &self.site)?;
        debug!(
            title = %record.title,
            date = ?record.date,
            content_preview = %truncate_for_log(&record.content, 120),
            "Parsed article"
        );
        Ok(record)
    }
}

/// Fetch every URL in order, one at a time.
///
/// A URL that fails to fetch or parse is logged and dropped; it is not
/// retried and contributes no record. `delay` is slept after each success.
#[instrument(level = "info", skip_all, fields(count = urls.len()))]
pub async fn fetch_articles(fetcher: &ArticleFetcher, urls: &[String], delay: Duration) -> Vec<ArticleRecord> {
    info!("Starting to scrape articles");
    let mut records = Vec::with_capacity(urls.len());

    for url in urls {
        match fetcher.fetch(url).await {
            Ok(record) => {
                records.push(record);
                if !delay.is_zero() {
                    sleep(delay).await;
                }
            }
            Err(e) => {
                error!(%url, error = %e, "Error scraping article; skipping");
            }
        }
    }

    info!(
        scraped = records.len(),
        skipped = urls.len() - records.len(),
        "Finished scraping articles"
    );
    records
}
