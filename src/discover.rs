//! Article link discovery on an infinite-scroll index page.
//!
//! The index page only renders a handful of posts up front and inserts more
//! as the reader scrolls. Discovery repeatedly snapshots the rendered anchors,
//! scrolls, and waits, until either no new links show up for a few rounds or
//! the round budget runs out.
//!
//! # Round Structure
//!
//! Each round:
//! 1. Snapshot post links and merge them into the known set
//! 2. Scroll, rotating through [`ScrollMove::ALL`] by `round % 3`
//! 3. Sleep, alternating between the configured waits by `round % 2`
//! 4. On every `jiggle_every`-th round, scroll up then back down
//! 5. Advance the round; on every `force_load_every`-th round, click any
//!    "load more"-looking control and wait for it
//!
//! Lazy-load listeners differ in which trigger they react to (absolute
//! position, relative delta, direction change, explicit button), so the loop
//! tries all of them. There is no completeness guarantee.

use crate::config::{ScrollStrategy, SiteProfile};
use crate::models::{Discovery, LinkSet, StopReason};
use crate::session::PageSession;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

static ANCHOR_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Clicks every button or link whose text looks like a pagination control.
const FORCE_LOAD_SCRIPT: &str = r#"
document.querySelectorAll('button, a').forEach(el => {
    const text = el.textContent || '';
    if (text.toLowerCase().includes('more') ||
        text.toLowerCase().includes('load') ||
        text.includes('...')) {
        el.click();
    }
});
"#;

/// The three scroll triggers the loop rotates through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollMove {
    /// Jump to the very bottom of the document.
    ToBottom,
    /// Jump to a fraction of the document height.
    ToFraction,
    /// Scroll down by a fixed pixel delta.
    Step,
}

impl ScrollMove {
    pub const ALL: [ScrollMove; 3] = [ScrollMove::ToBottom, ScrollMove::ToFraction, ScrollMove::Step];

    pub fn for_round(round: usize) -> Self {
        Self::ALL[round % Self::ALL.len()]
    }

    pub fn script(self, strategy: &ScrollStrategy) -> String {
        match self {
            ScrollMove::ToBottom => "window.scrollTo(0, document.body.scrollHeight);".to_string(),
            ScrollMove::ToFraction => format!(
                "window.scrollTo(0, document.body.scrollHeight * {});",
                strategy.bottom_fraction
            ),
            ScrollMove::Step => format!("window.scrollBy(0, {});", strategy.step_offset),
        }
    }
}

/// Extract article links from rendered HTML.
///
/// Every `<a href>` whose `href` contains `pattern` is resolved against
/// `base`. Duplicates are removed, keeping first-seen order. Hrefs that do not
/// resolve to a URL are skipped.
pub fn extract_post_links(html: &str, base: &Url, pattern: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = LinkSet::new();
    for element in document.select(&ANCHOR_SEL) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !href.contains(pattern) {
            continue;
        }
        if let Ok(resolved) = base.join(href) {
            links.merge(std::iter::once(resolved.to_string()));
        }
    }
    links.into_vec()
}

/// Scroll up by the jiggle offset, then back down by the same amount.
fn jiggle_scripts(strategy: &ScrollStrategy) -> (String, String) {
    (
        format!("window.scrollBy(0, -{});", strategy.jiggle_offset),
        format!("window.scrollBy(0, {});", strategy.jiggle_offset),
    )
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}

/// Drive `session` until the page stops yielding new article links.
///
/// Termination is normal in both cases described by [`StopReason`]; the
/// links gathered so far are returned either way. Errors from the session
/// itself (a dead browser, a failed script) are propagated.
#[instrument(level = "info", skip_all, fields(base = %base))]
pub async fn discover_links<S: PageSession>(
    session: &S,
    base: &Url,
    site: &SiteProfile,
    strategy: &ScrollStrategy,
) -> Result<Discovery, Box<dyn Error>> {
    info!("Scrolling and collecting article links");

    let mut known = LinkSet::new();
    let mut growth = Vec::new();
    let mut consecutive_empty = 0usize;
    let mut round = 0usize;

    while round < strategy.max_rounds && consecutive_empty < strategy.max_consecutive_empty {
        let html = session.page_source().await?;
        let snapshot = extract_post_links(&html, base, &site.post_path_pattern);
        let added = known.merge(snapshot);
        growth.push(known.len());

        if added > 0 {
            info!(new = added, "Found new articles");
            consecutive_empty = 0;
        } else {
            consecutive_empty += 1;
            debug!(consecutive_empty, "No new links this round");
        }

        let scroll = ScrollMove::for_round(round);
        session.run_script(&scroll.script(strategy)).await?;
        pause(strategy.wait_for_round(round)).await;

        if strategy.jiggle_every > 0 && round % strategy.jiggle_every == 0 {
            debug!(round, offset = strategy.jiggle_offset, "Jiggling scroll position");
            let (up, down) = jiggle_scripts(strategy);
            session.run_script(&up).await?;
            pause(strategy.jiggle_wait()).await;
            session.run_script(&down).await?;
            pause(strategy.jiggle_wait()).await;
        }

        round += 1;
        info!(
            round,
            max = strategy.max_rounds,
            found = known.len(),
            ?scroll,
            "Scroll attempt complete"
        );

        if strategy.force_load_every > 0 && round % strategy.force_load_every == 0 {
            info!("Attempting to force load more content");
            session.run_script(FORCE_LOAD_SCRIPT).await?;
            pause(strategy.force_load_wait()).await;
        }
    }

    let stop = if consecutive_empty >= strategy.max_consecutive_empty {
        info!(consecutive_empty, "No new links found after multiple attempts");
        StopReason::Exhausted
    } else {
        info!(round, "Reached maximum scroll attempts");
        StopReason::RoundLimit
    };

    if known.is_empty() {
        warn!(pattern = %site.post_path_pattern, "No article links found on the page");
    }
    info!(total = known.len(), rounds = round, "Finished scrolling");
    Ok(Discovery {
        links: known.into_vec(),
        rounds: round,
        stop,
        growth,
    })
}
