//! Tunable knobs for the scraper.
//!
//! Every value has a default matching the target blog, so the YAML file is
//! optional and may override any subset of fields:
//!
//! ```yaml
//! scroll:
//!   max_rounds: 80
//!   waits_ms: [1500, 2500]
//! site:
//!   post_path_pattern: "/blog/"
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScrapeConfig {
    pub site: SiteProfile,
    pub scroll: ScrollStrategy,
    pub fetch: FetchSettings,
}

/// Markup conventions of the site being scraped.
///
/// These are artifacts of the site builder's generated HTML, so they are kept
/// as data rather than baked into the parser.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SiteProfile {
    /// Substring identifying article links, matched against `href`.
    pub post_path_pattern: String,
    /// Author written on every record.
    pub author: String,
    /// Title used when the article has no `<h1>`.
    pub title_fallback: String,
    /// Text marker of the element that carries the publication date.
    pub date_marker: String,
    /// CSS selector for category tag elements.
    pub category_selector: String,
    /// Lowercase substrings; any content block containing one is dropped.
    pub boilerplate: Vec<String>,
    /// `User-Agent` sent with every article request.
    pub user_agent: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            post_path_pattern: "/post/".to_string(),
            author: "Austin from Austin".to_string(),
            title_fallback: "No title found".to_string(),
            date_marker: "min read".to_string(),
            category_selector: r#"a[data-hook="post-category"]"#.to_string(),
            boilerplate: ["min read", "©2021", "subscribe", "social musings"]
                .into_iter()
                .map(String::from)
                .collect(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
        }
    }
}

/// Parameters of the infinite-scroll discovery loop.
///
/// Durations are stored in milliseconds so the YAML stays flat.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScrollStrategy {
    pub max_rounds: usize,
    pub max_consecutive_empty: usize,
    /// Fraction of the document height used by the second scroll move.
    pub bottom_fraction: f64,
    /// Pixel delta used by the relative scroll move.
    pub step_offset: i64,
    /// Post-scroll waits, picked by `round % waits_ms.len()`.
    pub waits_ms: Vec<u64>,
    pub jiggle_every: usize,
    /// Pixel distance of the up-then-down jiggle.
    pub jiggle_offset: u32,
    pub jiggle_wait_ms: u64,
    pub force_load_every: usize,
    pub force_load_wait_ms: u64,
    /// How long `open` waits for the first post link to render.
    pub ready_timeout_ms: u64,
}

impl Default for ScrollStrategy {
    fn default() -> Self {
        Self {
            max_rounds: 50,
            max_consecutive_empty: 3,
            bottom_fraction: 0.8,
            step_offset: 1000,
            waits_ms: vec![2000, 3000],
            jiggle_every: 5,
            jiggle_offset: 500,
            jiggle_wait_ms: 1000,
            force_load_every: 10,
            force_load_wait_ms: 3000,
            ready_timeout_ms: 20_000,
        }
    }
}

impl ScrollStrategy {
    /// Wait after the scroll move of `round`.
    pub fn wait_for_round(&self, round: usize) -> Duration {
        if self.waits_ms.is_empty() {
            return Duration::ZERO;
        }
        Duration::from_millis(self.waits_ms[round % self.waits_ms.len()])
    }

    pub fn jiggle_wait(&self) -> Duration {
        Duration::from_millis(self.jiggle_wait_ms)
    }

    pub fn force_load_wait(&self) -> Duration {
        Duration::from_millis(self.force_load_wait_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

/// Settings for the per-article HTTP fetches.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FetchSettings {
    /// Pause after each successfully scraped article.
    pub delay_ms: u64,
    pub timeout_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            timeout_ms: 30_000,
        }
    }
}

impl FetchSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ScrapeConfig {
    /// Load configuration from an optional YAML file.
    ///
    /// With no path the built-in defaults are returned. A path that cannot be
    /// read or parsed is an error, since silently scraping with the wrong
    /// selectors would produce an empty or misleading archive.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            info!("No config file given; using built-in defaults");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&raw)?;
        info!(%path, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error>> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }
}
