//! Browser automation session.
//!
//! A run needs four things from a browser: open the index page, read the
//! current rendered HTML, run a script in the page, and release the browser.
//! [`PageSession`] captures exactly that, so the run can be driven by a real
//! WebDriver session in production and by a scripted fake in tests.
//!
//! [`WebDriverSession`] talks to a running WebDriver server (chromedriver,
//! geckodriver, selenium) through `fantoccini`.

use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// A live page that can be inspected and scripted.
pub trait PageSession {
    /// Navigate to `base_url` and wait up to `timeout` for a post link.
    ///
    /// A readiness timeout is not an error. Sessions that are already on the
    /// right page keep the default.
    async fn open(
        &self,
        _base_url: &str,
        _post_path_pattern: &str,
        _timeout: Duration,
    ) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    /// HTML of the page as currently rendered, including lazily inserted nodes.
    async fn page_source(&self) -> Result<String, Box<dyn Error>>;

    /// Execute `script` in the page, ignoring its return value.
    async fn run_script(&self, script: &str) -> Result<(), Box<dyn Error>>;

    /// Release the session. Consumes the handle so it cannot be used after.
    async fn close(self) -> Result<(), Box<dyn Error>>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// XPath matching any anchor whose `href` contains `pattern`.
pub fn post_link_xpath(pattern: &str) -> String {
    format!("//a[contains(@href, '{}')]", pattern.replace('\'', ""))
}

/// Chrome capabilities for the automation session.
pub fn chrome_capabilities(headless: bool) -> Map<String, Value> {
    let mut args = vec![
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--window-size=1920,1080",
    ];
    if headless {
        args.insert(0, "--headless");
    }

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

/// Exclusive handle on one WebDriver browser session.
///
/// [`PageSession::close`] consumes the handle; `harvest` in `main` calls it
/// on every exit path once the session has been connected.
pub struct WebDriverSession {
    client: Client,
}

impl std::fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverSession").finish_non_exhaustive()
    }
}

impl WebDriverSession {
    /// Start a new browser session on the WebDriver server at `webdriver_url`.
    ///
    /// # Errors
    ///
    /// Fails if the server is unreachable or refuses the capabilities. This is
    /// a setup failure and aborts the run.
    #[instrument(level = "info")]
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self, Box<dyn Error>> {
        let client = ClientBuilder::native()
            .capabilities(chrome_capabilities(headless))
            .connect(webdriver_url)
            .await?;
        info!("Browser session started");
        Ok(Self { client })
    }
}

impl PageSession for WebDriverSession {
    /// Navigate to `base_url` and wait for the first post link to render.
    ///
    /// A readiness timeout is not fatal: it is logged and discovery proceeds
    /// against whatever the page has rendered so far.
    #[instrument(level = "info", skip(self))]
    async fn open(
        &self,
        base_url: &str,
        post_path_pattern: &str,
        timeout: Duration,
    ) -> Result<(), Box<dyn Error>> {
        info!("Loading main page to extract all article links");
        self.client.goto(base_url).await?;

        let t0 = Instant::now();
        let xpath = post_link_xpath(post_path_pattern);
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::XPath(&xpath))
            .await
        {
            Ok(_) => {
                debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "First post link rendered");
            }
            Err(CmdError::WaitTimeout) => {
                warn!(?timeout, %xpath, "Initial load timeout; continuing with partial page");
            }
            Err(e) => {
                warn!(error = %e, "Initial load wait failed; continuing with partial page");
            }
        }
        Ok(())
    }

    /// End the browser session.
    #[instrument(level = "info", skip_all)]
    async fn close(self) -> Result<(), Box<dyn Error>> {
        self.client.close().await?;
        info!("Browser session closed");
        Ok(())
    }

    async fn page_source(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.client.source().await?)
    }

    async fn run_script(&self, script: &str) -> Result<(), Box<dyn Error>> {
        self.client.execute(script, Vec::new()).await?;
        Ok(())
    }
}
