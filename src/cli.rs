//! Command-line interface definitions.
//!
//! Every option has a default, so running the binary with no arguments
//! archives the default blog into `blog_articles.tsv`.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Defaults: headless Chrome via a local chromedriver on port 4444
/// musings_scraper
///
/// # Watch the browser scroll, write somewhere else
/// musings_scraper --headed -o ./archive/articles.tsv
///
/// # Tune scroll timings from a YAML file
/// musings_scraper -c ./scroll.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Index page of the blog to archive
    #[arg(long, default_value = "https://www.socialmusingsbyaustin.com/")]
    pub base_url: String,

    /// Output path for the tab-separated article file
    #[arg(short, long, default_value = "blog_articles.tsv")]
    pub output: PathBuf,

    /// WebDriver server (chromedriver, selenium) to drive the browser through
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:4444")]
    pub webdriver_url: String,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Optional path to a YAML file overriding site markup and scroll timings
    #[arg(short, long)]
    pub config: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["musings_scraper"]);

        assert_eq!(cli.base_url, "https://www.socialmusingsbyaustin.com/");
        assert_eq!(cli.output, PathBuf::from("blog_articles.tsv"));
        assert!(!cli.headed);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "musings_scraper",
            "-o",
            "/tmp/articles.tsv",
            "-c",
            "/tmp/scroll.yaml",
            "--headed",
        ]);

        assert_eq!(cli.output, PathBuf::from("/tmp/articles.tsv"));
        assert_eq!(cli.config.as_deref(), Some("/tmp/scroll.yaml"));
        assert!(cli.headed);
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::parse_from([
            "musings_scraper",
            "--base-url",
            "https://blog.example.com/",
            "--webdriver-url",
            "http://selenium:4444/wd/hub",
        ]);

        assert_eq!(cli.base_url, "https://blog.example.com/");
        assert_eq!(cli.webdriver_url, "http://selenium:4444/wd/hub");
    }
}
