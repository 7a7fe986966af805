//! Small helpers shared by the parser, exporter and logging.
//!
//! - Whitespace normalization for article bodies
//! - String truncation for log previews
//! - Output path validation before a long scraping run

use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Collapse every run of whitespace into a single space and trim both ends.
///
/// Idempotent: normalizing already-normalized text returns it unchanged.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_whitespace("  a\n\n b\t c "), "a b c");
/// ```
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to a character
/// boundary) with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Make sure the directory that will hold `path` exists and is writable.
///
/// Checked up front so a run does not spend minutes scrolling and fetching
/// only to fail on the final write.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a probe file
/// cannot be written into it.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    let probe = dir.join("..__probe_write__");
    fs::write(&probe, b"").await?;
    let _ = fs::remove_file(&probe).await;
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace_collapses_runs() {
        assert_eq!(normalize_whitespace("  a\n\n b\t\t c  "), "a b c");
        assert_eq!(normalize_whitespace("one\u{a0}two"), "one two");
    }

    #[test]
    fn test_normalize_whitespace_empty_input() {
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace(" \n\t "), "");
    }

    #[test]
    fn test_normalize_whitespace_is_idempotent() {
        let samples = [
            "First paragraph.\n\nSecond   paragraph.",
            "  leading and trailing  ",
            "already normalized",
            "tabs\tand\r\nnewlines",
        ];
        for sample in samples {
            let once = normalize_whitespace(sample);
            assert_eq!(normalize_whitespace(&once), once);
        }
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "é".repeat(10);
        let result = truncate_for_log(&s, 3);
        assert!(result.starts_with('é'));
        assert!(result.contains("(+18 bytes)"));
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_creates_missing_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("nested/deeper/out.tsv");
        ensure_parent_dir(&target).await.unwrap();
        assert!(tmp.path().join("nested/deeper").is_dir());
        assert!(!tmp.path().join("nested/deeper/..__probe_write__").exists());
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_bare_filename() {
        ensure_parent_dir(Path::new("blog_articles.tsv")).await.unwrap();
    }
}
