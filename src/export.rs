//! Tab-separated output of scraped articles.
//!
//! The file has a header row followed by one row per record, with columns
//! `url, title, author, date, content, categories`. A missing date is an empty
//! cell. Fields containing tabs, quotes or newlines are quoted.

use crate::models::ArticleRecord;
use csv::WriterBuilder;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Column names, in output order.
pub const COLUMNS: [&str; 6] = ["url", "title", "author", "date", "content", "categories"];

/// Write `records` to `path`, replacing any existing file.
///
/// The header row is written even when `records` is empty.
#[instrument(level = "info", skip_all, fields(count = records.len(), path = %path.display()))]
pub fn write_tsv(records: &[ArticleRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Saved articles");
    Ok(())
}
