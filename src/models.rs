//! Data models for discovered links and scraped articles.
//!
//! - [`LinkSet`]: deduplicated article URLs, kept in discovery order
//! - [`Discovery`]: outcome of the scroll loop, including why it stopped
//! - [`ArticleRecord`]: one exported row

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

/// Article URLs accumulated across scroll rounds.
///
/// Links are only ever added. Iteration yields them in the order they were
/// first seen, which keeps the output file stable between runs of the same
/// page state.
#[derive(Debug, Default, Clone)]
pub struct LinkSet {
    seen: HashSet<String>,
    order: Vec<String>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `links` into the set, returning how many were new.
    pub fn merge<I>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.order.len();
        for link in links {
            if self.seen.insert(link.clone()) {
                self.order.push(link);
            }
        }
        self.order.len() - before
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

/// Why the discovery loop ended.
///
/// Both variants are normal completions; the caller gets the links either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Several consecutive rounds produced no new links.
    Exhausted,
    /// The round budget ran out while links may still have been appearing.
    RoundLimit,
}

/// Result of running the scroll loop to completion.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub links: Vec<String>,
    pub rounds: usize,
    pub stop: StopReason,
    /// Size of the known-link set at the end of each round's snapshot.
    pub growth: Vec<usize>,
}

/// One scraped article, serialized as a row of the output file.
///
/// Field order is the column order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    pub author: String,
    /// Publication date as printed on the page, e.g. `March 3, 2021`.
    pub date: Option<String>,
    pub content: String,
    /// Comma-joined category names; empty when the article has none.
    pub categories: String,
}

impl ArticleRecord {
    /// Calendar date of publication, when the printed date is a real one.
    pub fn published_on(&self) -> Option<NaiveDate> {
        self.date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%B %d, %Y").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: Option<&str>) -> ArticleRecord {
        ArticleRecord {
            url: "https://example.com/post/a".to_string(),
            title: "A".to_string(),
            author: "Someone".to_string(),
            date: date.map(String::from),
            content: "Body".to_string(),
            categories: String::new(),
        }
    }

    #[test]
    fn test_link_set_merge_counts_only_new() {
        let mut links = LinkSet::new();
        assert_eq!(links.merge(vec!["a".to_string(), "b".to_string()]), 2);
        assert_eq!(links.merge(vec!["b".to_string(), "c".to_string()]), 1);
        assert_eq!(links.merge(Vec::new()), 0);
        assert_eq!(links.len(), 3);
        assert!(!links.is_empty());
    }

    #[test]
    fn test_link_set_keeps_first_seen_order() {
        let mut links = LinkSet::new();
        links.merge(vec!["z".to_string(), "a".to_string(), "z".to_string()]);
        links.merge(vec!["m".to_string()]);
        assert_eq!(links.into_vec(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_published_on_parses_printed_date() {
        let date = record(Some("March 3, 2021")).published_on();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 3, 3));
    }

    #[test]
    fn test_published_on_rejects_impossible_date() {
        assert_eq!(record(Some("Febtober 45, 2021")).published_on(), None);
        assert_eq!(record(None).published_on(), None);
    }
}
