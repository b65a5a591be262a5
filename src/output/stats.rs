//! Statistics over a batch's accumulated results
//!
//! This module provides functionality for summarizing a [`BatchState`],
//! whether held in memory or restored from the storage layer, and for
//! displaying those statistics.

use crate::state::{BatchState, UrlFailure};
use crate::storage::Storage;
use crate::AuditError;
use std::collections::{HashMap, HashSet};

/// Batch statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditStatistics {
    /// Number of URLs fully processed
    pub pages_processed: usize,

    /// Number of distinct block instances found
    pub block_instances: usize,

    /// Total content rows extracted
    pub content_rows: usize,

    /// Content rows that received readability scores
    pub scored_rows: usize,

    /// Mean reading ease over scored rows
    pub average_readability: Option<f64>,

    /// Total asset rows collected
    pub asset_rows: usize,

    /// Total broken-link rows
    pub broken_links: usize,

    /// Broken links per status, most frequent first
    pub links_by_status: Vec<(String, usize)>,

    /// URLs whose pipeline failed
    pub failures: Vec<UrlFailure>,
}

impl AuditStatistics {
    pub fn from_state(state: &BatchState) -> Self {
        let block_instances = state
            .content_rows
            .iter()
            .map(|row| (row.url.as_str(), row.instance_id.as_str()))
            .collect::<HashSet<_>>()
            .len();

        let scores: Vec<f64> = state
            .content_rows
            .iter()
            .filter_map(|row| row.readability_score)
            .collect();
        let average_readability = if scores.is_empty() {
            None
        } else {
            Some(crate::state::round2(
                scores.iter().sum::<f64>() / scores.len() as f64,
            ))
        };

        let mut by_status: HashMap<String, usize> = HashMap::new();
        for row in &state.link_rows {
            *by_status.entry(row.status.to_string()).or_insert(0) += 1;
        }
        let mut links_by_status: Vec<_> = by_status.into_iter().collect();
        links_by_status.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            pages_processed: state.processed_urls.len(),
            block_instances,
            content_rows: state.content_rows.len(),
            scored_rows: scores.len(),
            average_readability,
            asset_rows: state.asset_rows.len(),
            broken_links: state.link_rows.len(),
            links_by_status,
            failures: state.failures.clone(),
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(AuditStatistics)` - Successfully loaded statistics
/// * `Err(AuditError)` - Failed to restore the batch state
pub fn load_statistics(storage: &dyn Storage) -> Result<AuditStatistics, AuditError> {
    let state = storage.load_batch_state()?;
    Ok(AuditStatistics::from_state(&state))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &AuditStatistics) {
    println!("=== Audit Statistics ===\n");

    println!("Overview:");
    println!("  Pages processed: {}", stats.pages_processed);
    println!("  Block instances: {}", stats.block_instances);
    println!("  Content rows: {}", stats.content_rows);
    println!("  Asset rows: {}", stats.asset_rows);
    println!("  Broken links: {}", stats.broken_links);
    println!();

    match stats.average_readability {
        Some(average) => println!(
            "Readability: {:.2} average reading ease over {} scored rows",
            average, stats.scored_rows
        ),
        None => println!("Readability: no text long enough to score"),
    }
    println!();

    if !stats.links_by_status.is_empty() {
        println!("Broken Links by Status:");
        for (status, count) in &stats.links_by_status {
            println!("  {}: {}", status, count);
        }
        println!();
    }

    if !stats.failures.is_empty() {
        println!("Failed URLs ({}):", stats.failures.len());
        for failure in &stats.failures {
            println!("  - {}: {}", failure.url, failure.error);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ContentRow, LinkStatus, LinkStatusRow};

    fn content(url: &str, instance: &str, score: Option<f64>) -> ContentRow {
        ContentRow {
            url: url.to_string(),
            block_name: "hero".to_string(),
            instance_id: instance.to_string(),
            component_name: "Title".to_string(),
            value: "Welcome".to_string(),
            source_element_tag: "h1".to_string(),
            css_classes: String::new(),
            readability_score: score,
            grade_level: score.map(|_| 8.0),
        }
    }

    fn link(status: LinkStatus) -> LinkStatusRow {
        LinkStatusRow {
            source_page_url: "https://a.com/".to_string(),
            linked_url: format!("https://a.com/{}", status),
            status,
            block_name: None,
            component_name: None,
        }
    }

    #[test]
    fn test_statistics_from_state() {
        let mut state = BatchState::new();
        state.processed_urls.insert("https://a.com/".to_string());
        state.processed_urls.insert("https://b.com/".to_string());
        state.content_rows = vec![
            content("https://a.com/", "hero-1", Some(60.0)),
            content("https://a.com/", "hero-1", None),
            content("https://b.com/", "hero-1", Some(70.0)),
        ];
        state.link_rows = vec![
            link(LinkStatus::Http(404)),
            link(LinkStatus::Timeout),
            link(LinkStatus::Http(404)),
        ];

        let stats = AuditStatistics::from_state(&state);

        assert_eq!(stats.pages_processed, 2);
        assert_eq!(stats.block_instances, 2);
        assert_eq!(stats.content_rows, 3);
        assert_eq!(stats.scored_rows, 2);
        assert_eq!(stats.average_readability, Some(65.0));
        assert_eq!(
            stats.links_by_status,
            vec![("404".to_string(), 2), ("Timeout".to_string(), 1)]
        );
    }

    #[test]
    fn test_empty_state() {
        let stats = AuditStatistics::from_state(&BatchState::new());
        assert_eq!(stats, AuditStatistics::default());
    }

    #[test]
    fn test_load_statistics_from_storage() {
        let storage = crate::storage::SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.pages_processed, 0);
    }
}
