//! Frontier entries and crawl run statistics.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A URL admitted to the frontier, with its discovery depth.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

/// Why a URL was not enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Not parseable as an http(s) URL
    Invalid,
    /// Different scheme, host or port than the discovering page
    OutOfScope,
    /// Matched a robots.txt `Disallow` rule
    Robots,
    /// Discovered on a page already at the maximum depth
    TooDeep,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rejection::Invalid => "invalid",
            Rejection::OutOfScope => "out of scope",
            Rejection::Robots => "disallowed by robots.txt",
            Rejection::TooDeep => "too deep",
        };
        f.write_str(label)
    }
}

/// Outcome of offering a URL to the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Enqueued,
    /// Already visited, pending, or previously rejected
    Duplicate,
    Rejected(Rejection),
}

/// Summary of one crawl run, written as `crawl_report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub seeds: Vec<String>,
    pub pages_fetched: usize,
    pub pages_persisted: usize,
    pub fetch_failures: usize,
    pub empty_pages: usize,
    pub write_failures: usize,
    pub rejected: BTreeMap<Rejection, usize>,
    /// Set when the page budget or a shutdown request ended the run
    pub stopped_early: bool,
    pub visited: Vec<String>,
}

impl CrawlReport {
    pub fn new(seeds: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            seeds,
            pages_fetched: 0,
            pages_persisted: 0,
            fetch_failures: 0,
            empty_pages: 0,
            write_failures: 0,
            rejected: BTreeMap::new(),
            stopped_early: false,
            visited: Vec::new(),
        }
    }

    pub fn record_rejection(&mut self, reason: Rejection) {
        *self.rejected.entry(reason).or_default() += 1;
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}
