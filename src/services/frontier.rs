// src/services/frontier.rs

//! Breadth-first frontier with admission control.

use std::collections::{BTreeSet, HashSet, VecDeque};

use url::Url;

use crate::models::{Admission, FrontierEntry, Rejection};
use crate::services::robots::RobotsPolicyStore;
use crate::utils::url::same_origin;

/// Pending queue plus the visited, enqueued and rejected sets of one run.
///
/// A URL moves `unseen -> enqueued -> visited` or `unseen -> rejected`; it is
/// never queued twice and never fetched twice.
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    enqueued: HashSet<String>,
    visited: BTreeSet<String>,
    rejected: HashSet<String>,
    max_depth: u32,
    robots: Option<RobotsPolicyStore>,
}

impl Frontier {
    /// `robots` is `None` when robots.txt is not honored.
    pub fn new(max_depth: u32, robots: Option<RobotsPolicyStore>) -> Self {
        Self {
            queue: VecDeque::new(),
            enqueued: HashSet::new(),
            visited: BTreeSet::new(),
            rejected: HashSet::new(),
            max_depth,
            robots,
        }
    }

    /// Offer `url` for admission at `depth`, scoped to `origin`.
    ///
    /// Checks run in order: depth, validity, scope, duplicates, robots.
    pub async fn offer(&mut self, url: &str, origin: &Url, depth: u32) -> Admission {
        if depth > self.max_depth {
            return Admission::Rejected(Rejection::TooDeep);
        }
        let Ok(parsed) = Url::parse(url) else {
            self.rejected.insert(url.to_string());
            return Admission::Rejected(Rejection::Invalid);
        };
        if !same_origin(&parsed, origin) {
            return Admission::Rejected(Rejection::OutOfScope);
        }
        if self.is_known(parsed.as_str()) {
            return Admission::Duplicate;
        }
        if let Some(robots) = self.robots.as_mut() {
            if !robots.is_allowed(&parsed).await {
                self.rejected.insert(parsed.to_string());
                return Admission::Rejected(Rejection::Robots);
            }
        }

        self.enqueued.insert(parsed.to_string());
        self.queue.push_back(FrontierEntry {
            url: parsed.into(),
            depth,
        });
        Admission::Enqueued
    }

    /// Dequeue the oldest entry and mark it visited.
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        let entry = self.queue.pop_front()?;
        self.enqueued.remove(&entry.url);
        self.visited.insert(entry.url.clone());
        Some(entry)
    }

    pub fn is_known(&self, url: &str) -> bool {
        self.visited.contains(url) || self.enqueued.contains(url) || self.rejected.contains(url)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Visited URLs, sorted.
    pub fn visited(&self) -> &BTreeSet<String> {
        &self.visited
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::test_support::StaticFetcher;

    fn origin() -> Url {
        Url::parse("https://example.test/a").unwrap()
    }

    fn frontier_with_robots(robots_txt: &str) -> Frontier {
        let fetcher = Arc::new(
            StaticFetcher::new().page("https://example.test/robots.txt", robots_txt),
        );
        Frontier::new(
            1,
            Some(RobotsPolicyStore::new(fetcher, Duration::from_secs(1))),
        )
    }

    #[tokio::test]
    async fn test_fifo_order_and_visited_marking() {
        let mut frontier = Frontier::new(3, None);
        for path in ["a", "b", "c"] {
            let url = format!("https://example.test/{path}");
            assert_eq!(frontier.offer(&url, &origin(), 1).await, Admission::Enqueued);
        }
        let order: Vec<_> = std::iter::from_fn(|| frontier.pop()).map(|e| e.url).collect();
        assert_eq!(
            order,
            [
                "https://example.test/a",
                "https://example.test/b",
                "https://example.test/c"
            ]
        );
        assert_eq!(frontier.visited().len(), 3);
    }

    #[tokio::test]
    async fn test_duplicates_are_not_requeued() {
        let mut frontier = Frontier::new(3, None);
        let url = "https://example.test/page";
        assert_eq!(frontier.offer(url, &origin(), 1).await, Admission::Enqueued);
        assert_eq!(frontier.offer(url, &origin(), 1).await, Admission::Duplicate);
        frontier.pop();
        assert_eq!(frontier.offer(url, &origin(), 2).await, Admission::Duplicate);
        assert!(frontier.is_empty());
    }

    #[tokio::test]
    async fn test_depth_bound() {
        let mut frontier = Frontier::new(1, None);
        assert_eq!(
            frontier.offer("https://example.test/b", &origin(), 1).await,
            Admission::Enqueued
        );
        assert_eq!(
            frontier.offer("https://example.test/c", &origin(), 2).await,
            Admission::Rejected(Rejection::TooDeep)
        );
    }

    #[tokio::test]
    async fn test_scope_is_fail_closed() {
        let mut frontier = Frontier::new(2, None);
        assert_eq!(
            frontier.offer("https://other.test/c", &origin(), 1).await,
            Admission::Rejected(Rejection::OutOfScope)
        );
        assert_eq!(
            frontier.offer("http://example.test/c", &origin(), 1).await,
            Admission::Rejected(Rejection::OutOfScope)
        );
        assert_eq!(
            frontier.offer("::not a url::", &origin(), 1).await,
            Admission::Rejected(Rejection::Invalid)
        );
        assert!(frontier.is_empty());
    }

    #[tokio::test]
    async fn test_robots_rejection_is_remembered() {
        let mut frontier = frontier_with_robots("User-agent: *\nDisallow: /b");
        let b = "https://example.test/b";
        assert_eq!(
            frontier.offer(b, &origin(), 1).await,
            Admission::Rejected(Rejection::Robots)
        );
        assert_eq!(frontier.offer(b, &origin(), 1).await, Admission::Duplicate);
        assert_eq!(
            frontier.offer("https://example.test/ok", &origin(), 1).await,
            Admission::Enqueued
        );
    }
}
