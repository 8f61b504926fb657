// src/services/crawler.rs

//! Breadth-first crawl loop: fetch, extract, persist, admit links.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Admission, Config, CrawlReport, PageResult, Rejection, Seed};
use crate::services::extractor::ContentExtractor;
use crate::services::frontier::Frontier;
use crate::services::rate_limit::{Clock, RateLimiter, TokioClock};
use crate::services::robots::RobotsPolicyStore;
use crate::storage::PageSink;
use crate::utils::http::{Fetcher, fetch_ok};
use crate::utils::url::{authority, normalize_seed};

/// Pages persisted by a run and its statistics.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub pages: Vec<PageResult>,
    pub report: CrawlReport,
}

/// Owns all mutable state of one crawl run.
pub struct CrawlController {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetcher>,
    frontier: Frontier,
    limiter: RateLimiter,
    extractor: ContentExtractor,
    shutdown: Arc<AtomicBool>,
}

impl CrawlController {
    /// Create a controller using the wall clock.
    pub fn new(config: Arc<Config>, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        Self::with_clock(config, fetcher, Arc::new(TokioClock))
    }

    /// Create a controller with an explicit clock for politeness waits.
    pub fn with_clock(
        config: Arc<Config>,
        fetcher: Arc<dyn Fetcher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let crawler = &config.crawler;
        let robots = crawler.respect_robots_txt.then(|| {
            RobotsPolicyStore::new(Arc::clone(&fetcher), crawler.robots_timeout())
        });

        Ok(Self {
            frontier: Frontier::new(crawler.max_depth, robots),
            limiter: RateLimiter::new(
                crawler.politeness_delay(),
                crawler.per_domain_politeness,
                clock,
            ),
            extractor: ContentExtractor::new(&config)?,
            shutdown: Arc::new(AtomicBool::new(false)),
            fetcher,
            config,
        })
    }

    /// Use an externally owned shutdown flag.
    pub fn with_shutdown(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Flag that stops the run before the next dequeue once set.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Crawl from `seeds` until the frontier drains, the page budget is spent,
    /// or shutdown is requested.
    pub async fn run(&mut self, seeds: &Seed, sink: &dyn PageSink) -> Result<CrawlOutcome> {
        if seeds.urls.is_empty() {
            return Err(AppError::startup("no seed URLs to crawl"));
        }

        let mut report = CrawlReport::new(seeds.urls.clone());
        let mut pages = Vec::new();

        self.admit_seeds(seeds, &mut report).await;
        if self.frontier.is_empty() {
            log::warn!("No seed URL was admitted; nothing to crawl");
        }

        let max_pages = self.config.crawler.max_pages;
        let timeout = self.config.crawler.timeout();

        while !self.frontier.is_empty() {
            if self.shutdown.load(Ordering::SeqCst) {
                log::warn!(
                    "Shutdown requested; {} URLs left in the frontier",
                    self.frontier.pending()
                );
                report.stopped_early = true;
                break;
            }
            if max_pages.is_some_and(|max| report.pages_fetched >= max) {
                log::info!(
                    "Page budget of {} reached; {} URLs left in the frontier",
                    report.pages_fetched,
                    self.frontier.pending()
                );
                report.stopped_early = true;
                break;
            }

            let Some(entry) = self.frontier.pop() else {
                break;
            };
            let url = match Url::parse(&entry.url) {
                Ok(url) => url,
                Err(e) => {
                    log::warn!("Skipping unparseable frontier entry {}: {e}", entry.url);
                    continue;
                }
            };
            let domain = authority(&url).unwrap_or_default();

            self.limiter.acquire(&domain).await;
            log::info!("Fetching {} (depth {})", url, entry.depth);
            let fetched = fetch_ok(self.fetcher.as_ref(), &url, timeout).await;
            self.limiter.release(&domain);
            report.pages_fetched += 1;

            let response = match fetched {
                Ok(response) => response,
                Err(e) => {
                    report.fetch_failures += 1;
                    log::warn!("Page fetch failed: {e}");
                    continue;
                }
            };

            let page = self.extractor.extract(&response.text(), &url);
            if page.is_empty() {
                report.empty_pages += 1;
                log::info!("No content extracted from {url}; not persisted");
                continue;
            }

            let persisted = match sink.persist(&page).await {
                Ok(location) => {
                    report.pages_persisted += 1;
                    log::info!("Saved {} sections from {url} to {location}", page.sections.len());
                    true
                }
                Err(e) => {
                    report.write_failures += 1;
                    log::error!("Artifact write failed: {e}");
                    false
                }
            };

            let next_depth = entry.depth + 1;
            let mut enqueued = 0;
            for link in &page.discovered_links {
                match self.frontier.offer(link, &url, next_depth).await {
                    Admission::Enqueued => enqueued += 1,
                    Admission::Duplicate => {}
                    Admission::Rejected(reason) => {
                        log::debug!("Rejected {link}: {reason}");
                        report.record_rejection(reason);
                    }
                }
            }
            if enqueued > 0 {
                log::debug!("Enqueued {enqueued} links from {url}");
            }

            if persisted {
                pages.push(page);
            }
        }

        report.finished_at = Utc::now();
        report.visited = self.frontier.visited().iter().cloned().collect();
        log::info!(
            "Crawl finished: {} fetched, {} persisted, {} failed, {} rejected",
            report.pages_fetched,
            report.pages_persisted,
            report.fetch_failures,
            report.rejected_total()
        );

        Ok(CrawlOutcome { pages, report })
    }

    /// Seeds enter at depth 0, each scoped to its own origin.
    async fn admit_seeds(&mut self, seeds: &Seed, report: &mut CrawlReport) {
        let retain_query = self.config.crawler.retain_query_string;
        for raw in &seeds.urls {
            let Some(seed) = normalize_seed(raw, retain_query) else {
                log::warn!("Skipping invalid seed URL: {raw}");
                report.record_rejection(Rejection::Invalid);
                continue;
            };
            match self.frontier.offer(seed.as_str(), &seed, 0).await {
                Admission::Enqueued => log::debug!("Seed admitted: {seed}"),
                Admission::Duplicate => log::debug!("Duplicate seed skipped: {seed}"),
                Admission::Rejected(reason) => {
                    log::warn!("Seed {seed} rejected: {reason}");
                    report.record_rejection(reason);
                }
            }
        }
    }
}
