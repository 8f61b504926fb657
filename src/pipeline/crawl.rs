// src/pipeline/crawl.rs

//! Crawl pipeline: seeds to per-page artifacts.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::error::Result;
use crate::models::{Config, CrawlReport, Seed};
use crate::services::CrawlController;
use crate::storage::LocalStorage;
use crate::utils::{Fetcher, HttpFetcher};

/// Crawl from `seeds` and write artifacts, the combined document and the
/// run report into the output directory.
pub async fn run_crawler(
    config: Arc<Config>,
    seeds: &Seed,
    shutdown: Arc<AtomicBool>,
) -> Result<CrawlReport> {
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.crawler)?);
    crawl_with(config, seeds, fetcher, shutdown).await
}

/// Same as [`run_crawler`] with an explicit fetcher.
pub async fn crawl_with(
    config: Arc<Config>,
    seeds: &Seed,
    fetcher: Arc<dyn Fetcher>,
    shutdown: Arc<AtomicBool>,
) -> Result<CrawlReport> {
    seeds.validate()?;
    let storage = LocalStorage::new(&config.output);

    log::info!(
        "Crawling {} seeds (max depth {}, delay {:.1}s) into {}",
        seeds.urls.len(),
        config.crawler.max_depth,
        config.crawler.politeness_delay_seconds,
        storage.root_dir().display()
    );

    let mut controller =
        CrawlController::new(Arc::clone(&config), fetcher)?.with_shutdown(shutdown);
    let outcome = controller.run(seeds, &storage).await?;

    if config.output.combined_document && !outcome.pages.is_empty() {
        if let Err(e) = storage.write_combined(&outcome.pages).await {
            log::error!("Combined document not written: {e}");
        }
    }

    if config.output.report {
        match storage.write_report(&outcome.report).await {
            Ok(path) => log::info!("Crawl report written to {}", path.display()),
            Err(e) => log::error!("Crawl report not written: {e}"),
        }
    }

    Ok(outcome.report)
}
