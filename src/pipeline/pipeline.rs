// src/pipeline/pipeline.rs

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::error::Result;
use crate::models::{Config, Seed};

use super::crawl::run_crawler;
use super::dedup::run_dedup;

/// Run the full pipeline: crawl, then dedup the artifacts just written.
pub async fn run_pipeline(
    config: Arc<Config>,
    seeds: &Seed,
    shutdown: Arc<AtomicBool>,
    corpus: &Path,
) -> Result<()> {
    log::info!("Step 1/2: Crawl - Fetching pages");
    let report = run_crawler(Arc::clone(&config), seeds, shutdown).await?;

    if report.pages_persisted == 0 {
        log::warn!("Crawl persisted no pages; dedup will only see earlier artifacts");
    }

    log::info!("Step 2/2: Dedup - Merging artifacts");
    run_dedup(&config, &config.output.output_directory, corpus).await?;

    log::info!("Pipeline complete!");
    Ok(())
}
