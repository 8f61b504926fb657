// src/pipeline/validate.rs

use std::path::Path;

use crate::error::Result;
use crate::models::{Config, Seed};
use crate::utils::url::normalize_seed;

/// Validate configuration and the seed list, logging a summary.
pub fn run_validate(config: &Config, seeds_path: &Path) -> Result<Seed> {
    config.validate()?;
    log::info!("✓ Config OK");
    log::info!("  User agent: {}", config.crawler.user_agent);
    log::info!(
        "  Max depth: {}, politeness delay: {}s, max pages: {}",
        config.crawler.max_depth,
        config.crawler.politeness_delay_seconds,
        config
            .crawler
            .max_pages
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
    );
    log::info!("  Output directory: {}", config.output.output_directory.display());

    let seeds = Seed::load(seeds_path)?;
    let invalid: Vec<&String> = seeds
        .urls
        .iter()
        .filter(|raw| normalize_seed(raw, config.crawler.retain_query_string).is_none())
        .collect();
    for raw in &invalid {
        log::warn!("  Invalid seed URL will be skipped: {raw}");
    }
    log::info!(
        "✓ Seeds OK: {} URLs ({} invalid) from {}",
        seeds.urls.len(),
        invalid.len(),
        seeds_path.display()
    );

    Ok(seeds)
}
