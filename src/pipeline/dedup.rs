// src/pipeline/dedup.rs

//! Dedup pipeline: artifacts to one sorted corpus file.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::CorpusDeduplicator;

/// Merge the artifacts in `input` into `output`. Returns the line count.
///
/// Finding no readable line at all is an error, as is failing to write the
/// corpus file.
pub async fn run_dedup(config: &Config, input: &Path, output: &Path) -> Result<usize> {
    let dedup = CorpusDeduplicator::new(config)?;
    let lines = dedup
        .merge(input, &config.dedup.excluded_artifact_patterns)
        .await?;

    if lines.is_empty() {
        return Err(AppError::validation(format!(
            "no readable lines in artifacts under {}",
            input.display()
        )));
    }

    dedup.write(&lines, output).await?;
    log::info!("Wrote {} unique lines to {}", lines.len(), output.display());
    Ok(lines.len())
}
