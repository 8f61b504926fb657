//! Local filesystem storage implementation.
//!
//! Artifacts are written atomically (temp file, then rename) so a crash never
//! leaves a half-written page behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{ArtifactFormat, CrawlReport, OutputConfig, PageResult};
use crate::storage::PageSink;
use crate::utils::fs::write_atomic;
use crate::utils::url::artifact_stem;

/// File name of the combined document.
pub const COMBINED_FILE: &str = "combined.md";
/// File name of the run report.
pub const REPORT_FILE: &str = "crawl_report.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    format: ArtifactFormat,
    suffix: String,
    max_filename_length: usize,
}

impl LocalStorage {
    /// Create a LocalStorage rooted at the configured output directory.
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            root_dir: config.output_directory.clone(),
            format: config.format,
            suffix: config.artifact_suffix.clone(),
            max_filename_length: config.max_filename_length,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Artifact path for a page URL.
    pub fn artifact_path(&self, url: &str) -> PathBuf {
        let stem = artifact_stem(url, self.max_filename_length);
        self.root_dir.join(format!("{stem}{}", self.suffix))
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        write_atomic(path, &bytes).await
    }

    fn render(&self, page: &PageResult) -> String {
        match self.format {
            ArtifactFormat::Structured => page.render_structured(),
            ArtifactFormat::Plain => page.render_plain(),
        }
    }

    /// Write every page into one Markdown document with a table of contents.
    pub async fn write_combined(&self, pages: &[PageResult]) -> Result<PathBuf> {
        let path = self.root_dir.join(COMBINED_FILE);
        let mut slugs = SlugRegistry::default();

        let mut out = String::from("# Combined Documentation\n\n## Table of Contents\n\n");
        for (i, page) in pages.iter().enumerate() {
            let title = page.display_title();
            out.push_str(&format!("{}. [{}](#{})\n", i + 1, title, slugs.next(title)));
        }
        out.push_str("\n---\n\n");

        for page in pages {
            out.push_str(&page.render_structured());
            out.push_str("---\n\n");
        }

        write_atomic(&path, out.as_bytes())
            .await
            .map_err(|e| AppError::write(&path, e))?;
        log::info!("Combined document: {} pages written to {}", pages.len(), path.display());
        Ok(path)
    }

    /// Write the run report as pretty JSON.
    pub async fn write_report(&self, report: &CrawlReport) -> Result<PathBuf> {
        let path = self.root_dir.join(REPORT_FILE);
        Self::write_json(&path, report)
            .await
            .map_err(|e| AppError::write(&path, e))?;
        Ok(path)
    }
}

#[async_trait]
impl PageSink for LocalStorage {
    async fn persist(&self, page: &PageResult) -> Result<String> {
        let path = self.artifact_path(&page.url);
        write_atomic(&path, self.render(page).as_bytes())
            .await
            .map_err(|e| AppError::write(&path, e))?;
        Ok(path.display().to_string())
    }
}

/// Markdown heading anchors, numbered on repeats.
#[derive(Default)]
struct SlugRegistry {
    seen: HashMap<String, usize>,
}

impl SlugRegistry {
    fn next(&mut self, heading: &str) -> String {
        let base: String = heading
            .trim()
            .to_lowercase()
            .chars()
            .filter_map(|c| match c {
                ' ' => Some('-'),
                c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
                _ => None,
            })
            .collect();
        let count = self.seen.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        slug
    }
}
