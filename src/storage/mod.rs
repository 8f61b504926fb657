//! Storage abstractions for page artifacts.
//!
//! ## Directory Structure
//!
//! ```text
//! scraped_text/
//! ├── example_com_docs_intro.txt   # One artifact per persisted page
//! ├── example_com_docs_setup.txt
//! ├── combined.md                  # All pages with a table of contents
//! └── crawl_report.json            # Run statistics
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::PageResult;

// Re-export for convenience
pub use local::LocalStorage;

/// Destination for extracted pages.
#[async_trait]
pub trait PageSink: Send + Sync {
    /// Persist one page and return where it was written.
    async fn persist(&self, page: &PageResult) -> Result<String>;
}
