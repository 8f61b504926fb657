//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: Crawl seed URLs into per-page artifacts
//! - `run_dedup`: Merge artifacts into one deduplicated corpus
//! - `run_pipeline`: Crawl, then dedup
//! - `run_validate`: Check configuration and seeds

pub mod crawl;
pub mod dedup;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod validate;

pub use crawl::{crawl_with, run_crawler};
pub use dedup::run_dedup;
pub use pipeline::run_pipeline;
pub use validate::run_validate;
