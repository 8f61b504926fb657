// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod crawl;
mod page;
mod seed;

// Re-export all public types
pub use config::{
    ArtifactFormat, CleaningConfig, Config, CrawlerConfig, DedupConfig, ExtractorConfig,
    OutputConfig, PathsConfig, Replacement,
};
pub use crawl::{Admission, CrawlReport, FrontierEntry, Rejection};
pub use page::{PageResult, Section};
pub use seed::Seed;
