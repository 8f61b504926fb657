//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Crawl control (`CrawlController`, `Frontier`, `RateLimiter`)
//! - Robots.txt policy (`RobotsPolicyStore`)
//! - Content extraction (`ContentExtractor`, `TextCleaner`)
//! - Corpus deduplication (`CorpusDeduplicator`)

pub mod cleaner;
pub mod crawler;
pub mod dedup;
pub mod dom;
pub mod extractor;
pub mod frontier;
pub mod rate_limit;
pub mod robots;

pub use cleaner::TextCleaner;
pub use crawler::{CrawlController, CrawlOutcome};
pub use dedup::CorpusDeduplicator;
pub use dom::PrunableDocument;
pub use extractor::{ContentExtractor, collapse_sections};
pub use frontier::Frontier;
pub use rate_limit::{Clock, RateLimiter, TokioClock};
pub use robots::{RobotsPolicyStore, RobotsRules};
