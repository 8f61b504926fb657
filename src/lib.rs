// src/lib.rs

//! Corpus Crawler Library
//!
//! Scoped breadth-first crawling, structured text extraction and line-level
//! corpus deduplication.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
