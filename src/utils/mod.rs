//! Utility functions and helpers.

pub mod fs;
pub mod http;
pub mod url;

pub use self::http::{FetchResponse, Fetcher, HttpFetcher, fetch_ok};
