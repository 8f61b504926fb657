// src/error.rs

//! Unified error handling for the crawler application.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or empty seed list; nothing may be crawled
    #[error("Startup error: {0}")]
    Startup(String),

    /// Network error, timeout or non-success status for one page
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Artifact could not be decoded with any configured encoding
    #[error("Decode error for {path}: {message}")]
    Decode { path: String, message: String },

    /// Artifact or corpus file could not be written
    #[error("Write error for {path}: {message}")]
    Write { path: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fatal startup error.
    pub fn startup(message: impl Into<String>) -> Self {
        Self::Startup(message.into())
    }

    /// Create a page fetch error.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an artifact decode error.
    pub fn decode(path: &Path, message: impl fmt::Display) -> Self {
        Self::Decode {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create an artifact write error.
    pub fn write(path: &Path, message: impl fmt::Display) -> Self {
        Self::Write {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}
