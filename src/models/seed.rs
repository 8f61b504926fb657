//! Seed URL list.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Ordered list of start URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub urls: Vec<String>,
}

impl Seed {
    /// Parse one URL per line, skipping blank and `#` comment lines.
    pub fn parse(content: &str) -> Self {
        let urls = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();
        Self { urls }
    }

    /// Load and validate a seed file. A missing or empty list is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::startup(format!("cannot read seed file {}: {e}", path.display()))
        })?;
        let seed = Self::parse(&content);
        seed.validate()
            .map_err(|_| AppError::startup(format!("no seed URLs in {}", path.display())))?;
        Ok(seed)
    }

    /// Validate that at least one URL is present.
    pub fn validate(&self) -> Result<()> {
        if self.urls.is_empty() {
            return Err(AppError::startup("seed list is empty"));
        }
        Ok(())
    }
}
