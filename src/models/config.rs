//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Frontier, fetch and politeness settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Boilerplate removal and main-content detection
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Text preprocessing settings
    #[serde(default)]
    pub cleaning: CleaningConfig,

    /// Per-page artifact settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Corpus deduplication settings
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Input file locations
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.robots_timeout_secs == 0 {
            return Err(AppError::validation(
                "crawler.robots_timeout_secs must be > 0",
            ));
        }
        let delay = self.crawler.politeness_delay_seconds;
        if !delay.is_finite() || delay < 0.0 {
            return Err(AppError::validation(
                "crawler.politeness_delay_seconds must be a non-negative number",
            ));
        }
        if self.crawler.max_pages == Some(0) {
            return Err(AppError::validation("crawler.max_pages must be > 0"));
        }
        if self.extractor.main_content_selectors.is_empty() {
            return Err(AppError::validation(
                "extractor.main_content_selectors is empty",
            ));
        }
        for selector in self
            .extractor
            .boilerplate_selectors
            .iter()
            .chain(&self.extractor.main_content_selectors)
        {
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        if self.output.max_filename_length < 16 {
            return Err(AppError::validation(
                "output.max_filename_length must be >= 16",
            ));
        }
        if self.dedup.encodings.is_empty() {
            return Err(AppError::validation("dedup.encodings is empty"));
        }
        for label in &self.dedup.encodings {
            if encoding_rs::Encoding::for_label(label.as_bytes()).is_none() {
                return Err(AppError::validation(format!(
                    "dedup.encodings contains unknown encoding '{label}'"
                )));
            }
        }
        if self.dedup.max_concurrent_reads == 0 {
            return Err(AppError::validation(
                "dedup.max_concurrent_reads must be > 0",
            ));
        }
        Ok(())
    }

    /// Directory the deduplicator reads artifacts from.
    pub fn dedup_input_dir(&self) -> PathBuf {
        self.dedup
            .input_directory
            .clone()
            .unwrap_or_else(|| self.output.output_directory.clone())
    }
}

/// HTTP client, frontier and politeness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Page request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Shorter timeout for robots.txt requests
    #[serde(default = "defaults::robots_timeout")]
    pub robots_timeout_secs: u64,

    /// Links found on pages at this depth are not followed
    #[serde(default = "defaults::max_depth")]
    pub max_depth: u32,

    /// Wait between the end of one fetch and the start of the next
    #[serde(default = "defaults::politeness_delay")]
    pub politeness_delay_seconds: f64,

    /// Track the politeness interval per domain instead of globally
    #[serde(default)]
    pub per_domain_politeness: bool,

    /// Upper bound on fetched pages
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Keep `?query` on discovered links
    #[serde(default = "defaults::enabled")]
    pub retain_query_string: bool,

    /// Honor robots.txt `Disallow` rules
    #[serde(default = "defaults::enabled")]
    pub respect_robots_txt: bool,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn robots_timeout(&self) -> Duration {
        Duration::from_secs(self.robots_timeout_secs)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.politeness_delay_seconds).unwrap_or_default()
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            robots_timeout_secs: defaults::robots_timeout(),
            max_depth: defaults::max_depth(),
            politeness_delay_seconds: defaults::politeness_delay(),
            per_domain_politeness: false,
            max_pages: None,
            retain_query_string: true,
            respect_robots_txt: true,
        }
    }
}

/// Boilerplate removal and main-content detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Regions removed before any text is read, in order
    #[serde(default = "defaults::boilerplate_selectors")]
    pub boilerplate_selectors: Vec<String>,

    /// Candidate main-content regions; the first match wins
    #[serde(default = "defaults::main_content_selectors")]
    pub main_content_selectors: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            boilerplate_selectors: defaults::boilerplate_selectors(),
            main_content_selectors: defaults::main_content_selectors(),
        }
    }
}

/// Text cleaning/preprocessing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Site chrome labels removed by literal substring match
    #[serde(default = "defaults::boilerplate_phrases")]
    pub boilerplate_phrases: Vec<String>,

    /// Match phrases ignoring case (Unicode simple case folding)
    #[serde(default)]
    pub phrase_case_insensitive: bool,

    /// Text replacements applied after phrase removal, in order
    #[serde(default)]
    pub replacements: Vec<Replacement>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            boilerplate_phrases: defaults::boilerplate_phrases(),
            phrase_case_insensitive: false,
            replacements: Vec::new(),
        }
    }
}

/// A text replacement rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

/// Artifact body layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    /// Title, URL and heading-delimited sections
    #[default]
    Structured,
    /// Boilerplate-stripped page text
    Plain,
}

/// Per-page artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "defaults::output_directory")]
    pub output_directory: PathBuf,

    #[serde(default)]
    pub format: ArtifactFormat,

    #[serde(default = "defaults::artifact_suffix")]
    pub artifact_suffix: String,

    /// Maximum artifact file stem length
    #[serde(default = "defaults::max_filename_length")]
    pub max_filename_length: usize,

    /// Write `combined.md` after a crawl
    #[serde(default = "defaults::enabled")]
    pub combined_document: bool,

    /// Write `crawl_report.json` after a crawl
    #[serde(default = "defaults::enabled")]
    pub report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_directory: defaults::output_directory(),
            format: ArtifactFormat::default(),
            artifact_suffix: defaults::artifact_suffix(),
            max_filename_length: defaults::max_filename_length(),
            combined_document: true,
            report: true,
        }
    }
}

/// Corpus deduplication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Defaults to `output.output_directory`
    #[serde(default)]
    pub input_directory: Option<PathBuf>,

    #[serde(default = "defaults::corpus_file")]
    pub output_file: PathBuf,

    /// Artifact names containing any of these (case-insensitive) are skipped
    #[serde(default = "defaults::excluded_artifact_patterns")]
    pub excluded_artifact_patterns: Vec<String>,

    /// Encoding labels tried in order; the first clean decode wins
    #[serde(default = "defaults::encodings")]
    pub encodings: Vec<String>,

    #[serde(default = "defaults::max_concurrent_reads")]
    pub max_concurrent_reads: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            input_directory: None,
            output_file: defaults::corpus_file(),
            excluded_artifact_patterns: defaults::excluded_artifact_patterns(),
            encodings: defaults::encodings(),
            max_concurrent_reads: defaults::max_concurrent_reads(),
        }
    }
}

/// Input file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// One start URL per line; `#` starts a comment line
    #[serde(default = "defaults::seeds_file")]
    pub seeds_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            seeds_file: defaults::seeds_file(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; corpus-crawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn robots_timeout() -> u64 {
        5
    }
    pub fn max_depth() -> u32 {
        2
    }
    pub fn politeness_delay() -> f64 {
        1.0
    }
    pub fn enabled() -> bool {
        true
    }

    // Extractor defaults
    pub fn boilerplate_selectors() -> Vec<String> {
        [
            "header",
            "footer",
            "nav",
            "aside",
            "script",
            "style",
            "noscript",
            ".sidebar",
            ".navigation",
            ".nav",
            ".search",
            ".breadcrumb",
            ".header",
            ".footer",
            "#header",
            "#footer",
            "#nav",
            "[class*=\"nav\"]",
            "[class*=\"menu\"]",
            "[class*=\"sidebar\"]",
            "[id*=\"nav\"]",
            "[id*=\"menu\"]",
            "[id*=\"sidebar\"]",
            ".search-container",
            ".page-navigation",
            ".table-of-contents",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn main_content_selectors() -> Vec<String> {
        [
            "main",
            "[role=\"main\"]",
            ".main-content",
            "article",
            ".content",
            ".documentation-content",
            ".prose",
            ".markdown-body",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    // Cleaning defaults
    pub fn boilerplate_phrases() -> Vec<String> {
        [
            "Was this page helpful?",
            "On this page",
            "Skip to content",
            "Skip to main content",
            "Search...",
            "Ask AI",
            "Sign in",
            "Responses are generated using AI and may contain mistakes.",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    // Output defaults
    pub fn output_directory() -> PathBuf {
        PathBuf::from("scraped_text")
    }
    pub fn artifact_suffix() -> String {
        ".txt".into()
    }
    pub fn max_filename_length() -> usize {
        200
    }

    // Dedup defaults
    pub fn corpus_file() -> PathBuf {
        PathBuf::from("unique_combined_text.txt")
    }
    pub fn excluded_artifact_patterns() -> Vec<String> {
        [
            ".mp4.txt", "_mp4.txt", ".mov.txt", "_mov.txt", ".avi.txt", "_avi.txt",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn encodings() -> Vec<String> {
        ["utf-8", "shift_jis", "euc-jp"]
            .into_iter()
            .map(String::from)
            .collect()
    }
    pub fn max_concurrent_reads() -> usize {
        8
    }

    // Path defaults
    pub fn seeds_file() -> PathBuf {
        PathBuf::from("data/urls.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_delay() {
        let mut config = Config::default();
        config.crawler.politeness_delay_seconds = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.extractor.boilerplate_selectors.push("[[invalid".to_string());
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn validate_rejects_unknown_encoding() {
        let mut config = Config::default();
        config.dedup.encodings.push("klingon-8".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            max_depth = 1
            politeness_delay_seconds = 0.5

            [output]
            format = "plain"

            [[cleaning.replacements]]
            from = "Welcome"
            to = "ようこそ"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.max_depth, 1);
        assert_eq!(config.crawler.politeness_delay(), Duration::from_millis(500));
        assert!(config.crawler.retain_query_string);
        assert_eq!(config.output.format, ArtifactFormat::Plain);
        assert_eq!(config.cleaning.replacements.len(), 1);
        assert_eq!(config.dedup.encodings, vec!["utf-8", "shift_jis", "euc-jp"]);
        assert_eq!(config.dedup_input_dir(), PathBuf::from("scraped_text"));
    }
}
