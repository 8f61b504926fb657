// src/services/cleaner.rs

//! Text cleaning applied to every extracted string.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{CleaningConfig, Replacement};

static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("hardcoded regex pattern is valid"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("hardcoded regex pattern is valid"));

/// Whitespace normalization plus the configured substitution table.
///
/// Boilerplate phrases are substitutions to the empty string and run before
/// the configured replacements.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    substitutions: Vec<(Regex, String)>,
}

impl TextCleaner {
    pub fn new(config: &CleaningConfig) -> Result<Self> {
        let phrases = config
            .boilerplate_phrases
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| (p.as_str(), "", config.phrase_case_insensitive));
        let replacements = config
            .replacements
            .iter()
            .filter(|r| !r.from.is_empty())
            .map(|Replacement { from, to }| (from.as_str(), to.as_str(), false));

        let substitutions = phrases
            .chain(replacements)
            .map(|(from, to, case_insensitive)| {
                let pattern = if case_insensitive {
                    format!("(?i){}", regex::escape(from))
                } else {
                    regex::escape(from)
                };
                Regex::new(&pattern)
                    .map(|re| (re, to.to_string()))
                    .map_err(|e| AppError::config(format!("bad cleaning pattern '{from}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { substitutions })
    }

    /// Clean a single block: collapse all whitespace to single spaces and strip
    /// boilerplate phrases.
    pub fn clean(&self, text: &str) -> String {
        let text = Self::normalize_whitespace(text);
        let text = self.substitute(&text);
        Self::normalize_whitespace(&text)
    }

    /// Clean full-page text while keeping line structure.
    ///
    /// Each line is whitespace-normalized and stripped of boilerplate; runs of
    /// three or more newlines become exactly two.
    pub fn clean_page_text(&self, text: &str) -> String {
        let lines: Vec<String> = text
            .lines()
            .map(|line| {
                let line = HORIZONTAL_SPACE.replace_all(line, " ");
                let line = self.substitute(line.trim());
                line.trim().to_string()
            })
            .collect();
        let joined = lines.join("\n");
        BLANK_RUNS.replace_all(&joined, "\n\n").trim().to_string()
    }

    fn substitute(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (pattern, to) in &self.substitutions {
            if pattern.is_match(&result) {
                result = pattern.replace_all(&result, to.as_str()).into_owned();
            }
        }
        result
    }

    fn normalize_whitespace(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
