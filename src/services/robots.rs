// src/services/robots.rs

//! Per-domain robots.txt `Disallow` rules.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use url::Url;

use crate::utils::http::{Fetcher, fetch_ok};
use crate::utils::url::{authority, path_and_query};

/// Compiled `Disallow` patterns for one domain.
///
/// `User-agent` groups are not distinguished: every `Disallow` line applies.
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    patterns: Vec<Regex>,
}

impl RobotsRules {
    /// Parse a robots.txt body.
    ///
    /// Directive names are case-insensitive. `*` matches any substring and a
    /// `$` anchors the end of the path. Patterns that fail to compile are
    /// skipped.
    pub fn parse(body: &str) -> Self {
        let patterns = body
            .lines()
            .filter_map(|line| {
                let line = line.split('#').next().unwrap_or_default().trim();
                let (directive, value) = line.split_once(':')?;
                if !directive.trim().eq_ignore_ascii_case("disallow") {
                    return None;
                }
                let value = value.trim();
                (!value.is_empty()).then_some(value)
            })
            .filter_map(|pattern| match compile_pattern(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!("Ignoring robots pattern '{pattern}': {e}");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Match `path[?query]` against every pattern as a prefix.
    pub fn is_allowed(&self, target: &str) -> bool {
        !self.patterns.iter().any(|re| re.is_match(target))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let escaped = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\$", "$");
    Regex::new(&format!("^{escaped}"))
}

/// Lazily loaded robots rules keyed by `host[:port]`.
///
/// Each domain is fetched at most once per run. Any failure is treated as
/// "nothing disallowed" for that domain.
pub struct RobotsPolicyStore {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    cache: HashMap<String, RobotsRules>,
}

impl RobotsPolicyStore {
    pub fn new(fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        Self {
            fetcher,
            timeout,
            cache: HashMap::new(),
        }
    }

    /// Fetch and parse `{scheme}://{host[:port]}/robots.txt`.
    pub async fn load(&self, url: &Url) -> RobotsRules {
        let robots_url = match url.join("/robots.txt") {
            Ok(robots_url) => robots_url,
            Err(e) => {
                log::warn!("Robots policy unavailable for {url}: {e}");
                return RobotsRules::default();
            }
        };

        match fetch_ok(self.fetcher.as_ref(), &robots_url, self.timeout).await {
            Ok(response) => {
                let rules = RobotsRules::parse(&response.text());
                log::debug!("Loaded {} disallow rules from {robots_url}", rules.len());
                rules
            }
            Err(e) => {
                log::warn!("Robots policy unavailable, allowing all: {e}");
                RobotsRules::default()
            }
        }
    }

    /// Whether `url` may be fetched, loading its domain's rules on first use.
    pub async fn is_allowed(&mut self, url: &Url) -> bool {
        let Some(domain) = authority(url) else {
            return true;
        };
        if !self.cache.contains_key(&domain) {
            let rules = self.load(url).await;
            self.cache.insert(domain.clone(), rules);
        }
        self.cache
            .get(&domain)
            .is_none_or(|rules| rules.is_allowed(&path_and_query(url)))
    }

    /// Rules already loaded for a `host[:port]` key.
    pub fn rules_for(&self, domain: &str) -> Option<&RobotsRules> {
        self.cache.get(domain)
    }
}
