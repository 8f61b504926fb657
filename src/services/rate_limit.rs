// src/services/rate_limit.rs

//! Politeness delay between fetches.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Source of time for the rate limiter.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep_until(&self, deadline: Instant);
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, deadline: Instant) {
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
    }
}

const GLOBAL_KEY: &str = "*";

/// Enforces a minimum gap between the end of one fetch and the start of the
/// next, either globally or per domain.
pub struct RateLimiter {
    delay: Duration,
    per_domain: bool,
    last_release: HashMap<String, Instant>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(delay: Duration, per_domain: bool, clock: Arc<dyn Clock>) -> Self {
        Self {
            delay,
            per_domain,
            last_release: HashMap::new(),
            clock,
        }
    }

    fn key<'a>(&self, domain: &'a str) -> &'a str {
        if self.per_domain { domain } else { GLOBAL_KEY }
    }

    /// Earliest instant a fetch to `domain` may start; `None` when no fetch
    /// has completed yet under that key.
    pub fn next_allowed_time(&self, domain: &str) -> Option<Instant> {
        self.last_release
            .get(self.key(domain))
            .map(|last| *last + self.delay)
    }

    /// Wait until a fetch to `domain` is allowed.
    pub async fn acquire(&self, domain: &str) {
        if let Some(deadline) = self.next_allowed_time(domain) {
            if deadline > self.clock.now() {
                log::debug!("Politeness wait before fetching from {domain}");
                self.clock.sleep_until(deadline).await;
            }
        }
    }

    /// Record that a fetch to `domain` finished, whatever its outcome.
    pub fn release(&mut self, domain: &str) {
        let key = self.key(domain).to_string();
        self.last_release.insert(key, self.clock.now());
    }
}
