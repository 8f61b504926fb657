//! In-memory collaborators shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use url::Url;

use crate::error::Result;
use crate::models::PageResult;
use crate::services::rate_limit::Clock;
use crate::storage::PageSink;
use crate::utils::http::{FetchResponse, Fetcher};

/// Serves canned responses and records every requested URL.
///
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct StaticFetcher {
    responses: HashMap<String, FetchResponse>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResponse {
                status: 200,
                body: body.as_bytes().to_vec(),
                headers: HashMap::from([(
                    "content-type".to_string(),
                    "text/html; charset=utf-8".to_string(),
                )]),
            },
        );
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResponse {
                status,
                ..FetchResponse::default()
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| *u == url).count()
    }

    /// Requests other than robots.txt.
    pub fn page_requests(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|u| !u.ends_with("/robots.txt"))
            .collect()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &Url, _timeout: Duration) -> Result<FetchResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        Ok(self
            .responses
            .get(url.as_str())
            .cloned()
            .unwrap_or(FetchResponse {
                status: 404,
                ..FetchResponse::default()
            }))
    }
}

/// Clock that advances only when slept on.
pub struct ManualClock {
    start: Instant,
    state: Mutex<(Duration, Vec<Duration>)>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            state: Mutex::new((Duration::ZERO, Vec::new())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.state.lock().unwrap().0 += by;
    }

    /// Every wait requested through `sleep_until`, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().unwrap().1.clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.state.lock().unwrap().0
    }

    async fn sleep_until(&self, deadline: Instant) {
        let mut state = self.state.lock().unwrap();
        let now = self.start + state.0;
        if deadline > now {
            let wait = deadline - now;
            state.0 += wait;
            state.1.push(wait);
        }
    }
}

/// Collects persisted pages in memory; URLs listed in `failing` error out.
#[derive(Default)]
pub struct MemorySink {
    pub pages: Mutex<Vec<PageResult>>,
    pub failing: Vec<String>,
}

#[async_trait]
impl PageSink for MemorySink {
    async fn persist(&self, page: &PageResult) -> Result<String> {
        if self.failing.contains(&page.url) {
            return Err(crate::error::AppError::write(
                std::path::Path::new(&page.url),
                "simulated failure",
            ));
        }
        self.pages.lock().unwrap().push(page.clone());
        Ok(format!("memory://{}", page.url))
    }
}
