// src/utils/http.rs

//! HTTP fetch capability.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Raw response of one fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body using the `Content-Type` charset, falling back to UTF-8.
    pub fn text(&self) -> String {
        let encoding = self
            .headers
            .get("content-type")
            .and_then(|value| charset_label(value))
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        let (text, _, _) = encoding.decode(&self.body);
        text.into_owned()
    }
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// Anything that can retrieve a URL within a timeout.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchResponse>;
}

/// Fetch and treat any non-2xx status like a network error.
pub async fn fetch_ok(fetcher: &dyn Fetcher, url: &Url, timeout: Duration) -> Result<FetchResponse> {
    let response = fetcher.fetch(url, timeout).await?;
    if !response.is_success() {
        return Err(AppError::fetch(url.as_str(), format!("HTTP {}", response.status)));
    }
    Ok(response)
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the configured user agent and default timeout.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AppError::fetch(url.as_str(), e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::fetch(url.as_str(), e))?
            .to_vec();

        Ok(FetchResponse {
            status,
            body,
            headers,
        })
    }
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(content_type: &str, body: Vec<u8>) -> FetchResponse {
        FetchResponse {
            status: 200,
            body,
            headers: HashMap::from([("content-type".to_string(), content_type.to_string())]),
        }
    }

    #[test]
    fn test_charset_label() {
        assert_eq!(
            charset_label("text/html; charset=\"Shift_JIS\""),
            Some("Shift_JIS".to_string())
        );
        assert_eq!(charset_label("text/html"), None);
    }

    #[test]
    fn test_text_uses_declared_charset() {
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("日本語のページ");
        let resp = response("text/html; charset=shift_jis", bytes.into_owned());
        assert_eq!(resp.text(), "日本語のページ");
    }

    #[test]
    fn test_text_defaults_to_utf8() {
        let resp = response("text/html", "héllo".as_bytes().to_vec());
        assert_eq!(resp.text(), "héllo");
    }

    #[tokio::test]
    async fn test_http_fetcher_reads_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/page")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<p>hello</p>")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&CrawlerConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/page", server.url())).unwrap();
        let resp = fetcher.fetch(&url, Duration::from_secs(5)).await.unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.text(), "<p>hello</p>");
        assert!(resp.headers["content-type"].starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_fetch_ok_rejects_non_success() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&CrawlerConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/missing", server.url())).unwrap();
        let err = fetch_ok(&fetcher, &url, Duration::from_secs(5)).await.unwrap_err();

        assert!(matches!(err, AppError::Fetch { .. }));
        assert!(err.to_string().contains("HTTP 404"));
    }
}
