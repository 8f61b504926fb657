// src/utils/url.rs

//! URL normalization, scope filtering and artifact naming.

use sha2::{Digest, Sha256};
use url::Url;

/// Resolve `href` against `base` and strip the fragment.
///
/// Returns `None` for unparseable references and non-http(s) targets
/// (`mailto:`, `javascript:`, `tel:` ...).
///
/// # Examples
/// ```
/// use corpus_crawler::utils::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/intro").unwrap();
/// let url = normalize(&base, "setup?lang=en#install", true).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs/setup?lang=en");
/// ```
pub fn normalize(base: &Url, href: &str, retain_query: bool) -> Option<Url> {
    let url = base.join(href.trim()).ok()?;
    canonicalize(url, retain_query)
}

/// Parse a seed URL with the same fragment/query policy as discovered links.
pub fn normalize_seed(raw: &str, retain_query: bool) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    canonicalize(url, retain_query)
}

fn canonicalize(mut url: Url, retain_query: bool) -> Option<Url> {
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    if !retain_query {
        url.set_query(None);
    }
    Some(url)
}

/// True iff `url` has the same scheme, host and port as `origin`.
///
/// Unparseable input is out of scope.
pub fn in_scope(url: &str, origin: &str) -> bool {
    match (Url::parse(url), Url::parse(origin)) {
        (Ok(url), Ok(origin)) => same_origin(&url, &origin),
        _ => false,
    }
}

/// Origin comparison on parsed URLs; opaque origins never match.
pub fn same_origin(url: &Url, origin: &Url) -> bool {
    let (a, b) = (url.origin(), origin.origin());
    a.is_tuple() && a == b
}

/// `host[:port]` key used for per-domain state.
pub fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}

/// `path[?query]`, defaulting to `/` when empty.
pub fn path_and_query(url: &Url) -> String {
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    if target.is_empty() {
        target.push('/');
    }
    target
}

const DIGEST_CHARS: usize = 10;

/// Deterministic artifact file stem for a URL.
///
/// The scheme is dropped and every character outside `[A-Za-z0-9-]` becomes
/// `_`. That readable part is cut to fit `max_len` and always suffixed with
/// `_` plus 10 hex chars of the SHA-256 of the full URL, so `/docs`, `/docs/`
/// and `http://` variants get distinct names.
pub fn artifact_stem(url: &str, max_len: usize) -> String {
    let without_scheme = url
        .split_once("://")
        .map_or(url, |(_, rest)| rest);
    let readable: String = without_scheme
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    let suffix = &digest[..DIGEST_CHARS];
    let keep = max_len.saturating_sub(DIGEST_CHARS + 1).min(readable.len());
    let readable = readable[..keep].trim_end_matches('_');
    let readable = if readable.is_empty() { "index" } else { readable };
    format!("{readable}_{suffix}")
}
