//! Page snapshot: everything the pipeline knows about the inspected page.
//!
//! There is no live DOM here — the snapshot is the page's serialized markup
//! plus, optionally, a window-state JSON dump the user captured from the
//! browser console. Detection and collection both operate on this value
//! and nothing else.

use crate::http::HttpClient;
use anyhow::{bail, Context, Result};
use serde_json::Value;
use url::Url;

/// A captured view of one page, immutable once built.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// The URL the snapshot was taken from (after redirects).
    pub url: String,
    /// Scheme + host (+ port), used to resolve relative asset paths.
    pub origin: String,
    /// Bare hostname, used as the archive's site name.
    pub host: String,
    /// Full serialized markup.
    pub html: String,
    /// Optional window-state dump (arbitrary JSON object graph).
    pub state: Option<Value>,
}

impl PageSnapshot {
    /// Fetch `target_url` and build a snapshot from the response.
    ///
    /// A non-success status for the page itself is fatal — unlike asset
    /// fetches, there is nothing to extract without the page.
    pub async fn capture(
        client: &HttpClient,
        target_url: &str,
        timeout_ms: u64,
        state: Option<Value>,
    ) -> Result<Self> {
        let parsed = Url::parse(target_url)
            .with_context(|| format!("invalid target URL: {target_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("unsupported URL scheme: {}", parsed.scheme());
        }

        let resp = client
            .get(target_url, timeout_ms)
            .await
            .with_context(|| format!("failed to fetch {target_url}"))?;
        if !resp.is_success() {
            bail!("page returned HTTP {}", resp.status);
        }

        // Redirects may have moved us; resolve assets against where we landed.
        let final_url = Url::parse(&resp.final_url).unwrap_or(parsed);
        Ok(Self::from_parts(&final_url, resp.body, state))
    }

    /// Build a snapshot from already-available parts (tests, offline HTML).
    pub fn from_parts(url: &Url, html: String, state: Option<Value>) -> Self {
        let origin = origin_of(url);
        let host = url.host_str().unwrap_or_default().to_string();
        Self {
            url: url.to_string(),
            origin,
            host,
            html,
            state,
        }
    }
}

/// Scheme + host (+ non-default port) of a URL, without trailing slash.
fn origin_of(url: &Url) -> String {
    let mut origin = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        origin.push_str(&format!(":{port}"));
    }
    origin
}
