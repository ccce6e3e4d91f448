//! reqwest-backed `request` object.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use tracing::{debug, warn};

use super::types::{FetchOptions, FetchResponse, HttpError, HttpMethod};

/// Default timeout for a single fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client handed to scripts as `request`.
#[derive(Debug, Clone)]
pub struct Request {
    client: reqwest::Client,
}

impl Request {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("failed to build HTTP client ({e}); using defaults");
                reqwest::Client::new()
            });
        Self { client }
    }

    /// Perform a request.
    ///
    /// An unknown method is an error. Anything that goes wrong on the wire
    /// (bad URL, refused connection, timeout, unreadable body) comes back as
    /// a degraded response with `status == 0`.
    pub async fn fetch_async(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<FetchResponse, HttpError> {
        let method = match options.method.as_deref() {
            Some(m) => m.parse::<HttpMethod>()?,
            None => HttpMethod::Get,
        };

        let mut builder = self.client.request(method.into(), url);
        let has_content_type =
            options.headers.keys().any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if method != HttpMethod::Get {
            if let Some(body) = options.body {
                let text = body.to_string();
                if !has_content_type {
                    builder = builder.header(CONTENT_TYPE, "application/json");
                }
                builder = builder.body(text);
            }
        }

        debug!(%method, url, "fetch");
        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(%method, url, "fetch failed: {e}");
                return Ok(FetchResponse::degraded(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let headers = flatten_headers(response.headers());
        match response.text().await {
            Ok(body) => {
                debug!(%method, url, status, "fetch completed");
                Ok(FetchResponse::completed(status, headers, body))
            }
            Err(e) => {
                warn!(%method, url, status, "failed to read response body: {e}");
                Ok(FetchResponse::degraded(e.to_string()))
            }
        }
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// Collapse a header map into name → value, joining repeats with `, `.
fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}
