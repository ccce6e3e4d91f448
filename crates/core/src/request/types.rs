//! Request and response types for `request.fetchAsync`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Error type for fetch calls. Transport failures are not errors; they
/// produce a degraded [`FetchResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),
}

impl HttpError {
    /// Name of the error kind as shown to scripts.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidMethod(_) => "InvalidMethodError",
        }
    }
}

/// Standard HTTP verbs accepted by `fetchAsync`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(HttpError::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(value: HttpMethod) -> Self {
        match value {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Delete => Self::DELETE,
            HttpMethod::Head => Self::HEAD,
            HttpMethod::Options => Self::OPTIONS,
        }
    }
}

/// Options for a fetch call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    /// Verb name; GET when absent.
    pub method: Option<String>,
    pub headers: BTreeMap<String, String>,
    /// Body serialized as JSON text, only sent for non-GET requests.
    pub body: Option<Value>,
}

/// Result of a fetch call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResponse {
    /// HTTP status, or 0 when the request never completed.
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub success: bool,
    /// Body parsed as JSON; absent when the body is not valid JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
    /// Transport failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchResponse {
    /// Build a response from a completed exchange.
    pub fn completed(status: u16, headers: BTreeMap<String, String>, body: String) -> Self {
        let json = serde_json::from_str(&body).ok();
        Self {
            status,
            headers,
            body,
            success: (200..300).contains(&status),
            json,
            error: None,
        }
    }

    /// Response used when the request failed before a status was received.
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            status: 0,
            headers: BTreeMap::new(),
            body: String::new(),
            success: false,
            json: None,
            error: Some(error.into()),
        }
    }

    /// The parsed JSON body, if any.
    pub async fn json_async(&self) -> Option<Value> {
        self.json.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("get", HttpMethod::Get)]
    #[case("POST", HttpMethod::Post)]
    #[case(" Patch ", HttpMethod::Patch)]
    #[case("options", HttpMethod::Options)]
    fn test_method_from_str(#[case] input: &str, #[case] expected: HttpMethod) {
        assert_eq!(input.parse::<HttpMethod>().unwrap(), expected);
    }

    #[test]
    fn test_method_rejects_unknown() {
        let err = "FETCH".parse::<HttpMethod>().unwrap_err();
        assert_eq!(err, HttpError::InvalidMethod("FETCH".into()));
        assert_eq!(err.kind(), "InvalidMethodError");
    }

    #[test]
    fn test_completed_parses_json() {
        let resp = FetchResponse::completed(200, BTreeMap::new(), r#"{"ok":true}"#.into());
        assert!(resp.success);
        assert_eq!(resp.json, Some(json!({"ok": true})));
    }

    #[test]
    fn test_completed_malformed_json_is_absent() {
        let resp = FetchResponse::completed(500, BTreeMap::new(), "{not json".into());
        assert!(!resp.success);
        assert!(resp.json.is_none());
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn test_degraded_has_no_json() {
        let resp = FetchResponse::degraded("connection refused");
        assert_eq!(resp.status, 0);
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("connection refused"));
        assert!(resp.json_async().await.is_none());
    }
}
