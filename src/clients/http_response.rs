//! HTTP response types for the MoySklad API client.
//!
//! This module provides the [`HttpResponse`] type along with the parsed
//! rate limit headers the service attaches to every response.

use std::collections::HashMap;
use std::time::Duration;

/// Rate limit information parsed from the `X-RateLimit-*` headers.
///
/// # Example
///
/// ```rust
/// use moysklad_api::clients::RateLimit;
///
/// let limit = RateLimit::parse("45", "44").unwrap();
/// assert_eq!(limit.limit, 45);
/// assert_eq!(limit.remaining, 44);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed in the current window (`X-RateLimit-Limit`).
    pub limit: u32,
    /// Requests left in the current window (`X-RateLimit-Remaining`).
    pub remaining: u32,
}

impl RateLimit {
    /// Parses the limit and remaining header values.
    ///
    /// Returns `None` if either value is not a non-negative integer.
    #[must_use]
    pub fn parse(limit: &str, remaining: &str) -> Option<Self> {
        Some(Self {
            limit: limit.trim().parse().ok()?,
            remaining: remaining.trim().parse().ok()?,
        })
    }
}

/// An HTTP response from the MoySklad API.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers keyed by lower-cased name.
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body; `null` for an empty body.
    pub body: serde_json::Value,
    /// Rate limit information (from `X-RateLimit-Limit`/`X-RateLimit-Remaining`).
    pub rate_limit: Option<RateLimit>,
    /// How long to wait before retrying (from `X-Lognex-Retry-After`, in ms).
    pub retry_after: Option<Duration>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`, parsing the rate limit headers.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: serde_json::Value) -> Self {
        let first = |name: &str| {
            headers
                .get(name)
                .and_then(|values| values.first())
                .map(String::as_str)
        };

        let rate_limit = match (first("x-ratelimit-limit"), first("x-ratelimit-remaining")) {
            (Some(limit), Some(remaining)) => RateLimit::parse(limit, remaining),
            _ => None,
        };

        let retry_after = first("x-lognex-retry-after")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_millis);

        Self {
            code,
            headers,
            body,
            rate_limit,
            retry_after,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns `true` for responses worth retrying (429 and 5xx).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.code == 429 || self.code >= 500
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get("x-request-id")
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), vec![(*v).to_string()]))
            .collect()
    }

    #[test]
    fn test_is_ok_returns_true_for_2xx() {
        for code in 200..=299 {
            let response = HttpResponse::new(code, HashMap::new(), json!({}));
            assert!(response.is_ok(), "Expected is_ok() to be true for code {code}");
        }
    }

    #[test]
    fn test_retryable_codes() {
        assert!(HttpResponse::new(429, HashMap::new(), json!(null)).is_retryable());
        assert!(HttpResponse::new(500, HashMap::new(), json!(null)).is_retryable());
        assert!(HttpResponse::new(503, HashMap::new(), json!(null)).is_retryable());
        assert!(!HttpResponse::new(404, HashMap::new(), json!(null)).is_retryable());
        assert!(!HttpResponse::new(412, HashMap::new(), json!(null)).is_retryable());
    }

    #[test]
    fn test_rate_limit_parsing() {
        let response = HttpResponse::new(
            200,
            headers(&[("x-ratelimit-limit", "45"), ("x-ratelimit-remaining", "12")]),
            json!({}),
        );
        assert_eq!(
            response.rate_limit,
            Some(RateLimit {
                limit: 45,
                remaining: 12
            })
        );

        assert!(RateLimit::parse("abc", "1").is_none());
        assert!(RateLimit::parse("45", "").is_none());
    }

    #[test]
    fn test_rate_limit_requires_both_headers() {
        let response = HttpResponse::new(200, headers(&[("x-ratelimit-limit", "45")]), json!({}));
        assert!(response.rate_limit.is_none());
    }

    #[test]
    fn test_retry_after_is_in_milliseconds() {
        let response = HttpResponse::new(429, headers(&[("x-lognex-retry-after", "1500")]), json!({}));
        assert_eq!(response.retry_after, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_request_id_extraction() {
        let response = HttpResponse::new(200, headers(&[("x-request-id", "abc-123")]), json!({}));
        assert_eq!(response.request_id(), Some("abc-123"));
    }
}
