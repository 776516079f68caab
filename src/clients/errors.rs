//! HTTP-specific error types for the MoySklad API client.
//!
//! This module contains error types for HTTP operations, including response
//! errors, retry exhaustion, and request validation failures.
//!
//! # Error Handling
//!
//! - [`HttpResponseError`]: Non-2xx HTTP responses from the API
//! - [`MaxHttpRetriesExceededError`]: When retry attempts are exhausted
//! - [`InvalidHttpRequestError`]: When a request fails validation before sending
//! - [`HttpError`]: Unified error type encompassing all HTTP-related errors
//!
//! # Example
//!
//! ```rust,ignore
//! use moysklad_api::clients::{HttpError, Transport};
//!
//! match transport.get(url).await {
//!     Ok(body) => println!("Success: {body}"),
//!     Err(HttpError::Response(e)) => {
//!         println!("API error {}: {}", e.code, e);
//!     }
//!     Err(HttpError::MaxRetries(e)) => {
//!         println!("Retries exhausted after {} tries", e.tries);
//!     }
//!     Err(e) => println!("Transport error: {e}"),
//! }
//! ```

use thiserror::Error;

/// Error returned when an HTTP request receives a non-successful response.
///
/// The API reports failures as `{"errors": [{"error": "...", ...}]}`; the
/// `error` strings are collected into `messages` and displayed joined with
/// `"; "`.
///
/// # Example
///
/// ```rust
/// use moysklad_api::clients::HttpResponseError;
///
/// let error = HttpResponseError {
///     code: 412,
///     messages: vec![
///         "Field 'name' is required".to_string(),
///         "Unknown field 'colour'".to_string(),
///     ],
///     error_reference: None,
/// };
///
/// assert_eq!(
///     error.to_string(),
///     "Field 'name' is required; Unknown field 'colour'"
/// );
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{}", .messages.join("; "))]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// The error messages reported by the server.
    pub messages: Vec<String>,
    /// Reference ID for error reporting (from X-Request-Id header).
    pub error_reference: Option<String>,
}

impl HttpResponseError {
    /// Builds an error from a failed response body.
    ///
    /// Messages are taken from the `error` strings of the `errors` list.
    /// When the body carries no such list, the raw body text is used, and
    /// an empty body falls back to `HTTP {code}`.
    #[must_use]
    pub fn from_body(
        code: u16,
        body: &serde_json::Value,
        raw_body: &str,
        error_reference: Option<String>,
    ) -> Self {
        let mut messages: Vec<String> = body
            .get("errors")
            .and_then(serde_json::Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e.get("error").and_then(serde_json::Value::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        if messages.is_empty() {
            let raw = raw_body.trim();
            messages.push(if raw.is_empty() {
                format!("HTTP {code}")
            } else {
                raw.to_string()
            });
        }

        Self {
            code,
            messages,
            error_reference,
        }
    }
}

/// Error returned when maximum retry attempts have been exhausted.
///
/// This error is raised when a request keeps failing with 429 or 5xx
/// responses after all configured tries have been made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Exceeded maximum retry count of {tries}. Last message: {}", .messages.join("; "))]
pub struct MaxHttpRetriesExceededError {
    /// The HTTP status code of the last response.
    pub code: u16,
    /// The number of tries that were attempted.
    pub tries: u32,
    /// Error messages from the last response.
    pub messages: Vec<String>,
    /// Reference ID for error reporting (from X-Request-Id header).
    pub error_reference: Option<String>,
}

/// Error returned when an HTTP request fails validation before it is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST or PUT request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// The request URL is not absolute.
    #[error("Request URL '{url}' must be absolute (http or https).")]
    RelativeUrl {
        /// The offending URL.
        url: String,
    },
}

/// Unified error type for all HTTP-related errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// An HTTP response error (non-2xx status code).
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Maximum retry attempts exhausted.
    #[error(transparent)]
    MaxRetries(#[from] MaxHttpRetriesExceededError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_error_joins_server_messages() {
        let body = json!({
            "errors": [
                {"error": "Entity 'product' with UUID: 1 not found", "code": 1021},
                {"error": "Second problem", "parameter": "name"}
            ]
        });
        let error = HttpResponseError::from_body(404, &body, "", Some("req-1".to_string()));

        assert_eq!(error.code, 404);
        assert_eq!(error.messages.len(), 2);
        assert_eq!(
            error.to_string(),
            "Entity 'product' with UUID: 1 not found; Second problem"
        );
        assert_eq!(error.error_reference.as_deref(), Some("req-1"));
    }

    #[test]
    fn test_response_error_falls_back_to_raw_body() {
        let error = HttpResponseError::from_body(502, &serde_json::Value::Null, "Bad Gateway", None);
        assert_eq!(error.messages, vec!["Bad Gateway".to_string()]);
    }

    #[test]
    fn test_response_error_falls_back_to_status_code() {
        let error = HttpResponseError::from_body(500, &json!({}), "  ", None);
        assert_eq!(error.to_string(), "HTTP 500");
    }

    #[test]
    fn test_max_retries_error_includes_retry_count() {
        let error = MaxHttpRetriesExceededError {
            code: 429,
            tries: 3,
            messages: vec!["Too many requests".to_string()],
            error_reference: None,
        };
        let message = error.to_string();
        assert!(message.contains("Exceeded maximum retry count of 3"));
        assert!(message.contains("Too many requests"));
    }

    #[test]
    fn test_invalid_request_error_messages() {
        let error = InvalidHttpRequestError::MissingBody {
            method: "post".to_string(),
        };
        assert_eq!(error.to_string(), "Cannot use post without specifying data.");

        let error = InvalidHttpRequestError::RelativeUrl {
            url: "entity/product".to_string(),
        };
        assert!(error.to_string().contains("entity/product"));
    }

    #[test]
    fn test_http_error_is_transparent_for_responses() {
        let error: HttpError = HttpResponseError {
            code: 400,
            messages: vec!["bad".to_string()],
            error_reference: None,
        }
        .into();
        assert_eq!(error.to_string(), "bad");
    }
}
