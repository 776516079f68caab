//! The transport seam between the resource layer and the network.
//!
//! Everything above this module talks to the service through [`Transport`]:
//! a method, an absolute URL and an optional JSON body in, decoded JSON out.
//! [`HttpTransport`](crate::clients::HttpTransport) is the production
//! implementation; tests substitute an in-memory one.

use crate::clients::errors::HttpError;
use crate::clients::http_request::HttpMethod;

/// Issues requests against absolute URLs and returns decoded JSON.
///
/// Implementations are responsible for authentication, pacing and retries.
/// Callers await each request before building the next one.
///
/// # Example
///
/// ```rust
/// use moysklad_api::clients::{HttpError, HttpMethod, Transport};
/// use serde_json::{json, Value};
///
/// struct Static;
///
/// impl Transport for Static {
///     async fn send(
///         &self,
///         _method: HttpMethod,
///         _url: &str,
///         _body: Option<Value>,
///     ) -> Result<Value, HttpError> {
///         Ok(json!({"rows": [], "meta": {"size": 0}}))
///     }
/// }
/// ```
#[allow(async_fn_in_trait)]
pub trait Transport: Send + Sync {
    /// Sends one request and returns the decoded response body.
    ///
    /// An empty response body decodes to `null`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] for non-2xx responses, exhausted retries,
    /// malformed requests and network failures.
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, HttpError>;

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// See [`Transport::send`].
    async fn get(&self, url: &str) -> Result<serde_json::Value, HttpError> {
        self.send(HttpMethod::Get, url, None).await
    }

    /// Sends a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Transport::send`].
    async fn post(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, HttpError> {
        self.send(HttpMethod::Post, url, Some(body)).await
    }

    /// Sends a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Transport::send`].
    async fn put(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, HttpError> {
        self.send(HttpMethod::Put, url, Some(body)).await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`Transport::send`].
    async fn delete(&self, url: &str) -> Result<serde_json::Value, HttpError> {
        self.send(HttpMethod::Delete, url, None).await
    }
}
