//! HTTP client types for MoySklad API communication.
//!
//! This module provides the transport layer the resource layer is built on.
//! It handles request/response processing, pacing, retry logic and the
//! service's rate limit headers.
//!
//! # Overview
//!
//! - [`Transport`]: The seam every resource operation goes through
//! - [`HttpTransport`]: The reqwest-backed transport used by default
//! - [`HttpRequest`]: A request to be sent to the API
//! - [`HttpResponse`]: A parsed response from the API
//! - [`HttpMethod`]: Supported HTTP methods (GET, POST, PUT, DELETE)
//!
//! # Pacing
//!
//! Consecutive requests are separated by at least the configured
//! `request_delay` (200 ms by default). The delay can be lowered, even to
//! zero, except for the webhook endpoints, which always wait at least
//! [`MIN_WEBHOOK_DELAY`].
//!
//! # Retry Behavior
//!
//! - **429 and 5xx**: Retried after `X-Lognex-Retry-After` milliseconds, or
//!   1 second if the header is absent
//! - **Other errors (4xx)**: Returned immediately without retry
//!
//! The default `tries` is 1, meaning no automatic retries.

mod errors;
mod http_client;
mod http_request;
mod http_response;
mod transport;

pub use errors::{
    HttpError, HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};
pub use http_client::{HttpTransport, MIN_WEBHOOK_DELAY, RETRY_WAIT_TIME, SDK_VERSION};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::{HttpResponse, RateLimit};
pub use transport::Transport;
