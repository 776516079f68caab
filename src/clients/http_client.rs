//! HTTP transport for MoySklad API communication.
//!
//! This module provides [`HttpTransport`], the reqwest-backed
//! [`Transport`](crate::clients::Transport) used by default. It handles
//! authentication, request pacing, and retry on rate-limited or failing
//! responses.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio::time::Instant;

use crate::clients::errors::{HttpError, HttpResponseError, MaxHttpRetriesExceededError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::clients::transport::Transport;
use crate::config::MoyskladConfig;

/// Fixed retry wait time when the server does not say how long to wait.
pub const RETRY_WAIT_TIME: Duration = Duration::from_secs(1);

/// Minimum pause before any request to the webhook endpoints.
pub const MIN_WEBHOOK_DELAY: Duration = Duration::from_millis(200);

/// Library version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

const WEBHOOK_PATH: &str = "/entity/webhook";

/// HTTP transport for the MoySklad API.
///
/// The transport handles:
/// - Basic authentication from the configured login and password
/// - Default headers including User-Agent
/// - A pause of at least `request_delay` between consecutive requests
///   (never below [`MIN_WEBHOOK_DELAY`] for webhook URLs)
/// - Automatic retries for 429 and 5xx responses
///
/// # Thread Safety
///
/// `HttpTransport` is `Send + Sync`. Requests are still expected to be
/// issued one at a time; the pacing state is shared.
///
/// # Example
///
/// ```rust,ignore
/// use moysklad_api::clients::{HttpTransport, Transport};
///
/// let transport = HttpTransport::new(&config)?;
/// let body = transport
///     .get("https://api.moysklad.ru/api/remap/1.2/entity/product?limit=10&offset=0")
///     .await?;
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    default_headers: HashMap<String, String>,
    request_delay: Duration,
    tries: u32,
    last_request: Mutex<Option<Instant>>,
}

// Verify HttpTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpTransport>();
};

impl HttpTransport {
    /// Creates a new transport from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the underlying reqwest client
    /// cannot be created (e.g. TLS initialization failure).
    pub fn new(config: &MoyskladConfig) -> Result<Self, HttpError> {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{user_agent_prefix}MoySklad API Library v{SDK_VERSION} | Rust {rust_version}");

        let credentials = STANDARD.encode(format!(
            "{}:{}",
            config.login().as_ref(),
            config.password().as_ref()
        ));

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert(
            "Accept".to_string(),
            "application/json;charset=utf-8".to_string(),
        );
        default_headers.insert("Authorization".to_string(), format!("Basic {credentials}"));

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .gzip(true)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            default_headers,
            request_delay: config.request_delay(),
            tries: config.tries(),
            last_request: Mutex::new(None),
        })
    }

    /// Returns the default headers sent with every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the pause enforced before a request to `url`.
    #[must_use]
    pub fn delay_for(&self, url: &str) -> Duration {
        if url.contains(WEBHOOK_PATH) {
            self.request_delay.max(MIN_WEBHOOK_DELAY)
        } else {
            self.request_delay
        }
    }

    /// Sends an HTTP request to the MoySklad API.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - Network error occurs (`Network`)
    /// - Non-2xx response received (`Response`)
    /// - Max retries exceeded (`MaxRetries`)
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let mut headers = self.default_headers.clone();
        if request.body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }

        let mut tries: u32 = 0;
        loop {
            tries += 1;
            self.pace(&request.url).await;

            let mut req_builder = match request.http_method {
                HttpMethod::Get => self.client.get(&request.url),
                HttpMethod::Post => self.client.post(&request.url),
                HttpMethod::Put => self.client.put(&request.url),
                HttpMethod::Delete => self.client.delete(&request.url),
            };
            for (key, value) in &headers {
                req_builder = req_builder.header(key, value);
            }
            if let Some(body) = &request.body {
                req_builder = req_builder.body(body.to_string());
            }

            let sent = req_builder.send().await;
            self.mark_finished();
            let res = sent?;

            let code = res.status().as_u16();
            let res_headers = Self::parse_response_headers(res.headers());
            let body_text = res.text().await?;
            let body = if body_text.trim().is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_str(&body_text)
                    .unwrap_or_else(|_| serde_json::Value::String(body_text.clone()))
            };

            let response = HttpResponse::new(code, res_headers, body);
            if response.is_ok() {
                return Ok(response);
            }

            let error = HttpResponseError::from_body(
                code,
                &response.body,
                &body_text,
                response.request_id().map(String::from),
            );

            if !response.is_retryable() || request.tries <= 1 {
                return Err(HttpError::Response(error));
            }
            if tries >= request.tries {
                return Err(HttpError::MaxRetries(MaxHttpRetriesExceededError {
                    code,
                    tries: request.tries,
                    messages: error.messages,
                    error_reference: error.error_reference,
                }));
            }

            let delay = response.retry_after.unwrap_or(RETRY_WAIT_TIME);
            tracing::warn!(
                url = %request.url,
                status = code,
                attempt = tries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retrying MoySklad request"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn pace(&self, url: &str) {
        let delay = self.delay_for(url);
        let last = *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(last) = last {
            let elapsed = last.elapsed();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }
    }

    fn mark_finished(&self) {
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }

    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, HttpError> {
        let request = HttpRequest::builder(method, url)
            .maybe_body(body)
            .tries(self.tries)
            .build()?;
        Ok(self.request(request).await?.body)
    }
}
