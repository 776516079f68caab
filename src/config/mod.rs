//! Configuration types for the MoySklad API client.
//!
//! This module provides the core configuration types used to initialize
//! the client for communication with the MoySklad JSON API.
//!
//! # Overview
//!
//! - [`MoyskladConfig`]: The main configuration struct holding all client settings
//! - [`MoyskladConfigBuilder`]: A builder for constructing [`MoyskladConfig`] instances
//! - [`Login`]: A validated account login
//! - [`Password`]: A validated password with masked debug output
//! - [`BaseUrl`]: A validated API base URL
//!
//! # Example
//!
//! ```rust
//! use moysklad_api::{MoyskladConfig, Login, Password};
//! use std::time::Duration;
//!
//! let config = MoyskladConfig::builder()
//!     .login(Login::new("admin@company").unwrap())
//!     .password(Password::new("secret").unwrap())
//!     .request_delay(Duration::from_millis(300))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.entities_query_limit_max(), 1000);
//! ```

mod newtypes;

pub use newtypes::{BaseUrl, Login, Password};

use std::time::Duration;

use crate::error::ConfigError;

/// Default server-side page ceiling for entity collections.
pub const ENTITIES_QUERY_LIMIT_MAX: usize = 1000;

/// Default server-side page ceiling for audit event collections.
pub const EVENTS_QUERY_LIMIT_MAX: usize = 100;

/// Default pause between two consecutive requests.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(200);

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the MoySklad API client.
///
/// `MoyskladConfig` is `Clone`, `Send`, and `Sync`, so one configuration can
/// back several clients.
#[derive(Clone, Debug)]
pub struct MoyskladConfig {
    login: Login,
    password: Password,
    base_url: BaseUrl,
    request_delay: Duration,
    timeout: Duration,
    tries: u32,
    entities_query_limit_max: usize,
    events_query_limit_max: usize,
    user_agent_prefix: Option<String>,
}

impl MoyskladConfig {
    /// Creates a new builder for constructing a `MoyskladConfig`.
    #[must_use]
    pub fn builder() -> MoyskladConfigBuilder {
        MoyskladConfigBuilder::new()
    }

    /// Returns the account login.
    #[must_use]
    pub const fn login(&self) -> &Login {
        &self.login
    }

    /// Returns the account password.
    #[must_use]
    pub const fn password(&self) -> &Password {
        &self.password
    }

    /// Returns the API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the minimum pause between two consecutive requests.
    #[must_use]
    pub const fn request_delay(&self) -> Duration {
        self.request_delay
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns how many times a rate-limited or failing request is attempted.
    #[must_use]
    pub const fn tries(&self) -> u32 {
        self.tries
    }

    /// Returns the page size ceiling for entity collections.
    #[must_use]
    pub const fn entities_query_limit_max(&self) -> usize {
        self.entities_query_limit_max
    }

    /// Returns the page size ceiling for audit event collections.
    #[must_use]
    pub const fn events_query_limit_max(&self) -> usize {
        self.events_query_limit_max
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }
}

// Verify MoyskladConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MoyskladConfig>();
};

/// Builder for constructing [`MoyskladConfig`] instances.
///
/// Required fields are `login` and `password`.
///
/// # Defaults
///
/// - `base_url`: [`BaseUrl::DEFAULT`]
/// - `request_delay`: 200 ms
/// - `timeout`: 30 s
/// - `tries`: 1 (no retries)
/// - `entities_query_limit_max`: 1000
/// - `events_query_limit_max`: 100
/// - `user_agent_prefix`: `None`
#[derive(Debug, Default)]
pub struct MoyskladConfigBuilder {
    login: Option<Login>,
    password: Option<Password>,
    base_url: Option<BaseUrl>,
    request_delay: Option<Duration>,
    timeout: Option<Duration>,
    tries: Option<u32>,
    entities_query_limit_max: Option<usize>,
    events_query_limit_max: Option<usize>,
    user_agent_prefix: Option<String>,
}

impl MoyskladConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the account login (required).
    #[must_use]
    pub fn login(mut self, login: Login) -> Self {
        self.login = Some(login);
        self
    }

    /// Sets the account password (required).
    #[must_use]
    pub fn password(mut self, password: Password) -> Self {
        self.password = Some(password);
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: BaseUrl) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the pause enforced between two consecutive requests.
    ///
    /// Webhook endpoints never go below
    /// [`MIN_WEBHOOK_DELAY`](crate::clients::MIN_WEBHOOK_DELAY).
    #[must_use]
    pub const fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = Some(delay);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets how many times a request is attempted on 429 and 5xx responses.
    #[must_use]
    pub const fn tries(mut self, tries: u32) -> Self {
        self.tries = Some(tries);
        self
    }

    /// Sets the page size ceiling for entity collections.
    #[must_use]
    pub const fn entities_query_limit_max(mut self, limit: usize) -> Self {
        self.entities_query_limit_max = Some(limit);
        self
    }

    /// Sets the page size ceiling for audit event collections.
    #[must_use]
    pub const fn events_query_limit_max(mut self, limit: usize) -> Self {
        self.events_query_limit_max = Some(limit);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`MoyskladConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `login` or `password`
    /// are not set, and [`ConfigError::InvalidQueryLimit`] for a zero page
    /// size ceiling.
    pub fn build(self) -> Result<MoyskladConfig, ConfigError> {
        let login = self
            .login
            .ok_or(ConfigError::MissingRequiredField { field: "login" })?;
        let password = self
            .password
            .ok_or(ConfigError::MissingRequiredField { field: "password" })?;

        let entities_query_limit_max = self
            .entities_query_limit_max
            .unwrap_or(ENTITIES_QUERY_LIMIT_MAX);
        if entities_query_limit_max == 0 {
            return Err(ConfigError::InvalidQueryLimit {
                field: "entities_query_limit_max",
                value: 0,
            });
        }

        let events_query_limit_max = self.events_query_limit_max.unwrap_or(EVENTS_QUERY_LIMIT_MAX);
        if events_query_limit_max == 0 {
            return Err(ConfigError::InvalidQueryLimit {
                field: "events_query_limit_max",
                value: 0,
            });
        }

        Ok(MoyskladConfig {
            login,
            password,
            base_url: self.base_url.unwrap_or_default(),
            request_delay: self.request_delay.unwrap_or(DEFAULT_REQUEST_DELAY),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            tries: self.tries.unwrap_or(1).max(1),
            entities_query_limit_max,
            events_query_limit_max,
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}
