//! # MoySklad API Rust Client
//!
//! A Rust client for the MoySklad JSON API 1.2, providing type-safe
//! configuration, a paced and retrying HTTP transport, and a dynamic entity
//! model for working with inventory resources.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`MoyskladConfig`] and [`MoyskladConfigBuilder`]
//! - Validated newtypes for credentials and the API base URL
//! - An async HTTP transport with request pacing, retries and rate limit
//!   header parsing
//! - [`Entity`], a dynamic resource with dirty tracking and partial saves
//! - Paginated collection fetching that reconciles the caller's limit with
//!   the server's page ceiling
//! - Server filter rendering and in-memory filtering with the same predicates
//! - Link traversal between related entities
//! - Webhook management
//!
//! ## Quick Start
//!
//! ```rust
//! use moysklad_api::{BaseUrl, Login, MoyskladConfig, Password};
//! use std::time::Duration;
//!
//! let config = MoyskladConfig::builder()
//!     .login(Login::new("admin@company").unwrap())
//!     .password(Password::new("secret").unwrap())
//!     .base_url(BaseUrl::new("https://api.moysklad.ru/api/remap/1.2").unwrap())
//!     .request_delay(Duration::from_millis(250))
//!     .tries(3)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.tries(), 3);
//! ```
//!
//! ## Working With Entities
//!
//! ```rust,no_run
//! use moysklad_api::{Login, MoyskladClient, MoyskladConfig, Password};
//! use moysklad_api::rest::{CollectionRequest, FilterOperator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MoyskladConfig::builder()
//!     .login(Login::new("admin@company")?)
//!     .password(Password::new("secret")?)
//!     .build()?;
//! let client = MoyskladClient::new(&config)?;
//!
//! let mut order = client.get_entity_by_id("customerorder", "7944ef04-f831-11e5-7a69-971500188b19", None).await?;
//! order.set_state(&client, "Shipped", "name").await?;
//! order.save(&client).await?;
//!
//! let agents = order
//!     .get_linked_entities(&client, "counterparty", None, 10, None)
//!     .await?;
//! println!("{} linked counterparties", agents.len());
//!
//! let recent = client
//!     .get_entities("demand", &CollectionRequest::new().filter("moment", FilterOperator::Ge, "2024-01-01 00:00:00"))
//!     .await?;
//! println!("{} demands", recent.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use moysklad_api::rest::ResourceError;
//!
//! fn describe(error: &ResourceError) -> String {
//!     match error {
//!         ResourceError::NotFound { kind, name } => format!("missing {kind} {name}"),
//!         ResourceError::ReadOnly { field } => format!("{field} cannot be changed"),
//!         ResourceError::BadResponse(e) => format!("server said: {e}"),
//!         other => other.to_string(),
//!     }
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: caches belong to a client instance
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **Explicit client passing**: entities are plain data; network
//!   operations take the client as an argument
//! - **Sequential I/O**: every request completes before the next is built
//! - **Pluggable transport**: anything implementing [`clients::Transport`]

pub mod clients;
pub mod config;
pub mod error;
pub mod rest;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use config::{BaseUrl, Login, MoyskladConfig, MoyskladConfigBuilder, Password};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse, HttpResponseError,
    HttpTransport, InvalidHttpRequestError, MaxHttpRetriesExceededError, RateLimit, Transport,
};

// Re-export the resource layer
pub use rest::{
    CollectionRequest, Entity, FieldValue, FilterOperator, FilterPredicate, MoyskladClient,
    ResourceError,
};
