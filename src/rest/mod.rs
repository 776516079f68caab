//! The resource layer: entities, collections, filters and links.
//!
//! This module is the core of the crate:
//!
//! - **[`Entity`]**: a dynamic server resource with an ordered field store,
//!   dirty tracking, custom attributes, persistence and deletion
//! - **[`FieldValue`]**: a materialized field; nested objects carrying a
//!   `meta` become entities
//! - **[`FilterPredicate`]**: a `(field, operator, value)` triple, rendered
//!   into the `filter` query parameter or evaluated in memory
//! - **[`CollectionRequest`]**: filters, limit, offset and extra parameters
//!   of a paginated collection fetch
//! - **[`MoyskladClient`]**: the facade issuing requests through a
//!   [`Transport`](crate::clients::Transport)
//! - **[`ResourceError`]**: what resource operations fail with
//!
//! # Example
//!
//! ```rust,no_run
//! use moysklad_api::MoyskladClient;
//! use moysklad_api::rest::{CollectionRequest, FilterOperator, ResourceError};
//!
//! # async fn example(client: MoyskladClient) -> Result<(), ResourceError> {
//! // Fetch unpaid orders
//! let request = CollectionRequest::new()
//!     .filter("payedSum", FilterOperator::Eq, 0)
//!     .expand("agent");
//! let orders = client.get_entities("customerorder", &request).await?;
//!
//! for mut order in orders {
//!     // Only `description` is sent
//!     order.set("description", "awaiting payment")?;
//!     order.save(&client).await?;
//! }
//!
//! // Create a new product
//! let mut product = client.create_entity("product");
//! product.set("name", "Widget")?;
//! product.save(&client).await?;
//! println!("created {}", product.id()?);
//! # Ok(())
//! # }
//! ```

mod attributes;
mod client;
mod collection;
mod entity;
mod errors;
mod field;
mod filter;
mod links;
mod query;
mod tracking;

pub use client::{MoyskladClient, StockType};
pub use entity::{Entity, DEFAULT_READ_ONLY_FIELDS};
pub use errors::ResourceError;
pub use field::{FieldValue, Fields, Reference, MEDIA_TYPE_JSON};
pub use filter::{
    filter_list, matches, render, FilterOperator, FilterPredicate, FilterValue, Record,
    DATETIME_FORMAT,
};
pub use query::{CollectionQuery, CollectionRequest};
pub use tracking::DirtyFields;
