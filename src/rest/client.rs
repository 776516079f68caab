//! The MoySklad client facade.
//!
//! [`MoyskladClient`] binds a [`Transport`] to a base URL and the two
//! server page ceilings, and owns the per-type metadata and attribute
//! definition caches. Entities never hold a client; operations that need
//! the network take one explicitly.
//!
//! # Example
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
//! let orders = client
//!     .get_entities(
//!         "customerorder",
//!         &CollectionRequest::new()
//!             .filter("sum", FilterOperator::Gt, 100)
//!             .limit(50),
//!     )
//!     .await?;
//! println!("fetched {} orders", orders.len());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::clients::{HttpError, HttpTransport, Transport};
use crate::config::{
    BaseUrl, MoyskladConfig, ENTITIES_QUERY_LIMIT_MAX, EVENTS_QUERY_LIMIT_MAX,
};
use crate::rest::collection::resolve;
use crate::rest::entity::Entity;
use crate::rest::errors::ResourceError;
use crate::rest::field::{FieldValue, Reference};
use crate::rest::filter::{filter_list, render, FilterOperator, FilterPredicate, Record};
use crate::rest::query::{CollectionQuery, CollectionRequest};

/// The quantity a current stock report is computed for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StockType {
    /// Physical stock.
    #[default]
    Stock,
    /// Stock minus reserves.
    FreeStock,
    /// Stock minus reserves plus expected arrivals.
    Quantity,
}

impl StockType {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::FreeStock => "freeStock",
            Self::Quantity => "quantity",
        }
    }
}

impl fmt::Display for StockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockType {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stock" => Ok(Self::Stock),
            "freeStock" => Ok(Self::FreeStock),
            "quantity" => Ok(Self::Quantity),
            other => Err(ResourceError::not_supported(format!(
                "unknown stock type '{other}'"
            ))),
        }
    }
}

/// Client for the MoySklad JSON API.
///
/// Generic over the [`Transport`] so tests can substitute an in-memory one;
/// [`MoyskladClient::new`] uses [`HttpTransport`].
///
/// The metadata and attribute definition caches are filled on first use per
/// entity type and never invalidated.
pub struct MoyskladClient<T: Transport = HttpTransport> {
    transport: T,
    base_url: BaseUrl,
    entities_query_limit_max: usize,
    events_query_limit_max: usize,
    metadata: Mutex<HashMap<String, Entity>>,
    attribute_definitions: Mutex<HashMap<String, Vec<Entity>>>,
}

// Verify MoyskladClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MoyskladClient>();
};

impl<T: Transport> fmt::Debug for MoyskladClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoyskladClient")
            .field("base_url", &self.base_url)
            .field("entities_query_limit_max", &self.entities_query_limit_max)
            .field("events_query_limit_max", &self.events_query_limit_max)
            .finish_non_exhaustive()
    }
}

impl MoyskladClient<HttpTransport> {
    /// Creates a client talking HTTP to the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &MoyskladConfig) -> Result<Self, HttpError> {
        Ok(Self::with_transport(HttpTransport::new(config)?, config))
    }
}

impl<T: Transport> MoyskladClient<T> {
    /// Creates a client over an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: T, config: &MoyskladConfig) -> Self {
        Self {
            transport,
            base_url: config.base_url().clone(),
            entities_query_limit_max: config.entities_query_limit_max(),
            events_query_limit_max: config.events_query_limit_max(),
            metadata: Mutex::new(HashMap::new()),
            attribute_definitions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the collection URL of `entity_type`.
    #[must_use]
    pub fn entity_url(&self, entity_type: &str) -> String {
        self.base_url.join(&format!("entity/{entity_type}"))
    }

    /// Returns the page ceiling for entity collections.
    #[must_use]
    pub const fn entities_query_limit_max(&self) -> usize {
        self.entities_query_limit_max
    }

    /// Overrides the page ceiling for entity collections; `None` restores
    /// the default.
    pub fn set_entities_query_limit_max(&mut self, limit: Option<usize>) {
        self.entities_query_limit_max = limit.unwrap_or(ENTITIES_QUERY_LIMIT_MAX);
    }

    /// Returns the page ceiling for audit history.
    #[must_use]
    pub const fn events_query_limit_max(&self) -> usize {
        self.events_query_limit_max
    }

    /// Overrides the page ceiling for audit history; `None` restores the
    /// default.
    pub fn set_events_query_limit_max(&mut self, limit: Option<usize>) {
        self.events_query_limit_max = limit.unwrap_or(EVENTS_QUERY_LIMIT_MAX);
    }

    /// Returns a bare placeholder of `entity_type`, ready to be filled and
    /// saved.
    #[must_use]
    pub fn create_entity(&self, entity_type: &str) -> Entity {
        Entity::new(entity_type)
    }

    /// Fetches one entity by type and id.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::BadResponse`] if the server rejects the
    /// request (e.g. unknown id), or [`ResourceError::Validation`] if the
    /// response lacks `meta`.
    pub async fn get_entity_by_id(
        &self,
        entity_type: &str,
        id: &str,
        expand: Option<&str>,
    ) -> Result<Entity, ResourceError> {
        let href = format!("{}/{id}", self.entity_url(entity_type));
        self.get_entity_by_href(&href, expand).await
    }

    /// Fetches one entity by its absolute `href`.
    ///
    /// # Errors
    ///
    /// See [`MoyskladClient::get_entity_by_id`].
    pub async fn get_entity_by_href(
        &self,
        href: &str,
        expand: Option<&str>,
    ) -> Result<Entity, ResourceError> {
        let url = match expand {
            Some(expand) if !expand.is_empty() => {
                let separator = if href.contains('?') { '&' } else { '?' };
                format!("{href}{separator}expand={expand}")
            }
            _ => href.to_string(),
        };
        Entity::from_json(self.transport.get(&url).await?)
    }

    /// Fetches entities one by one, in order. Aborts on the first failure.
    ///
    /// # Errors
    ///
    /// See [`MoyskladClient::get_entity_by_href`].
    pub async fn get_entities_by_href<S: AsRef<str>>(
        &self,
        hrefs: &[S],
        expand: Option<&str>,
    ) -> Result<Vec<Entity>, ResourceError> {
        let mut entities = Vec::with_capacity(hrefs.len());
        for href in hrefs {
            entities.push(self.get_entity_by_href(href.as_ref(), expand).await?);
        }
        Ok(entities)
    }

    /// Fetches entities of one type by id, in order. Aborts on the first
    /// failure.
    ///
    /// # Errors
    ///
    /// See [`MoyskladClient::get_entity_by_href`].
    pub async fn get_entities_by_id<S: AsRef<str>>(
        &self,
        entity_type: &str,
        ids: &[S],
        expand: Option<&str>,
    ) -> Result<Vec<Entity>, ResourceError> {
        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            entities.push(
                self.get_entity_by_id(entity_type, id.as_ref(), expand)
                    .await?,
            );
        }
        Ok(entities)
    }

    /// Fetches the collection `entity/{entity_type}`.
    ///
    /// # Errors
    ///
    /// See [`MoyskladClient::get_collection`].
    pub async fn get_entities(
        &self,
        entity_type: &str,
        request: &CollectionRequest,
    ) -> Result<Vec<Entity>, ResourceError> {
        self.get_collection(&format!("entity/{entity_type}"), request)
            .await
    }

    /// Fetches a paginated collection below the base URL.
    ///
    /// Pages are at most [`entities_query_limit_max`](Self::entities_query_limit_max)
    /// rows. Without a limit, everything the server reports past the
    /// offset is fetched.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::Validation`] if a response lacks `rows`, the
    ///   total size, or a row lacks `meta`.
    /// - [`ResourceError::BadResponse`] if the server rejects a page.
    ///
    /// No partial result is returned on failure.
    pub async fn get_collection(
        &self,
        endpoint: &str,
        request: &CollectionRequest,
    ) -> Result<Vec<Entity>, ResourceError> {
        let query = CollectionQuery::from_request(self.base_url.join(endpoint), request);
        resolve(
            &self.transport,
            &query,
            self.entities_query_limit_max,
            request.get_limit(),
            request.get_offset(),
            Entity::from_json,
        )
        .await
    }

    /// Fetches the stock report `report/stock/{all|bystore}`.
    ///
    /// `group_by` is one of `product`, `variant`, `consignment`; the server
    /// defaults to `variant`.
    ///
    /// # Errors
    ///
    /// See [`MoyskladClient::get_collection`].
    pub async fn get_stock(
        &self,
        by_store: bool,
        group_by: Option<&str>,
        request: &CollectionRequest,
    ) -> Result<Vec<Entity>, ResourceError> {
        let request = request.clone().param_opt("groupBy", group_by);
        self.get_collection(stock_endpoint(by_store), &request).await
    }

    /// Fetches the current stock report as raw JSON.
    ///
    /// # Errors
    ///
    /// Returns the transport failure, if any.
    pub async fn get_current_stock(
        &self,
        by_store: bool,
        stock_type: StockType,
        zero_lines: bool,
        filters: &[FilterPredicate],
    ) -> Result<Value, ResourceError> {
        let mut url = format!(
            "{}/current?stockType={stock_type}",
            self.base_url.join(stock_endpoint(by_store))
        );
        if zero_lines {
            url.push_str("&include=zeroLines");
        }
        if !filters.is_empty() {
            url.push_str("&filter=");
            url.push_str(&render(filters));
        }
        Ok(self.transport.get(&url).await?)
    }

    /// Returns the employee whose `uid` is `uid`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if there is none.
    pub async fn get_employee_by_uid(&self, uid: &str) -> Result<Entity, ResourceError> {
        let request = CollectionRequest::new().filter("uid", FilterOperator::Eq, uid);
        self.get_entities("employee", &request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ResourceError::not_found("employee", uid))
    }

    /// Returns the single event of an audit record matching the entity type,
    /// the event type and, when given, the entity `uid`.
    ///
    /// Types are compared lower-cased.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::NotFound`] if no event matches.
    /// - [`ResourceError::Validation`] if more than one does, or the
    ///   response has no `rows`.
    pub async fn get_audit_event(
        &self,
        audit_href: &str,
        entity_type: &str,
        event_type: &str,
        uid: Option<&str>,
    ) -> Result<FieldValue, ResourceError> {
        let entity_type = entity_type.to_lowercase();
        let event_type = event_type.to_lowercase();

        let response = self
            .transport
            .get(&format!("{audit_href}/events"))
            .await?;
        let Some(Value::Array(rows)) = response.get("rows") else {
            return Err(ResourceError::validation(format!(
                "audit response from '{audit_href}' has no 'rows' array"
            )));
        };

        let text = |event: &Value, field: &str| event.get(field).and_then(Value::as_str).map(str::to_string);
        let mut matching = rows.iter().filter(|event| {
            text(event, "eventType").as_deref() == Some(event_type.as_str())
                && text(event, "entityType").as_deref() == Some(entity_type.as_str())
                && uid.map_or(true, |uid| text(event, "uid").as_deref() == Some(uid))
        });

        let event = matching.next().ok_or_else(|| {
            ResourceError::not_found("event", format!("{entity_type}.{event_type} in {audit_href}"))
        })?;
        if matching.next().is_some() {
            return Err(ResourceError::validation(format!(
                "more than one {entity_type}.{event_type} event in {audit_href}"
            )));
        }
        Ok(FieldValue::from(event.clone()))
    }

    /// Returns the metadata of `entity_type`, fetched once and cached.
    ///
    /// # Errors
    ///
    /// Returns the transport failure of the first fetch, or
    /// [`ResourceError::Validation`] if the response is not an object.
    pub async fn get_metadata(&self, entity_type: &str) -> Result<Entity, ResourceError> {
        if let Some(metadata) = self.cached_metadata(entity_type) {
            return Ok(metadata);
        }

        let url = self.base_url.join(&format!("entity/{entity_type}/metadata"));
        let metadata = match self.transport.get(&url).await? {
            Value::Object(map) => Entity::materialize(map).unwrap_or_else(|map| {
                let mut metadata = Entity::from_reference(Reference::new(&url, "metadata"));
                for (name, value) in map {
                    metadata.put(&name, FieldValue::from(value));
                }
                metadata
            }),
            _ => {
                return Err(ResourceError::validation(format!(
                    "metadata of '{entity_type}' is not an object"
                )))
            }
        };

        tracing::debug!(entity_type, "Caching entity metadata");
        self.metadata
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity_type.to_string(), metadata.clone());
        Ok(metadata)
    }

    fn cached_metadata(&self, entity_type: &str) -> Option<Entity> {
        self.metadata
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_type)
            .cloned()
    }

    /// Returns the custom attribute definitions of `entity_type`, fetched
    /// once and cached.
    ///
    /// # Errors
    ///
    /// See [`MoyskladClient::get_collection`].
    pub async fn get_attribute_definitions(
        &self,
        entity_type: &str,
    ) -> Result<Vec<Entity>, ResourceError> {
        let cached = self
            .attribute_definitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_type)
            .cloned();
        if let Some(definitions) = cached {
            return Ok(definitions);
        }

        let definitions = self
            .get_collection(
                &format!("entity/{entity_type}/metadata/attributes"),
                &CollectionRequest::new(),
            )
            .await?;

        tracing::debug!(
            entity_type,
            count = definitions.len(),
            "Caching attribute definitions"
        );
        self.attribute_definitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity_type.to_string(), definitions.clone());
        Ok(definitions)
    }

    /// Keeps the records of `list` matching every predicate.
    #[must_use]
    pub fn filter<R: Record>(&self, list: Vec<R>, predicates: &[FilterPredicate]) -> Vec<R> {
        filter_list(list, predicates)
    }

    /// Builds a reference-only entity pointing at `{type}/{id}`.
    ///
    /// With `with_metadata`, the reference also carries `metadataHref`.
    #[must_use]
    pub fn create_link(&self, entity_type: &str, id: &str, with_metadata: bool) -> Entity {
        let entity_url = self.entity_url(entity_type);
        let mut reference = Reference::new(format!("{entity_url}/{id}"), entity_type);
        if with_metadata {
            reference.metadata_href = Some(format!("{entity_url}/metadata"));
        }
        Entity::from_reference(reference)
    }

    /// Fetches a paginated audit history.
    ///
    /// Pages are at most [`events_query_limit_max`](Self::events_query_limit_max)
    /// rows.
    ///
    /// # Errors
    ///
    /// See [`MoyskladClient::get_collection`].
    pub async fn fetch_events(
        &self,
        href: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<FieldValue>, ResourceError> {
        let query = CollectionQuery::new(href);
        resolve(
            &self.transport,
            &query,
            self.events_query_limit_max,
            limit,
            offset,
            |row| Ok(FieldValue::from(row)),
        )
        .await
    }
}

const fn stock_endpoint(by_store: bool) -> &'static str {
    if by_store {
        "report/stock/bystore"
    } else {
        "report/stock/all"
    }
}
