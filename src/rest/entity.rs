//! The dynamic resource wrapper.
//!
//! An [`Entity`] is one server resource: an ordered field store, a `meta`
//! [`Reference`] once the resource exists on the server, and a
//! [`DirtyFields`] set recording what changed locally.
//!
//! # Lifecycle
//!
//! - **Hydrated** ([`Entity::from_json`]): built from server JSON, which must
//!   carry a `meta`. Read-only fields are enforced.
//! - **Placeholder** ([`Entity::new`]): a type name only, used to build a
//!   create request. Any field may be assigned.
//!
//! Both start with an empty dirty set; every successful [`Entity::set`]
//! marks the field.
//!
//! # Example
//!
//! ```rust
//! use moysklad_api::rest::{Entity, ResourceError};
//! use serde_json::json;
//!
//! let mut product = Entity::from_json(json!({
//!     "meta": {
//!         "href": "https://api.moysklad.ru/api/remap/1.2/entity/product/abc-123",
//!         "type": "product"
//!     },
//!     "name": "Widget"
//! }))
//! .unwrap();
//!
//! assert_eq!(product.id().unwrap(), "abc-123");
//!
//! product.set("name", "Gadget").unwrap();
//! product.set("name", "Gizmo").unwrap();
//! assert_eq!(product.dirty_fields().len(), 1);
//!
//! let err = product.set("id", "other").unwrap_err();
//! assert!(matches!(err, ResourceError::ReadOnly { .. }));
//! ```

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::clients::Transport;
use crate::rest::client::MoyskladClient;
use crate::rest::errors::ResourceError;
use crate::rest::field::{FieldValue, Fields, Reference};
use crate::rest::filter::{FilterOperator, FilterPredicate, Record};
use crate::rest::tracking::DirtyFields;

/// Fields a hydrated entity refuses to assign by default.
pub const DEFAULT_READ_ONLY_FIELDS: &[&str] =
    &["id", "href", "meta", "accountId", "created", "updated"];

/// Fields holding structure rather than cross-references.
pub(crate) const STRUCTURAL_FIELDS: &[&str] = &["attributes", "positions", "files"];

/// A server resource with dirty tracking.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    entity_type: String,
    meta: Option<Reference>,
    fields: Fields,
    dirty: DirtyFields,
    read_only: Vec<String>,
    required: Vec<String>,
}

impl Entity {
    /// Creates a bare placeholder of `entity_type` for a resource that does
    /// not exist yet.
    #[must_use]
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            meta: None,
            fields: Fields::new(),
            dirty: DirtyFields::new(),
            read_only: DEFAULT_READ_ONLY_FIELDS.iter().map(ToString::to_string).collect(),
            required: Vec::new(),
        }
    }

    /// Hydrates an entity from server JSON.
    ///
    /// Nested objects carrying a `meta` are materialized into entities.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Validation`] if `data` is not an object or
    /// lacks a valid `meta`.
    pub fn from_json(data: Value) -> Result<Self, ResourceError> {
        let Value::Object(map) = data else {
            return Err(ResourceError::validation(
                "entity data must be a JSON object",
            ));
        };
        Self::materialize(map)
            .map_err(|_| ResourceError::validation("'meta' field is required"))
    }

    /// Hydrates an entity carrying nothing but `reference`.
    #[must_use]
    pub fn from_reference(reference: Reference) -> Self {
        let mut entity = Self::new(reference.entity_type.clone());
        entity.meta = Some(reference);
        entity
    }

    /// Builds a hydrated entity, handing `map` back if `meta` is unusable.
    pub(crate) fn materialize(mut map: Map<String, Value>) -> Result<Self, Map<String, Value>> {
        let Some(reference) = map.get("meta").and_then(Reference::from_json) else {
            return Err(map);
        };
        map.shift_remove("meta");

        let mut entity = Self::from_reference(reference);
        entity.fields = Fields::from(map);
        Ok(entity)
    }

    /// Returns the entity type name.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the `meta` reference, if the resource exists on the server.
    #[must_use]
    pub const fn reference(&self) -> Option<&Reference> {
        self.meta.as_ref()
    }

    /// Returns `true` if the entity was built from server data.
    #[must_use]
    pub const fn is_hydrated(&self) -> bool {
        self.meta.is_some()
    }

    /// Returns `true` if any field changed since load or the last save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Returns the set of changed fields.
    #[must_use]
    pub const fn dirty_fields(&self) -> &DirtyFields {
        &self.dirty
    }

    /// Returns the names refused by [`Entity::set`] on a hydrated entity.
    #[must_use]
    pub fn read_only_fields(&self) -> &[String] {
        &self.read_only
    }

    /// Adds `name` to the read-only set.
    pub fn protect(&mut self, name: &str) {
        if !self.read_only.iter().any(|n| n == name) {
            self.read_only.push(name.to_string());
        }
    }

    /// Returns the fields always sent on save.
    #[must_use]
    pub fn required_fields(&self) -> &[String] {
        &self.required
    }

    /// Marks `name` as required: it is always sent on save and must exist.
    pub fn require(&mut self, name: &str) {
        if !self.required.iter().any(|n| n == name) {
            self.required.push(name.to_string());
        }
    }

    /// Returns the resource id, derived from the last segment of `meta.href`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if the entity has no `meta`.
    pub fn id(&self) -> Result<&str, ResourceError> {
        self.meta
            .as_ref()
            .map(Reference::id)
            .ok_or_else(|| ResourceError::not_found("field", "id"))
    }

    /// Iterates stored fields in order, `meta` excluded.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter()
    }

    /// Returns `true` if `name` is stored (or is `meta` on a hydrated entity).
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        (name == "meta" && self.meta.is_some()) || self.fields.contains(name)
    }

    /// Returns a stored field, without `id` derivation or attribute lookup.
    #[must_use]
    pub fn stored(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Reads a field.
    ///
    /// Lookup order: stored fields (`meta` included), the derived `id`, then
    /// custom attributes by name.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] naming the field if none match.
    pub fn get(&self, name: &str) -> Result<Cow<'_, FieldValue>, ResourceError> {
        if let Some(value) = self.fields.get(name) {
            return Ok(Cow::Borrowed(value));
        }
        if name == "meta" {
            if let Some(reference) = &self.meta {
                return Ok(Cow::Owned(FieldValue::from(reference.to_json())));
            }
        }
        if name == "id" {
            return self
                .id()
                .map(|id| Cow::Owned(FieldValue::String(id.to_string())));
        }
        self.find_attribute(name)
            .map(Cow::Borrowed)
            .ok_or_else(|| ResourceError::not_found("field", name))
    }

    /// Assigns a field and records it as changed.
    ///
    /// Nested objects carrying a `meta` are wrapped into entities.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::ReadOnly`] for a protected field of a hydrated
    ///   entity; nothing is changed.
    /// - [`ResourceError::Validation`] when assigning an unusable `meta` to
    ///   a placeholder.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), ResourceError> {
        if self.is_hydrated() && self.read_only.iter().any(|n| n == name) {
            return Err(ResourceError::ReadOnly {
                field: name.to_string(),
            });
        }

        let value: FieldValue = value.into();
        let value = value.materialize();
        if name == "meta" {
            let reference = Reference::from_json(&value.to_json())
                .ok_or_else(|| ResourceError::validation("'meta' must be a reference object"))?;
            if !reference.entity_type.is_empty() {
                self.entity_type.clone_from(&reference.entity_type);
            }
            self.meta = Some(reference);
        } else {
            self.fields.insert(name, value);
        }
        self.dirty.mark(name);
        Ok(())
    }

    /// Stores a field without read-only checks or dirty tracking.
    pub(crate) fn put(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name, value);
    }

    pub(crate) fn dirty_mut(&mut self) -> &mut DirtyFields {
        &mut self.dirty
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Flattens the entity to plain JSON, `meta` first.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        if let Some(reference) = &self.meta {
            map.insert("meta".to_string(), reference.to_json());
        }
        for (name, value) in self.fields.iter() {
            map.insert(name.to_string(), value.to_json());
        }
        Value::Object(map)
    }

    /// Returns a JSON object with those of `names` that are stored.
    #[must_use]
    pub fn map(&self, names: &[&str]) -> Value {
        let mut out = Map::new();
        for name in names {
            if self.has(name) {
                if let Ok(value) = self.get(name) {
                    out.insert((*name).to_string(), value.to_json());
                }
            }
        }
        Value::Object(out)
    }

    fn request_body(&self) -> Result<Map<String, Value>, ResourceError> {
        let mut body = Map::new();
        for name in &self.required {
            let value = self.field_json(name).ok_or_else(|| {
                ResourceError::validation(format!("required field '{name}' is missing"))
            })?;
            body.insert(name.clone(), value);
        }
        for name in self.dirty.iter() {
            if body.contains_key(name) {
                continue;
            }
            if let Some(value) = self.field_json(name) {
                body.insert(name.to_string(), value);
            }
        }
        Ok(body)
    }

    fn field_json(&self, name: &str) -> Option<Value> {
        if name == "meta" {
            return self.meta.as_ref().map(Reference::to_json);
        }
        self.fields.get(name).map(FieldValue::to_json)
    }

    /// Persists required and changed fields.
    ///
    /// An existing resource is updated with `PUT` to `meta.href`; a
    /// placeholder is created with `POST` to its type's collection. On
    /// success the local fields are replaced by the server's response and
    /// the dirty set is cleared.
    ///
    /// Returns `Ok(false)` without any request when there is nothing to send.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::Validation`] if a required field is missing or the
    ///   response lacks `meta`.
    /// - [`ResourceError::BadResponse`] if the server rejects the body.
    pub async fn save<T: Transport>(
        &mut self,
        client: &MoyskladClient<T>,
    ) -> Result<bool, ResourceError> {
        let mut body = self.request_body()?;
        if body.is_empty() {
            return Ok(false);
        }

        let response = if let Some(reference) = &self.meta {
            body.insert("meta".to_string(), reference.to_json());
            tracing::debug!(href = %reference.href, fields = body.len(), "Updating entity");
            client
                .transport()
                .put(&reference.href, Value::Object(body))
                .await?
        } else {
            let url = client.entity_url(&self.entity_type);
            tracing::debug!(url = %url, fields = body.len(), "Creating entity");
            client.transport().post(&url, Value::Object(body)).await?
        };

        let fresh = Self::from_json(response)?;
        self.entity_type = fresh.entity_type;
        self.meta = fresh.meta;
        self.fields = fresh.fields;
        self.dirty.clear();
        Ok(true)
    }

    /// Deletes the resource on the server.
    ///
    /// The local value is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotSupported`] if the entity was never
    /// persisted, or the transport failure.
    pub async fn remove<T: Transport>(&self, client: &MoyskladClient<T>) -> Result<(), ResourceError> {
        let reference = self.meta.as_ref().ok_or_else(|| {
            ResourceError::not_supported("cannot delete an entity that was never saved")
        })?;
        tracing::debug!(href = %reference.href, "Deleting entity");
        client.transport().delete(&reference.href).await?;
        Ok(())
    }

    /// Returns the metadata of this entity's type.
    ///
    /// # Errors
    ///
    /// See [`MoyskladClient::get_metadata`].
    pub async fn get_metadata<T: Transport>(
        &self,
        client: &MoyskladClient<T>,
    ) -> Result<Self, ResourceError> {
        client.get_metadata(&self.entity_type).await
    }

    /// Returns the states defined for this entity's type, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if the type has no states, or a
    /// metadata fetch failure.
    pub async fn get_states<T: Transport>(
        &self,
        client: &MoyskladClient<T>,
        filters: &[FilterPredicate],
    ) -> Result<Vec<FieldValue>, ResourceError> {
        let metadata = client.get_metadata(&self.entity_type).await?;
        let states = metadata
            .stored("states")
            .and_then(FieldValue::as_array)
            .ok_or_else(|| {
                ResourceError::not_found("metadata", format!("{}.states", self.entity_type))
            })?;
        Ok(crate::rest::filter::filter_list(states.iter().cloned(), filters))
    }

    /// Returns the first state whose field `by` equals `needle`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if no state matches.
    pub async fn get_state<T: Transport>(
        &self,
        client: &MoyskladClient<T>,
        needle: &str,
        by: &str,
    ) -> Result<FieldValue, ResourceError> {
        let filters = [FilterPredicate::new(by, FilterOperator::Eq, needle)];
        self.get_states(client, &filters)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ResourceError::not_found("state", format!("{by} = {needle}")))
    }

    /// Assigns the state whose field `by` equals `needle` to `state`.
    ///
    /// # Errors
    ///
    /// See [`Entity::get_state`] and [`Entity::set`].
    pub async fn set_state<T: Transport>(
        &mut self,
        client: &MoyskladClient<T>,
        needle: &str,
        by: &str,
    ) -> Result<(), ResourceError> {
        let state = self.get_state(client, needle, by).await?;
        self.set("state", state)
    }

    /// Returns the audit history of this entity.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotSupported`] for an entity that was never
    /// persisted, or a collection failure.
    pub async fn get_events<T: Transport>(
        &self,
        client: &MoyskladClient<T>,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<FieldValue>, ResourceError> {
        let reference = self.meta.as_ref().ok_or_else(|| {
            ResourceError::not_supported("an entity that was never saved has no audit history")
        })?;
        client
            .fetch_events(&format!("{}/audit", reference.href), limit, offset)
            .await
    }
}

impl Record for Entity {
    fn filter_value(&self, field: &str) -> Option<Value> {
        if let Some(value) = self.field_json(field) {
            return Some(value);
        }
        if field == "id" {
            return self.id().ok().map(Value::from);
        }
        self.find_attribute(field)
            .and_then(|attribute| attribute.field("value"))
            .map(FieldValue::to_json)
    }
}
