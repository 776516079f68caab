//! Field values, the ordered field store, and resource references.
//!
//! Server JSON is turned into [`FieldValue`]s by materialization: every
//! object carrying its own `meta` becomes a nested
//! [`Entity`](crate::rest::Entity); everything else keeps its shape.
//! [`FieldValue::to_json`] is the inverse and flattens nested entities back
//! to plain JSON.
//!
//! ```rust
//! use moysklad_api::rest::FieldValue;
//! use serde_json::json;
//!
//! let raw = json!({
//!     "name": "Order 1",
//!     "agent": {"meta": {
//!         "href": "https://host/entity/counterparty/c1",
//!         "type": "counterparty",
//!         "mediaType": "application/json"
//!     }}
//! });
//!
//! let value = FieldValue::from(raw.clone());
//! let agent = value.field("agent").unwrap();
//! assert!(agent.as_entity().is_some());
//!
//! // Materializing again is a no-op.
//! assert_eq!(value.clone().materialize(), value);
//! assert_eq!(value.to_json(), raw);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::rest::entity::Entity;
use crate::rest::filter::Record;

/// The JSON media type every reference carries.
pub const MEDIA_TYPE_JSON: &str = "application/json";

/// Identifies a server resource without embedding its body.
///
/// Extra keys the server puts in `meta` (`uuidHref`, `size`, ...) are kept
/// in `extra` and sent back unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Absolute URL of the resource.
    pub href: String,
    /// Entity type name, e.g. `customerorder`.
    #[serde(rename = "type", default)]
    pub entity_type: String,
    /// Media type of the resource body.
    #[serde(default = "default_media_type")]
    pub media_type: String,
    /// Absolute URL of the type's metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_href: Option<String>,
    /// Any further keys of the server's `meta` object.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_media_type() -> String {
    MEDIA_TYPE_JSON.to_string()
}

impl Reference {
    /// Creates a reference with the JSON media type and no metadata link.
    #[must_use]
    pub fn new(href: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            entity_type: entity_type.into(),
            media_type: default_media_type(),
            metadata_href: None,
            extra: Map::new(),
        }
    }

    /// Parses a reference out of a `meta` JSON object.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Returns the resource id: the last path segment of `href`.
    ///
    /// ```rust
    /// use moysklad_api::rest::Reference;
    ///
    /// let reference = Reference::new(
    ///     "https://api.moysklad.ru/api/remap/1.2/entity/counterparty/abc-123",
    ///     "counterparty",
    /// );
    /// assert_eq!(reference.id(), "abc-123");
    /// ```
    #[must_use]
    pub fn id(&self) -> &str {
        let path = self.href.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/').next().unwrap_or_default()
    }

    /// Returns the reference as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A materialized field value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FieldValue {
    /// JSON `null`.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// An ordered sequence.
    Array(Vec<FieldValue>),
    /// A plain object without its own `meta`.
    Object(Fields),
    /// An object carrying a `meta`, wrapped into an entity.
    Entity(Box<Entity>),
}

impl FieldValue {
    /// Wraps any still-plain object carrying a `meta` into an entity.
    ///
    /// Already materialized values are returned unchanged.
    #[must_use]
    pub fn materialize(self) -> Self {
        match self {
            Self::Array(items) => Self::Array(items.into_iter().map(Self::materialize).collect()),
            Self::Object(fields) => {
                if fields.get("meta").is_some_and(|m| m.to_json().is_object()) {
                    Self::from(Self::Object(fields).to_json())
                } else {
                    Self::Object(
                        fields
                            .into_iter()
                            .map(|(name, value)| (name, value.materialize()))
                            .collect(),
                    )
                }
            }
            other => other,
        }
    }

    /// Flattens the value back to plain JSON, nested entities included.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(fields) => fields.to_json(),
            Self::Entity(entity) => entity.to_json(),
        }
    }

    /// Returns `true` for [`FieldValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number as `f64`, if this is one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Returns the number as `i64`, if this is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Returns the items, if this is a sequence.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entity, if this is one.
    #[must_use]
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// Returns the entity mutably, if this is one.
    pub fn as_entity_mut(&mut self) -> Option<&mut Entity> {
        match self {
            Self::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// Returns a stored sub-field of an object or entity.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Object(fields) => fields.get(name),
            Self::Entity(entity) => entity.stored(name),
            _ => None,
        }
    }

    /// Stores a sub-field of an object or entity without dirty tracking.
    ///
    /// Returns `false` if this value has no fields.
    pub(crate) fn put(&mut self, name: &str, value: Self) -> bool {
        match self {
            Self::Object(fields) => {
                fields.insert(name, value);
                true
            }
            Self::Entity(entity) => {
                entity.put(name, value);
                true
            }
            _ => false,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                if map.get("meta").is_some_and(Value::is_object) {
                    match Entity::materialize(map) {
                        Ok(entity) => Self::Entity(Box::new(entity)),
                        Err(map) => Self::Object(Fields::from(map)),
                    }
                } else {
                    Self::Object(Fields::from(map))
                }
            }
        }
    }
}

impl From<Entity> for FieldValue {
    fn from(entity: Entity) -> Self {
        Self::Entity(Box::new(entity))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

impl<T: Into<Self>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl Record for FieldValue {
    fn filter_value(&self, field: &str) -> Option<Value> {
        match self {
            Self::Entity(entity) => entity.filter_value(field),
            other => other.field(field).map(Self::to_json),
        }
    }
}

/// An insertion-ordered map from field name to [`FieldValue`].
///
/// Replacing an existing field keeps its position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, FieldValue)>,
}

impl Fields {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Returns the value of `name` mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Returns `true` if `name` is stored.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Stores `value` under `name`, returning the previous value.
    pub fn insert(&mut self, name: &str, value: FieldValue) -> Option<FieldValue> {
        match self.get_mut(name) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name.to_string(), value));
                None
            }
        }
    }

    /// Removes `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Iterates field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Flattens the store to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter()
            .map(|(name, value)| (name, FieldValue::from(value)))
            .collect()
    }
}

impl FromIterator<(String, FieldValue)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (name, value) in iter {
            fields.insert(&name, value);
        }
        fields
    }
}

impl IntoIterator for Fields {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
