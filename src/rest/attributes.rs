//! Custom attributes ("additional fields").
//!
//! Attribute values live in an entity's `attributes` array. Each element is
//! an attribute entity carrying its definition (`name`, `type`) and its
//! `value`. Attributes the entity does not carry yet are built from the
//! type's attribute definitions.

use crate::clients::Transport;
use crate::rest::client::MoyskladClient;
use crate::rest::entity::Entity;
use crate::rest::errors::ResourceError;
use crate::rest::field::FieldValue;

const ATTRIBUTES: &str = "attributes";

fn is_named(attribute: &FieldValue, name: &str) -> bool {
    attribute.field("name").and_then(FieldValue::as_str) == Some(name)
}

impl Entity {
    /// Returns the attribute values carried by this entity.
    #[must_use]
    pub fn additional_fields(&self) -> &[FieldValue] {
        self.stored(ATTRIBUTES)
            .and_then(FieldValue::as_array)
            .unwrap_or_default()
    }

    pub(crate) fn find_attribute(&self, name: &str) -> Option<&FieldValue> {
        self.additional_fields()
            .iter()
            .find(|attribute| is_named(attribute, name))
    }

    /// Returns the attribute `name`.
    ///
    /// If the entity does not carry it, the type's definition is returned
    /// with a `null` value.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if the type defines no such
    /// attribute, or a definitions fetch failure.
    pub async fn additional_field<T: Transport>(
        &self,
        client: &MoyskladClient<T>,
        name: &str,
    ) -> Result<FieldValue, ResourceError> {
        if let Some(attribute) = self.find_attribute(name) {
            return Ok(attribute.clone());
        }
        let mut attribute = self.attribute_definition(client, name).await?;
        attribute.put("value", FieldValue::Null);
        Ok(attribute)
    }

    /// Assigns the value of attribute `name` and marks `attributes` changed.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if the entity does not carry the
    /// attribute and the type defines no such attribute.
    pub async fn set_additional_field<T: Transport>(
        &mut self,
        client: &MoyskladClient<T>,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), ResourceError> {
        let value: FieldValue = value.into();
        let value = value.materialize();

        if self.find_attribute(name).is_none() {
            let mut attribute = self.attribute_definition(client, name).await?;
            attribute.put("value", value);
            self.push_attribute(attribute);
        } else if let Some(FieldValue::Array(items)) = self.fields_mut().get_mut(ATTRIBUTES) {
            if let Some(attribute) = items.iter_mut().find(|a| is_named(a, name)) {
                attribute.put("value", value);
            }
        }

        self.dirty_mut().mark(ATTRIBUTES);
        Ok(())
    }

    fn push_attribute(&mut self, attribute: FieldValue) {
        match self.fields_mut().get_mut(ATTRIBUTES) {
            Some(FieldValue::Array(items)) => items.push(attribute),
            _ => self.put(ATTRIBUTES, FieldValue::Array(vec![attribute])),
        }
    }

    async fn attribute_definition<T: Transport>(
        &self,
        client: &MoyskladClient<T>,
        name: &str,
    ) -> Result<FieldValue, ResourceError> {
        client
            .get_attribute_definitions(self.entity_type())
            .await?
            .into_iter()
            .find(|definition| definition.stored("name").and_then(FieldValue::as_str) == Some(name))
            .map(FieldValue::from)
            .ok_or_else(|| ResourceError::not_found("additional field", name))
    }
}
