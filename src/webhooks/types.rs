//! Webhook subscription types.
//!
//! A subscription is written `"{entityType}.{action}"`, e.g.
//! `"customerorder.create"`. The action is case-insensitive locally and
//! upper-cased on the wire.
//!
//! # Example
//!
//! ```rust
//! use moysklad_api::webhooks::{WebhookAction, WebhookSubscription};
//!
//! let subscription: WebhookSubscription = "customerorder.create".parse().unwrap();
//!
//! assert_eq!(subscription.entity_type, "customerorder");
//! assert_eq!(subscription.action, WebhookAction::Create);
//! assert_eq!(subscription.to_string(), "customerorder.CREATE");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::rest::ResourceError;

/// The event a webhook fires on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WebhookAction {
    /// The entity was created.
    Create,
    /// The entity was updated.
    Update,
    /// The entity was deleted.
    Delete,
    /// An asynchronous task finished processing.
    Processed,
}

impl WebhookAction {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Processed => "PROCESSED",
        }
    }
}

impl fmt::Display for WebhookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookAction {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "PROCESSED" => Ok(Self::Processed),
            _ => Err(ResourceError::not_supported(format!(
                "unknown webhook action '{s}'"
            ))),
        }
    }
}

/// An entity type and action pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WebhookSubscription {
    /// The entity type, e.g. `customerorder`.
    pub entity_type: String,
    /// The action.
    pub action: WebhookAction,
}

impl WebhookSubscription {
    /// Creates a subscription.
    #[must_use]
    pub fn new(entity_type: impl Into<String>, action: WebhookAction) -> Self {
        Self {
            entity_type: entity_type.into(),
            action,
        }
    }

    /// Returns `true` if the server-side webhook `hook` has this entity type
    /// and action.
    pub(crate) fn matches(&self, hook: &crate::rest::Entity) -> bool {
        let text = |name| hook.stored(name).and_then(crate::rest::FieldValue::as_str);
        text("entityType") == Some(self.entity_type.as_str())
            && text("action") == Some(self.action.as_str())
    }
}

impl fmt::Display for WebhookSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity_type, self.action)
    }
}

impl FromStr for WebhookSubscription {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || {
            ResourceError::not_supported(format!(
                "webhook subscription '{s}' is not of the form 'entityType.action'"
            ))
        };
        let (entity_type, action) = s.split_once('.').ok_or_else(malformed)?;
        if entity_type.is_empty() || action.contains('.') {
            return Err(malformed());
        }
        Ok(Self::new(entity_type, action.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parsing_is_case_insensitive() {
        assert_eq!("update".parse::<WebhookAction>().unwrap(), WebhookAction::Update);
        assert_eq!("Processed".parse::<WebhookAction>().unwrap(), WebhookAction::Processed);
        assert!(matches!(
            "archive".parse::<WebhookAction>(),
            Err(ResourceError::NotSupported { .. })
        ));
    }

    #[test]
    fn test_subscription_parsing() {
        let subscription: WebhookSubscription = "product.DELETE".parse().unwrap();
        assert_eq!(subscription, WebhookSubscription::new("product", WebhookAction::Delete));
    }

    #[test]
    fn test_malformed_subscriptions_are_rejected() {
        for raw in ["product", ".create", "product.create.extra", "product.remove"] {
            assert!(
                matches!(
                    raw.parse::<WebhookSubscription>(),
                    Err(ResourceError::NotSupported { .. })
                ),
                "{raw} should be rejected"
            );
        }
    }
}
