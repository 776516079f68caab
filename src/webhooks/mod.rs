//! Webhook management.
//!
//! Webhooks live in the `entity/webhook` collection. Each one notifies a
//! URL about one action on one entity type. The operations here are
//! idempotent per URL: [`add_webhooks`](MoyskladClient::add_webhooks) only
//! creates subscriptions that are missing, and
//! [`delete_webhooks`](MoyskladClient::delete_webhooks) only deletes ones
//! that exist.
//!
//! Requests to webhook endpoints are never paced faster than
//! [`MIN_WEBHOOK_DELAY`](crate::clients::MIN_WEBHOOK_DELAY) by
//! [`HttpTransport`](crate::clients::HttpTransport).
//!
//! # Example
//!
//! ```rust,no_run
//! use moysklad_api::MoyskladClient;
//! use moysklad_api::webhooks::WebhookSubscription;
//!
//! # async fn example(client: MoyskladClient) -> Result<(), moysklad_api::rest::ResourceError> {
//! let subscriptions = [
//!     "customerorder.create".parse::<WebhookSubscription>()?,
//!     "customerorder.update".parse::<WebhookSubscription>()?,
//! ];
//!
//! let created = client
//!     .add_webhooks(&subscriptions, "https://example.com/hooks")
//!     .await?;
//! println!("created {} webhooks", created.len());
//! # Ok(())
//! # }
//! ```

mod types;

pub use types::{WebhookAction, WebhookSubscription};

use serde_json::json;

use crate::clients::Transport;
use crate::rest::{CollectionRequest, Entity, FilterOperator, FilterPredicate, MoyskladClient, ResourceError};

const WEBHOOK_ENDPOINT: &str = "entity/webhook";

impl<T: Transport> MoyskladClient<T> {
    /// Lists webhooks, keeping those that match every predicate.
    ///
    /// # Errors
    ///
    /// See [`MoyskladClient::get_collection`].
    pub async fn get_webhooks(
        &self,
        filters: &[FilterPredicate],
    ) -> Result<Vec<Entity>, ResourceError> {
        let webhooks = self
            .get_collection(WEBHOOK_ENDPOINT, &CollectionRequest::new())
            .await?;
        Ok(self.filter(webhooks, filters))
    }

    /// Fetches one webhook by id.
    ///
    /// # Errors
    ///
    /// See [`MoyskladClient::get_entity_by_href`].
    pub async fn get_webhook(&self, id: &str) -> Result<Entity, ResourceError> {
        let href = self.base_url().join(&format!("{WEBHOOK_ENDPOINT}/{id}"));
        self.get_entity_by_href(&href, None).await
    }

    /// Subscribes `url` to each subscription it is not subscribed to yet.
    ///
    /// Returns the created webhooks.
    ///
    /// # Errors
    ///
    /// Returns the first failure; webhooks created before it stay created.
    pub async fn add_webhooks(
        &self,
        subscriptions: &[WebhookSubscription],
        url: &str,
    ) -> Result<Vec<Entity>, ResourceError> {
        let existing = self.webhooks_for(url).await?;
        let endpoint = self.base_url().join(WEBHOOK_ENDPOINT);

        let mut created = Vec::new();
        for subscription in subscriptions {
            if existing.iter().any(|hook| subscription.matches(hook)) {
                tracing::debug!(%subscription, url, "Webhook already exists");
                continue;
            }
            let body = json!({
                "url": url,
                "action": subscription.action.as_str(),
                "entityType": subscription.entity_type,
            });
            tracing::debug!(%subscription, url, "Creating webhook");
            let response = self.transport().post(&endpoint, body).await?;
            created.push(Entity::from_json(response)?);
        }
        Ok(created)
    }

    /// Deletes the webhooks of `url` matching `subscriptions`.
    ///
    /// Returns the number of webhooks deleted.
    ///
    /// # Errors
    ///
    /// Returns the first failure; webhooks deleted before it stay deleted.
    pub async fn delete_webhooks(
        &self,
        subscriptions: &[WebhookSubscription],
        url: &str,
    ) -> Result<usize, ResourceError> {
        let existing = self.webhooks_for(url).await?;

        let mut deleted = 0;
        for subscription in subscriptions {
            let Some(hook) = existing.iter().find(|hook| subscription.matches(hook)) else {
                continue;
            };
            tracing::debug!(%subscription, url, "Deleting webhook");
            hook.remove(self).await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    async fn webhooks_for(&self, url: &str) -> Result<Vec<Entity>, ResourceError> {
        self.get_webhooks(&[FilterPredicate::new("url", FilterOperator::Eq, url)])
            .await
    }
}
