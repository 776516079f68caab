//! Link traversal.
//!
//! Collects entities of one type referenced from another entity's fields,
//! optionally following references through the server up to a depth.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::clients::Transport;
use crate::rest::client::MoyskladClient;
use crate::rest::entity::{Entity, STRUCTURAL_FIELDS};
use crate::rest::errors::ResourceError;
use crate::rest::field::FieldValue;

/// An entity whose fields are being scanned, resuming at field `next`.
struct Frame<'a> {
    entity: Cow<'a, Entity>,
    depth: Option<u32>,
    next: usize,
}

impl<'a> Frame<'a> {
    const fn new(entity: Cow<'a, Entity>, depth: Option<u32>) -> Self {
        Self {
            entity,
            depth,
            next: 0,
        }
    }
}

/// Links a scan stopped at to fetch and descend into.
struct Descent {
    resume_at: usize,
    depth: u32,
    hrefs: Vec<String>,
}

/// Returns the entities a field links to: the entity itself for a
/// single-entity field, the entity elements of an array whose first element
/// is an entity, nothing otherwise.
fn linked(value: &FieldValue) -> Vec<&Entity> {
    match value {
        FieldValue::Entity(entity) => vec![entity.as_ref()],
        FieldValue::Array(items) if items.first().and_then(FieldValue::as_entity).is_some() => {
            items.iter().filter_map(FieldValue::as_entity).collect()
        }
        _ => Vec::new(),
    }
}

impl Entity {
    /// Collects entities of `search_type` linked from this entity's fields.
    ///
    /// Fields are scanned in order; `attributes`, `positions` and `files`
    /// are skipped. With `recursive = Some(n)` and `n > 0`, every linked
    /// entity is fetched (with `expand`) and scanned with depth `n - 1`
    /// before the scan moves on to the next field. Each href is fetched at
    /// most once per call.
    ///
    /// The result never holds more than `limit` entities; `limit == 0`
    /// returns immediately without requests.
    ///
    /// # Errors
    ///
    /// Returns the first fetch failure; no partial result is returned.
    pub async fn get_linked_entities<T: Transport>(
        &self,
        client: &MoyskladClient<T>,
        search_type: &str,
        recursive: Option<u32>,
        limit: usize,
        expand: Option<&str>,
    ) -> Result<Vec<Self>, ResourceError> {
        let mut found = Vec::new();
        if limit == 0 {
            return Ok(found);
        }

        let mut visited: HashSet<String> = self
            .reference()
            .map(|reference| reference.href.clone())
            .into_iter()
            .collect();
        let mut stack = vec![Frame::new(Cow::Borrowed(self), recursive)];

        while let Some(mut frame) = stack.pop() {
            let mut descent = None;

            for (index, (name, value)) in frame.entity.fields().enumerate().skip(frame.next) {
                if STRUCTURAL_FIELDS.contains(&name) {
                    continue;
                }
                let targets = linked(value);
                let Some(first) = targets.first() else {
                    continue;
                };

                if first.entity_type() == search_type {
                    let take = targets.len().min(limit - found.len());
                    found.extend(targets[..take].iter().map(|e| (*e).clone()));
                    if found.len() == limit {
                        return Ok(found);
                    }
                }

                let Some(depth) = frame.depth.filter(|depth| *depth > 0) else {
                    continue;
                };

                let mut hrefs = Vec::new();
                for reference in targets.iter().filter_map(|e| e.reference()) {
                    if visited.insert(reference.href.clone()) {
                        hrefs.push(reference.href.clone());
                    } else {
                        tracing::warn!(href = %reference.href, "Skipping already visited entity");
                    }
                }
                if hrefs.is_empty() {
                    continue;
                }

                tracing::debug!(field = name, count = hrefs.len(), depth, "Following links");
                descent = Some(Descent {
                    resume_at: index + 1,
                    depth: depth - 1,
                    hrefs,
                });
                break;
            }

            let Some(descent) = descent else {
                continue;
            };
            let children = client.get_entities_by_href(&descent.hrefs, expand).await?;

            frame.next = descent.resume_at;
            stack.push(frame);
            stack.extend(
                children
                    .into_iter()
                    .rev()
                    .map(|child| Frame::new(Cow::Owned(child), Some(descent.depth))),
            );
        }
        Ok(found)
    }
}
