//! Paginated collection fetching.
//!
//! The server returns at most a per-endpoint maximum of rows per request, so
//! logical requests larger than that are split into consecutive pages. The
//! first response's `meta.size` decides how many rows to collect when the
//! caller set no limit.

use serde_json::Value;

use crate::clients::Transport;
use crate::rest::errors::ResourceError;
use crate::rest::query::CollectionQuery;

/// Collects rows from a paginated collection.
///
/// - `cap` is the server's per-request maximum.
/// - `limit = None` collects `meta.size - offset` rows.
/// - Every row goes through `materialize`; the first failure aborts.
///
/// Pages are requested while fewer rows than the target were collected and
/// the last page came back full. Never returns more than `limit` rows.
pub(crate) async fn resolve<T, R, F>(
    transport: &T,
    query: &CollectionQuery,
    cap: usize,
    limit: Option<usize>,
    offset: Option<usize>,
    mut materialize: F,
) -> Result<Vec<R>, ResourceError>
where
    T: Transport,
    F: FnMut(Value) -> Result<R, ResourceError>,
{
    let mut page = limit.map_or(cap, |limit| limit.min(cap));
    if page == 0 {
        return Ok(Vec::new());
    }

    let start = offset.unwrap_or(0);
    let mut offset = start;
    let mut expected = limit;
    let mut items = Vec::new();

    loop {
        let url = query.page_url(page, offset);
        tracing::debug!(url = %url, page, offset, "Fetching collection page");

        let response = transport.get(&url).await?;
        let Some(Value::Array(rows)) = response.get("rows") else {
            return Err(ResourceError::validation(format!(
                "collection response from '{}' has no 'rows' array",
                query.url()
            )));
        };

        let target = match expected {
            Some(target) => target,
            None => {
                let size = response
                    .get("meta")
                    .and_then(|meta| meta.get("size"))
                    .and_then(Value::as_u64)
                    .ok_or_else(|| {
                        ResourceError::validation(format!(
                            "collection response from '{}' has no 'meta.size'",
                            query.url()
                        ))
                    })?;
                let size = usize::try_from(size).unwrap_or(usize::MAX);
                let target = size.saturating_sub(start);
                expected = Some(target);
                target
            }
        };

        let received = rows.len();
        for row in rows.iter().cloned() {
            items.push(materialize(row)?);
        }

        offset += page;
        let remainder = target.saturating_sub(items.len());
        let requested = page;
        if remainder < page {
            page = remainder;
        }

        if page == 0 || items.len() >= target || received < requested {
            break;
        }
    }

    if let Some(target) = expected {
        items.truncate(target);
    }
    tracing::debug!(url = %query.url(), rows = items.len(), "Collection resolved");
    Ok(items)
}
