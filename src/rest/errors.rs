//! Error types for entity and collection operations.
//!
//! Every operation of the resource layer returns [`ResourceError`]. The
//! variants follow the failure kinds callers need to tell apart:
//!
//! - [`ResourceError::Validation`]: malformed server data or a missing required field
//! - [`ResourceError::ReadOnly`]: a write to a protected field of a hydrated entity
//! - [`ResourceError::NotFound`]: an unknown field, attribute, state or metadata entry
//! - [`ResourceError::NotSupported`]: an operation invalid for the entity's state,
//!   or an unrecognized enum value
//! - [`ResourceError::BadResponse`]: a non-2xx answer, carrying the server's messages
//! - [`ResourceError::Http`]: network failures, exhausted retries, malformed requests
//!
//! # Example
//!
//! ```rust,ignore
//! use moysklad_api::rest::ResourceError;
//!
//! match client.get_entity_by_id("product", "abc", None).await {
//!     Ok(product) => println!("Found: {:?}", product.get("name")),
//!     Err(ResourceError::BadResponse(e)) => {
//!         println!("Server said ({}): {e}", e.code);
//!     }
//!     Err(e) => println!("Other error: {e}"),
//! }
//! ```

use thiserror::Error;

use crate::clients::{HttpError, HttpResponseError};

/// Error type for entity and collection operations.
///
/// # Example
///
/// ```rust
/// use moysklad_api::rest::ResourceError;
///
/// let error = ResourceError::ReadOnly {
///     field: "id".to_string(),
/// };
/// assert!(error.to_string().contains("'id'"));
///
/// let error = ResourceError::NotFound {
///     kind: "state",
///     name: "Shipped".to_string(),
/// };
/// assert!(error.is_not_found());
/// ```
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Server data or a request body failed validation.
    #[error("Validation failed: {reason}")]
    Validation {
        /// What was wrong.
        reason: String,
    },

    /// A read-only field was assigned on a hydrated entity.
    #[error("Field '{field}' is read-only")]
    ReadOnly {
        /// The protected field name.
        field: String,
    },

    /// A field, attribute, state or metadata entry does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// What was looked up (e.g. "field", "state", "employee").
        kind: &'static str,
        /// The name, id or criteria that matched nothing.
        name: String,
    },

    /// The operation is not valid in the current state, or a value is not
    /// one of the recognized options.
    #[error("Not supported: {reason}")]
    NotSupported {
        /// Why the operation was refused.
        reason: String,
    },

    /// The service answered with a non-2xx status.
    #[error(transparent)]
    BadResponse(#[from] HttpResponseError),

    /// A transport-level failure other than an error response.
    #[error(transparent)]
    Http(HttpError),
}

impl ResourceError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub(crate) fn not_supported(reason: impl Into<String>) -> Self {
        Self::NotSupported {
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Returns `true` for [`ResourceError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`ResourceError::BadResponse`].
    #[must_use]
    pub const fn is_bad_response(&self) -> bool {
        matches!(self, Self::BadResponse(_))
    }

    /// Returns the request ID reported by the server, if available.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::BadResponse(e) => e.error_reference.as_deref(),
            Self::Http(HttpError::MaxRetries(e)) => e.error_reference.as_deref(),
            _ => None,
        }
    }
}

impl From<HttpError> for ResourceError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Response(e) => Self::BadResponse(e),
            other => Self::Http(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{InvalidHttpRequestError, MaxHttpRetriesExceededError};

    #[test]
    fn test_http_response_errors_become_bad_response() {
        let error: ResourceError = HttpError::Response(HttpResponseError {
            code: 412,
            messages: vec!["first".to_string(), "second".to_string()],
            error_reference: Some("req-9".to_string()),
        })
        .into();

        assert!(error.is_bad_response());
        assert_eq!(error.to_string(), "first; second");
        assert_eq!(error.request_id(), Some("req-9"));
    }

    #[test]
    fn test_other_http_errors_stay_http() {
        let error: ResourceError = HttpError::InvalidRequest(InvalidHttpRequestError::MissingBody {
            method: "put".to_string(),
        })
        .into();
        assert!(matches!(error, ResourceError::Http(_)));
        assert!(!error.is_bad_response());

        let error: ResourceError = HttpError::MaxRetries(MaxHttpRetriesExceededError {
            code: 429,
            tries: 2,
            messages: vec![],
            error_reference: Some("req-1".to_string()),
        })
        .into();
        assert_eq!(error.request_id(), Some("req-1"));
    }

    #[test]
    fn test_messages_name_the_offender() {
        assert_eq!(
            ResourceError::not_found("field", "colour").to_string(),
            "field 'colour' not found"
        );
        assert!(ResourceError::validation("'meta' field is required")
            .to_string()
            .contains("'meta'"));
        assert!(ResourceError::not_supported("unknown operator '<>'")
            .to_string()
            .contains("<>"));
    }
}
