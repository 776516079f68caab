//! Collection request parameters and page URL rendering.
//!
//! [`CollectionRequest`] is what callers hand to collection operations:
//! filters, an optional `limit` and `offset`, and extra query parameters.
//! [`CollectionQuery`] binds a request to an absolute collection URL and
//! renders one URL per page:
//!
//! ```text
//! {url}?limit={n}&offset={n}[&{param}={value}]*[&filter={rendered}]
//! ```
//!
//! Parameter values are percent-encoded; the filter is emitted verbatim.

use crate::rest::filter::{render, FilterOperator, FilterPredicate, FilterValue};

/// A logical collection request.
///
/// `limit = None` means "everything the server reports".
///
/// # Example
///
/// ```rust
/// use moysklad_api::rest::{CollectionRequest, FilterOperator};
///
/// let request = CollectionRequest::new()
///     .filter("archived", FilterOperator::Eq, false)
///     .limit(50)
///     .expand("agent");
///
/// assert_eq!(request.get_limit(), Some(50));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectionRequest {
    filters: Vec<FilterPredicate>,
    limit: Option<usize>,
    offset: Option<usize>,
    params: Vec<(String, String)>,
}

impl CollectionRequest {
    /// Creates an empty request: no filters, no limit, offset 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter predicate.
    #[must_use]
    pub fn filter(
        mut self,
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        self.filters
            .push(FilterPredicate::new(field, operator, value));
        self
    }

    /// Replaces the filter predicates.
    #[must_use]
    pub fn filters(mut self, filters: Vec<FilterPredicate>) -> Self {
        self.filters = filters;
        self
    }

    /// Caps the number of rows returned.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the starting offset.
    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Adds an extra query parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Adds an extra query parameter when `value` is present.
    #[must_use]
    pub fn param_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    /// Adds an `expand` parameter.
    #[must_use]
    pub fn expand(self, path: impl Into<String>) -> Self {
        self.param("expand", path)
    }

    /// Returns the filter predicates.
    #[must_use]
    pub fn get_filters(&self) -> &[FilterPredicate] {
        &self.filters
    }

    /// Returns the requested limit.
    #[must_use]
    pub const fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns the requested offset.
    #[must_use]
    pub const fn get_offset(&self) -> Option<usize> {
        self.offset
    }

    /// Returns the extra query parameters.
    #[must_use]
    pub fn get_params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// A collection URL with its fixed parameters, ready to render pages.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionQuery {
    url: String,
    params: Vec<(String, String)>,
    filter: Option<String>,
}

impl CollectionQuery {
    /// Creates a query for an absolute collection URL with no parameters.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
            filter: None,
        }
    }

    /// Creates a query carrying the parameters and filters of `request`.
    #[must_use]
    pub fn from_request(url: impl Into<String>, request: &CollectionRequest) -> Self {
        let filter = if request.filters.is_empty() {
            None
        } else {
            Some(render(&request.filters))
        };
        Self {
            url: url.into(),
            params: request.params.clone(),
            filter,
        }
    }

    /// Returns the collection URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Renders the URL of the page starting at `offset` with `limit` rows.
    #[must_use]
    pub fn page_url(&self, limit: usize, offset: usize) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        let mut href = format!("{}{separator}limit={limit}&offset={offset}", self.url);
        for (name, value) in &self.params {
            href.push('&');
            href.push_str(name);
            href.push('=');
            href.push_str(&urlencoding::encode(value));
        }
        if let Some(filter) = &self.filter {
            href.push_str("&filter=");
            href.push_str(filter);
        }
        href
    }
}
