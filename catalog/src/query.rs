//! Product listing queries
//!
//! The catalog API cannot combine a category with a free-text search, so a
//! [`ProductsQuery`] resolves to one of three endpoints and, when both were
//! requested, a search that has to be applied to the returned page locally.

use crate::types::{Product, ProductsResponse};
use reqwest::Url;
use std::fmt;

/// Sort direction for product listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl SortOrder {
    /// Wire value for the `sortOrder` parameter
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters for [`CatalogClient::get_products`](crate::CatalogClient::get_products)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductsQuery {
    /// Category slug; `"all"` means no category
    pub category: Option<String>,
    /// Free-text search
    pub q: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Page offset
    pub skip: Option<u32>,
    /// Field to sort by
    pub sort_by: Option<String>,
    /// Sort direction
    pub sort_order: Option<SortOrder>,
}

/// Endpoint and parameters a [`ProductsQuery`] maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    /// Unencoded path segments below the API root
    pub segments: Vec<String>,
    /// Query string parameters, in a stable order
    pub params: Vec<(&'static str, String)>,
    /// Search to apply to the returned products, if the endpoint could not
    pub client_filter: Option<String>,
}

impl ProductsQuery {
    /// An empty query (all products, server defaults)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a category
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Search titles and descriptions
    #[must_use]
    pub fn with_search(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the page offset
    #[must_use]
    pub const fn with_skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sort by a field
    #[must_use]
    pub fn with_sort(mut self, sort_by: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = Some(order);
        self
    }

    fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
    }

    fn search_term(&self) -> Option<&str> {
        self.q.as_deref().filter(|q| !q.is_empty())
    }

    /// Map the query onto an endpoint
    ///
    /// A category other than `all` takes precedence over the search endpoint.
    /// `limit` and `skip` are only sent when non-zero.
    #[must_use]
    pub fn resolve(&self) -> ResolvedQuery {
        let category = self.category_filter();
        let search = self.search_term();

        let segments: Vec<String> = match (category, search) {
            (Some(category), _) => vec!["products".into(), "category".into(), category.into()],
            (None, Some(_)) => vec!["products".into(), "search".into()],
            (None, None) => vec!["products".into()],
        };

        let mut params = Vec::new();
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            params.push(("limit", limit.to_string()));
        }
        if let Some(skip) = self.skip.filter(|s| *s > 0) {
            params.push(("skip", skip.to_string()));
        }
        if let (None, Some(q)) = (category, search) {
            params.push(("q", q.to_string()));
        }
        if let Some(sort_by) = self.sort_by.as_deref().filter(|s| !s.is_empty()) {
            params.push(("sortBy", sort_by.to_string()));
        }
        if let Some(order) = self.sort_order {
            params.push(("sortOrder", order.as_str().to_string()));
        }

        ResolvedQuery {
            segments,
            params,
            client_filter: category.and(search).map(str::to_lowercase),
        }
    }
}

impl ResolvedQuery {
    /// URL of the endpoint below `base`, without the query string
    #[must_use]
    pub fn url(&self, base: &Url) -> Url {
        endpoint(base, &self.segments)
    }

    /// Apply the local search, if any, and recount `total`
    #[must_use]
    pub fn apply(&self, mut response: ProductsResponse) -> ProductsResponse {
        if let Some(needle) = &self.client_filter {
            response.products.retain(|product| matches_text(product, needle));
            response.total = response.products.len() as u64;
        }
        response
    }
}

/// Append `segments` to `base`, percent-encoding each one
///
/// A `base` that cannot carry a path is returned unchanged; the client
/// refuses such URLs up front.
pub(crate) fn endpoint<S: AsRef<str>>(base: &Url, segments: &[S]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn matches_text(product: &Product, lowercase_needle: &str) -> bool {
    product.title.to_lowercase().contains(lowercase_needle)
        || product.description.to_lowercase().contains(lowercase_needle)
}
