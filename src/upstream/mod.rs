//! Upstream Module
//!
//! Boundary to the hosted backend: what a request for a resource looks like,
//! how it is fingerprinted for the cache, and the trait the governor calls to
//! actually fetch it.

mod http;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Policy;
use crate::error::Result;

pub use http::HttpUpstream;

/// Query parameter names the gateway sets itself
pub const RESERVED_PARAMS: [&str; 2] = ["limit", "offset"];

/// Longest accepted resource name
pub const MAX_RESOURCE_LENGTH: usize = 64;

// == Upstream Trait ==
/// Something that can fetch a resource page from the hosted backend.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, request: &ResourceRequest) -> Result<Value>;
}

// == Resource Request ==
/// One page of one resource, optionally filtered.
///
/// Filter values are handed to the backend verbatim; their syntax is the
/// backend's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    /// Table or view name
    pub resource: String,
    /// Filters, sorted by name
    pub filters: BTreeMap<String, String>,
    /// Zero-based page index
    pub page: u32,
    /// Rows per page, already clamped by the policy
    pub page_size: u32,
}

impl ResourceRequest {
    /// First page of `resource` at the policy's default page size.
    pub fn new(resource: impl Into<String>, policy: &Policy) -> Self {
        Self {
            resource: resource.into(),
            filters: BTreeMap::new(),
            page: 0,
            page_size: clamp_page_size(None, policy),
        }
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }

    /// Selects a page. A missing size means the default; any size is capped
    /// at `max_page_size` and raised to at least 1.
    pub fn with_page(mut self, page: u32, page_size: Option<u32>, policy: &Policy) -> Self {
        self.page = page;
        self.page_size = clamp_page_size(page_size, policy);
        self
    }

    /// Row offset of the selected page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }

    /// Validates the request.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.resource.is_empty() {
            return Some("Resource cannot be empty".to_string());
        }
        if self.resource.len() > MAX_RESOURCE_LENGTH {
            return Some(format!(
                "Resource exceeds maximum length of {} characters",
                MAX_RESOURCE_LENGTH
            ));
        }
        if !self
            .resource
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Some(format!("Invalid resource name '{}'", self.resource));
        }
        if let Some(name) = self
            .filters
            .keys()
            .find(|name| RESERVED_PARAMS.contains(&name.as_str()))
        {
            return Some(format!("Filter name '{}' is reserved", name));
        }
        None
    }

    // == Fingerprint ==
    /// Stable cache key for this request:
    /// `resource?f1=v1&f2=v2&limit=N&offset=M`, filters in name order.
    ///
    /// Every fingerprint of a resource starts with [`resource_prefix`].
    pub fn fingerprint(&self) -> String {
        let mut key = resource_prefix(&self.resource);
        for (name, value) in &self.filters {
            key.push_str(&escape(name));
            key.push('=');
            key.push_str(&escape(value));
            key.push('&');
        }
        key.push_str(&format!("limit={}&offset={}", self.page_size, self.offset()));
        key
    }

    /// Filters plus paging as backend query parameters.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        pairs.push(("limit".to_string(), self.page_size.to_string()));
        pairs.push(("offset".to_string(), self.offset().to_string()));
        pairs
    }
}

/// Prefix shared by every fingerprint of `resource`.
pub fn resource_prefix(resource: &str) -> String {
    format!("{}?", resource)
}

fn clamp_page_size(requested: Option<u32>, policy: &Policy) -> u32 {
    requested
        .unwrap_or(policy.default_page_size)
        .min(policy.max_page_size)
        .max(1)
}

/// Keeps `&` and `=` inside names and values from forging another key.
fn escape(raw: &str) -> String {
    raw.replace('%', "%25")
        .replace('&', "%26")
        .replace('=', "%3D")
}
