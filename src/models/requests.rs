//! Request DTOs for the gateway API
//!
//! Turns incoming query strings into resource requests.

use std::collections::HashMap;

use crate::config::Policy;
use crate::upstream::ResourceRequest;

/// Query parameter selecting the zero-based page
pub const PAGE_PARAM: &str = "page";

/// Query parameter selecting the page size
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// Query string of `GET /data/:resource`.
///
/// `page` and `page_size` select the page; every other parameter is a filter
/// passed to the backend verbatim.
#[derive(Debug, Clone, Default)]
pub struct DataQuery {
    pub params: HashMap<String, String>,
}

impl DataQuery {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Builds and validates the resource request.
    ///
    /// Returns an error message if the page parameters are not numbers or
    /// the resulting request is invalid.
    pub fn into_request(self, resource: &str, policy: &Policy) -> Result<ResourceRequest, String> {
        let page = parse_number(&self.params, PAGE_PARAM)?.unwrap_or(0);
        let page_size = parse_number(&self.params, PAGE_SIZE_PARAM)?;

        let request = self
            .params
            .into_iter()
            .filter(|(name, _)| name != PAGE_PARAM && name != PAGE_SIZE_PARAM)
            .fold(ResourceRequest::new(resource, policy), |request, (name, value)| {
                request.with_filter(name, value)
            })
            .with_page(page, page_size, policy);

        match request.validate() {
            Some(error_msg) => Err(error_msg),
            None => Ok(request),
        }
    }
}

fn parse_number(params: &HashMap<String, String>, name: &str) -> Result<Option<u32>, String> {
    params
        .get(name)
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|_| format!("'{}' must be a non-negative integer, got '{}'", name, raw))
        })
        .transpose()
}
