//! Pagination types for API responses
//!
//! Offset based: `?offset=40&pageSize=20`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 500;

/// Pagination parameters (from query string)
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default)]
    pub offset: i64,

    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            offset: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationParams {
    pub fn new(offset: i64, page_size: i64) -> Self {
        Self { offset, page_size }.normalized()
    }

    /// Clamp client supplied values into a usable window
    pub fn normalized(self) -> Self {
        Self {
            offset: self.offset.max(0),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// SQL limit
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// Paginated collection response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    #[serde(rename = "_type")]
    pub hal_type: String,

    /// Total count of items
    pub total: i64,

    /// Number of items in this page
    pub count: i64,

    pub page_size: i64,

    pub offset: i64,

    #[serde(rename = "_links")]
    pub links: PaginationLinks,

    #[serde(rename = "_embedded")]
    pub embedded: PaginatedEmbedded<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationLinks {
    #[serde(rename = "self")]
    pub self_link: LinkObject,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "previousByOffset")]
    pub previous: Option<LinkObject>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "nextByOffset")]
    pub next: Option<LinkObject>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LinkObject {
    pub href: String,
}

impl LinkObject {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedEmbedded<T> {
    pub elements: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: i64, params: &PaginationParams, base_url: &str) -> Self {
        let offset = params.offset;
        let page_size = params.page_size;
        let count = items.len() as i64;

        let href = |offset: i64| format!("{}?offset={}&pageSize={}", base_url, offset, page_size);

        let previous = (offset > 0).then(|| LinkObject::new(href((offset - page_size).max(0))));
        let next = (offset + count < total).then(|| LinkObject::new(href(offset + page_size)));

        Self {
            hal_type: "Collection".to_string(),
            total,
            count,
            page_size,
            offset,
            links: PaginationLinks {
                self_link: LinkObject::new(href(offset)),
                previous,
                next,
            },
            embedded: PaginatedEmbedded { elements: items },
        }
    }

    /// Unpaginated collection (every element on one page)
    pub fn all(items: Vec<T>, base_url: &str) -> Self {
        let total = items.len() as i64;
        let params = PaginationParams {
            offset: 0,
            page_size: total.max(1),
        };
        Self::new(items, total, &params, base_url)
    }
}
