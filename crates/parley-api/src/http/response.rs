//! Envelope response format for all API responses.
//!
//! Every response is wrapped in a consistent envelope:
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 },
//!   "errors": [],
//!   "_links": { "self": "..." }
//! }
//! ```

use std::collections::HashMap;

use serde::Serialize;

use parley_core::pagination::Page;

/// Envelope response wrapping all API data.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// The main response payload.
    pub data: Option<T>,

    /// Request metadata.
    pub meta: ApiMeta,

    /// Error list (empty on success).
    pub errors: Vec<ApiErrorDetail>,

    /// Navigation links.
    #[serde(rename = "_links", skip_serializing_if = "HashMap::is_empty")]
    pub links: HashMap<String, String>,
}

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ApiMeta {
    /// Unique request identifier for tracing.
    pub request_id: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
    /// Response time in milliseconds.
    pub response_time_ms: u64,
}

/// Individual error detail.
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response with data.
    pub fn success(data: T, request_id: String, response_time_ms: u64) -> Self {
        Self {
            data: Some(data),
            meta: ApiMeta {
                request_id,
                timestamp: chrono::Utc::now().to_rfc3339(),
                response_time_ms,
            },
            errors: Vec::new(),
            links: HashMap::new(),
        }
    }

    /// Add a link.
    pub fn with_link(mut self, rel: &str, href: &str) -> Self {
        self.links.insert(rel.to_string(), href.to_string());
        self
    }
}

impl<T: Serialize> ApiResponse<Page<T>> {
    /// Wrap a page, linking `self` and, where they exist, the neighbouring
    /// pages of `base`.
    pub fn page(page: Page<T>, base: &str, request_id: String, response_time_ms: u64) -> Self {
        let current = format!("{base}?page={}", page.page);
        let next = page.next_page().map(|n| format!("{base}?page={n}"));
        let previous = page.prev_page().map(|p| format!("{base}?page={p}"));

        let mut resp = Self::success(page, request_id, response_time_ms).with_link("self", &current);
        if let Some(href) = next {
            resp = resp.with_link("next", &href);
        }
        if let Some(href) = previous {
            resp = resp.with_link("previous", &href);
        }
        resp
    }
}

impl ApiResponse<()> {
    /// Create an error response (no data).
    pub fn error(code: &str, message: &str, request_id: String, response_time_ms: u64) -> Self {
        Self {
            data: None,
            meta: ApiMeta {
                request_id,
                timestamp: chrono::Utc::now().to_rfc3339(),
                response_time_ms,
            },
            errors: vec![ApiErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
            }],
            links: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use parley_core::pagination::PageWindow;

    use super::*;

    fn page(number: i64, total: u64) -> Page<u32> {
        Page::new(vec![1, 2], PageWindow::new(number, 2), total)
    }

    #[test]
    fn test_success_envelope_shape() {
        let resp = ApiResponse::success("hi", "req-1".to_string(), 3).with_link("self", "/x");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["data"], "hi");
        assert_eq!(json["meta"]["request_id"], "req-1");
        assert_eq!(json["errors"], serde_json::json!([]));
        assert_eq!(json["_links"]["self"], "/x");
    }

    #[test]
    fn test_error_envelope_has_null_data() {
        let resp = ApiResponse::error("NOT_FOUND", "gone", "req-2".to_string(), 0);
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json["data"].is_null());
        assert_eq!(json["errors"][0]["code"], "NOT_FOUND");
        assert!(json.get("_links").is_none());
    }

    #[test]
    fn test_page_links_only_when_neighbours_exist() {
        let first = ApiResponse::page(page(1, 6), "/api/v1/users", String::new(), 0);
        assert_eq!(first.links["next"], "/api/v1/users?page=2");
        assert!(!first.links.contains_key("previous"));

        let middle = ApiResponse::page(page(2, 6), "/api/v1/users", String::new(), 0);
        assert_eq!(middle.links["next"], "/api/v1/users?page=3");
        assert_eq!(middle.links["previous"], "/api/v1/users?page=1");

        let last = ApiResponse::page(page(3, 6), "/api/v1/users", String::new(), 0);
        assert!(!last.links.contains_key("next"));
        assert_eq!(last.links["self"], "/api/v1/users?page=3");
    }
}
