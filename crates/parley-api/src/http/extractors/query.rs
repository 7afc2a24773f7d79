//! Query parameter extractors for list endpoints.

use serde::Deserialize;

/// `?page=N` on paginated endpoints. A missing or non-numeric value means
/// the first page.
#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
        }
    }

    #[test]
    fn test_page_defaults_to_first() {
        assert_eq!(query(None).page(), 1);
        assert_eq!(query(Some("abc")).page(), 1);
        assert_eq!(query(Some("3")).page(), 3);
        // Out-of-range numbers pass through; the page comes back empty.
        assert_eq!(query(Some("-2")).page(), -2);
    }
}
