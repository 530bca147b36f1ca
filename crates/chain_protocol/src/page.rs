//! The list endpoint envelope.

use crate::query::Query;
use serde::{Deserialize, Serialize};

/// One page of a list endpoint's result set.
///
/// `next` is the query to send for the following page; the client only takes
/// the cursor from it. `last_page` is set when the server has nothing after
/// this page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, in server order.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Query for the next page.
    #[serde(default)]
    pub next: Query,
    /// Whether this is the final page.
    #[serde(default)]
    pub last_page: bool,
}

impl<T> Page<T> {
    /// Creates a page.
    pub fn new(items: Vec<T>, next: Query, last_page: bool) -> Self {
        Self {
            items,
            next,
            last_page,
        }
    }

    /// Creates the empty final page returned once a result set is exhausted.
    pub fn exhausted() -> Self {
        Self::new(Vec::new(), Query::new(), true)
    }

    /// Returns the cursor for the next page, if any.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next.cursor()
    }

    /// Returns the number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_envelope() {
        let page: Page<String> = serde_json::from_value(json!({
            "items": ["a", "b"],
            "next": {"filter": "alias=$1", "after": "2"},
            "last_page": false
        }))
        .unwrap();

        assert_eq!(page.items, vec!["a", "b"]);
        assert_eq!(page.next_cursor(), Some("2"));
        assert!(!page.last_page);
    }

    #[test]
    fn missing_fields_default() {
        let page: Page<String> = serde_json::from_value(json!({})).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.next_cursor(), None);
        assert!(!page.last_page);
    }

    #[test]
    fn exhausted_page() {
        let page: Page<u8> = Page::exhausted();
        assert!(page.is_empty());
        assert!(page.last_page);
    }
}
