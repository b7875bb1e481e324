//! List view query state: pagination + filters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 15;

/// One filter widget's submitted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(i64),
    Flag(bool),
}

impl FilterValue {
    pub fn as_param(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Flag(b) => b.to_string(),
        }
    }
}

/// Current list view state. Mutated only by the orchestrator in response
/// to pagination or filter-submit events; the store adapter reads it to
/// build the next fetch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryState {
    /// 1-based page number.
    #[serde(rename = "pageNo")]
    pub page_no: u64,
    #[serde(rename = "pageSize")]
    pub page_size: u64,
    #[serde(flatten)]
    pub filters: BTreeMap<String, FilterValue>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page_no: 1,
            page_size: DEFAULT_PAGE_SIZE,
            filters: BTreeMap::new(),
        }
    }
}

impl QueryState {
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Set or clear one filter; submitting a filter always returns the
    /// view to the first page.
    pub fn apply_filter(&mut self, key: impl Into<String>, value: Option<FilterValue>) {
        let key = key.into();
        match value {
            Some(FilterValue::Text(s)) if s.trim().is_empty() => {
                self.filters.remove(&key);
            }
            Some(v) => {
                self.filters.insert(key, v);
            }
            None => {
                self.filters.remove(&key);
            }
        }
        self.page_no = 1;
    }

    pub fn filter_text(&self, key: &str) -> Option<&str> {
        match self.filters.get(key) {
            Some(FilterValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn active_filter_count(&self) -> usize {
        self.filters.len()
    }

    pub fn set_page(&mut self, page_no: u64) {
        self.page_no = page_no.max(1);
    }

    /// Changing the page size restarts from the first page.
    pub fn set_page_size(&mut self, page_size: u64) {
        self.page_size = page_size.max(1);
        self.page_no = 1;
    }

    pub fn reset_to_first_page(&mut self) {
        self.page_no = 1;
    }

    /// After a delete, step back one page when the current page just
    /// became empty (`remaining` rows left on it) so the view never
    /// shows an empty page with data before it.
    pub fn step_back_if_empty(&mut self, remaining: usize) {
        if remaining == 0 && self.page_no > 1 {
            self.page_no -= 1;
        }
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        (total + self.page_size - 1) / self.page_size
    }

    /// Flat request parameters, ready for query-string encoding.
    pub fn to_param_map(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("pageNo".to_string(), self.page_no.to_string());
        params.insert("pageSize".to_string(), self.page_size.to_string());
        for (key, value) in &self.filters {
            params.insert(key.clone(), value.as_param());
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_submit_resets_page() {
        let mut query = QueryState::default();
        query.set_page(4);
        query.apply_filter("q", Some(FilterValue::Text("cert".into())));
        assert_eq!(query.page_no, 1);
        assert_eq!(query.filter_text("q"), Some("cert"));
    }

    #[test]
    fn test_blank_filter_is_cleared() {
        let mut query = QueryState::default();
        query.apply_filter("q", Some(FilterValue::Text("x".into())));
        query.apply_filter("q", Some(FilterValue::Text("  ".into())));
        assert_eq!(query.active_filter_count(), 0);
    }

    #[test]
    fn test_step_back_on_empty_page() {
        let mut query = QueryState::default();
        query.set_page(3);
        query.step_back_if_empty(0);
        assert_eq!(query.page_no, 2);

        // non-empty page stays put
        query.step_back_if_empty(5);
        assert_eq!(query.page_no, 2);

        // first page never steps back
        query.set_page(1);
        query.step_back_if_empty(0);
        assert_eq!(query.page_no, 1);
    }

    #[test]
    fn test_total_pages() {
        let query = QueryState::new(15);
        assert_eq!(query.total_pages(0), 0);
        assert_eq!(query.total_pages(15), 1);
        assert_eq!(query.total_pages(16), 2);
    }

    #[test]
    fn test_param_map_contains_pagination_and_filters() {
        let mut query = QueryState::default();
        query.apply_filter("q", Some(FilterValue::Text("ios".into())));
        let params = query.to_param_map();
        assert_eq!(params.get("pageNo"), Some(&"1".to_string()));
        assert_eq!(params.get("pageSize"), Some(&"15".to_string()));
        assert_eq!(params.get("q"), Some(&"ios".to_string()));
    }

    #[test]
    fn test_query_state_serializes_flat() {
        let mut query = QueryState::default();
        query.apply_filter("q", Some(FilterValue::Text("ios".into())));
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"pageNo": 1, "pageSize": 15, "q": "ios"})
        );
    }
}
