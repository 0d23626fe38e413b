//! User-controlled query state and its transitions
//!
//! `QueryState` is the single source of truth for what subset and order of
//! rows the table shows. Every mutation goes through a transition method
//! that reports which derived views (row page, chart) it invalidated.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Sort direction for a row query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }

    fn flipped(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

/// Which derived views a state transition invalidated
///
/// The row page depends on the full state; the chart depends only on
/// `filters` and `search`, so pagination and sort changes leave it alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refresh {
    pub rows: bool,
    pub chart: bool,
}

impl Refresh {
    pub const ROWS: Refresh = Refresh { rows: true, chart: false };
    pub const BOTH: Refresh = Refresh { rows: true, chart: true };
}

/// Pagination, sort, search, and per-column filter state
///
/// Invariants: `page >= 1`, `page_size >= 1`, and `filters` never holds an
/// entry with an empty value. All mutation goes through the transition
/// methods below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    page: u32,
    page_size: u32,
    sort_by: Option<String>,
    sort_dir: SortDir,
    search: String,
    filters: IndexMap<String, String>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
            sort_by: None,
            sort_dir: SortDir::Asc,
            search: String::new(),
            filters: IndexMap::new(),
        }
    }
}

impl QueryState {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    pub fn sort_dir(&self) -> SortDir {
        self.sort_dir
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &IndexMap<String, String> {
        &self.filters
    }

    /// True when neither a search term nor any column filter is active.
    pub fn is_unfiltered(&self) -> bool {
        self.search.is_empty() && self.filters.is_empty()
    }

    /// Jump to a page. Clamped to 1; filters and search are untouched.
    pub fn set_page(&mut self, page: u32) -> Refresh {
        self.page = page.max(1);
        Refresh::ROWS
    }

    /// Change the number of rows per page. Resets to page 1.
    pub fn set_page_size(&mut self, page_size: u32) -> Refresh {
        self.page_size = page_size.max(1);
        self.page = 1;
        Refresh::ROWS
    }

    /// Sort by a column, flipping direction when it is already the sort key.
    ///
    /// The current page position is kept; the caller re-fetches that page
    /// under the new order.
    pub fn set_sort(&mut self, column: &str) -> Refresh {
        if self.sort_by.as_deref() == Some(column) {
            self.sort_dir = self.sort_dir.flipped();
        } else {
            self.sort_by = Some(column.to_owned());
            self.sort_dir = SortDir::Asc;
        }
        Refresh::ROWS
    }

    /// Set or clear a per-column filter. An empty value removes the entry.
    /// Resets to page 1: the old page position is meaningless under a new
    /// filter.
    pub fn set_filter(&mut self, column: &str, value: &str) -> Refresh {
        if value.is_empty() {
            self.filters.shift_remove(column);
        } else {
            self.filters.insert(column.to_owned(), value.to_owned());
        }
        self.page = 1;
        Refresh::BOTH
    }

    /// Replace the global search term. Resets to page 1.
    pub fn set_search(&mut self, text: &str) -> Refresh {
        self.search = text.to_owned();
        self.page = 1;
        Refresh::BOTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = QueryState::default();
        assert_eq!(state.page(), 1);
        assert_eq!(state.page_size(), 50);
        assert_eq!(state.sort_by(), None);
        assert_eq!(state.sort_dir(), SortDir::Asc);
        assert!(state.is_unfiltered());
    }

    #[test]
    fn test_page_clamped_to_one() {
        let mut state = QueryState::default();
        state.set_page(0);
        assert_eq!(state.page(), 1);
        state.set_page(7);
        assert_eq!(state.page(), 7);
    }

    #[test]
    fn test_filter_and_search_reset_page() {
        let mut state = QueryState::default();
        state.set_page(5);
        state.set_filter("status", "open");
        assert_eq!(state.page(), 1);

        state.set_page(3);
        state.set_search("bob");
        assert_eq!(state.page(), 1);

        state.set_page(4);
        state.set_filter("status", "");
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_empty_filter_value_removes_entry() {
        let mut state = QueryState::default();
        state.set_filter("status", "open");
        assert_eq!(state.filters().get("status").map(String::as_str), Some("open"));

        state.set_filter("status", "");
        assert!(state.filters().is_empty());
    }

    #[test]
    fn test_sort_toggles_direction_on_same_column() {
        let mut state = QueryState::default();
        state.set_sort("name");
        assert_eq!(state.sort_by(), Some("name"));
        assert_eq!(state.sort_dir(), SortDir::Asc);

        state.set_sort("name");
        assert_eq!(state.sort_by(), Some("name"));
        assert_eq!(state.sort_dir(), SortDir::Desc);

        state.set_sort("name");
        assert_eq!(state.sort_dir(), SortDir::Asc);
    }

    #[test]
    fn test_sort_switch_resets_direction_not_page() {
        let mut state = QueryState::default();
        state.set_page(3);
        state.set_sort("a");
        state.set_sort("a");
        assert_eq!(state.sort_dir(), SortDir::Desc);

        state.set_sort("b");
        assert_eq!(state.sort_by(), Some("b"));
        assert_eq!(state.sort_dir(), SortDir::Asc);
        assert_eq!(state.page(), 3);
    }

    #[test]
    fn test_page_size_resets_page() {
        let mut state = QueryState::default();
        state.set_page(9);
        state.set_page_size(100);
        assert_eq!(state.page(), 1);
        assert_eq!(state.page_size(), 100);
    }

    #[test]
    fn test_refresh_scope_per_transition() {
        let mut state = QueryState::default();
        assert_eq!(state.set_page(2), Refresh::ROWS);
        assert_eq!(state.set_page_size(25), Refresh::ROWS);
        assert_eq!(state.set_sort("x"), Refresh::ROWS);
        assert_eq!(state.set_filter("x", "1"), Refresh::BOTH);
        assert_eq!(state.set_search("q"), Refresh::BOTH);
    }
}
