//! Client-side filtering, sorting and selection over a fetched catalog.

pub mod filter;
pub mod sort;

use std::collections::HashSet;

use crate::suno::SongRecord;

pub use filter::VisibilityFilter;
pub use sort::{SortCriterion, SortField, SortStack};

/// Browse state for one fetched catalog: the query, visibility filter,
/// sort stack and selection live here instead of in shared globals.
#[derive(Debug, Clone)]
pub struct BrowseSession {
    songs: Vec<SongRecord>,
    query: String,
    visibility: VisibilityFilter,
    sort_stack: SortStack,
    selected: HashSet<String>,
}

impl BrowseSession {
    pub fn new(songs: Vec<SongRecord>) -> Self {
        Self {
            songs,
            query: String::new(),
            visibility: VisibilityFilter::All,
            sort_stack: SortStack::default(),
            selected: HashSet::new(),
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_visibility(&mut self, visibility: VisibilityFilter) {
        self.visibility = visibility;
    }

    pub fn set_sort_stack(&mut self, stack: SortStack) {
        self.sort_stack = stack;
    }

    pub fn sort_stack(&self) -> &SortStack {
        &self.sort_stack
    }

    /// Column-header click; see [`SortStack::promote`].
    pub fn click_column(&mut self, field: SortField) {
        self.sort_stack.promote(field);
    }

    pub fn total(&self) -> usize {
        self.songs.len()
    }

    /// Filtered then sorted songs.
    pub fn view(&self) -> Vec<&SongRecord> {
        let mut view = filter::filter(&self.songs, &self.query, self.visibility);
        sort::sort(&mut view, &self.sort_stack);
        view
    }

    /// `"N songs"`, or `"N of M songs"` while a filter hides some.
    pub fn summary(&self) -> String {
        let shown = self.view().len();
        if shown == self.total() {
            format!("{} songs", shown)
        } else {
            format!("{} of {} songs", shown, self.total())
        }
    }

    /// Add `id` to the selection. Returns `false` for ids not in the catalog.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.songs.iter().any(|s| s.id == id) {
            return false;
        }
        self.selected.insert(id.to_string());
        true
    }

    /// Flip the selection state of `id`; returns whether it is now selected.
    #[allow(dead_code)] // interactive selection; the CLI selects by id or filter
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.select(id)
        }
    }

    /// Select every song currently in the view.
    pub fn select_all_visible(&mut self) {
        let ids: Vec<String> = self.view().iter().map(|s| s.id.clone()).collect();
        self.selected.extend(ids);
    }

    #[allow(dead_code)] // interactive selection; the CLI selects by id or filter
    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected songs in catalog order.
    pub fn selected(&self) -> Vec<SongRecord> {
        self.songs
            .iter()
            .filter(|s| self.selected.contains(&s.id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn library() -> Vec<SongRecord> {
        [
            json!({"id": "1", "title": "Neon", "created_at": "2024-03-01T00:00:00Z", "is_public": true}),
            json!({"id": "2", "title": "Dust", "created_at": "2024-01-01T00:00:00Z"}),
            json!({"id": "3", "title": "Anthem", "created_at": "2024-02-01T00:00:00Z", "is_public": true}),
        ]
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap())
        .collect()
    }

    fn view_ids(session: &BrowseSession) -> Vec<String> {
        session.view().iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn test_view_applies_filter_then_sort() {
        let mut session = BrowseSession::new(library());
        assert_eq!(view_ids(&session), ["1", "3", "2"]);

        session.set_visibility(VisibilityFilter::PublicOnly);
        assert_eq!(view_ids(&session), ["1", "3"]);
        assert_eq!(session.summary(), "2 of 3 songs");

        session.click_column(SortField::Name);
        assert_eq!(view_ids(&session), ["3", "1"]);
    }

    #[test]
    fn test_click_column_twice_reverses() {
        let mut session = BrowseSession::new(library());
        session.click_column(SortField::Name);
        assert_eq!(view_ids(&session), ["3", "2", "1"]);
        session.click_column(SortField::Name);
        assert_eq!(view_ids(&session), ["1", "2", "3"]);
    }

    #[test]
    fn test_summary_without_filter() {
        let session = BrowseSession::new(library());
        assert_eq!(session.summary(), "3 songs");
    }

    #[test]
    fn test_selection_is_returned_in_catalog_order() {
        let mut session = BrowseSession::new(library());
        assert!(session.toggle("3"));
        assert!(session.select("1"));
        assert!(!session.select("missing"));
        let ids: Vec<_> = session.selected().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["1", "3"]);

        assert!(!session.toggle("3"));
        assert_eq!(session.selected_count(), 1);
        session.clear_selection();
        assert!(session.selected().is_empty());
    }

    #[test]
    fn test_select_all_visible_respects_filters() {
        let mut session = BrowseSession::new(library());
        session.set_query("dust");
        session.select_all_visible();
        let ids: Vec<_> = session.selected().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["2"]);
    }
}
