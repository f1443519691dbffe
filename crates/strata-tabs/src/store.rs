//! The hierarchical tab store
//!
//! Entities live in flat tables keyed by id; parents and children reference
//! each other by id only. Every mutation leaves the tree with dense 0-based
//! order indices and no empty rows or groups: cascade deletion runs leaf
//! upward inside the same call.

use std::collections::HashMap;

use crate::group::{TabGroup, TabRow};
use crate::kind::TabKind;
use crate::space::Space;
use crate::tab::StoredTab;

/// What a `remove_tab` cascade actually deleted, so callers can mirror the
/// deletion into persistence or pick a replacement tab.
#[derive(Debug, Clone)]
pub struct TabRemoval {
    pub tab: StoredTab,
    pub space_id: Option<String>,
    pub removed_row: Option<String>,
    pub removed_group: Option<String>,
}

#[derive(Debug, Default)]
pub struct TabStore {
    spaces: HashMap<String, Space>,
    groups: HashMap<String, TabGroup>,
    rows: HashMap<String, TabRow>,
    tabs: HashMap<String, StoredTab>,
}

impl TabStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Spaces ===

    pub fn add_space(&mut self, mut space: Space) -> String {
        space.order_index = self.spaces.len();
        let id = space.id.clone();
        self.spaces.insert(id.clone(), space);
        id
    }

    pub fn space(&self, space_id: &str) -> Option<&Space> {
        self.spaces.get(space_id)
    }

    pub fn space_mut(&mut self, space_id: &str) -> Option<&mut Space> {
        self.spaces.get_mut(space_id)
    }

    pub fn spaces(&self) -> impl Iterator<Item = &Space> {
        self.spaces.values()
    }

    /// Delete a space and everything it owns.
    pub fn remove_space(&mut self, space_id: &str) -> bool {
        let Some(space) = self.spaces.remove(space_id) else {
            return false;
        };

        for kind in [TabKind::Primary, TabKind::Pinned, TabKind::Favorite] {
            for group_id in space.collection(kind) {
                self.drop_group_subtree(group_id);
            }
        }

        for tab_id in &space.legacy_tab_ids {
            self.tabs.remove(tab_id);
        }

        tracing::info!(space_id = %space_id, "Removed space");
        true
    }

    // === Lookups ===

    pub fn tab(&self, tab_id: &str) -> Option<&StoredTab> {
        self.tabs.get(tab_id)
    }

    pub fn tab_mut(&mut self, tab_id: &str) -> Option<&mut StoredTab> {
        self.tabs.get_mut(tab_id)
    }

    pub fn group(&self, group_id: &str) -> Option<&TabGroup> {
        self.groups.get(group_id)
    }

    pub fn row(&self, row_id: &str) -> Option<&TabRow> {
        self.rows.get(row_id)
    }

    /// The group owning a tab, or None. Linear scan across all groups of all
    /// three collections of every space; the tree is bounded by realistic
    /// browsing-session sizes so this stays cheap.
    pub fn find_group_containing(&self, tab_id: &str) -> Option<&TabGroup> {
        for space in self.spaces.values() {
            for kind in [TabKind::Primary, TabKind::Pinned, TabKind::Favorite] {
                for group_id in space.collection(kind) {
                    let Some(group) = self.groups.get(group_id) else {
                        continue;
                    };
                    for row_id in &group.row_ids {
                        if let Some(row) = self.rows.get(row_id) {
                            if row.tab_ids.iter().any(|id| id == tab_id) {
                                return Some(group);
                            }
                        }
                    }
                }
            }
        }
        None
    }

    /// Groups of one collection, in collection order.
    pub fn groups_of(&self, space_id: &str, kind: TabKind) -> Vec<&TabGroup> {
        let Some(space) = self.spaces.get(space_id) else {
            return Vec::new();
        };
        space
            .collection(kind)
            .iter()
            .filter_map(|id| self.groups.get(id))
            .collect()
    }

    /// First tab of a group in nested order (row 0, column 0).
    pub fn first_tab_of_group(&self, group_id: &str) -> Option<&StoredTab> {
        let group = self.groups.get(group_id)?;
        let row_id = group.row_ids.first()?;
        let row = self.rows.get(row_id)?;
        let tab_id = row.tab_ids.first()?;
        self.tabs.get(tab_id)
    }

    /// Row-major view of a group, sorted by row index then tab order index.
    pub fn nested_view(&self, group_id: &str, include_temporary: bool) -> Vec<Vec<StoredTab>> {
        let Some(group) = self.groups.get(group_id) else {
            return Vec::new();
        };

        let mut rows: Vec<&TabRow> = group
            .row_ids
            .iter()
            .filter_map(|id| self.rows.get(id))
            .collect();
        rows.sort_by_key(|r| r.row_index);

        rows.iter()
            .map(|row| {
                let mut tabs: Vec<StoredTab> = row
                    .tab_ids
                    .iter()
                    .filter_map(|id| self.tabs.get(id))
                    .filter(|t| include_temporary || !t.is_temporary)
                    .cloned()
                    .collect();
                tabs.sort_by_key(|t| t.order_index);
                tabs
            })
            .collect()
    }

    // === Mutations ===

    /// Append a tab to a row. No-op returning false if the row no longer
    /// exists; callers must re-resolve their target.
    pub fn add_tab(&mut self, mut tab: StoredTab, row_id: &str) -> bool {
        let Some(row) = self.rows.get(row_id) else {
            return false;
        };
        let group_id = row.group_id.clone();
        let order_index = row.tab_ids.len();

        // The tab inherits the classification of its container
        let (kind, space_id) = match self.groups.get(&group_id) {
            Some(group) => (group.kind, group.space_id.clone()),
            None => return false,
        };

        tab.order_index = order_index;
        tab.kind = kind;
        tab.row_id = Some(row_id.to_string());
        tab.space_id = Some(space_id.clone());

        let tab_id = tab.id.clone();
        if !tab.is_temporary {
            if let Some(space) = self.spaces.get_mut(&space_id) {
                if !space.legacy_tab_ids.contains(&tab_id) {
                    space.legacy_tab_ids.push(tab_id.clone());
                }
            }
        }

        self.tabs.insert(tab_id.clone(), tab);
        if let Some(row) = self.rows.get_mut(row_id) {
            row.tab_ids.push(tab_id);
        }

        debug_assert!(self.check_invariants().is_ok());
        true
    }

    /// Append a new row holding `tabs` to a group. Returns the new row id,
    /// or None if the group no longer exists.
    pub fn add_row(&mut self, tabs: Vec<StoredTab>, group_id: &str) -> Option<String> {
        let row_index = self.groups.get(group_id)?.row_ids.len();

        let mut row = TabRow::new(group_id);
        row.row_index = row_index;
        let row_id = row.id.clone();

        self.rows.insert(row_id.clone(), row);
        if let Some(group) = self.groups.get_mut(group_id) {
            group.row_ids.push(row_id.clone());
        }

        for tab in tabs {
            self.add_tab(tab, &row_id);
        }

        Some(row_id)
    }

    /// Create a new group with a single row holding `tabs`, appended to the
    /// collection matching `kind`. Returns the new group id.
    pub fn add_group(
        &mut self,
        space_id: &str,
        kind: TabKind,
        tabs: Vec<StoredTab>,
    ) -> Option<String> {
        let order_index = self.spaces.get(space_id)?.collection(kind).len();

        let mut group = TabGroup::new(space_id, kind);
        group.order_index = order_index;
        let group_id = group.id.clone();

        self.groups.insert(group_id.clone(), group);
        if let Some(space) = self.spaces.get_mut(space_id) {
            space.collection_mut(kind).push(group_id.clone());
        }

        self.add_row(tabs, &group_id);

        tracing::debug!(group_id = %group_id, kind = %kind, "Created tab group");
        Some(group_id)
    }

    /// Remove a tab and cascade: an emptied row is deleted, an emptied group
    /// is deleted from its collection, all within this call. Returns None if
    /// the tab is not present.
    pub fn remove_tab(&mut self, tab_id: &str) -> Option<TabRemoval> {
        let tab = self.tabs.remove(tab_id)?;

        let space_id = tab
            .space_id
            .clone()
            .or_else(|| {
                tab.row_id
                    .as_deref()
                    .and_then(|rid| self.rows.get(rid))
                    .and_then(|r| self.groups.get(&r.group_id))
                    .map(|g| g.space_id.clone())
            });

        if let Some(sid) = &space_id {
            if let Some(space) = self.spaces.get_mut(sid) {
                space.legacy_tab_ids.retain(|id| id != tab_id);
            }
        }

        let mut removed_row = None;
        let mut removed_group = None;

        if let Some(row_id) = tab.row_id.clone() {
            let row_became_empty = match self.rows.get_mut(&row_id) {
                Some(row) => {
                    row.tab_ids.retain(|id| id != tab_id);
                    row.tab_ids.is_empty()
                }
                None => false,
            };

            if row_became_empty {
                let group_id = self.rows.remove(&row_id).map(|r| r.group_id);
                removed_row = Some(row_id.clone());

                if let Some(group_id) = group_id {
                    let group_became_empty = match self.groups.get_mut(&group_id) {
                        Some(group) => {
                            group.row_ids.retain(|id| id != &row_id);
                            group.row_ids.is_empty()
                        }
                        None => false,
                    };

                    if group_became_empty {
                        if let Some(group) = self.groups.remove(&group_id) {
                            if let Some(space) = self.spaces.get_mut(&group.space_id) {
                                space.collection_mut(group.kind).retain(|id| id != &group_id);
                            }
                            if let Some(sid) = &space_id {
                                self.reindex_collection(sid, group.kind);
                            }
                        }
                        removed_group = Some(group_id);
                    } else {
                        self.reindex_group_rows(&group_id);
                    }
                }
            } else {
                self.reindex_row_tabs(&row_id);
            }
        }

        debug_assert!(self.check_invariants().is_ok());
        Some(TabRemoval {
            tab,
            space_id,
            removed_row,
            removed_group,
        })
    }

    /// Reorder a tab within its row. Indices stay a dense 0-based
    /// permutation afterwards.
    pub fn move_tab_in_row(&mut self, tab_id: &str, new_index: usize) -> bool {
        let Some(row_id) = self.tabs.get(tab_id).and_then(|t| t.row_id.clone()) else {
            return false;
        };
        let Some(row) = self.rows.get_mut(&row_id) else {
            return false;
        };
        let Some(current) = row.tab_ids.iter().position(|id| id == tab_id) else {
            return false;
        };

        let id = row.tab_ids.remove(current);
        let insert_at = new_index.min(row.tab_ids.len());
        row.tab_ids.insert(insert_at, id);

        self.reindex_row_tabs(&row_id);
        debug_assert!(self.check_invariants().is_ok());
        true
    }

    /// Move a tab into the collection matching `new_kind`: reuse the first
    /// existing group of that kind (appending to its first row), otherwise
    /// create a new single-row group. The tab's own kind and its container
    /// change together. Returns the target group id, or None if the tab is
    /// unknown.
    pub fn reclassify(&mut self, tab_id: &str, new_kind: TabKind) -> Option<String> {
        let space_id = self
            .find_group_containing(tab_id)
            .map(|g| g.space_id.clone())
            .or_else(|| self.tabs.get(tab_id).and_then(|t| t.space_id.clone()))?;

        let removal = self.remove_tab(tab_id)?;
        let mut tab = removal.tab;
        tab.kind = new_kind;
        tab.row_id = None;
        tab.order_index = 0;

        let existing_group = self
            .spaces
            .get(&space_id)
            .and_then(|s| s.collection(new_kind).first().cloned());

        let group_id = match existing_group {
            Some(group_id) => {
                let first_row = self
                    .groups
                    .get(&group_id)
                    .and_then(|g| g.row_ids.first().cloned());
                match first_row {
                    Some(row_id) => {
                        self.add_tab(tab, &row_id);
                        group_id
                    }
                    None => self.add_group(&space_id, new_kind, vec![tab])?,
                }
            }
            None => self.add_group(&space_id, new_kind, vec![tab])?,
        };

        tracing::debug!(tab_id = %tab_id, kind = %new_kind, "Reclassified tab");
        Some(group_id)
    }

    /// Register a tab that only exists in the legacy flat layout (no group
    /// membership). Temporary tabs are refused; they are never persisted.
    pub fn add_legacy_tab(&mut self, space_id: &str, mut tab: StoredTab) -> bool {
        if tab.is_temporary {
            return false;
        }
        let Some(space) = self.spaces.get_mut(space_id) else {
            return false;
        };

        tab.row_id = None;
        tab.space_id = Some(space_id.to_string());
        if !space.legacy_tab_ids.contains(&tab.id) {
            space.legacy_tab_ids.push(tab.id.clone());
        }
        self.tabs.insert(tab.id.clone(), tab);
        true
    }

    // === Restore from persistence ===

    pub fn restore_space(&mut self, space: Space) {
        self.spaces.insert(space.id.clone(), space);
    }

    pub fn restore_group(&mut self, group: TabGroup) {
        if let Some(space) = self.spaces.get_mut(&group.space_id) {
            space.collection_mut(group.kind).push(group.id.clone());
        }
        self.groups.insert(group.id.clone(), group);
    }

    pub fn restore_row(&mut self, row: TabRow) {
        if let Some(group) = self.groups.get_mut(&row.group_id) {
            group.row_ids.push(row.id.clone());
        }
        self.rows.insert(row.id.clone(), row);
    }

    pub fn restore_tab(&mut self, tab: StoredTab) {
        if let Some(row_id) = &tab.row_id {
            if let Some(row) = self.rows.get_mut(row_id) {
                row.tab_ids.push(tab.id.clone());
            }
        }
        self.tabs.insert(tab.id.clone(), tab);
    }

    /// After a bulk restore: order child lists by the persisted indices,
    /// drop dangling references, delete empty containers the same way a
    /// live mutation would, and re-densify all indices.
    pub fn finish_restore(&mut self) {
        // Order and prune row children
        let row_ids: Vec<String> = self.rows.keys().cloned().collect();
        for row_id in &row_ids {
            let mut tab_ids = self.rows[row_id].tab_ids.clone();
            tab_ids.retain(|id| self.tabs.contains_key(id));
            tab_ids.sort_by_key(|id| self.tabs[id].order_index);
            if let Some(row) = self.rows.get_mut(row_id) {
                row.tab_ids = tab_ids;
            }
            self.reindex_row_tabs(row_id);
        }

        // Empty rows self-heal away
        let empty_rows: Vec<String> = self
            .rows
            .values()
            .filter(|r| r.tab_ids.is_empty())
            .map(|r| r.id.clone())
            .collect();
        for row_id in empty_rows {
            if let Some(row) = self.rows.remove(&row_id) {
                if let Some(group) = self.groups.get_mut(&row.group_id) {
                    group.row_ids.retain(|id| id != &row_id);
                }
            }
        }

        let group_ids: Vec<String> = self.groups.keys().cloned().collect();
        for group_id in &group_ids {
            let mut row_ids = self.groups[group_id].row_ids.clone();
            row_ids.retain(|id| self.rows.contains_key(id));
            row_ids.sort_by_key(|id| self.rows[id].row_index);
            if let Some(group) = self.groups.get_mut(group_id) {
                group.row_ids = row_ids;
            }
            self.reindex_group_rows(group_id);
        }

        // Empty groups likewise
        let empty_groups: Vec<String> = self
            .groups
            .values()
            .filter(|g| g.row_ids.is_empty())
            .map(|g| g.id.clone())
            .collect();
        for group_id in empty_groups {
            if let Some(group) = self.groups.remove(&group_id) {
                if let Some(space) = self.spaces.get_mut(&group.space_id) {
                    space.collection_mut(group.kind).retain(|id| id != &group_id);
                }
            }
        }

        let space_ids: Vec<String> = self.spaces.keys().cloned().collect();
        for space_id in &space_ids {
            for kind in [TabKind::Primary, TabKind::Pinned, TabKind::Favorite] {
                let mut collection = self.spaces[space_id].collection(kind).clone();
                collection.retain(|id| self.groups.contains_key(id));
                collection.sort_by_key(|id| self.groups[id].order_index);
                if let Some(space) = self.spaces.get_mut(space_id) {
                    *space.collection_mut(kind) = collection;
                }
                self.reindex_collection(space_id, kind);
            }

            let tabs = &self.tabs;
            if let Some(space) = self.spaces.get_mut(space_id) {
                space.legacy_tab_ids.retain(|id| tabs.contains_key(id));
            }
        }
    }

    // === Invariants ===

    /// Verify every invariant the store promises after a mutation. Used by
    /// debug assertions and tests.
    pub fn check_invariants(&self) -> Result<(), String> {
        for row in self.rows.values() {
            if row.tab_ids.is_empty() {
                return Err(format!("empty row {} persisted", row.id));
            }
            for (expected, tab_id) in row.tab_ids.iter().enumerate() {
                let tab = self
                    .tabs
                    .get(tab_id)
                    .ok_or_else(|| format!("row {} references missing tab {}", row.id, tab_id))?;
                if tab.order_index != expected {
                    return Err(format!(
                        "tab {} order_index {} != position {}",
                        tab_id, tab.order_index, expected
                    ));
                }
            }
        }

        for group in self.groups.values() {
            if group.row_ids.is_empty() {
                return Err(format!("empty group {} persisted", group.id));
            }
            for (expected, row_id) in group.row_ids.iter().enumerate() {
                let row = self
                    .rows
                    .get(row_id)
                    .ok_or_else(|| format!("group {} references missing row {}", group.id, row_id))?;
                if row.row_index != expected {
                    return Err(format!(
                        "row {} row_index {} != position {}",
                        row_id, row.row_index, expected
                    ));
                }
                for tab_id in &row.tab_ids {
                    if let Some(tab) = self.tabs.get(tab_id) {
                        if tab.kind != group.kind {
                            return Err(format!(
                                "tab {} kind {} != group kind {}",
                                tab_id, tab.kind, group.kind
                            ));
                        }
                    }
                }
            }
        }

        for space in self.spaces.values() {
            for kind in [TabKind::Primary, TabKind::Pinned, TabKind::Favorite] {
                for (expected, group_id) in space.collection(kind).iter().enumerate() {
                    let group = self.groups.get(group_id).ok_or_else(|| {
                        format!("space {} references missing group {}", space.id, group_id)
                    })?;
                    if group.kind != kind {
                        return Err(format!(
                            "group {} kind {} stored in {} collection",
                            group_id, group.kind, kind
                        ));
                    }
                    if group.order_index != expected {
                        return Err(format!(
                            "group {} order_index {} != position {}",
                            group_id, group.order_index, expected
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    // === Internal ===

    fn drop_group_subtree(&mut self, group_id: &str) {
        if let Some(group) = self.groups.remove(group_id) {
            for row_id in group.row_ids {
                if let Some(row) = self.rows.remove(&row_id) {
                    for tab_id in row.tab_ids {
                        self.tabs.remove(&tab_id);
                    }
                }
            }
        }
    }

    fn reindex_row_tabs(&mut self, row_id: &str) {
        let Some(tab_ids) = self.rows.get(row_id).map(|r| r.tab_ids.clone()) else {
            return;
        };
        for (index, tab_id) in tab_ids.iter().enumerate() {
            if let Some(tab) = self.tabs.get_mut(tab_id) {
                tab.order_index = index;
            }
        }
    }

    fn reindex_group_rows(&mut self, group_id: &str) {
        let Some(row_ids) = self.groups.get(group_id).map(|g| g.row_ids.clone()) else {
            return;
        };
        for (index, row_id) in row_ids.iter().enumerate() {
            if let Some(row) = self.rows.get_mut(row_id) {
                row.row_index = index;
            }
        }
    }

    fn reindex_collection(&mut self, space_id: &str, kind: TabKind) {
        let Some(group_ids) = self.spaces.get(space_id).map(|s| s.collection(kind).clone()) else {
            return;
        };
        for (index, group_id) in group_ids.iter().enumerate() {
            if let Some(group) = self.groups.get_mut(group_id) {
                group.order_index = index;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_space() -> (TabStore, String) {
        let mut store = TabStore::new();
        let space_id = store.add_space(Space::new("Test"));
        (store, space_id)
    }

    fn tab(url: &str) -> StoredTab {
        StoredTab::new(url, TabKind::Primary)
    }

    #[test]
    fn test_add_group_creates_row_and_tab() {
        let (mut store, space_id) = store_with_space();

        let group_id = store
            .add_group(&space_id, TabKind::Primary, vec![tab("https://a.com")])
            .unwrap();

        let view = store.nested_view(&group_id, true);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].len(), 1);
        assert_eq!(view[0][0].url, "https://a.com");
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_order_indices_stay_dense() {
        let (mut store, space_id) = store_with_space();
        let group_id = store
            .add_group(&space_id, TabKind::Primary, vec![tab("https://a.com")])
            .unwrap();
        let row_id = store.group(&group_id).unwrap().row_ids[0].clone();

        let b = tab("https://b.com");
        let c = tab("https://c.com");
        let d = tab("https://d.com");
        let b_id = b.id.clone();
        let d_id = d.id.clone();
        assert!(store.add_tab(b, &row_id));
        assert!(store.add_tab(c, &row_id));
        assert!(store.add_tab(d, &row_id));

        // Remove from the middle, reorder the tail to the front
        store.remove_tab(&b_id).unwrap();
        assert!(store.move_tab_in_row(&d_id, 0));

        let view = store.nested_view(&group_id, true);
        let indices: Vec<usize> = view[0].iter().map(|t| t.order_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(view[0][0].url, "https://d.com");
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_last_tab_cascades_row_and_group() {
        let (mut store, space_id) = store_with_space();
        let group_id = store
            .add_group(&space_id, TabKind::Primary, vec![tab("https://a.com")])
            .unwrap();
        let row_id = store.group(&group_id).unwrap().row_ids[0].clone();
        let tab_id = store.row(&row_id).unwrap().tab_ids[0].clone();

        let removal = store.remove_tab(&tab_id).unwrap();
        assert_eq!(removal.removed_row.as_deref(), Some(row_id.as_str()));
        assert_eq!(removal.removed_group.as_deref(), Some(group_id.as_str()));

        assert!(store.group(&group_id).is_none());
        assert!(store.row(&row_id).is_none());
        assert!(store
            .space(&space_id)
            .unwrap()
            .primary_group_ids
            .is_empty());
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_same_url_tabs_coexist_in_row() {
        let (mut store, space_id) = store_with_space();
        let group_id = store
            .add_group(&space_id, TabKind::Primary, vec![tab("https://dup.example")])
            .unwrap();
        let row_id = store.group(&group_id).unwrap().row_ids[0].clone();

        assert!(store.add_tab(tab("https://dup.example"), &row_id));

        let view = store.nested_view(&group_id, true);
        assert_eq!(view[0].len(), 2);
        assert_ne!(view[0][0].id, view[0][1].id);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_tab_not_found_is_noop() {
        let (mut store, _space_id) = store_with_space();
        assert!(store.remove_tab("nope").is_none());
    }

    #[test]
    fn test_add_tab_to_missing_row_is_noop() {
        let (mut store, _space_id) = store_with_space();
        assert!(!store.add_tab(tab("https://a.com"), "gone"));
    }

    #[test]
    fn test_find_group_containing() {
        let (mut store, space_id) = store_with_space();
        let group_id = store
            .add_group(&space_id, TabKind::Primary, vec![tab("https://a.com")])
            .unwrap();
        let tab_id = store.first_tab_of_group(&group_id).unwrap().id.clone();

        assert_eq!(store.find_group_containing(&tab_id).unwrap().id, group_id);
        assert!(store.find_group_containing("missing").is_none());
    }

    #[test]
    fn test_reclassify_moves_tab_and_kind_together() {
        let (mut store, space_id) = store_with_space();
        let group_id = store
            .add_group(&space_id, TabKind::Primary, vec![tab("https://a.com")])
            .unwrap();
        let tab_id = store.first_tab_of_group(&group_id).unwrap().id.clone();

        let target = store.reclassify(&tab_id, TabKind::Pinned).unwrap();

        let group = store.find_group_containing(&tab_id).unwrap();
        assert_eq!(group.id, target);
        assert_eq!(group.kind, TabKind::Pinned);
        assert_eq!(store.tab(&tab_id).unwrap().kind, TabKind::Pinned);
        // Old single-tab group cascaded away
        assert!(store.group(&group_id).is_none());
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_reclassify_reuses_existing_group() {
        let (mut store, space_id) = store_with_space();
        let pinned_group = store
            .add_group(&space_id, TabKind::Pinned, vec![{
                let mut t = tab("https://pin.com");
                t.kind = TabKind::Pinned;
                t
            }])
            .unwrap();
        let primary_group = store
            .add_group(&space_id, TabKind::Primary, vec![tab("https://a.com")])
            .unwrap();
        let tab_id = store.first_tab_of_group(&primary_group).unwrap().id.clone();

        let target = store.reclassify(&tab_id, TabKind::Pinned).unwrap();
        assert_eq!(target, pinned_group);

        let view = store.nested_view(&pinned_group, true);
        assert_eq!(view[0].len(), 2);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_nested_view_excludes_temporary() {
        let (mut store, space_id) = store_with_space();
        let group_id = store
            .add_group(&space_id, TabKind::Primary, vec![tab("https://a.com")])
            .unwrap();
        let row_id = store.group(&group_id).unwrap().row_ids[0].clone();
        store.add_tab(StoredTab::temporary(TabKind::Primary), &row_id);

        assert_eq!(store.nested_view(&group_id, true)[0].len(), 2);
        assert_eq!(store.nested_view(&group_id, false)[0].len(), 1);
    }

    #[test]
    fn test_temporary_tab_kept_out_of_legacy_list() {
        let (mut store, space_id) = store_with_space();
        let group_id = store
            .add_group(&space_id, TabKind::Primary, vec![tab("https://a.com")])
            .unwrap();
        let row_id = store.group(&group_id).unwrap().row_ids[0].clone();
        store.add_tab(StoredTab::temporary(TabKind::Primary), &row_id);

        assert_eq!(store.space(&space_id).unwrap().legacy_tab_ids.len(), 1);
        assert!(!store.add_legacy_tab(&space_id, StoredTab::temporary(TabKind::Primary)));
    }

    #[test]
    fn test_remove_space_cascades_everything() {
        let (mut store, space_id) = store_with_space();
        let group_id = store
            .add_group(&space_id, TabKind::Primary, vec![tab("https://a.com")])
            .unwrap();
        let tab_id = store.first_tab_of_group(&group_id).unwrap().id.clone();

        assert!(store.remove_space(&space_id));
        assert!(store.space(&space_id).is_none());
        assert!(store.group(&group_id).is_none());
        assert!(store.tab(&tab_id).is_none());
    }
}
