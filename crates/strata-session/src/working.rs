//! The working tree
//!
//! In-memory rows × columns of open tabs mirroring the tab group currently
//! displayed. At most one working tree exists per session manager; it is
//! either empty or mirrors exactly one group.

use std::sync::Arc;

use strata_tabs::StoredTab;

use crate::surface::ContentSurface;

pub struct OpenTab {
    pub tab: StoredTab,
    pub surface: Arc<dyn ContentSurface>,
}

#[derive(Default)]
pub struct WorkingTree {
    rows: Vec<Vec<OpenTab>>,
    focus: (usize, usize),
}

impl WorkingTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Vec<OpenTab>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn focus(&self) -> (usize, usize) {
        self.focus
    }

    pub fn set_focus(&mut self, row: usize, col: usize) {
        if self.rows.is_empty() {
            self.focus = (0, 0);
            return;
        }
        let row = row.min(self.rows.len() - 1);
        let col = if self.rows[row].is_empty() {
            0
        } else {
            col.min(self.rows[row].len() - 1)
        };
        self.focus = (row, col);
    }

    pub fn focused_tab(&self) -> Option<&OpenTab> {
        self.rows.get(self.focus.0)?.get(self.focus.1)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.focus = (0, 0);
    }

    /// Replace the tree with a single tab.
    pub fn replace_single(&mut self, tab: StoredTab, surface: Arc<dyn ContentSurface>) {
        self.rows = vec![vec![OpenTab { tab, surface }]];
        self.focus = (0, 0);
    }

    /// Replace the tree with a full nested layout.
    pub fn set_rows(&mut self, rows: Vec<Vec<OpenTab>>) {
        self.rows = rows;
        self.rows.retain(|row| !row.is_empty());
        self.focus = (0, 0);
    }

    pub fn position_of(&self, tab_id: &str) -> Option<(usize, usize)> {
        for (row_idx, row) in self.rows.iter().enumerate() {
            for (col_idx, open) in row.iter().enumerate() {
                if open.tab.id == tab_id {
                    return Some((row_idx, col_idx));
                }
            }
        }
        None
    }

    pub fn contains(&self, tab_id: &str) -> bool {
        self.position_of(tab_id).is_some()
    }

    pub fn tab_mut(&mut self, tab_id: &str) -> Option<&mut OpenTab> {
        self.rows
            .iter_mut()
            .flat_map(|row| row.iter_mut())
            .find(|open| open.tab.id == tab_id)
    }

    pub fn iter_tabs(&self) -> impl Iterator<Item = &OpenTab> {
        self.rows.iter().flat_map(|row| row.iter())
    }

    /// Append a tab to an existing row (clamped), or start the first row if
    /// the tree is empty. Returns the position it landed at.
    pub fn push_tab_to_row(&mut self, row_index: usize, open: OpenTab) -> (usize, usize) {
        if self.rows.is_empty() {
            self.rows.push(vec![open]);
            return (0, 0);
        }
        let row_index = row_index.min(self.rows.len() - 1);
        self.rows[row_index].push(open);
        (row_index, self.rows[row_index].len() - 1)
    }

    /// Append a whole new row. Returns the position of its first tab.
    pub fn push_row(&mut self, row: Vec<OpenTab>) -> (usize, usize) {
        self.rows.push(row);
        (self.rows.len() - 1, 0)
    }

    /// Remove every temporary tab except the currently focused one, drop
    /// rows that end up empty, and keep focus pointing at the same tab.
    /// Returns the ids of the removed tabs.
    pub fn remove_temporary_except_focused(&mut self) -> Vec<String> {
        let keep = self
            .focused_tab()
            .filter(|open| open.tab.is_temporary)
            .map(|open| open.tab.id.clone());
        let focused_id = self.focused_tab().map(|open| open.tab.id.clone());

        let mut removed = Vec::new();
        for row in &mut self.rows {
            row.retain(|open| {
                let is_kept =
                    !open.tab.is_temporary || keep.as_deref() == Some(open.tab.id.as_str());
                if !is_kept {
                    removed.push(open.tab.id.clone());
                }
                is_kept
            });
        }
        self.rows.retain(|row| !row.is_empty());

        match focused_id.and_then(|id| self.position_of(&id)) {
            Some((row, col)) => self.focus = (row, col),
            None => self.set_focus(self.focus.0, self.focus.1),
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HeadlessFactory, SurfaceFactory};
    use strata_tabs::{StoredTab, TabKind};

    fn open(url: &str) -> OpenTab {
        OpenTab {
            tab: StoredTab::new(url, TabKind::Primary),
            surface: HeadlessFactory.create(),
        }
    }

    fn open_temp() -> OpenTab {
        OpenTab {
            tab: StoredTab::temporary(TabKind::Primary),
            surface: HeadlessFactory.create(),
        }
    }

    #[test]
    fn test_focus_is_clamped() {
        let mut tree = WorkingTree::new();
        tree.set_rows(vec![vec![open("https://a.com"), open("https://b.com")]]);

        tree.set_focus(5, 9);
        assert_eq!(tree.focus(), (0, 1));
    }

    #[test]
    fn test_remove_temporary_keeps_focused_placeholder() {
        let mut tree = WorkingTree::new();
        let focused = open_temp();
        let focused_id = focused.tab.id.clone();
        tree.set_rows(vec![
            vec![open("https://a.com"), open_temp()],
            vec![focused],
        ]);
        tree.set_focus(1, 0);

        let removed = tree.remove_temporary_except_focused();

        assert_eq!(removed.len(), 1);
        assert!(tree.contains(&focused_id));
        assert_eq!(tree.focus(), tree.position_of(&focused_id).unwrap());
    }

    #[test]
    fn test_remove_temporary_drops_empty_rows_and_adjusts_focus() {
        let mut tree = WorkingTree::new();
        tree.set_rows(vec![vec![open_temp()], vec![open("https://a.com")]]);
        tree.set_focus(1, 0);

        let removed = tree.remove_temporary_except_focused();

        assert_eq!(removed.len(), 1);
        assert_eq!(tree.rows().len(), 1);
        assert_eq!(tree.focus(), (0, 0));
        assert_eq!(tree.focused_tab().unwrap().tab.url, "https://a.com");
    }
}
