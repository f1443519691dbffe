//! Space: a top-level workspace
//!
//! Holds three independent ordered collections of tab groups plus cosmetic
//! attributes. The legacy tab-id list indexes every non-temporary tab in the
//! space flat, for backward compatibility with the pre-group layout.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::TabKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    pub name: String,
    pub icon: String,
    /// Gradient stops as hex strings
    pub background_colors: Vec<String>,
    pub text_color: String,
    pub is_incognito: bool,
    pub order_index: usize,
    /// Primary tab groups, ordered by group order_index
    pub primary_group_ids: Vec<String>,
    /// Pinned tab groups
    pub pinned_group_ids: Vec<String>,
    /// Favorite tab groups
    pub favorite_group_ids: Vec<String>,
    /// Flat legacy tab index (pre-group layout compatibility)
    pub legacy_tab_ids: Vec<String>,
}

impl Space {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            icon: String::new(),
            background_colors: Vec::new(),
            text_color: String::new(),
            is_incognito: false,
            order_index: 0,
            primary_group_ids: Vec::new(),
            pinned_group_ids: Vec::new(),
            favorite_group_ids: Vec::new(),
            legacy_tab_ids: Vec::new(),
        }
    }

    /// Created on first launch when no space exists yet.
    pub fn default_space() -> Self {
        Self::new("Personal")
    }

    pub fn collection(&self, kind: TabKind) -> &Vec<String> {
        match kind {
            TabKind::Primary => &self.primary_group_ids,
            TabKind::Pinned => &self.pinned_group_ids,
            TabKind::Favorite => &self.favorite_group_ids,
        }
    }

    pub fn collection_mut(&mut self, kind: TabKind) -> &mut Vec<String> {
        match kind {
            TabKind::Primary => &mut self.primary_group_ids,
            TabKind::Pinned => &mut self.pinned_group_ids,
            TabKind::Favorite => &mut self.favorite_group_ids,
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collections_are_independent() {
        let mut space = Space::new("Work");
        space.collection_mut(TabKind::Primary).push("g1".into());
        space.collection_mut(TabKind::Pinned).push("g2".into());

        assert_eq!(space.collection(TabKind::Primary), &["g1".to_string()]);
        assert_eq!(space.collection(TabKind::Pinned), &["g2".to_string()]);
        assert!(space.collection(TabKind::Favorite).is_empty());
    }
}
