//! Stored tab record
//!
//! A tab is a leaf of the hierarchy. Its id is derived from the URL and the
//! creation instant so re-opening the same URL yields a distinct identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::TabKind;

/// Sentinel URL of a placeholder "new tab" that has not been given a real
/// URL yet. Tabs holding it are never persisted.
pub const TEMPORARY_TAB_URL: &str = "temp://new-tab";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTab {
    /// Unique identifier, derived from URL + creation instant + a nonce
    pub id: String,
    /// Current URL
    pub url: String,
    /// Classification, must match the owning group's kind
    pub kind: TabKind,
    /// Position within the owning row
    pub order_index: usize,
    /// Optional user folder label
    pub folder_name: Option<String>,
    /// Placeholder tab awaiting a real URL; never persisted
    pub is_temporary: bool,
    /// Creation / last-visited timestamp, drives cleanup-by-age
    pub last_visited_at: DateTime<Utc>,
    /// Owning row, None for legacy flat-layout tabs not yet migrated
    pub row_id: Option<String>,
    /// Legacy per-space flat list reference
    pub space_id: Option<String>,
}

impl StoredTab {
    pub fn new(url: impl Into<String>, kind: TabKind) -> Self {
        let url = url.into();
        let now = Utc::now();

        Self {
            id: derive_id(&url, now),
            url,
            kind,
            order_index: 0,
            folder_name: None,
            is_temporary: false,
            last_visited_at: now,
            row_id: None,
            space_id: None,
        }
    }

    /// A placeholder tab holding the sentinel URL.
    pub fn temporary(kind: TabKind) -> Self {
        let mut tab = Self::new(TEMPORARY_TAB_URL, kind);
        tab.is_temporary = true;
        tab
    }

    /// Flip a placeholder into a real tab. Happens exactly once per tab,
    /// when the user submits a URL into it; the caller persists afterwards.
    pub fn commit(&mut self, url: impl Into<String>) {
        debug_assert!(self.is_temporary, "commit on a non-temporary tab");
        let url = url.into();
        let now = Utc::now();

        self.id = derive_id(&url, now);
        self.url = url;
        self.last_visited_at = now;
        self.is_temporary = false;
    }

    pub fn touch(&mut self) {
        self.last_visited_at = Utc::now();
    }
}

fn derive_id(url: &str, instant: DateTime<Utc>) -> String {
    // Two tabs for the same URL can be created within one clock tick; the
    // nonce keeps their ids distinct.
    let seed = format!(
        "{}|{}|{}",
        url,
        instant.timestamp_micros(),
        Uuid::new_v4()
    );
    Uuid::new_v5(&Uuid::NAMESPACE_URL, seed.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tab_defaults() {
        let tab = StoredTab::new("https://example.com", TabKind::Primary);
        assert!(!tab.is_temporary);
        assert!(!tab.id.is_empty());
        assert_eq!(tab.url, "https://example.com");
    }

    #[test]
    fn test_same_url_same_instant_ids_differ() {
        let a = StoredTab::new("https://dup.example", TabKind::Primary);
        let b = StoredTab::new("https://dup.example", TabKind::Primary);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_commit_replaces_identity() {
        let mut tab = StoredTab::temporary(TabKind::Primary);
        assert_eq!(tab.url, TEMPORARY_TAB_URL);

        let old_id = tab.id.clone();
        tab.commit("https://example.com");

        assert!(!tab.is_temporary);
        assert_eq!(tab.url, "https://example.com");
        assert_ne!(tab.id, old_id);
    }
}
