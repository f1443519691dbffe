//! Tab groups and rows
//!
//! A group is what the user perceives as one tab slot; when split views are
//! in use it holds several rows, each row an ordered set of columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::TabKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabGroup {
    pub id: String,
    /// Owning space
    pub space_id: String,
    /// Must equal the collection this group is stored in
    pub kind: TabKind,
    /// Position within the owning collection
    pub order_index: usize,
    pub created_at: DateTime<Utc>,
    /// Child rows, ordered by row_index
    pub row_ids: Vec<String>,
}

impl TabGroup {
    pub fn new(space_id: impl Into<String>, kind: TabKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            space_id: space_id.into(),
            kind,
            order_index: 0,
            created_at: Utc::now(),
            row_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabRow {
    pub id: String,
    /// Owning group
    pub group_id: String,
    /// Split-view column-set order within the group
    pub row_index: usize,
    /// Child tabs, ordered by order_index
    pub tab_ids: Vec<String>,
}

impl TabRow {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.into(),
            row_index: 0,
            tab_ids: Vec::new(),
        }
    }
}
