//! Persistence glue between the tab store and SQLite
//!
//! One mutating session operation maps to one transactional save. The save
//! rewrites the affected space subtree wholesale: the tree is small, and a
//! full rewrite keeps the on-disk shape identical to memory without
//! tracking individual dirty entities. Temporary tabs are never written.

use chrono::{DateTime, Utc};
use std::str::FromStr;

use strata_storage::{Database, Result};
use strata_tabs::{Space, StoredTab, TabGroup, TabKind, TabRow, TabStore};

/// Upsert the space row only (cosmetic attributes and the legacy id list).
pub fn save_space(db: &Database, space: &Space) -> Result<()> {
    let background_colors = serde_json::to_string(&space.background_colors)?;
    let legacy_tab_ids = serde_json::to_string(&space.legacy_tab_ids)?;

    db.with_connection(|conn| {
        conn.execute(
            "INSERT OR REPLACE INTO spaces
             (id, name, icon, background_colors, text_color, is_incognito, order_index, legacy_tab_ids)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                space.id,
                space.name,
                space.icon,
                background_colors,
                space.text_color,
                space.is_incognito as i32,
                space.order_index as i64,
                legacy_tab_ids,
            ],
        )?;
        Ok(())
    })
}

/// Rewrite a full space subtree (space, groups, rows, tabs) in one
/// transaction.
pub fn save_space_tree(db: &Database, store: &TabStore, space_id: &str) -> Result<()> {
    let Some(space) = store.space(space_id) else {
        return Ok(());
    };

    let background_colors = serde_json::to_string(&space.background_colors)?;
    let legacy_tab_ids = serde_json::to_string(&space.legacy_tab_ids)?;

    db.transaction(|conn| {
        conn.execute(
            "INSERT OR REPLACE INTO spaces
             (id, name, icon, background_colors, text_color, is_incognito, order_index, legacy_tab_ids)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                space.id,
                space.name,
                space.icon,
                background_colors,
                space.text_color,
                space.is_incognito as i32,
                space.order_index as i64,
                legacy_tab_ids,
            ],
        )?;

        // Groups cascade to their rows and attached tabs; legacy-only tabs
        // hang off the space directly and are cleared separately.
        conn.execute("DELETE FROM tab_groups WHERE space_id = ?1", [space_id])?;
        conn.execute(
            "DELETE FROM tabs WHERE space_id = ?1 AND row_id IS NULL",
            [space_id],
        )?;

        for kind in [TabKind::Primary, TabKind::Pinned, TabKind::Favorite] {
            for group_id in space.collection(kind) {
                let Some(group) = store.group(group_id) else {
                    continue;
                };
                insert_group(conn, group)?;

                for row_id in &group.row_ids {
                    let Some(row) = store.row(row_id) else {
                        continue;
                    };
                    insert_row(conn, row)?;

                    for tab_id in &row.tab_ids {
                        if let Some(tab) = store.tab(tab_id) {
                            insert_tab(conn, tab)?;
                        }
                    }
                }
            }
        }

        // Legacy flat-layout tabs without group membership
        for tab_id in &space.legacy_tab_ids {
            if let Some(tab) = store.tab(tab_id) {
                if tab.row_id.is_none() {
                    insert_tab(conn, tab)?;
                }
            }
        }

        Ok(())
    })
}

/// Upsert a single tab; cheap path for url/timestamp touches.
pub fn save_tab(db: &Database, tab: &StoredTab) -> Result<()> {
    if tab.is_temporary {
        debug_assert!(false, "attempted to persist a temporary tab");
        return Ok(());
    }

    db.with_connection(|conn| {
        insert_tab(conn, tab)?;
        Ok(())
    })
}

pub fn delete_space(db: &Database, space_id: &str) -> Result<()> {
    db.with_connection(|conn| {
        conn.execute("DELETE FROM spaces WHERE id = ?1", [space_id])?;
        Ok(())
    })
}

/// Rebuild the full store from disk at startup.
pub fn load_store(db: &Database) -> Result<TabStore> {
    let mut store = TabStore::new();

    let spaces = db.with_connection(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, icon, background_colors, text_color, is_incognito, order_index, legacy_tab_ids
             FROM spaces ORDER BY order_index",
        )?;
        let spaces: Vec<Space> = stmt
            .query_map([], |row| {
                let colors_json: String = row.get(3)?;
                let legacy_json: String = row.get(7)?;
                let order: i64 = row.get(6)?;

                let mut space = Space::new(row.get::<_, String>(1)?);
                space.id = row.get(0)?;
                space.icon = row.get(2)?;
                space.background_colors = serde_json::from_str(&colors_json).unwrap_or_default();
                space.text_color = row.get(4)?;
                space.is_incognito = row.get::<_, i32>(5)? != 0;
                space.order_index = order.max(0) as usize;
                space.legacy_tab_ids = serde_json::from_str(&legacy_json).unwrap_or_default();
                Ok(space)
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(spaces)
    })?;

    for space in spaces {
        store.restore_space(space);
    }

    let groups = db.with_connection(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, space_id, kind, order_index, created_at FROM tab_groups ORDER BY order_index",
        )?;
        let groups: Vec<TabGroup> = stmt
            .query_map([], |row| {
                let kind_str: String = row.get(2)?;
                let order: i64 = row.get(3)?;
                let created_str: String = row.get(4)?;

                let mut group = TabGroup::new(
                    row.get::<_, String>(1)?,
                    TabKind::from_str(&kind_str).unwrap_or(TabKind::Primary),
                );
                group.id = row.get(0)?;
                group.order_index = order.max(0) as usize;
                group.created_at = parse_instant(&created_str);
                Ok(group)
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(groups)
    })?;

    for group in groups {
        store.restore_group(group);
    }

    let rows = db.with_connection(|conn| {
        let mut stmt =
            conn.prepare("SELECT id, group_id, row_index FROM tab_rows ORDER BY row_index")?;
        let rows: Vec<TabRow> = stmt
            .query_map([], |row| {
                let index: i64 = row.get(2)?;

                let mut tab_row = TabRow::new(row.get::<_, String>(1)?);
                tab_row.id = row.get(0)?;
                tab_row.row_index = index.max(0) as usize;
                Ok(tab_row)
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    })?;

    for row in rows {
        store.restore_row(row);
    }

    let tabs = db.with_connection(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, row_id, space_id, url, kind, order_index, folder_name, is_temporary, last_visited_at
             FROM tabs ORDER BY order_index",
        )?;
        let tabs: Vec<StoredTab> = stmt
            .query_map([], |row| {
                let kind_str: String = row.get(4)?;
                let order: i64 = row.get(5)?;
                let visited_str: String = row.get(8)?;

                let mut tab = StoredTab::new(
                    row.get::<_, String>(3)?,
                    TabKind::from_str(&kind_str).unwrap_or(TabKind::Primary),
                );
                tab.id = row.get(0)?;
                tab.row_id = row.get(1)?;
                tab.space_id = row.get(2)?;
                tab.order_index = order.max(0) as usize;
                tab.folder_name = row.get(6)?;
                tab.is_temporary = row.get::<_, i32>(7)? != 0;
                tab.last_visited_at = parse_instant(&visited_str);
                Ok(tab)
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(tabs)
    })?;

    for tab in tabs {
        // A temporary tab on disk would be a defect from a previous run;
        // drop it rather than resurrecting a placeholder.
        if tab.is_temporary {
            tracing::warn!(tab_id = %tab.id, "Dropping persisted temporary tab");
            continue;
        }
        store.restore_tab(tab);
    }

    store.finish_restore();
    Ok(store)
}

fn insert_group(conn: &rusqlite::Connection, group: &TabGroup) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO tab_groups (id, space_id, kind, order_index, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            group.id,
            group.space_id,
            group.kind.as_str(),
            group.order_index as i64,
            group.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn insert_row(conn: &rusqlite::Connection, row: &TabRow) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO tab_rows (id, group_id, row_index) VALUES (?1, ?2, ?3)",
        rusqlite::params![row.id, row.group_id, row.row_index as i64],
    )?;
    Ok(())
}

fn insert_tab(conn: &rusqlite::Connection, tab: &StoredTab) -> Result<()> {
    if tab.is_temporary {
        return Ok(());
    }

    conn.execute(
        "INSERT OR REPLACE INTO tabs
         (id, row_id, space_id, url, kind, order_index, folder_name, is_temporary, last_visited_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
        rusqlite::params![
            tab.id,
            tab.row_id,
            tab.space_id,
            tab.url,
            tab.kind.as_str(),
            tab.order_index as i64,
            tab.folder_name,
            tab.last_visited_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn parse_instant(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_tree_roundtrip() {
        let db = Database::open_in_memory().unwrap();

        let mut store = TabStore::new();
        let space_id = store.add_space(Space::new("Work"));
        let group_id = store
            .add_group(
                &space_id,
                TabKind::Primary,
                vec![StoredTab::new("https://example.com", TabKind::Primary)],
            )
            .unwrap();
        store
            .add_row(
                vec![StoredTab::new("https://docs.example.com", TabKind::Primary)],
                &group_id,
            )
            .unwrap();

        save_space_tree(&db, &store, &space_id).unwrap();

        let loaded = load_store(&db).unwrap();
        loaded.check_invariants().unwrap();

        let space = loaded.space(&space_id).unwrap();
        assert_eq!(space.name, "Work");
        assert_eq!(space.primary_group_ids, vec![group_id.clone()]);

        let view = loaded.nested_view(&group_id, false);
        assert_eq!(view.len(), 2);
        assert_eq!(view[0][0].url, "https://example.com");
        assert_eq!(view[1][0].url, "https://docs.example.com");
    }

    #[test]
    fn test_temporary_tabs_never_hit_disk() {
        let db = Database::open_in_memory().unwrap();

        let mut store = TabStore::new();
        let space_id = store.add_space(Space::new("Work"));
        let group_id = store
            .add_group(
                &space_id,
                TabKind::Primary,
                vec![StoredTab::new("https://example.com", TabKind::Primary)],
            )
            .unwrap();
        let row_id = store.group(&group_id).unwrap().row_ids[0].clone();
        store.add_tab(strata_tabs::StoredTab::temporary(TabKind::Primary), &row_id);

        save_space_tree(&db, &store, &space_id).unwrap();

        let count: i64 = db
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM tabs", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_legacy_only_tabs_roundtrip() {
        let db = Database::open_in_memory().unwrap();

        let mut store = TabStore::new();
        let space_id = store.add_space(Space::new("Work"));
        let tab = StoredTab::new("https://old.example.com", TabKind::Primary);
        let tab_id = tab.id.clone();
        assert!(store.add_legacy_tab(&space_id, tab));

        save_space_tree(&db, &store, &space_id).unwrap();

        let loaded = load_store(&db).unwrap();
        let loaded_tab = loaded.tab(&tab_id).unwrap();
        assert_eq!(loaded_tab.row_id, None);
        assert!(loaded.find_group_containing(&tab_id).is_none());
        assert_eq!(
            loaded.space(&space_id).unwrap().legacy_tab_ids,
            vec![tab_id]
        );
    }
}
