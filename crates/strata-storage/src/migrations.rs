//! Database migrations
//!
//! Schema for the tab hierarchy: spaces own three ordered collections of
//! tab groups, groups own rows, rows own tabs. Tabs additionally carry a
//! nullable legacy space reference from the pre-group flat layout.

use crate::Result;
use rusqlite::Connection;

const SCHEMA_VERSION: i32 = 1;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<i32, _> =
        conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        });

    match result {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(rusqlite::Error::SqliteFailure(_, _)) => {
            // Table doesn't exist yet
            conn.execute(
                "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
                [],
            )?;
            conn.execute("INSERT INTO schema_version (version) VALUES (0)", [])?;
            Ok(0)
        }
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    tracing::info!("Running migration v1: Initial schema");

    // Spaces: top-level workspaces. background_colors is a JSON array of
    // hex strings; legacy_tab_ids keeps the flat pre-group tab order.
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS spaces (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            icon TEXT NOT NULL DEFAULT '',
            background_colors TEXT NOT NULL DEFAULT '[]',
            text_color TEXT NOT NULL DEFAULT '',
            is_incognito INTEGER NOT NULL DEFAULT 0,
            order_index INTEGER NOT NULL DEFAULT 0,
            legacy_tab_ids TEXT NOT NULL DEFAULT '[]'
        );
    "#,
    )?;

    // Tab groups: one logical tab slot. kind doubles as the collection
    // role (primary/pinned/favorite) inside the owning space.
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS tab_groups (
            id TEXT PRIMARY KEY,
            space_id TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'primary',
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY (space_id) REFERENCES spaces(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_tab_groups_space ON tab_groups(space_id);
    "#,
    )?;

    // Tab rows: one horizontal split within a group.
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS tab_rows (
            id TEXT PRIMARY KEY,
            group_id TEXT NOT NULL,
            row_index INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (group_id) REFERENCES tab_groups(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_tab_rows_group ON tab_rows(group_id);
    "#,
    )?;

    // Tabs: row_id is NULL for legacy flat-layout tabs that have not been
    // migrated into a group yet. Temporary tabs are never written here.
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS tabs (
            id TEXT PRIMARY KEY,
            row_id TEXT,
            space_id TEXT,
            url TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'primary',
            order_index INTEGER NOT NULL DEFAULT 0,
            folder_name TEXT,
            is_temporary INTEGER NOT NULL DEFAULT 0,
            last_visited_at TEXT NOT NULL,
            FOREIGN KEY (row_id) REFERENCES tab_rows(id) ON DELETE CASCADE,
            FOREIGN KEY (space_id) REFERENCES spaces(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_tabs_row ON tabs(row_id);
        CREATE INDEX IF NOT EXISTS idx_tabs_space ON tabs(space_id);
    "#,
    )?;

    // Settings table
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#,
    )?;

    Ok(())
}
