//! Session Manager
//!
//! The single owner of the tab store and the working tree. Every user
//! intent lands here, mutates the store, is persisted immediately, and is
//! mirrored into the working tree. Persistence failures are logged and
//! never roll back the in-memory mutation; memory stays authoritative for
//! the rest of the session and the next successful save reconciles.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use strata_navigation::InputResolver;
use strata_storage::Database;
use strata_tabs::{Space, StoredTab, TabKind, TabStore, TEMPORARY_TAB_URL};

use crate::cache::PreloadCache;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::events::{SessionEvent, SessionObserver};
use crate::persist;
use crate::surface::{ContentSurface, SurfaceFactory, TitleResolver};
use crate::working::{OpenTab, WorkingTree};
use crate::Result;

pub struct SessionManager {
    store: TabStore,
    db: Database,
    config: SessionConfig,
    resolver: InputResolver,
    factory: Arc<dyn SurfaceFactory>,
    title_resolver: Option<Arc<dyn TitleResolver>>,
    working: WorkingTree,
    preloaded: PreloadCache,
    /// Live URL per open tab, for immediate UI display
    live_urls: HashMap<String, String>,
    /// Resolved page titles, purely decorative
    titles: HashMap<String, String>,
    observers: Vec<SessionObserver>,
    current_space_id: Option<String>,
    launch_tasks_done: bool,
}

impl SessionManager {
    /// Load the store from disk, creating the default space on first
    /// launch.
    pub fn new(
        db: Database,
        config: SessionConfig,
        factory: Arc<dyn SurfaceFactory>,
    ) -> Result<Self> {
        let mut store = persist::load_store(&db)?;

        if store.spaces().next().is_none() {
            let space_id = store.add_space(Space::default_space());
            persist::save_space_tree(&db, &store, &space_id)?;
            tracing::info!(space_id = %space_id, "Created default space");
        }

        let current_space_id = store
            .spaces()
            .min_by_key(|s| s.order_index)
            .map(|s| s.id.clone());

        let resolver = InputResolver::new(config.search_template.clone());
        let preloaded = PreloadCache::new(config.preload_capacity);

        Ok(Self {
            store,
            db,
            config,
            resolver,
            factory,
            title_resolver: None,
            working: WorkingTree::new(),
            preloaded,
            live_urls: HashMap::new(),
            titles: HashMap::new(),
            observers: Vec::new(),
            current_space_id,
            launch_tasks_done: false,
        })
    }

    pub fn with_title_resolver(mut self, resolver: Arc<dyn TitleResolver>) -> Self {
        self.title_resolver = Some(resolver);
        self
    }

    pub fn subscribe(&mut self, observer: SessionObserver) {
        self.observers.push(observer);
    }

    // === Accessors ===

    pub fn store(&self) -> &TabStore {
        &self.store
    }

    pub fn working_tree(&self) -> &WorkingTree {
        &self.working
    }

    pub fn preloaded(&self) -> &PreloadCache {
        &self.preloaded
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn current_space_id(&self) -> Option<&str> {
        self.current_space_id.as_deref()
    }

    pub fn set_current_space(&mut self, space_id: &str) -> Result<()> {
        if self.store.space(space_id).is_none() {
            return Err(SessionError::SpaceNotFound(space_id.to_string()));
        }
        self.current_space_id = Some(space_id.to_string());
        Ok(())
    }

    pub fn live_url(&self, tab_id: &str) -> Option<&str> {
        self.live_urls.get(tab_id).map(String::as_str)
    }

    pub fn title(&self, tab_id: &str) -> Option<&str> {
        self.titles.get(tab_id).map(String::as_str)
    }

    // === Space operations ===

    pub fn create_space(&mut self, name: &str) -> Result<Space> {
        let space_id = self.store.add_space(Space::new(name));
        self.persist_space(&space_id);

        let space = self
            .store
            .space(&space_id)
            .cloned()
            .ok_or_else(|| SessionError::SpaceNotFound(space_id))?;
        tracing::info!(space_id = %space.id, name = %space.name, "Created space");
        Ok(space)
    }

    /// Destroy a space and everything it owns.
    pub fn remove_space(&mut self, space_id: &str) -> Result<()> {
        if !self.store.remove_space(space_id) {
            return Err(SessionError::SpaceNotFound(space_id.to_string()));
        }
        if let Err(e) = persist::delete_space(&self.db, space_id) {
            tracing::warn!(space_id = %space_id, error = %e, "Failed to delete space from storage");
        }
        if self.current_space_id.as_deref() == Some(space_id) {
            self.current_space_id = self.store.spaces().next().map(|s| s.id.clone());
            self.working.clear();
            self.refresh_live_urls();
            self.emit(SessionEvent::WorkingTreeReplaced);
        }
        Ok(())
    }

    // === Tab operations ===

    /// Open a new single-tab group in the primary collection. The input is
    /// normalized first (scheme passthrough, bare-host heuristics, search
    /// fallback); malformed input errors out before any store mutation.
    pub fn new_tab(&mut self, input: &str, space_id: &str) -> Result<StoredTab> {
        let url = self.resolver.normalize(input)?;

        let group_id = self
            .store
            .add_group(space_id, TabKind::Primary, vec![StoredTab::new(url, TabKind::Primary)])
            .ok_or_else(|| SessionError::SpaceNotFound(space_id.to_string()))?;

        let tab = self
            .store
            .first_tab_of_group(&group_id)
            .cloned()
            .ok_or_else(|| SessionError::GroupNotFound(group_id))?;

        self.persist_space(space_id);
        self.current_space_id = Some(space_id.to_string());

        let surface = self.obtain_surface(&tab);
        self.working.replace_single(tab.clone(), surface);
        self.refresh_live_urls();

        tracing::info!(tab_id = %tab.id, url = %tab.url, "Opened new tab");
        self.emit(SessionEvent::TabOpened {
            tab_id: tab.id.clone(),
        });
        self.emit(SessionEvent::WorkingTreeReplaced);

        Ok(tab)
    }

    /// Bring a tab on screen. If the tab belongs to a tracked group, the
    /// group's full split layout is restored, reusing preloaded surfaces
    /// where ids match; otherwise a single-tab tree is built. Focus lands
    /// on the requested tab, defaulting to (0, 0).
    pub fn select_or_load_tab(&mut self, tab_id: &str) -> Result<()> {
        let group = self
            .store
            .find_group_containing(tab_id)
            .map(|g| (g.id.clone(), g.space_id.clone()));

        match group {
            Some((group_id, space_id)) => {
                let nested = self.store.nested_view(&group_id, false);
                let mut rows = Vec::with_capacity(nested.len());
                for stored_row in nested {
                    let mut row = Vec::with_capacity(stored_row.len());
                    for stored in stored_row {
                        let surface = self.obtain_surface(&stored);
                        row.push(OpenTab {
                            tab: stored,
                            surface,
                        });
                    }
                    rows.push(row);
                }
                self.working.set_rows(rows);
                self.current_space_id = Some(space_id);
            }
            None => {
                let tab = self
                    .store
                    .tab(tab_id)
                    .cloned()
                    .ok_or_else(|| SessionError::TabNotFound(tab_id.to_string()))?;
                if let Some(space_id) = tab.space_id.clone() {
                    self.current_space_id = Some(space_id);
                }
                let surface = self.obtain_surface(&tab);
                self.working.replace_single(tab, surface);
            }
        }

        let (row, col) = self.working.position_of(tab_id).unwrap_or((0, 0));
        self.working.set_focus(row, col);

        if let Some(tab) = self.store.tab_mut(tab_id) {
            tab.touch();
        }
        if let Some(tab) = self.store.tab(tab_id).cloned() {
            if !tab.is_temporary {
                if let Err(e) = persist::save_tab(&self.db, &tab) {
                    tracing::warn!(tab_id = %tab_id, error = %e, "Failed to persist tab visit");
                }
            }
        }

        self.refresh_live_urls();
        self.emit(SessionEvent::WorkingTreeReplaced);
        Ok(())
    }

    /// Close a tab and select a replacement: the first tab of the group
    /// after the closed group's position in the same collection, else the
    /// group before it, else nothing. Returns the replacement so the
    /// caller can move its "selected" indicator.
    pub fn close_tab(&mut self, tab_id: &str) -> Result<Option<StoredTab>> {
        let owning = self
            .store
            .find_group_containing(tab_id)
            .map(|g| (g.id.clone(), g.kind, g.order_index, g.space_id.clone()));

        let Some((group_id, kind, closed_order, space_id)) = owning else {
            // Legacy flat-layout tab, or already gone
            let Some(removal) = self.store.remove_tab(tab_id) else {
                return Err(SessionError::TabNotFound(tab_id.to_string()));
            };
            self.drop_tab_bookkeeping(tab_id);
            if let Some(space_id) = &removal.space_id {
                self.persist_space(space_id);
            }
            self.emit(SessionEvent::TabClosed {
                tab_id: tab_id.to_string(),
                replacement: None,
            });
            return Ok(None);
        };

        let removal = self
            .store
            .remove_tab(tab_id)
            .ok_or_else(|| SessionError::TabNotFound(tab_id.to_string()))?;
        self.drop_tab_bookkeeping(tab_id);
        self.persist_space(&space_id);

        let exclude = if removal.removed_group.is_some() {
            None
        } else {
            Some(group_id.as_str())
        };
        let replacement = self.replacement_in_collection(&space_id, kind, closed_order, exclude);

        match &replacement {
            Some(next) => self.select_or_load_tab(&next.id)?,
            None => {
                self.working.clear();
                self.refresh_live_urls();
                self.emit(SessionEvent::WorkingTreeReplaced);
            }
        }

        tracing::info!(tab_id = %tab_id, "Closed tab");
        self.emit(SessionEvent::TabClosed {
            tab_id: tab_id.to_string(),
            replacement: replacement.as_ref().map(|t| t.id.clone()),
        });

        Ok(replacement)
    }

    /// Close a whole group and all its rows and tabs. Replacement search
    /// runs at group granularity: first group with a strictly greater
    /// order index, else the greatest order index still below, else any
    /// group across the space's three collections.
    pub fn close_tab_group(&mut self, group_id: &str) -> Result<Option<StoredTab>> {
        let group = self
            .store
            .group(group_id)
            .cloned()
            .ok_or_else(|| SessionError::GroupNotFound(group_id.to_string()))?;
        let space_id = group.space_id.clone();

        let tab_ids: Vec<String> = self
            .store
            .nested_view(group_id, true)
            .into_iter()
            .flatten()
            .map(|t| t.id)
            .collect();
        for tab_id in &tab_ids {
            self.store.remove_tab(tab_id);
            self.drop_tab_bookkeeping(tab_id);
        }
        self.persist_space(&space_id);

        let mut replacement =
            self.replacement_in_collection(&space_id, group.kind, group.order_index, None);

        if replacement.is_none() {
            // Last resort: any remaining group in the space
            for kind in [TabKind::Primary, TabKind::Pinned, TabKind::Favorite] {
                let first = self
                    .store
                    .groups_of(&space_id, kind)
                    .first()
                    .map(|g| g.id.clone());
                if let Some(gid) = first {
                    replacement = self.store.first_tab_of_group(&gid).cloned();
                    break;
                }
            }
        }

        match &replacement {
            Some(next) => self.select_or_load_tab(&next.id)?,
            None => {
                self.working.clear();
                self.refresh_live_urls();
                self.emit(SessionEvent::WorkingTreeReplaced);
            }
        }

        tracing::info!(group_id = %group_id, tabs = tab_ids.len(), "Closed tab group");
        self.emit(SessionEvent::GroupClosed {
            group_id: group_id.to_string(),
        });

        Ok(replacement)
    }

    /// Move a tab to a different classification. The store relocates it;
    /// any matching working-tree entry is updated in place so the UI
    /// reflects the change without a reload.
    pub fn update_tab_kind(&mut self, tab_id: &str, kind: TabKind) -> Result<()> {
        let group_id = self
            .store
            .reclassify(tab_id, kind)
            .ok_or_else(|| SessionError::TabNotFound(tab_id.to_string()))?;

        if let Some(space_id) = self.store.group(&group_id).map(|g| g.space_id.clone()) {
            self.persist_space(&space_id);
        }

        if let Some(open) = self.working.tab_mut(tab_id) {
            open.tab.kind = kind;
        }

        self.emit(SessionEvent::TabReclassified {
            tab_id: tab_id.to_string(),
            kind,
        });
        Ok(())
    }

    /// Reorder a tab within its row.
    pub fn move_tab_in_row(&mut self, tab_id: &str, new_index: usize) -> Result<()> {
        if !self.store.move_tab_in_row(tab_id, new_index) {
            return Err(SessionError::TabNotFound(tab_id.to_string()));
        }
        let space_id = self
            .store
            .find_group_containing(tab_id)
            .map(|g| g.space_id.clone());
        if let Some(space_id) = space_id {
            self.persist_space(&space_id);
        }
        Ok(())
    }

    // === Split-view operations ===

    /// Add a column to an existing row of the current layout. The sentinel
    /// URL produces an unpersisted placeholder; a real URL is persisted
    /// into the row backing the displayed structure, creating a new group
    /// only when none can be resolved from the focused tab.
    pub fn add_tab_to_current_row(&mut self, input: &str, row_index: usize) -> Result<StoredTab> {
        if input == TEMPORARY_TAB_URL {
            return Ok(self.add_placeholder(|working, open| working.push_tab_to_row(row_index, open)));
        }

        let url = self.resolver.normalize(input)?;

        let backing = self.backing_group_of_focused();
        let mut created_row = false;
        let stored = match backing {
            Some((group_id, kind, space_id)) => {
                let row_id = self
                    .store
                    .group(&group_id)
                    .and_then(|g| g.row_ids.get(row_index).cloned());
                let tab = StoredTab::new(url, kind);
                let tab_id = tab.id.clone();
                match row_id {
                    Some(row_id) => {
                        self.store.add_tab(tab, &row_id);
                    }
                    None => {
                        self.store.add_row(vec![tab], &group_id);
                        created_row = true;
                    }
                }
                self.persist_space(&space_id);
                self.store
                    .tab(&tab_id)
                    .cloned()
                    .ok_or(SessionError::TabNotFound(tab_id))?
            }
            None => self.open_detached_group(url)?,
        };

        let surface = self.obtain_surface(&stored);
        let open = OpenTab {
            tab: stored.clone(),
            surface,
        };
        // The layout must mirror the backing group: when the index was past
        // the last row and the store grew a new row, so does the layout.
        let (row, col) = if created_row {
            self.working.push_row(vec![open])
        } else {
            self.working.push_tab_to_row(row_index, open)
        };
        self.working.set_focus(row, col);
        self.live_urls.insert(stored.id.clone(), stored.url.clone());

        self.emit(SessionEvent::TabOpened {
            tab_id: stored.id.clone(),
        });
        Ok(stored)
    }

    /// Add a whole new row below the current layout.
    pub fn add_new_row_to_current_tabs(&mut self, input: &str) -> Result<StoredTab> {
        if input == TEMPORARY_TAB_URL {
            return Ok(self.add_placeholder(|working, open| working.push_row(vec![open])));
        }

        let url = self.resolver.normalize(input)?;

        let backing = self.backing_group_of_focused();
        let stored = match backing {
            Some((group_id, kind, space_id)) => {
                let tab = StoredTab::new(url, kind);
                let tab_id = tab.id.clone();
                self.store.add_row(vec![tab], &group_id);
                self.persist_space(&space_id);
                self.store
                    .tab(&tab_id)
                    .cloned()
                    .ok_or(SessionError::TabNotFound(tab_id))?
            }
            None => self.open_detached_group(url)?,
        };

        let surface = self.obtain_surface(&stored);
        let (row, col) = self.working.push_row(vec![OpenTab {
            tab: stored.clone(),
            surface,
        }]);
        self.working.set_focus(row, col);
        self.live_urls.insert(stored.id.clone(), stored.url.clone());

        self.emit(SessionEvent::TabOpened {
            tab_id: stored.id.clone(),
        });
        Ok(stored)
    }

    /// The one-shot temporary → permanent transition: the placeholder gets
    /// a real URL, a fresh identity and timestamp, enters the store for
    /// the first time, and starts loading.
    pub fn commit_temporary_tab(&mut self, tab_id: &str, input: &str) -> Result<StoredTab> {
        let position = self
            .working
            .position_of(tab_id)
            .ok_or_else(|| SessionError::TabNotFound(tab_id.to_string()))?;

        let placeholder = self
            .working
            .rows()
            .get(position.0)
            .and_then(|row| row.get(position.1))
            .map(|open| open.tab.clone())
            .ok_or_else(|| SessionError::TabNotFound(tab_id.to_string()))?;

        if !placeholder.is_temporary {
            return Err(SessionError::NotTemporary(tab_id.to_string()));
        }

        let url = self.resolver.normalize(input)?;

        let mut committed = placeholder;
        committed.commit(url);

        // Insert next to a persisted neighbor in the same row if the
        // layout is backed by a group; otherwise start a fresh group.
        let neighbor_row_id = self.working.rows()[position.0]
            .iter()
            .find(|open| !open.tab.is_temporary && open.tab.id != tab_id)
            .and_then(|open| self.store.tab(&open.tab.id))
            .and_then(|t| t.row_id.clone());

        let stored = match neighbor_row_id {
            Some(row_id) => {
                let space_id = self
                    .store
                    .row(&row_id)
                    .and_then(|r| self.store.group(&r.group_id))
                    .map(|g| g.space_id.clone());
                let new_id = committed.id.clone();
                if !self.store.add_tab(committed, &row_id) {
                    return Err(SessionError::TabNotFound(new_id));
                }
                if let Some(space_id) = space_id {
                    self.persist_space(&space_id);
                }
                self.store
                    .tab(&new_id)
                    .cloned()
                    .ok_or(SessionError::TabNotFound(new_id))?
            }
            None => {
                let url = committed.url.clone();
                self.open_detached_group(url)?
            }
        };

        // Swap the working entry in place, keep the surface, point it at
        // the real URL
        if let Some(open) = self.working.tab_mut(tab_id) {
            open.surface.load(&stored.url);
            open.tab = stored.clone();
        }
        if let Some(surface) = self.preloaded.remove(tab_id) {
            if let Some((evicted, _)) = self.preloaded.push(stored.id.clone(), surface) {
                tracing::debug!(tab_id = %evicted, "Evicted preloaded surface");
            }
        }
        self.live_urls.remove(tab_id);
        self.live_urls
            .insert(stored.id.clone(), stored.url.clone());
        self.titles.remove(tab_id);

        tracing::info!(tab_id = %stored.id, url = %stored.url, "Committed placeholder tab");
        self.emit(SessionEvent::TabOpened {
            tab_id: stored.id.clone(),
        });
        Ok(stored)
    }

    /// Sweep placeholder tabs out of the working tree, sparing only the
    /// focused one. Persisted storage is untouched; placeholders were
    /// never written to it.
    pub fn cleanup_temporary_tabs(&mut self) {
        let removed = self.working.remove_temporary_except_focused();
        for tab_id in &removed {
            self.drop_tab_bookkeeping(tab_id);
        }

        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "Cleaned up temporary tabs");
        }
        self.emit(SessionEvent::TemporaryTabsCleaned {
            removed: removed.len(),
        });
    }

    // === Launch tasks ===

    /// Run once per launch: migrate legacy flat-layout tabs into groups,
    /// then expire tabs past the retention window. Re-running is a no-op.
    pub fn app_launch_tasks(&mut self) {
        if self.launch_tasks_done {
            return;
        }

        let migrated = self.migrate_legacy_tabs();
        let cutoff = Utc::now() - chrono::Duration::minutes(self.config.retention_minutes);
        let expired = self.cleanup_old_tabs(cutoff);

        self.launch_tasks_done = true;
        tracing::info!(migrated, expired, "Launch tasks complete");
    }

    /// Wrap every legacy tab that has no group membership into a new
    /// single-row group of matching kind, appended after existing groups
    /// of that kind. Idempotent: already-grouped tabs are skipped.
    pub fn migrate_legacy_tabs(&mut self) -> usize {
        let space_ids: Vec<String> = self.store.spaces().map(|s| s.id.clone()).collect();
        let mut migrated = 0;

        for space_id in space_ids {
            let legacy: Vec<String> = self
                .store
                .space(&space_id)
                .map(|s| s.legacy_tab_ids.clone())
                .unwrap_or_default();
            let mut touched = false;

            for tab_id in legacy {
                if self.store.find_group_containing(&tab_id).is_some() {
                    continue;
                }

                let Some(tab) = self.store.tab(&tab_id).cloned() else {
                    // Dangling legacy reference; prune it
                    if let Some(space) = self.store.space_mut(&space_id) {
                        space.legacy_tab_ids.retain(|id| id != &tab_id);
                        touched = true;
                    }
                    continue;
                };

                if tab.is_temporary {
                    // Placeholders must not survive migration
                    self.store.remove_tab(&tab_id);
                    touched = true;
                    continue;
                }

                let mut tab = tab;
                tab.row_id = None;
                if self.store.add_group(&space_id, tab.kind, vec![tab]).is_some() {
                    migrated += 1;
                    touched = true;
                }
            }

            if touched {
                self.persist_space(&space_id);
            }
        }

        if migrated > 0 {
            tracing::info!(migrated, "Migrated legacy tabs into groups");
        }
        migrated
    }

    /// Delete every grouped tab last visited before `cutoff`, cascading
    /// empty rows and groups. Idempotent for an unchanged cutoff.
    pub fn cleanup_old_tabs(&mut self, cutoff: DateTime<Utc>) -> usize {
        let space_ids: Vec<String> = self.store.spaces().map(|s| s.id.clone()).collect();
        let mut removed = 0;

        for space_id in space_ids {
            let mut expired: Vec<String> = Vec::new();
            for kind in [TabKind::Primary, TabKind::Pinned, TabKind::Favorite] {
                let group_ids: Vec<String> = self
                    .store
                    .groups_of(&space_id, kind)
                    .iter()
                    .map(|g| g.id.clone())
                    .collect();
                for group_id in group_ids {
                    for row in self.store.nested_view(&group_id, false) {
                        for tab in row {
                            if tab.last_visited_at < cutoff {
                                expired.push(tab.id);
                            }
                        }
                    }
                }
            }

            if expired.is_empty() {
                continue;
            }

            for tab_id in &expired {
                self.store.remove_tab(tab_id);
                self.drop_tab_bookkeeping(tab_id);
            }
            removed += expired.len();
            self.persist_space(&space_id);
        }

        if removed > 0 {
            tracing::info!(removed, "Expired old tabs");
        }
        removed
    }

    // === Asynchronous callbacks from content surfaces ===

    /// A surface reported a navigation. No-op if the tab already left the
    /// working tree; late results of abandoned loads are ignored.
    pub fn note_url_changed(&mut self, tab_id: &str, url: &str) {
        if !self.working.contains(tab_id) {
            return;
        }

        self.live_urls.insert(tab_id.to_string(), url.to_string());
        if let Some(open) = self.working.tab_mut(tab_id) {
            open.tab.url = url.to_string();
        }

        let updated = match self.store.tab_mut(tab_id) {
            Some(tab) if !tab.is_temporary => {
                tab.url = url.to_string();
                tab.touch();
                Some(tab.clone())
            }
            _ => None,
        };
        if let Some(tab) = updated {
            if let Err(e) = persist::save_tab(&self.db, &tab) {
                tracing::warn!(tab_id = %tab_id, error = %e, "Failed to persist URL change");
            }
        }
    }

    /// A title lookup completed. No-op for tabs no longer on screen.
    pub fn note_title(&mut self, tab_id: &str, title: &str) {
        if !self.working.contains(tab_id) {
            return;
        }
        self.titles.insert(tab_id.to_string(), title.to_string());
    }

    // === Internal ===

    fn emit(&self, event: SessionEvent) {
        for observer in &self.observers {
            observer(&event);
        }
    }

    fn persist_space(&self, space_id: &str) {
        if let Err(e) = persist::save_space_tree(&self.db, &self.store, space_id) {
            tracing::warn!(
                space_id = %space_id,
                error = %e,
                "Failed to persist space; in-memory state stays authoritative"
            );
        }
    }

    /// Reuse a preloaded surface for the tab if one exists, otherwise
    /// create one, start loading, and enter it into the FIFO cache.
    fn obtain_surface(&mut self, tab: &StoredTab) -> Arc<dyn ContentSurface> {
        if let Some(surface) = self.preloaded.get(&tab.id) {
            return surface;
        }

        let surface = self.factory.create();
        surface.load(&tab.url);

        if let Some((evicted, _)) = self.preloaded.push(tab.id.clone(), Arc::clone(&surface)) {
            tracing::debug!(tab_id = %evicted, "Evicted preloaded surface");
        }

        if !tab.is_temporary {
            if let Some(resolver) = &self.title_resolver {
                if let Some(title) = resolver.fetch_title(&tab.url) {
                    self.titles.insert(tab.id.clone(), title);
                }
            }
        }

        surface
    }

    fn add_placeholder(
        &mut self,
        place: impl FnOnce(&mut WorkingTree, OpenTab) -> (usize, usize),
    ) -> StoredTab {
        let kind = self
            .working
            .focused_tab()
            .map(|open| open.tab.kind)
            .unwrap_or(TabKind::Primary);
        let tab = StoredTab::temporary(kind);

        let surface = self.factory.create();
        surface.load(TEMPORARY_TAB_URL);
        if let Some((evicted, _)) = self.preloaded.push(tab.id.clone(), Arc::clone(&surface)) {
            tracing::debug!(tab_id = %evicted, "Evicted preloaded surface");
        }

        let (row, col) = place(
            &mut self.working,
            OpenTab {
                tab: tab.clone(),
                surface,
            },
        );
        self.working.set_focus(row, col);
        tab
    }

    /// Group/kind/space backing the currently focused tab, if the focused
    /// tab is persisted.
    fn backing_group_of_focused(&self) -> Option<(String, TabKind, String)> {
        let focused_id = self.working.focused_tab().map(|open| open.tab.id.clone())?;
        let group = self.store.find_group_containing(&focused_id)?;
        Some((group.id.clone(), group.kind, group.space_id.clone()))
    }

    /// Open a fresh primary group in the current space for a URL that has
    /// no resolvable backing structure.
    fn open_detached_group(&mut self, url: String) -> Result<StoredTab> {
        let space_id = self
            .current_space_id
            .clone()
            .ok_or(SessionError::NoCurrentSpace)?;
        let group_id = self
            .store
            .add_group(&space_id, TabKind::Primary, vec![StoredTab::new(url, TabKind::Primary)])
            .ok_or(SessionError::SpaceNotFound(space_id.clone()))?;
        self.persist_space(&space_id);
        self.store
            .first_tab_of_group(&group_id)
            .cloned()
            .ok_or(SessionError::GroupNotFound(group_id))
    }

    /// First tab of the group after `closed_order` in the collection, else
    /// of the group before it, else none.
    fn replacement_in_collection(
        &self,
        space_id: &str,
        kind: TabKind,
        closed_order: usize,
        exclude: Option<&str>,
    ) -> Option<StoredTab> {
        let groups = self.store.groups_of(space_id, kind);

        let next = groups
            .iter()
            .find(|g| exclude != Some(g.id.as_str()) && g.order_index >= closed_order);
        let prev = groups
            .iter()
            .rev()
            .find(|g| exclude != Some(g.id.as_str()) && g.order_index < closed_order);

        let target = next.or(prev)?;
        self.store.first_tab_of_group(&target.id).cloned()
    }

    fn drop_tab_bookkeeping(&mut self, tab_id: &str) {
        self.preloaded.remove(tab_id);
        self.live_urls.remove(tab_id);
        self.titles.remove(tab_id);
    }

    fn refresh_live_urls(&mut self) {
        self.live_urls.clear();
        for open in self.working.iter_tabs() {
            self.live_urls
                .insert(open.tab.id.clone(), open.tab.url.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessFactory;

    fn manager() -> SessionManager {
        let db = Database::open_in_memory().unwrap();
        SessionManager::new(db, SessionConfig::default(), Arc::new(HeadlessFactory)).unwrap()
    }

    fn manager_with_capacity(capacity: usize) -> SessionManager {
        let db = Database::open_in_memory().unwrap();
        let config = SessionConfig {
            preload_capacity: capacity,
            ..SessionConfig::default()
        };
        SessionManager::new(db, config, Arc::new(HeadlessFactory)).unwrap()
    }

    fn default_space(manager: &SessionManager) -> String {
        manager.current_space_id().unwrap().to_string()
    }

    #[test]
    fn test_first_launch_creates_default_space() {
        let manager = manager();
        assert_eq!(manager.store().spaces().count(), 1);
        assert!(manager.current_space_id().is_some());
    }

    #[test]
    fn test_new_tab_builds_group_row_tab() {
        let mut manager = manager();
        let space_id = default_space(&manager);

        let tab = manager.new_tab("example.com", &space_id).unwrap();
        assert_eq!(tab.url, "https://example.com");
        assert_eq!(tab.kind, TabKind::Primary);

        let space = manager.store().space(&space_id).unwrap();
        assert_eq!(space.primary_group_ids.len(), 1);

        let group_id = space.primary_group_ids[0].clone();
        let view = manager.store().nested_view(&group_id, true);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].len(), 1);
        assert_eq!(view[0][0].url, "https://example.com");

        assert_eq!(manager.working_tree().focused_tab().unwrap().tab.id, tab.id);
    }

    #[test]
    fn test_close_only_tab_leaves_empty_tree_and_no_replacement() {
        let mut manager = manager();
        let space_id = default_space(&manager);
        let tab = manager.new_tab("example.com", &space_id).unwrap();

        let replacement = manager.close_tab(&tab.id).unwrap();
        assert!(replacement.is_none());
        assert!(manager.working_tree().is_empty());
        assert!(manager
            .store()
            .space(&space_id)
            .unwrap()
            .primary_group_ids
            .is_empty());
    }

    #[test]
    fn test_close_tab_prefers_following_group() {
        let mut manager = manager();
        let space_id = default_space(&manager);

        let t1 = manager.new_tab("https://one.example", &space_id).unwrap();
        let t2 = manager.new_tab("https://two.example", &space_id).unwrap();
        let t3 = manager.new_tab("https://three.example", &space_id).unwrap();

        let replacement = manager.close_tab(&t2.id).unwrap().unwrap();
        assert_eq!(replacement.id, t3.id);
        assert_eq!(
            manager.working_tree().focused_tab().unwrap().tab.id,
            t3.id
        );

        // Closing the highest-ordered group falls back to the preceding one
        let replacement = manager.close_tab(&t3.id).unwrap().unwrap();
        assert_eq!(replacement.id, t1.id);
    }

    #[test]
    fn test_close_group_replacement_scenario() {
        let mut manager = manager();
        let space_id = default_space(&manager);

        let t1 = manager.new_tab("https://one.example", &space_id).unwrap();
        let t2 = manager.new_tab("https://two.example", &space_id).unwrap();
        let t3 = manager.new_tab("https://three.example", &space_id).unwrap();

        let g1 = manager.store().find_group_containing(&t1.id).unwrap().id.clone();
        let g2 = manager.store().find_group_containing(&t2.id).unwrap().id.clone();
        let g3 = manager.store().find_group_containing(&t3.id).unwrap().id.clone();

        let replacement = manager.close_tab_group(&g2).unwrap().unwrap();
        assert_eq!(replacement.id, t3.id);

        let space = manager.store().space(&space_id).unwrap();
        assert_eq!(space.primary_group_ids, vec![g1, g3]);
    }

    #[test]
    fn test_close_group_last_resort_crosses_collections() {
        let mut manager = manager();
        let space_id = default_space(&manager);

        let pinned = manager.new_tab("https://pin.example", &space_id).unwrap();
        manager.update_tab_kind(&pinned.id, TabKind::Pinned).unwrap();

        let primary = manager.new_tab("https://one.example", &space_id).unwrap();
        let group = manager
            .store()
            .find_group_containing(&primary.id)
            .unwrap()
            .id
            .clone();

        let replacement = manager.close_tab_group(&group).unwrap().unwrap();
        assert_eq!(replacement.id, pinned.id);
    }

    #[test]
    fn test_close_unknown_tab_is_not_found() {
        let mut manager = manager();
        match manager.close_tab("missing") {
            Err(SessionError::TabNotFound(_)) => {}
            other => panic!("expected TabNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_invalid_input_never_reaches_store() {
        let mut manager = manager();
        let space_id = default_space(&manager);

        assert!(manager.new_tab("   ", &space_id).is_err());
        assert!(manager
            .store()
            .space(&space_id)
            .unwrap()
            .primary_group_ids
            .is_empty());
    }

    #[test]
    fn test_update_tab_kind_reflected_in_store_and_tree() {
        let mut manager = manager();
        let space_id = default_space(&manager);
        let tab = manager.new_tab("example.com", &space_id).unwrap();

        manager.update_tab_kind(&tab.id, TabKind::Favorite).unwrap();

        let group = manager.store().find_group_containing(&tab.id).unwrap();
        assert_eq!(group.kind, TabKind::Favorite);
        assert_eq!(
            manager.store().tab(&tab.id).unwrap().kind,
            TabKind::Favorite
        );
        let (row, col) = manager.working_tree().position_of(&tab.id).unwrap();
        assert_eq!(
            manager.working_tree().rows()[row][col].tab.kind,
            TabKind::Favorite
        );
    }

    #[test]
    fn test_split_view_add_tab_and_row() {
        let mut manager = manager();
        let space_id = default_space(&manager);
        let first = manager.new_tab("example.com", &space_id).unwrap();

        let second = manager
            .add_tab_to_current_row("https://side.example", 0)
            .unwrap();
        let third = manager
            .add_new_row_to_current_tabs("https://below.example")
            .unwrap();

        // Working tree mirrors the split: two columns in row 0, one in row 1
        assert_eq!(manager.working_tree().rows().len(), 2);
        assert_eq!(manager.working_tree().rows()[0].len(), 2);
        assert_eq!(manager.working_tree().rows()[1].len(), 1);

        // Store mirrors the same nested shape
        let group_id = manager
            .store()
            .find_group_containing(&first.id)
            .unwrap()
            .id
            .clone();
        let view = manager.store().nested_view(&group_id, false);
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].len(), 2);
        assert_eq!(view[0][1].id, second.id);
        assert_eq!(view[1][0].id, third.id);
    }

    #[test]
    fn test_out_of_range_row_index_adds_row_on_both_sides() {
        let mut manager = manager();
        let space_id = default_space(&manager);
        let first = manager.new_tab("example.com", &space_id).unwrap();

        // Past-the-end index grows a new row rather than widening the last one
        let second = manager
            .add_tab_to_current_row("https://side.example", 5)
            .unwrap();

        assert_eq!(manager.working_tree().rows().len(), 2);
        assert_eq!(manager.working_tree().rows()[0].len(), 1);
        assert_eq!(manager.working_tree().rows()[1].len(), 1);

        let group_id = manager
            .store()
            .find_group_containing(&first.id)
            .unwrap()
            .id
            .clone();
        let view = manager.store().nested_view(&group_id, false);
        assert_eq!(view.len(), 2);
        assert_eq!(view[0][0].id, first.id);
        assert_eq!(view[1][0].id, second.id);
        assert_eq!(
            manager.working_tree().focus(),
            manager.working_tree().position_of(&second.id).unwrap()
        );
    }

    #[test]
    fn test_select_restores_split_layout_with_focus() {
        let mut manager = manager();
        let space_id = default_space(&manager);
        let first = manager.new_tab("example.com", &space_id).unwrap();
        let second = manager
            .add_tab_to_current_row("https://side.example", 0)
            .unwrap();

        // Navigate away, then come back through the second tab
        manager.new_tab("https://elsewhere.example", &space_id).unwrap();
        manager.select_or_load_tab(&second.id).unwrap();

        assert_eq!(manager.working_tree().rows()[0].len(), 2);
        assert_eq!(
            manager.working_tree().focus(),
            manager.working_tree().position_of(&second.id).unwrap()
        );
        assert!(manager.live_url(&first.id).is_some());
    }

    #[test]
    fn test_placeholder_tab_is_never_persisted() {
        let mut manager = manager();
        let space_id = default_space(&manager);
        manager.new_tab("example.com", &space_id).unwrap();

        let temp = manager
            .add_tab_to_current_row(TEMPORARY_TAB_URL, 0)
            .unwrap();
        assert!(temp.is_temporary);
        assert!(manager.store().tab(&temp.id).is_none());

        // Move focus back to the real tab, then sweep
        manager.working.set_focus(0, 0);
        manager.cleanup_temporary_tabs();

        assert!(!manager.working_tree().contains(&temp.id));
        let count: i64 = manager
            .db
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM tabs", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_commit_temporary_tab_persists_once() {
        let mut manager = manager();
        let space_id = default_space(&manager);
        manager.new_tab("example.com", &space_id).unwrap();

        let temp = manager
            .add_tab_to_current_row(TEMPORARY_TAB_URL, 0)
            .unwrap();
        let committed = manager
            .commit_temporary_tab(&temp.id, "docs.example.com")
            .unwrap();

        assert!(!committed.is_temporary);
        assert_eq!(committed.url, "https://docs.example.com");
        assert_ne!(committed.id, temp.id);
        assert!(manager.store().tab(&committed.id).is_some());

        // A second commit attempt is rejected: the transition is one-shot
        match manager.commit_temporary_tab(&committed.id, "other.example.com") {
            Err(SessionError::NotTemporary(_)) => {}
            other => panic!("expected NotTemporary, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_preload_cache_respects_capacity() {
        let mut manager = manager_with_capacity(2);
        let space_id = default_space(&manager);

        for i in 0..5 {
            manager
                .new_tab(&format!("https://site{}.example", i), &space_id)
                .unwrap();
            assert!(manager.preloaded().len() <= 2);
        }
    }

    #[test]
    fn test_migration_is_idempotent() {
        let mut manager = manager();
        let space_id = default_space(&manager);

        for url in ["https://a.example", "https://b.example"] {
            let tab = StoredTab::new(url, TabKind::Primary);
            assert!(manager.store.add_legacy_tab(&space_id, tab));
        }

        assert_eq!(manager.migrate_legacy_tabs(), 2);
        let groups_after_first = manager
            .store()
            .space(&space_id)
            .unwrap()
            .primary_group_ids
            .len();

        assert_eq!(manager.migrate_legacy_tabs(), 0);
        let groups_after_second = manager
            .store()
            .space(&space_id)
            .unwrap()
            .primary_group_ids
            .len();

        assert_eq!(groups_after_first, 2);
        assert_eq!(groups_after_first, groups_after_second);
        manager.store().check_invariants().unwrap();
    }

    #[test]
    fn test_cleanup_old_tabs_by_cutoff() {
        let mut manager = manager();
        let space_id = default_space(&manager);

        let old = manager.new_tab("https://old.example", &space_id).unwrap();
        let fresh = manager.new_tab("https://fresh.example", &space_id).unwrap();

        // Backdate one tab past the cutoff
        manager.store.tab_mut(&old.id).unwrap().last_visited_at =
            Utc::now() - chrono::Duration::days(30);

        let cutoff = Utc::now() - chrono::Duration::days(7);
        assert_eq!(manager.cleanup_old_tabs(cutoff), 1);

        assert!(manager.store().tab(&old.id).is_none());
        assert!(manager.store().tab(&fresh.id).is_some());
        assert!(manager.store().find_group_containing(&fresh.id).is_some());

        // Idempotent for an unchanged cutoff
        assert_eq!(manager.cleanup_old_tabs(cutoff), 0);
    }

    #[test]
    fn test_late_callbacks_for_closed_tabs_are_ignored() {
        let mut manager = manager();
        let space_id = default_space(&manager);
        let tab = manager.new_tab("example.com", &space_id).unwrap();
        manager.close_tab(&tab.id).unwrap();

        manager.note_url_changed(&tab.id, "https://late.example");
        manager.note_title(&tab.id, "Too late");

        assert!(manager.live_url(&tab.id).is_none());
        assert!(manager.title(&tab.id).is_none());
    }

    #[test]
    fn test_events_fire_on_mutations() {
        use parking_lot::Mutex;

        let mut manager = manager();
        let space_id = default_space(&manager);

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        manager.subscribe(Box::new(move |event| {
            sink.lock().push(format!("{:?}", event));
        }));

        let tab = manager.new_tab("example.com", &space_id).unwrap();
        manager.close_tab(&tab.id).unwrap();

        let events = seen.lock();
        assert!(events.iter().any(|e| e.starts_with("TabOpened")));
        assert!(events.iter().any(|e| e.starts_with("TabClosed")));
    }
}
