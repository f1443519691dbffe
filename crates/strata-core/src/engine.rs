//! Engine facade
//!
//! Owns the database handle and the session manager, and exposes the
//! surface the UI shell talks to. All state lives on the Rust side; the
//! renderer is a stateless view over it.

use std::sync::Arc;

use strata_session::{SessionEvent, SessionManager, SurfaceFactory};
use strata_storage::Database;
use strata_tabs::{Space, StoredTab, TabKind};

use crate::config::Config;
use crate::error::CoreError;
use crate::Result;

pub struct Engine {
    config: Config,
    db: Database,
    session: SessionManager,
}

impl Engine {
    /// Open the database at the configured path and load the session.
    /// Persisted preferences override the static config where present.
    pub fn new(config: Config, factory: Arc<dyn SurfaceFactory>) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db, factory)
    }

    /// Build on an already-open database. Used by tests and embedders that
    /// manage the connection themselves.
    pub fn with_database(
        mut config: Config,
        db: Database,
        factory: Arc<dyn SurfaceFactory>,
    ) -> Result<Self> {
        if let Some(template) = db.get_setting("search_engine")? {
            config.search_engine = template;
        }

        let session = SessionManager::new(db.clone(), config.session_config(), factory)?;

        Ok(Self {
            config,
            db,
            session,
        })
    }

    /// Run once after construction: legacy migration, then retention
    /// cleanup.
    pub fn startup(&mut self) {
        self.session.app_launch_tasks();
        tracing::info!("Engine started");
    }

    pub fn subscribe(&mut self, observer: Box<dyn Fn(&SessionEvent) + Send>) {
        self.session.subscribe(observer);
    }

    // === Session access ===

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    // === Tab operations ===

    /// Open a new tab in the current space.
    pub fn open_tab(&mut self, input: &str) -> Result<StoredTab> {
        let space_id = self
            .session
            .current_space_id()
            .ok_or_else(|| CoreError::Config("No space is open".to_string()))?
            .to_string();
        Ok(self.session.new_tab(input, &space_id)?)
    }

    pub fn open_homepage(&mut self) -> Result<StoredTab> {
        let homepage = self.config.homepage.clone();
        self.open_tab(&homepage)
    }

    pub fn select_tab(&mut self, tab_id: &str) -> Result<()> {
        Ok(self.session.select_or_load_tab(tab_id)?)
    }

    pub fn close_tab(&mut self, tab_id: &str) -> Result<Option<StoredTab>> {
        Ok(self.session.close_tab(tab_id)?)
    }

    pub fn close_tab_group(&mut self, group_id: &str) -> Result<Option<StoredTab>> {
        Ok(self.session.close_tab_group(group_id)?)
    }

    pub fn update_tab_kind(&mut self, tab_id: &str, kind: TabKind) -> Result<()> {
        Ok(self.session.update_tab_kind(tab_id, kind)?)
    }

    pub fn split_right(&mut self, input: &str, row_index: usize) -> Result<StoredTab> {
        Ok(self.session.add_tab_to_current_row(input, row_index)?)
    }

    pub fn split_down(&mut self, input: &str) -> Result<StoredTab> {
        Ok(self.session.add_new_row_to_current_tabs(input)?)
    }

    pub fn commit_temporary_tab(&mut self, tab_id: &str, input: &str) -> Result<StoredTab> {
        Ok(self.session.commit_temporary_tab(tab_id, input)?)
    }

    pub fn cleanup_temporary_tabs(&mut self) {
        self.session.cleanup_temporary_tabs();
    }

    // === Space operations ===

    pub fn create_space(&mut self, name: &str) -> Result<Space> {
        Ok(self.session.create_space(name)?)
    }

    pub fn remove_space(&mut self, space_id: &str) -> Result<()> {
        Ok(self.session.remove_space(space_id)?)
    }

    pub fn switch_space(&mut self, space_id: &str) -> Result<()> {
        Ok(self.session.set_current_space(space_id)?)
    }

    pub fn spaces(&self) -> Vec<&Space> {
        let mut spaces: Vec<&Space> = self.session.store().spaces().collect();
        spaces.sort_by_key(|s| s.order_index);
        spaces
    }

    // === Settings ===

    pub fn search_engine(&self) -> &str {
        &self.config.search_engine
    }

    pub fn set_search_engine(&mut self, template: String) -> Result<()> {
        self.db.set_setting("search_engine", &template)?;
        self.config.search_engine = template;
        Ok(())
    }

    pub fn theme(&self) -> Result<Option<String>> {
        Ok(self.db.get_setting("theme")?)
    }

    pub fn set_theme(&self, theme: &str) -> Result<()> {
        self.db.set_setting("theme", theme)?;
        Ok(())
    }

    // === Config ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}
