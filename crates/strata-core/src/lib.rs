//! Strata Core
//!
//! Central coordination layer for the Strata browser engine. Rust owns all
//! state; the renderer is a stateless view.

mod config;
mod engine;
mod error;

pub use config::Config;
pub use engine::Engine;
pub use error::CoreError;

// Re-export core components
pub use strata_navigation::{InputResolver, NavigationError, Resolution};
pub use strata_session::{
    ContentSurface, HeadlessFactory, HeadlessSurface, OpenTab, PreloadCache, SessionConfig,
    SessionError, SessionEvent, SessionManager, SurfaceFactory, TitleResolver, WorkingTree,
};
pub use strata_storage::{Database, StorageError};
pub use strata_tabs::{
    Space, StoredTab, TabError, TabGroup, TabKind, TabRow, TabStore, TEMPORARY_TAB_URL,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
