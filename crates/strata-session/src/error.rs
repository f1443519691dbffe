//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("Tab group not found: {0}")]
    GroupNotFound(String),

    #[error("Space not found: {0}")]
    SpaceNotFound(String),

    #[error("No space is currently open")]
    NoCurrentSpace,

    #[error("Tab is not a placeholder: {0}")]
    NotTemporary(String),

    #[error("Navigation error: {0}")]
    Navigation(#[from] strata_navigation::NavigationError),

    #[error("Storage error: {0}")]
    Storage(#[from] strata_storage::StorageError),

    #[error("Tab store error: {0}")]
    Tabs(#[from] strata_tabs::TabError),
}
