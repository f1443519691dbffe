//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] strata_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] strata_session::SessionError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] strata_navigation::NavigationError),
}
