//! Tab store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("Tab group not found: {0}")]
    GroupNotFound(String),

    #[error("Space not found: {0}")]
    SpaceNotFound(String),

    #[error("Unknown tab kind: {0}")]
    UnknownKind(String),
}
