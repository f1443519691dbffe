//! Strata Hierarchical Tab Store
//!
//! The durable representation of "what is open": a Space owns three ordered
//! collections of tab groups (primary, pinned, favorite), a group owns rows
//! of a split-view layout, a row owns tabs. Entities live in flat tables
//! keyed by id and reference each other by id, so cascade deletion is an
//! explicit graph walk instead of framework inverse-relationship magic.

mod error;
mod group;
mod kind;
mod space;
mod store;
mod tab;

pub use error::TabError;
pub use group::{TabGroup, TabRow};
pub use kind::TabKind;
pub use space::Space;
pub use store::{TabRemoval, TabStore};
pub use tab::{StoredTab, TEMPORARY_TAB_URL};

pub type Result<T> = std::result::Result<T, TabError>;
