//! Strata Input Normalization
//!
//! The one boundary where free-form address input becomes a loadable URL:
//! recognized schemes pass through, bare hosts get https, everything else
//! becomes a search-engine query. Malformed input is rejected here and
//! never reaches the tab store.

mod error;
mod resolver;

pub use error::NavigationError;
pub use resolver::{InputResolver, Resolution};

pub type Result<T> = std::result::Result<T, NavigationError>;
