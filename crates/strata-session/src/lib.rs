//! Strata Session Management
//!
//! Translates user intents (new tab, close, split, retype) into mutations
//! of the hierarchical tab store, keeps the in-memory working tree mirrored
//! to what is displayed, persists every change, and bounds the set of live
//! content surfaces with a FIFO preload cache.
//!
//! All mutations run on one sequential execution context; the manager takes
//! `&mut self` and holds no internal locks.

mod cache;
mod config;
mod error;
mod events;
mod manager;
pub mod persist;
mod surface;
mod working;

pub use cache::PreloadCache;
pub use config::SessionConfig;
pub use error::SessionError;
pub use events::{SessionEvent, SessionObserver};
pub use manager::SessionManager;
pub use surface::{ContentSurface, HeadlessFactory, HeadlessSurface, SurfaceFactory, TitleResolver};
pub use working::{OpenTab, WorkingTree};

pub type Result<T> = std::result::Result<T, SessionError>;
