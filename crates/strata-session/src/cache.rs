//! Bounded preload cache
//!
//! Keeps the most recently instantiated content surfaces alive for quick
//! tab switching. Eviction is FIFO, not LRU: when the list is over
//! capacity the earliest-inserted entry goes, whether or not it is
//! currently displayed.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::surface::ContentSurface;

pub struct PreloadCache {
    entries: VecDeque<(String, Arc<dyn ContentSurface>)>,
    capacity: usize,
}

impl PreloadCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a surface; returns the evicted entry if capacity was exceeded.
    pub fn push(
        &mut self,
        tab_id: impl Into<String>,
        surface: Arc<dyn ContentSurface>,
    ) -> Option<(String, Arc<dyn ContentSurface>)> {
        self.entries.push_back((tab_id.into(), surface));

        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn get(&self, tab_id: &str) -> Option<Arc<dyn ContentSurface>> {
        self.entries
            .iter()
            .find(|(id, _)| id == tab_id)
            .map(|(_, surface)| Arc::clone(surface))
    }

    pub fn remove(&mut self, tab_id: &str) -> Option<Arc<dyn ContentSurface>> {
        let index = self.entries.iter().position(|(id, _)| id == tab_id)?;
        self.entries.remove(index).map(|(_, surface)| surface)
    }

    pub fn contains(&self, tab_id: &str) -> bool {
        self.entries.iter().any(|(id, _)| id == tab_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tab ids in insertion order, oldest first.
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }
}
