//! Content surface collaborators
//!
//! The session core never renders anything. It drives these interfaces and
//! observes their state; the UI shell supplies real implementations backed
//! by an actual web view.

use parking_lot::Mutex;
use std::sync::Arc;

pub trait ContentSurface: Send + Sync {
    fn load(&self, url: &str);
    fn reload(&self);
    fn go_back(&self);
    fn go_forward(&self);

    fn url(&self) -> Option<String>;
    fn title(&self) -> Option<String>;
    fn is_secure(&self) -> bool;
    fn is_loading(&self) -> bool;
}

pub trait SurfaceFactory: Send + Sync {
    fn create(&self) -> Arc<dyn ContentSurface>;
}

/// Opportunistic page-title lookup used to decorate the UI. Never required
/// for correctness of the tab tree.
pub trait TitleResolver: Send + Sync {
    fn fetch_title(&self, url: &str) -> Option<String>;
}

/// A surface that records navigation without rendering. Used when the
/// engine runs without an attached renderer, and throughout the tests.
#[derive(Default)]
pub struct HeadlessSurface {
    current_url: Mutex<Option<String>>,
    load_count: Mutex<usize>,
}

impl HeadlessSurface {
    pub fn load_count(&self) -> usize {
        *self.load_count.lock()
    }
}

impl ContentSurface for HeadlessSurface {
    fn load(&self, url: &str) {
        *self.current_url.lock() = Some(url.to_string());
        *self.load_count.lock() += 1;
    }

    fn reload(&self) {
        *self.load_count.lock() += 1;
    }

    fn go_back(&self) {}

    fn go_forward(&self) {}

    fn url(&self) -> Option<String> {
        self.current_url.lock().clone()
    }

    fn title(&self) -> Option<String> {
        None
    }

    fn is_secure(&self) -> bool {
        self.current_url
            .lock()
            .as_deref()
            .map(|u| u.starts_with("https://"))
            .unwrap_or(false)
    }

    fn is_loading(&self) -> bool {
        false
    }
}

#[derive(Default)]
pub struct HeadlessFactory;

impl SurfaceFactory for HeadlessFactory {
    fn create(&self) -> Arc<dyn ContentSurface> {
        Arc::new(HeadlessSurface::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_surface_tracks_loads() {
        let surface = HeadlessSurface::default();
        surface.load("https://example.com");

        assert_eq!(surface.url().as_deref(), Some("https://example.com"));
        assert!(surface.is_secure());
        assert_eq!(surface.load_count(), 1);
    }
}
