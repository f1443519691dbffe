//! Session configuration
//!
//! Passed in at construction so behavior is deterministic and testable;
//! there is no process-global settings lookup.

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Tabs whose last visit is older than this are deleted at launch
    pub retention_minutes: i64,
    /// Maximum number of live content surfaces kept around
    pub preload_capacity: usize,
    /// Search engine URL template (%s replaced with the encoded query)
    pub search_template: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retention_minutes: 7 * 24 * 60,
            preload_capacity: 8,
            search_template: "https://duckduckgo.com/?q=%s".to_string(),
        }
    }
}
