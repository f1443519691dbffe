//! Change notification
//!
//! The UI layer subscribes to these instead of the core assuming any
//! particular reactivity framework. Events fire after the mutation has
//! fully completed (store updated, persistence attempted, working tree
//! adjusted).

use strata_tabs::TabKind;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The working tree now mirrors a different group (or a single tab)
    WorkingTreeReplaced,
    /// A new tab was created and persisted
    TabOpened { tab_id: String },
    /// A tab was closed; `replacement` is the tab selected in its place
    TabClosed {
        tab_id: String,
        replacement: Option<String>,
    },
    /// A whole group was closed
    GroupClosed { group_id: String },
    /// A tab moved to a different classification
    TabReclassified { tab_id: String, kind: TabKind },
    /// Placeholder tabs were swept from the working tree
    TemporaryTabsCleaned { removed: usize },
}

pub type SessionObserver = Box<dyn Fn(&SessionEvent) + Send>;
