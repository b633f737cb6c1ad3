use std::collections::HashSet;

use kalitech_resolver::ModuleId;

#[cfg(feature = "hot_reload")]
mod fs_watcher;
#[cfg(feature = "hot_reload")]
pub use fs_watcher::FsWatcher;

/// Raw, undebounced change feed (§4.C). Debouncing is the orchestrator's
/// job (§9 "watcher debouncing belongs to the orchestrator, not the
/// watcher") — this trait only dedupes identical ids *within* one poll.
pub trait ChangeWatcher {
    /// Drains events accumulated since the last call, deduped within this
    /// poll only.
    fn poll_changed(&mut self) -> HashSet<ModuleId>;

    /// Shuts down all observers; pending events are dropped.
    fn close(&mut self);
}

/// A watcher with no backing filesystem observer — used when the
/// `hot_reload` feature is disabled, or for any deployment that never
/// wants live reload. Never reports changes.
#[derive(Default)]
pub struct NullWatcher;

impl ChangeWatcher for NullWatcher {
    fn poll_changed(&mut self) -> HashSet<ModuleId> {
        HashSet::new()
    }

    fn close(&mut self) {}
}

/// A watcher driven entirely by test code via `push_changed`, used by
/// `kalitech_runtime`'s orchestrator tests so they don't depend on real
/// filesystem timing.
#[derive(Default)]
pub struct ManualWatcher {
    pending: HashSet<ModuleId>,
    closed: bool,
}

impl ManualWatcher {
    pub fn push_changed(&mut self, id: impl Into<ModuleId>) {
        if !self.closed {
            self.pending.insert(id.into());
        }
    }
}

impl ChangeWatcher for ManualWatcher {
    fn poll_changed(&mut self) -> HashSet<ModuleId> {
        std::mem::take(&mut self.pending)
    }

    fn close(&mut self) {
        self.closed = true;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_watcher_dedupes_within_one_poll() {
        let mut w = ManualWatcher::default();
        w.push_changed("Scripts/a.js");
        w.push_changed("Scripts/a.js");
        w.push_changed("Scripts/b.js");
        let changed = w.poll_changed();
        assert_eq!(changed.len(), 2);
        assert!(w.poll_changed().is_empty());
    }

    #[test]
    fn close_drops_pending_events() {
        let mut w = ManualWatcher::default();
        w.push_changed("Scripts/a.js");
        w.close();
        assert!(w.poll_changed().is_empty());
        w.push_changed("Scripts/b.js");
        assert!(w.poll_changed().is_empty());
    }
}
