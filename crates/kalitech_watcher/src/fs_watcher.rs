use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::mpsc::{channel, Receiver, TryRecvError},
};

use kalitech_resolver::{normalize, ModuleId};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use tracing::warn;

use crate::ChangeWatcher;

/// Recursively observes a content root and turns filesystem events into
/// `ModuleId`s (§4.C). Paths outside the root are ignored; a changed path
/// is mapped to a module id by stripping the root prefix and normalizing
/// the remainder the same way the resolver does.
pub struct FsWatcher {
    root: PathBuf,
    _inner: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
}

impl FsWatcher {
    pub fn new(root: impl Into<PathBuf>) -> notify::Result<Self> {
        let root = root.into();
        let (tx, events) = channel();
        let mut inner = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        inner.watch(&root, RecursiveMode::Recursive)?;
        Ok(Self {
            root,
            _inner: inner,
            events,
        })
    }

    fn to_module_id(&self, path: &Path) -> Option<ModuleId> {
        let canonical_root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        let canonical_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if !canonical_path.starts_with(&canonical_root) {
            // A symlink resolving outside the root, or a transient path
            // from a rename event whose target no longer exists.
            return None;
        }

        let relative = canonical_path.strip_prefix(&canonical_root).ok()?;
        Some(normalize(&relative.to_string_lossy()))
    }
}

impl ChangeWatcher for FsWatcher {
    fn poll_changed(&mut self) -> HashSet<ModuleId> {
        let mut changed = HashSet::new();
        loop {
            match self.events.try_recv() {
                Ok(Ok(event)) => {
                    if !matches!(
                        event.kind,
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                    ) {
                        continue;
                    }
                    for path in &event.paths {
                        if let Some(id) = self.to_module_id(path) {
                            changed.insert(id);
                        }
                    }
                }
                Ok(Err(err)) => warn!("watcher error: {err}"),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    fn close(&mut self) {
        let _ = self._inner.unwatch(&self.root);
        while self.events.try_recv().is_ok() {}
    }
}
