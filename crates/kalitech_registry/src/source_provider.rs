use std::{collections::HashMap, path::PathBuf};

use kalitech_resolver::ModuleId;
use parking_lot::RwLock;

/// Loads module source text for an id, or reports it doesn't exist (§4.B).
/// Implemented by a filesystem-backed provider in production and an
/// in-memory provider in tests (grounded in the teacher's own split between
/// `ipfs`-backed content and the dedicated `dcl/src/js/testing.rs` harness).
pub trait SourceProvider: Send + Sync {
    fn exists(&self, id: &ModuleId) -> bool;
    fn load(&self, id: &ModuleId) -> Option<String>;
}

/// Resolves ids against a root directory on disk.
pub struct FsSourceProvider {
    root: PathBuf,
}

impl FsSourceProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, id: &ModuleId) -> PathBuf {
        self.root.join(id)
    }
}

impl SourceProvider for FsSourceProvider {
    fn exists(&self, id: &ModuleId) -> bool {
        self.path_for(id).is_file()
    }

    fn load(&self, id: &ModuleId) -> Option<String> {
        std::fs::read_to_string(self.path_for(id)).ok()
    }
}

/// A fully in-memory provider for unit tests and the builtin namespace.
#[derive(Default)]
pub struct MemorySourceProvider {
    files: RwLock<HashMap<ModuleId, String>>,
}

impl MemorySourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<ModuleId>, source: impl Into<String>) {
        self.files.write().insert(id.into(), source.into());
    }

    pub fn remove(&self, id: &ModuleId) {
        self.files.write().remove(id);
    }
}

impl SourceProvider for MemorySourceProvider {
    fn exists(&self, id: &ModuleId) -> bool {
        self.files.read().contains_key(id)
    }

    fn load(&self, id: &ModuleId) -> Option<String> {
        self.files.read().get(id).cloned()
    }
}
