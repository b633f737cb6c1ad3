use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};

use kalitech_common::KalitechError;
use kalitech_resolver::{ModuleId, ResolverChain};

use crate::{
    evaluator::Evaluator,
    module::{fnv1a, Module, ModuleState},
    source_provider::SourceProvider,
};

/// Load/cache module source, evaluate once per version, serve re-exports
/// (§4.B). Generic over the scripting backend (`Evaluator`) and the content
/// source (`SourceProvider`) so the same logic backs both the live
/// `deno_core` runtime and registry unit tests.
///
/// Not `Sync`: the registry lives on the single main/script thread (§5) and
/// is shared, when needed, via `Rc`, the same way the teacher threads
/// `Rc<RefCell<OpState>>` through its ops rather than an `Arc<Mutex<_>>`.
pub struct ModuleRegistry<E: Evaluator, S: SourceProvider> {
    resolver: ResolverChain,
    source: S,
    evaluator: E,
    modules: RefCell<HashMap<ModuleId, Module<E::Exports>>>,
}

impl<E: Evaluator, S: SourceProvider> ModuleRegistry<E, S> {
    pub fn new(resolver: ResolverChain, source: S, evaluator: E) -> Self {
        Self {
            resolver,
            source,
            evaluator,
            modules: RefCell::new(HashMap::new()),
        }
    }

    /// Resolve `request` (issued from `parent`), pick the first existing
    /// candidate, and return its exports — evaluating it first if needed
    /// (§4.B).
    pub fn require(&self, parent: &ModuleId, request: &str) -> Result<E::Exports, KalitechError> {
        let candidates = self.resolver.resolve(parent, request)?;
        let id = candidates
            .into_iter()
            .find(|c| self.builtin_or_exists(c))
            .ok_or_else(|| KalitechError::UnresolvedRequire {
                parent: parent.clone(),
                request: request.to_owned(),
            })?;

        self.require_by_id(&id)
    }

    /// Requires an already-resolved id directly, skipping `resolve()`
    /// (used by system adapters that keep a module id from a prior
    /// resolution around — e.g. `ScriptHost::require_module` — rather than
    /// re-resolving a request string on every call).
    pub fn require_resolved(&self, id: &ModuleId) -> Result<E::Exports, KalitechError> {
        self.require_by_id(id)
    }

    fn builtin_or_exists(&self, id: &ModuleId) -> bool {
        id.starts_with("@builtin/") || self.source.exists(id)
    }

    fn require_by_id(&self, id: &ModuleId) -> Result<E::Exports, KalitechError> {
        if let Some(m) = self.modules.borrow().get(id) {
            match m.state {
                ModuleState::Ready => return Ok(m.exports.clone().expect("ready module has exports")),
                ModuleState::Evaluating => {
                    return Ok(m.exports.clone().expect("evaluating module has sentinel exports"))
                }
                ModuleState::Unloaded | ModuleState::Failed => {}
            }
        }

        let source = self.source.load(id).ok_or_else(|| KalitechError::UnresolvedRequire {
            parent: id.clone(),
            request: id.clone(),
        })?;
        let source_hash = fnv1a(source.as_bytes());
        let unchanged_version = self.version_of(id);

        if let Err(e) = self.evaluator.check_syntax(id, &source) {
            self.modules.borrow_mut().insert(
                id.clone(),
                Module {
                    id: id.clone(),
                    source_hash,
                    version: unchanged_version,
                    exports: None,
                    state: ModuleState::Failed,
                },
            );
            return Err(e);
        }

        self.modules.borrow_mut().insert(
            id.clone(),
            Module {
                id: id.clone(),
                source_hash,
                version: unchanged_version,
                exports: Some(self.evaluator.sentinel_exports()),
                state: ModuleState::Evaluating,
            },
        );

        // Reentrant: nested `require()` calls from inside `evaluate` land
        // back on `require_by_id`, observing the `Evaluating` sentinel just
        // inserted above for `id` itself (§8 circular require).
        let mut require_cb = |request: &str| self.require(id, request);
        let eval_result = self.evaluator.evaluate(id, &source, &mut require_cb);

        match eval_result {
            Ok(exports) => {
                self.modules.borrow_mut().insert(
                    id.clone(),
                    Module {
                        id: id.clone(),
                        source_hash,
                        version: unchanged_version + 1,
                        exports: Some(exports.clone()),
                        state: ModuleState::Ready,
                    },
                );
                Ok(exports)
            }
            Err(e) => {
                self.modules.borrow_mut().insert(
                    id.clone(),
                    Module {
                        id: id.clone(),
                        source_hash,
                        version: unchanged_version,
                        exports: None,
                        state: ModuleState::Failed,
                    },
                );
                Err(e)
            }
        }
    }

    fn version_of(&self, id: &ModuleId) -> u64 {
        self.modules.borrow().get(id).map(|m| m.version).unwrap_or(0)
    }

    /// Returns the module's current version, `0` if never loaded (§4.B).
    pub fn module_version(&self, id: &ModuleId) -> u64 {
        self.version_of(id)
    }

    /// Drops cached exports and marks the module `Unloaded`; dependents are
    /// not touched — they pull the fresh value on their next `require`
    /// (§4.B).
    pub fn invalidate(&self, id: &ModuleId) {
        let mut modules = self.modules.borrow_mut();
        if let Some(m) = modules.get_mut(id) {
            m.state = ModuleState::Unloaded;
            m.exports = None;
        }
    }

    /// Atomic batch invalidation (§4.B).
    pub fn invalidate_many(&self, ids: &HashSet<ModuleId>) {
        let mut modules = self.modules.borrow_mut();
        for id in ids {
            if let Some(m) = modules.get_mut(id) {
                m.state = ModuleState::Unloaded;
                m.exports = None;
            }
        }
    }

    pub fn state_of(&self, id: &ModuleId) -> Option<ModuleState> {
        self.modules.borrow().get(id).map(|m| m.state)
    }

    pub fn source_provider(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{evaluator::MockEvaluator, source_provider::MemorySourceProvider};
    use kalitech_resolver::{AliasStrategy, ResolverChain};
    use std::{collections::HashMap as Map, sync::Arc};

    fn registry_with(evaluator: MockEvaluator) -> ModuleRegistry<MockEvaluator, MemorySourceProvider> {
        let resolver = ResolverChain::default_chain(
            "Mods",
            Arc::new(AliasStrategy::new(Map::new())),
            vec!["Scripts/".to_owned(), "Mods/".to_owned()],
        );
        ModuleRegistry::new(resolver, MemorySourceProvider::new(), evaluator)
    }

    fn registry() -> ModuleRegistry<MockEvaluator, MemorySourceProvider> {
        registry_with(MockEvaluator::default())
    }

    #[test]
    fn invalidate_then_require_increments_version() {
        let reg = registry();
        reg.source_provider().insert("Scripts/a.js", "hello");
        assert_eq!(reg.require(&"Scripts/main.js".to_owned(), "./a.js").unwrap(), "hello");
        assert_eq!(reg.module_version(&"Scripts/a.js".to_owned()), 1);

        reg.invalidate(&"Scripts/a.js".to_owned());
        assert_eq!(reg.require(&"Scripts/main.js".to_owned(), "./a.js").unwrap(), "hello");
        assert_eq!(reg.module_version(&"Scripts/a.js".to_owned()), 2);
    }

    #[test]
    fn circular_require_terminates_both_ready() {
        let reg = registry();
        reg.source_provider().insert("Scripts/a.js", "A\nrequire:./b.js");
        reg.source_provider().insert("Scripts/b.js", "B\nrequire:./a.js");

        let a = reg.require(&"Scripts/main.js".to_owned(), "./a.js").unwrap();
        assert_eq!(a, "AB");
        assert_eq!(reg.state_of(&"Scripts/a.js".to_owned()), Some(ModuleState::Ready));
        assert_eq!(reg.state_of(&"Scripts/b.js".to_owned()), Some(ModuleState::Ready));
    }

    #[test]
    fn syntax_error_marks_failed_and_does_not_poison_others() {
        let reg = registry_with(MockEvaluator {
            fail_syntax_for: vec!["Scripts/bad.js".to_owned()],
        });
        reg.source_provider().insert("Scripts/bad.js", "broken");
        reg.source_provider().insert("Scripts/good.js", "fine");

        assert!(reg.require(&"Scripts/main.js".to_owned(), "./bad.js").is_err());
        assert_eq!(reg.state_of(&"Scripts/bad.js".to_owned()), Some(ModuleState::Failed));
        assert_eq!(reg.require(&"Scripts/main.js".to_owned(), "./good.js").unwrap(), "fine");
    }

    #[test]
    fn unresolved_candidate_errors() {
        let reg = registry();
        let err = reg.require(&"Scripts/main.js".to_owned(), "./nope.js");
        assert!(matches!(err, Err(KalitechError::UnresolvedRequire { .. })));
    }
}
