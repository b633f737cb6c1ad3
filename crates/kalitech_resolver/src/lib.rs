pub mod candidates;
pub mod module_id;
pub mod strategy;

use std::sync::Arc;

use kalitech_common::KalitechError;

pub use candidates::expand_candidates;
pub use module_id::{normalize, ModuleId};
pub use strategy::{
    AliasStrategy, BuiltinStrategy, NamespaceStrategy, PassThroughStrategy, RelativeStrategy,
    ResolveStrategy,
};

/// The ordered chain of resolve strategies; first strategy to return
/// `Some` wins (§4.A, §8 #2: deterministic, order-independent relative to
/// declared order).
pub struct ResolverChain {
    strategies: Vec<Arc<dyn ResolveStrategy>>,
}

impl ResolverChain {
    pub fn new(strategies: Vec<Arc<dyn ResolveStrategy>>) -> Self {
        Self { strategies }
    }

    /// Default chain matching the order required by §4.A: builtin,
    /// namespace, alias, relative, pass-through.
    pub fn default_chain(mods_root: impl Into<String>, alias: Arc<AliasStrategy>, allowed_roots: Vec<String>) -> Self {
        Self::new(vec![
            Arc::new(BuiltinStrategy),
            Arc::new(NamespaceStrategy {
                mods_root: mods_root.into(),
            }),
            alias,
            Arc::new(RelativeStrategy),
            Arc::new(PassThroughStrategy { allowed_roots }),
        ])
    }

    /// Resolve `request` (issued by `parent`) into a base module id, then
    /// expand it into the candidate list the caller should try in order.
    pub fn resolve(&self, parent: &ModuleId, request: &str) -> Result<Vec<ModuleId>, KalitechError> {
        for strategy in &self.strategies {
            if let Some(base) = strategy.resolve(parent, request) {
                return Ok(expand_candidates(&base));
            }
        }
        Err(KalitechError::UnresolvedRequire {
            parent: parent.clone(),
            request: request.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn chain() -> ResolverChain {
        let mut aliases = HashMap::new();
        aliases.insert("@core".to_owned(), "Scripts/core".to_owned());
        let alias = Arc::new(AliasStrategy::new(aliases));
        ResolverChain::default_chain("Mods", alias, vec!["Scripts/".to_owned(), "Mods/".to_owned()])
    }

    #[test]
    fn builtin_request_passes_through() {
        let c = chain();
        let candidates = c.resolve(&"x".to_owned(), "@builtin/entity").unwrap();
        assert_eq!(candidates, vec!["@builtin/entity".to_owned()]);
    }

    #[test]
    fn alias_then_candidate_expansion_matches_scenario_6() {
        let c = chain();
        let candidates = c
            .resolve(&"Scripts/main.js".to_owned(), "@core/cam/third")
            .unwrap();
        assert_eq!(
            candidates,
            vec![
                "Scripts/core/cam/third/index.js".to_owned(),
                "Scripts/core/cam/third.js".to_owned(),
            ]
        );
    }

    #[test]
    fn unmatched_request_is_unresolved() {
        let c = chain();
        let err = c.resolve(&"Scripts/main.js".to_owned(), "totally/unknown/ns/x").err();
        assert!(matches!(err, Some(KalitechError::UnresolvedRequire { .. })));
    }

    #[test]
    fn order_independent_given_same_declared_order() {
        let c1 = chain();
        let c2 = chain();
        let r1 = c1.resolve(&"Scripts/main.js".to_owned(), "@core/cam/third").unwrap();
        let r2 = c2.resolve(&"Scripts/main.js".to_owned(), "@core/cam/third").unwrap();
        assert_eq!(r1, r2);
    }
}
