use std::{any::Any, cell::RefCell, collections::HashMap, rc::Rc};

use kalitech_common::KalitechError;
use kalitech_host::Engine;

use crate::{
    alias::{AliasGuard, GlobalAliasInstaller},
    kit::BuiltinKit,
    meta::BuiltinMeta,
};

pub const NAMESPACE_PREFIX: &str = "@builtin/";

/// One entry in the `@builtin/` namespace (§4.M). `create` runs at most
/// once per registry lifetime per builtin; its result is cached and
/// handed out (cloned `Rc`) to every later requirer, matching how an
/// ordinary module's exports are only evaluated once (§4.B).
pub trait Builtin {
    fn meta(&self) -> BuiltinMeta;
    fn create(&self, engine: Rc<RefCell<Engine>>, kit: &BuiltinKit) -> Result<Rc<dyn Any>, KalitechError>;
}

fn unresolved(name: &str) -> KalitechError {
    KalitechError::UnresolvedRequire {
        parent: NAMESPACE_PREFIX.to_owned(),
        request: name.to_owned(),
    }
}

/// Holds every registered builtin and the exports already materialized
/// from it. Capabilities a builtin depends on may not be installed on
/// `Engine` yet at factory time — the factory itself never probes for
/// them; exports still get produced, and calls into a missing capability
/// surface `CapabilityMissing` later, at call time, the same way `Engine`
/// itself degrades (§9 "no probing").
#[derive(Default)]
pub struct BuiltinRegistry {
    builtins: HashMap<&'static str, Box<dyn Builtin>>,
    cache: RefCell<HashMap<&'static str, Rc<dyn Any>>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, builtin: Box<dyn Builtin>) {
        let name = builtin.meta().name;
        self.builtins.insert(name, builtin);
    }

    pub fn meta(&self, name: &str) -> Option<BuiltinMeta> {
        self.builtins.get(name).map(|b| b.meta())
    }

    /// Strips the `@builtin/` prefix; `None` for a request outside the
    /// namespace.
    pub fn builtin_name(id: &str) -> Option<&str> {
        id.strip_prefix(NAMESPACE_PREFIX)
    }

    pub fn is_builtin_id(id: &str) -> bool {
        id.starts_with(NAMESPACE_PREFIX)
    }

    /// Resolves a full `@builtin/<name>` id.
    pub fn require(
        &self,
        id: &str,
        engine: &Rc<RefCell<Engine>>,
        aliases: &dyn GlobalAliasInstaller,
    ) -> Result<Rc<dyn Any>, KalitechError> {
        let name = Self::builtin_name(id).ok_or_else(|| unresolved(id))?;
        self.require_name(name, engine, aliases)
    }

    pub fn require_typed<T: 'static>(
        &self,
        id: &str,
        engine: &Rc<RefCell<Engine>>,
        aliases: &dyn GlobalAliasInstaller,
    ) -> Result<Rc<T>, KalitechError> {
        let name = Self::builtin_name(id).ok_or_else(|| unresolved(id))?;
        self.require_typed_name(name, engine, aliases)
    }

    pub(crate) fn require_name(
        &self,
        name: &str,
        engine: &Rc<RefCell<Engine>>,
        aliases: &dyn GlobalAliasInstaller,
    ) -> Result<Rc<dyn Any>, KalitechError> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return Ok(cached.clone());
        }

        let builtin = self.builtins.get(name).ok_or_else(|| unresolved(name))?;
        let static_name = builtin.meta().name;
        let kit = BuiltinKit { registry: self, engine, aliases };

        let exports = {
            let _guard = AliasGuard::install(aliases, engine);
            builtin.create(engine.clone(), &kit)?
        };

        self.cache.borrow_mut().insert(static_name, exports.clone());
        Ok(exports)
    }

    pub(crate) fn require_typed_name<T: 'static>(
        &self,
        name: &str,
        engine: &Rc<RefCell<Engine>>,
        aliases: &dyn GlobalAliasInstaller,
    ) -> Result<Rc<T>, KalitechError> {
        self.require_name(name, engine, aliases)
            .and_then(|exports| exports.downcast::<T>().map_err(|_| {
                KalitechError::InvalidHandle(format!("builtin {name} exports are not a {}", std::any::type_name::<T>()))
            }))
    }
}
