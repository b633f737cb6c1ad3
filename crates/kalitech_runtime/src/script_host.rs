use std::{cell::RefCell, rc::Rc};

use kalitech_builtins::{BuiltinRegistry, GlobalAliasInstaller};
use kalitech_common::KalitechError;
use kalitech_host::Engine;
use kalitech_registry::{Evaluator, ModuleRegistry, SourceProvider};
use kalitech_resolver::ModuleId;
use kalitech_world::{ScriptHost, ScriptModule};
use serde_json::Value as JsonValue;

/// What an evaluator's per-module exports must offer the orchestrator and
/// the `jsSystem` adapter (§4.L, §4.K). A concrete `Evaluator::Exports`
/// implements this once; everything in this crate is generic over it so
/// swapping in the live `deno_core` evaluator later is a matter of
/// providing one more impl, not touching the orchestrator.
pub trait ScriptExports: Clone {
    /// The `world` descriptor this module's exports carry, if any. Per §6
    /// the root module may export it as `exports.world` or as the whole
    /// export value itself — that distinction is the evaluator's to make;
    /// this method just returns the already-unwrapped descriptor JSON.
    fn world_descriptor(&self) -> Option<JsonValue>;

    /// Runs the optional `bootstrap(ctx)` hook (§4.L `rebuildFromMain`).
    /// A module without one is a no-op, not an error.
    fn bootstrap(&self, ctx: &kalitech_world::SystemContext) -> Result<(), KalitechError>;

    /// Narrows to the shape a `jsSystem` provider entry needs.
    fn into_script_module(self) -> Box<dyn ScriptModule>;
}

fn builtin_as_system(id: &str) -> KalitechError {
    KalitechError::UnknownSystem(format!("{id} is a builtin; builtins are require()d by scripts, not installed as jsSystem providers"))
}

/// The concrete `ScriptHost` the orchestrator installs into every
/// `JsWorldSystem` (§4.K). Routes `@builtin/…` ids to `BuiltinRegistry`
/// ahead of the module registry, mirroring the short-circuit a live
/// evaluator's own `require()` callback must perform for nested
/// `require("@builtin/…")` calls from inside script source (§4.M).
pub struct RuntimeScriptHost<E: Evaluator, S: SourceProvider>
where
    E::Exports: ScriptExports + 'static,
{
    registry: Rc<ModuleRegistry<E, S>>,
    builtins: Rc<BuiltinRegistry>,
    engine: Rc<RefCell<Engine>>,
    aliases: Rc<dyn GlobalAliasInstaller>,
}

impl<E: Evaluator, S: SourceProvider> RuntimeScriptHost<E, S>
where
    E::Exports: ScriptExports + 'static,
{
    pub fn new(
        registry: Rc<ModuleRegistry<E, S>>,
        builtins: Rc<BuiltinRegistry>,
        engine: Rc<RefCell<Engine>>,
        aliases: Rc<dyn GlobalAliasInstaller>,
    ) -> Self {
        Self {
            registry,
            builtins,
            engine,
            aliases,
        }
    }

    pub fn registry(&self) -> &Rc<ModuleRegistry<E, S>> {
        &self.registry
    }
}

impl<E: Evaluator, S: SourceProvider> ScriptHost for RuntimeScriptHost<E, S>
where
    E::Exports: ScriptExports + 'static,
{
    fn require_module(&self, id: &ModuleId) -> Result<Box<dyn ScriptModule>, KalitechError> {
        if BuiltinRegistry::is_builtin_id(id) {
            // Touch the registry so a bad `jsSystem` config naming a real
            // builtin surfaces a pointed error instead of a bare
            // UnresolvedRequire from the module registry below.
            self.builtins.require(id, &self.engine, self.aliases.as_ref())?;
            return Err(builtin_as_system(id));
        }
        let exports = self.registry.require_resolved(id)?;
        Ok(exports.into_script_module())
    }

    fn module_version(&self, id: &ModuleId) -> u64 {
        if BuiltinRegistry::is_builtin_id(id) {
            1
        } else {
            self.registry.module_version(id)
        }
    }
}
