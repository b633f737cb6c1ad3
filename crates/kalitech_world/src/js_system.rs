use std::rc::Rc;

use kalitech_common::KalitechError;
use kalitech_resolver::ModuleId;
use tracing::warn;

use crate::system::{KSystem, SystemContext};

/// A single script instance, already narrowed to one of the recognized
/// module shapes (`{start,update,stop}`, `{init,update,destroy}`, a
/// factory, or `{create()}`) by whatever produced it (§4.K).
pub trait ScriptInstance {
    fn start(&mut self, _ctx: &SystemContext) -> Result<(), KalitechError> {
        Ok(())
    }
    fn update(&mut self, _ctx: &SystemContext, _tpf: f32) -> Result<(), KalitechError> {
        Ok(())
    }
    fn stop(&mut self, _ctx: &SystemContext) -> Result<(), KalitechError> {
        Ok(())
    }
}

/// A required module's exports, not yet turned into a running instance.
pub trait ScriptModule {
    /// Tries the recognized shapes in declared order and returns the
    /// first match.
    fn instantiate(&self) -> Result<Box<dyn ScriptInstance>, KalitechError>;
}

/// The registry + evaluator pairing `JsWorldSystem` needs, narrowed to an
/// object-safe surface so the adapter doesn't have to carry the
/// registry's `Evaluator`/`SourceProvider` generics.
pub trait ScriptHost {
    fn require_module(&self, id: &ModuleId) -> Result<Box<dyn ScriptModule>, KalitechError>;
    fn module_version(&self, id: &ModuleId) -> u64;
}

/// Wraps a script module behind `KSystem` (§4.K).
pub struct JsWorldSystem {
    module_id: ModuleId,
    hot_reload: bool,
    host: Rc<dyn ScriptHost>,
    instance: Option<Box<dyn ScriptInstance>>,
    applied_version: u64,
}

impl JsWorldSystem {
    pub fn new(module_id: ModuleId, hot_reload: bool, host: Rc<dyn ScriptHost>) -> Self {
        Self {
            module_id,
            hot_reload,
            host,
            instance: None,
            applied_version: 0,
        }
    }

    /// `force=true` always re-instantiates (used by `onStart`); `force=false`
    /// only re-instantiates when the module's version has moved past what's
    /// currently applied (used by `onUpdate` under hot reload).
    fn restart_if_needed(&mut self, ctx: &SystemContext, force: bool) -> Result<(), KalitechError> {
        let current_version = self.host.module_version(&self.module_id);
        if !force && self.instance.is_some() && current_version == self.applied_version {
            return Ok(());
        }

        if let Some(mut old) = self.instance.take() {
            guarded(old.stop(ctx));
        }

        let module = self.host.require_module(&self.module_id)?;
        let mut instance = module.instantiate()?;
        instance.start(ctx)?;
        self.instance = Some(instance);
        self.applied_version = self.host.module_version(&self.module_id);
        Ok(())
    }
}

/// Swallows shutdown-noise errors (context cancelled/closed during
/// interpreter teardown); anything else is logged at warning level
/// without propagating, matching the adapter's "does not stop the
/// runtime" contract.
fn guarded(result: Result<(), KalitechError>) {
    if let Err(e) = result {
        if !e.is_shutdown_noise() {
            warn!("script-system call failed: {e}");
        }
    }
}

impl KSystem for JsWorldSystem {
    fn start(&mut self, ctx: &SystemContext) -> Result<(), KalitechError> {
        self.restart_if_needed(ctx, true)
    }

    fn update(&mut self, ctx: &SystemContext, tpf: f32) -> Result<(), KalitechError> {
        if self.hot_reload {
            self.restart_if_needed(ctx, false)?;
        }
        if let Some(instance) = &mut self.instance {
            instance.update(ctx, tpf)?;
        }
        Ok(())
    }

    fn stop(&mut self, ctx: &SystemContext) -> Result<(), KalitechError> {
        if let Some(mut instance) = self.instance.take() {
            guarded(instance.stop(ctx));
        }
        Ok(())
    }
}
