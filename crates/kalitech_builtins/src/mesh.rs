use std::{any::Any, cell::RefCell, rc::Rc};

use kalitech_common::KalitechError;
use kalitech_ecs::SurfaceHandle;
use kalitech_host::Engine;
use serde_json::Value as JsonValue;

use crate::{kit::BuiltinKit, meta::BuiltinMeta, registry::Builtin};

pub struct MeshBuiltin;

impl Builtin for MeshBuiltin {
    fn meta(&self) -> BuiltinMeta {
        BuiltinMeta {
            name: "mesh",
            global_name: None,
            version: "1.0.0",
            description: "mesh surface creation",
            engine_min: "0.1.0",
        }
    }

    fn create(&self, engine: Rc<RefCell<Engine>>, _kit: &BuiltinKit) -> Result<Rc<dyn Any>, KalitechError> {
        Ok(Rc::new(MeshApi { engine }))
    }
}

pub struct MeshApi {
    engine: Rc<RefCell<Engine>>,
}

impl MeshApi {
    pub fn create(&self, cfg: JsonValue) -> Result<SurfaceHandle, KalitechError> {
        self.engine.borrow_mut().mesh_create(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::NullAliasInstaller;
    use crate::registry::BuiltinRegistry;

    #[test]
    fn create_without_a_renderer_reports_capability_missing() {
        let mut registry = BuiltinRegistry::new();
        registry.register(Box::new(MeshBuiltin));
        let engine = Rc::new(RefCell::new(Engine::new()));
        let api = registry
            .require_typed::<MeshApi>("@builtin/mesh", &engine, &NullAliasInstaller)
            .unwrap();
        assert!(matches!(api.create(JsonValue::Null), Err(KalitechError::CapabilityMissing(_))));
    }
}
