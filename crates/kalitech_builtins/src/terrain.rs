use std::{any::Any, cell::RefCell, rc::Rc};

use kalitech_common::KalitechError;
use kalitech_ecs::SurfaceHandle;
use kalitech_host::Engine;
use serde_json::Value as JsonValue;

use crate::{kit::BuiltinKit, meta::BuiltinMeta, registry::Builtin};

pub struct TerrainBuiltin;

impl Builtin for TerrainBuiltin {
    fn meta(&self) -> BuiltinMeta {
        BuiltinMeta {
            name: "terrain",
            global_name: None,
            version: "1.0.0",
            description: "heightmap/plane terrain creation and splatting",
            engine_min: "0.1.0",
        }
    }

    fn create(&self, engine: Rc<RefCell<Engine>>, _kit: &BuiltinKit) -> Result<Rc<dyn Any>, KalitechError> {
        Ok(Rc::new(TerrainApi { engine }))
    }
}

pub struct TerrainApi {
    engine: Rc<RefCell<Engine>>,
}

impl TerrainApi {
    pub fn create_heightmap(&self, cfg: JsonValue) -> Result<SurfaceHandle, KalitechError> {
        self.engine.borrow_mut().terrain_create_heightmap(cfg)
    }

    pub fn create_plane(&self, cfg: JsonValue) -> Result<SurfaceHandle, KalitechError> {
        self.engine.borrow_mut().terrain_create_plane(cfg)
    }

    pub fn splat_layer(&self, surface: SurfaceHandle, cfg: JsonValue) -> Result<(), KalitechError> {
        self.engine.borrow().terrain_splat_layer(surface, cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::NullAliasInstaller;
    use crate::registry::BuiltinRegistry;

    #[test]
    fn splat_without_a_terrain_backend_reports_capability_missing() {
        let mut registry = BuiltinRegistry::new();
        registry.register(Box::new(TerrainBuiltin));
        let engine = Rc::new(RefCell::new(Engine::new()));
        let api = registry
            .require_typed::<TerrainApi>("@builtin/terrain", &engine, &NullAliasInstaller)
            .unwrap();
        let fake = SurfaceHandle { id: 1, kind: kalitech_ecs::SurfaceKind::Terrain };
        assert!(matches!(
            api.splat_layer(fake, JsonValue::Null),
            Err(KalitechError::CapabilityMissing(_))
        ));
    }
}
