use std::{any::Any, cell::RefCell, rc::Rc};

use kalitech_common::KalitechError;
use kalitech_ecs::EntityId;
use kalitech_host::Engine;
use serde_json::Value as JsonValue;

use crate::{kit::BuiltinKit, meta::BuiltinMeta, registry::Builtin};

pub struct EntityBuiltin;

impl Builtin for EntityBuiltin {
    fn meta(&self) -> BuiltinMeta {
        BuiltinMeta {
            name: "entity",
            global_name: None,
            version: "1.0.0",
            description: "entity/component lifecycle",
            engine_min: "0.1.0",
        }
    }

    fn create(&self, engine: Rc<RefCell<Engine>>, _kit: &BuiltinKit) -> Result<Rc<dyn Any>, KalitechError> {
        Ok(Rc::new(EntityApi { engine }))
    }
}

/// Exports of `@builtin/entity`: spawn/destroy and named-component
/// access on top of `EcsStore` (§4.D).
pub struct EntityApi {
    engine: Rc<RefCell<Engine>>,
}

impl EntityApi {
    pub fn spawn(&self) -> EntityId {
        self.engine.borrow_mut().entity_create()
    }

    pub fn destroy(&self, id: EntityId) {
        self.engine.borrow_mut().entity_destroy(id);
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.engine.borrow().ecs.is_alive(id)
    }

    pub fn set_component(&self, id: EntityId, name: &str, value: JsonValue) -> Result<(), KalitechError> {
        self.engine.borrow_mut().ecs.set_named(id, name, value)
    }

    pub fn component(&self, id: EntityId, name: &str) -> Option<JsonValue> {
        self.engine.borrow().ecs.get_named(id, name).cloned()
    }

    pub fn remove_component(&self, id: EntityId, name: &str) -> Option<JsonValue> {
        self.engine.borrow_mut().ecs.remove_named(id, name)
    }

    /// Builds one entity from a declarative descriptor: `components` (an
    /// object of named values), an optional `surface` (`{kind, ...cfg}`,
    /// kind one of `mesh`/`terrain`/`editorGrid`, default `mesh`), and an
    /// optional `body` (physics config). A missing renderer/physics
    /// capability degrades the corresponding step to a no-op rather than
    /// failing the whole spawn (spec's "tolerate late-arriving engine
    /// capabilities"); any other error still aborts and destroys the
    /// partially-built entity.
    pub fn spawn_declarative(&self, cfg: &JsonValue) -> Result<EntityId, KalitechError> {
        let id = self.spawn();
        if let Err(e) = self.apply_declarative(id, cfg) {
            self.destroy(id);
            return Err(e);
        }
        Ok(id)
    }

    fn apply_declarative(&self, id: EntityId, cfg: &JsonValue) -> Result<(), KalitechError> {
        if let Some(components) = cfg.get("components").and_then(JsonValue::as_object) {
            for (name, value) in components {
                self.set_component(id, name, value.clone())?;
            }
        }

        let mut engine = self.engine.borrow_mut();
        if let Some(surface_cfg) = cfg.get("surface") {
            let kind = surface_cfg.get("kind").and_then(JsonValue::as_str).unwrap_or("mesh");
            let created = match kind {
                "terrain" => engine.terrain_create_heightmap(surface_cfg.clone()),
                "editorGrid" => engine.editor_lines_create_grid_plane(surface_cfg.clone()),
                _ => engine.mesh_create(surface_cfg.clone()),
            };
            match created {
                Ok(handle) if handle.id != 0 => engine.surface_attach(handle.id, id)?,
                Ok(_) | Err(KalitechError::CapabilityMissing(_)) => {}
                Err(e) => return Err(e),
            }
        }

        if let Some(body_cfg) = cfg.get("body") {
            match engine.physics_body(body_cfg.clone()) {
                Ok(_) | Err(KalitechError::CapabilityMissing(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::NullAliasInstaller;
    use crate::registry::BuiltinRegistry;

    fn api() -> (Rc<EntityApi>, Rc<RefCell<Engine>>) {
        let mut registry = BuiltinRegistry::new();
        registry.register(Box::new(EntityBuiltin));
        let engine = Rc::new(RefCell::new(Engine::new()));
        let api = registry
            .require_typed::<EntityApi>("@builtin/entity", &engine, &NullAliasInstaller)
            .unwrap();
        (api, engine)
    }

    #[test]
    fn spawn_destroy_and_components_round_trip() {
        let (api, _engine) = api();
        let e = api.spawn();
        assert!(api.is_alive(e));
        api.set_component(e, "health", JsonValue::from(10)).unwrap();
        assert_eq!(api.component(e, "health"), Some(JsonValue::from(10)));
        api.destroy(e);
        assert!(!api.is_alive(e));
        assert_eq!(api.component(e, "health"), None);
    }

    #[test]
    fn declarative_spawn_sets_components_and_tolerates_missing_renderer() {
        let (api, _engine) = api();
        let cfg = serde_json::json!({
            "components": {"health": 10},
            "surface": {"kind": "mesh"},
        });
        let e = api.spawn_declarative(&cfg).unwrap();
        assert!(api.is_alive(e));
        assert_eq!(api.component(e, "health"), Some(JsonValue::from(10)));
    }

    #[test]
    fn declarative_spawn_tolerates_a_stub_renderer_producing_no_trackable_surface() {
        let (api, engine) = api();
        engine.borrow_mut().install_renderer(kalitech_host::NoopRenderer::default);
        let cfg = serde_json::json!({"surface": {"kind": "mesh"}});
        let e = api.spawn_declarative(&cfg).unwrap();
        assert!(api.is_alive(e));
    }
}
