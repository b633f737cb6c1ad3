use std::{any::Any, cell::RefCell, collections::HashMap, rc::Rc};

use kalitech_common::KalitechError;
use kalitech_host::{handles::MaterialHandle, Engine};
use serde_json::Value as JsonValue;

use crate::{kit::BuiltinKit, meta::BuiltinMeta, registry::Builtin};

pub struct MaterialBuiltin;

impl Builtin for MaterialBuiltin {
    fn meta(&self) -> BuiltinMeta {
        BuiltinMeta {
            name: "material",
            global_name: None,
            version: "1.0.0",
            description: "JSON-db material registry with presets and overrides",
            engine_min: "0.1.0",
        }
    }

    fn create(&self, engine: Rc<RefCell<Engine>>, _kit: &BuiltinKit) -> Result<Rc<dyn Any>, KalitechError> {
        Ok(Rc::new(MaterialApi {
            engine,
            presets: RefCell::new(HashMap::new()),
        }))
    }
}

/// Exports of `@builtin/material` (§4.H `material` row): named presets
/// (`{def, params, scales}`-shaped JSON) merged with a per-call overrides
/// object, then handed to the installed renderer.
pub struct MaterialApi {
    engine: Rc<RefCell<Engine>>,
    presets: RefCell<HashMap<String, JsonValue>>,
}

fn merge(base: &JsonValue, overrides: &JsonValue) -> JsonValue {
    match (base, overrides) {
        (JsonValue::Object(base_map), JsonValue::Object(override_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            JsonValue::Object(merged)
        }
        (_, overrides) => overrides.clone(),
    }
}

impl MaterialApi {
    pub fn register_preset(&self, name: impl Into<String>, def: JsonValue) {
        self.presets.borrow_mut().insert(name.into(), def);
    }

    pub fn preset(&self, name: &str) -> Option<JsonValue> {
        self.presets.borrow().get(name).cloned()
    }

    /// Creates a material from a bare config, or from `preset` deep-merged
    /// with `overrides` when both are given.
    pub fn create(&self, cfg: JsonValue) -> Result<MaterialHandle, KalitechError> {
        self.engine.borrow().material_create(cfg)
    }

    pub fn create_from_preset(&self, preset: &str, overrides: JsonValue) -> Result<MaterialHandle, KalitechError> {
        let base = self
            .preset(preset)
            .ok_or_else(|| KalitechError::InvalidHandle(format!("unknown material preset {preset}")))?;
        self.create(merge(&base, &overrides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::NullAliasInstaller;
    use crate::registry::BuiltinRegistry;

    struct NoopMaterial;
    impl kalitech_host::capabilities::MaterialCapability for NoopMaterial {
        fn create(&self, cfg: JsonValue) -> Result<MaterialHandle, KalitechError> {
            // Echoes back a recognizable handle id for assertions below.
            let id = cfg.get("id").and_then(JsonValue::as_u64).unwrap_or(0) as u32;
            Ok(MaterialHandle(id))
        }
    }

    fn api() -> Rc<MaterialApi> {
        let mut registry = BuiltinRegistry::new();
        registry.register(Box::new(MaterialBuiltin));
        let engine = Rc::new(RefCell::new(Engine::new()));
        engine.borrow_mut().install_material(Box::new(NoopMaterial));
        registry
            .require_typed::<MaterialApi>("@builtin/material", &engine, &NullAliasInstaller)
            .unwrap()
    }

    #[test]
    fn preset_overrides_are_deep_merged_before_create() {
        let api = api();
        api.register_preset("metal", serde_json::json!({"id": 1, "params": {"roughness": 0.2, "metallic": 1.0}}));
        let handle = api
            .create_from_preset("metal", serde_json::json!({"params": {"roughness": 0.8}}))
            .unwrap();
        assert_eq!(handle, MaterialHandle(1));
    }

    #[test]
    fn unknown_preset_errors() {
        let api = api();
        assert!(api.create_from_preset("nope", JsonValue::Null).is_err());
    }
}
