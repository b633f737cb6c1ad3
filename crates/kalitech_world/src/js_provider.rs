use std::rc::Rc;

use kalitech_common::KalitechError;
use serde_json::Value as JsonValue;

use crate::{
    js_system::{JsWorldSystem, ScriptHost},
    provider::SystemProvider,
    system::{KSystem, SystemContext},
};

/// The always-present `jsSystem` provider (§4.I, §4.M). `config` must
/// carry `module: <ModuleId>`; `hotReload` defaults to `true`.
pub struct JsSystemProvider {
    host: Rc<dyn ScriptHost>,
}

impl JsSystemProvider {
    pub fn new(host: Rc<dyn ScriptHost>) -> Self {
        Self { host }
    }
}

impl SystemProvider for JsSystemProvider {
    fn id(&self) -> &'static str {
        "jsSystem"
    }

    fn create(&self, _ctx: &SystemContext, config: JsonValue) -> Result<Box<dyn KSystem>, KalitechError> {
        let module_id = config
            .get("module")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| KalitechError::UnknownSystem("jsSystem: config.module is required".to_owned()))?
            .to_owned();
        let hot_reload = config.get("hotReload").and_then(JsonValue::as_bool).unwrap_or(true);
        Ok(Box::new(JsWorldSystem::new(module_id, hot_reload, self.host.clone())))
    }
}
