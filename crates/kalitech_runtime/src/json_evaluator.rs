use kalitech_common::KalitechError;
use kalitech_registry::{Evaluator, RequireFn};
use kalitech_resolver::ModuleId;
use kalitech_world::{ScriptInstance, ScriptModule, SystemContext};
use serde_json::Value as JsonValue;

use crate::script_host::ScriptExports;

/// A module's evaluated exports under `JsonEvaluator`: the module's
/// source, parsed as JSON, treated directly as its `world` descriptor.
/// There is no `bootstrap` hook and no script-module shape to
/// instantiate — `into_script_module` produces an inert `ScriptModule`
/// whose instance does nothing, since a `jsSystem` entry naming a JSON
/// module has no executable body.
#[derive(Clone)]
pub struct JsonExports(pub JsonValue);

struct InertInstance;
impl ScriptInstance for InertInstance {}

struct InertModule;
impl ScriptModule for InertModule {
    fn instantiate(&self) -> Result<Box<dyn ScriptInstance>, KalitechError> {
        Ok(Box::new(InertInstance))
    }
}

impl ScriptExports for JsonExports {
    fn world_descriptor(&self) -> Option<JsonValue> {
        Some(self.0.clone())
    }

    fn bootstrap(&self, _ctx: &SystemContext) -> Result<(), KalitechError> {
        Ok(())
    }

    fn into_script_module(self) -> Box<dyn ScriptModule> {
        Box::new(InertModule)
    }
}

/// Stand-in evaluator that treats every module's source text as JSON and
/// returns it verbatim as that module's exports. No `require()` from
/// inside evaluated source is supported (the `require` callback is never
/// invoked) and no script code actually runs — this lets a declarative,
/// `systems: []`/static-entity world descriptor load and drive
/// `RuntimeOrchestrator` end to end without spinning up a `JsRuntime`,
/// which is what most of this crate's tests want. Real script bodies run
/// under `deno_evaluator::DenoEvaluator` instead; see `DESIGN.md`.
#[derive(Default)]
pub struct JsonEvaluator;

impl Evaluator for JsonEvaluator {
    type Exports = JsonExports;

    fn check_syntax(&self, id: &ModuleId, source: &str) -> Result<(), KalitechError> {
        serde_json::from_str::<JsonValue>(source)
            .map(|_| ())
            .map_err(|e| KalitechError::ScriptSyntax {
                id: id.clone(),
                line: 1,
                col: 1,
                msg: e.to_string(),
            })
    }

    fn sentinel_exports(&self) -> Self::Exports {
        JsonExports(JsonValue::Null)
    }

    fn evaluate(
        &self,
        id: &ModuleId,
        source: &str,
        _require: &mut RequireFn<Self::Exports>,
    ) -> Result<Self::Exports, KalitechError> {
        serde_json::from_str(source)
            .map(JsonExports)
            .map_err(|e| KalitechError::ScriptRuntime { id: id.clone(), msg: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_parses_source_as_the_modules_json_exports() {
        let evaluator = JsonEvaluator;
        let mut require = |_: &str| -> Result<JsonExports, KalitechError> { unreachable!("no nested require in JsonEvaluator") };
        let exports = evaluator.evaluate(&"main.js".to_owned(), r#"{"name":"main"}"#, &mut require).unwrap();
        assert_eq!(exports.world_descriptor().unwrap()["name"], "main");
    }

    #[test]
    fn check_syntax_rejects_invalid_json() {
        let evaluator = JsonEvaluator;
        assert!(evaluator.check_syntax(&"main.js".to_owned(), "not json").is_err());
    }
}
