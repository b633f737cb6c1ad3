use kalitech_common::KalitechError;
use kalitech_resolver::ModuleId;

/// A require callback bound back to the registry (`require(this.id, r)` in
/// §4.B), handed to the evaluator for the duration of one module's
/// evaluation.
pub type RequireFn<'a, Exports> = dyn FnMut(&str) -> Result<Exports, KalitechError> + 'a;

/// Capability to run source text in a sandboxed environment (§4.B). The
/// `deno_core`-backed implementation lives in `kalitech_host`; a
/// `MockEvaluator` used for registry/resolver unit tests lives here.
///
/// Methods take `&self`, not `&mut self`: a module's `require()` can
/// recurse back into the registry (and thus back into this evaluator)
/// while the outer evaluation is still on the call stack (§8 circular
/// require). Implementations that need mutable interpreter state (a live
/// `deno_core::JsRuntime`) hold it behind interior mutability themselves,
/// the same way `deno_core` hands ops an `Rc<RefCell<OpState>>` rather than
/// an exclusive borrow of the runtime.
pub trait Evaluator {
    type Exports: Clone;

    /// Syntax verification, performed *before* evaluation (§4.B). Must not
    /// mutate interpreter-visible state.
    fn check_syntax(&self, id: &ModuleId, source: &str) -> Result<(), KalitechError>;

    /// The sentinel value a module exposes to cyclic requesters while it is
    /// still `Evaluating` (§3).
    fn sentinel_exports(&self) -> Self::Exports;

    /// Run `source`, returning the module's final exports. `require` must be
    /// called for every nested `require(...)` the source performs.
    fn evaluate(
        &self,
        id: &ModuleId,
        source: &str,
        require: &mut RequireFn<Self::Exports>,
    ) -> Result<Self::Exports, KalitechError>;
}

/// A mock evaluator for tests that don't need a live scripting isolate. A
/// module's "source" is itself a tiny DSL: a `require:<request>` line
/// triggers a nested require, anything else is treated as literal exports
/// text. Mirrors the dedicated testing op module the teacher ships
/// (`dcl/src/js/testing.rs`) rather than spinning up `deno_core` in tests.
#[derive(Default)]
pub struct MockEvaluator {
    pub fail_syntax_for: Vec<ModuleId>,
}

impl Evaluator for MockEvaluator {
    type Exports = String;

    fn check_syntax(&self, id: &ModuleId, _source: &str) -> Result<(), KalitechError> {
        if self.fail_syntax_for.contains(id) {
            return Err(KalitechError::ScriptSyntax {
                id: id.clone(),
                line: 1,
                col: 1,
                msg: "forced syntax failure".to_owned(),
            });
        }
        Ok(())
    }

    fn sentinel_exports(&self) -> Self::Exports {
        String::new()
    }

    fn evaluate(
        &self,
        id: &ModuleId,
        source: &str,
        require: &mut RequireFn<Self::Exports>,
    ) -> Result<Self::Exports, KalitechError> {
        let mut exports = String::new();
        for line in source.lines() {
            if let Some(request) = line.strip_prefix("require:") {
                let dep_exports = require(request.trim())?;
                exports.push_str(&dep_exports);
            } else if line == "fail" {
                return Err(KalitechError::ScriptRuntime {
                    id: id.clone(),
                    msg: "forced runtime failure".to_owned(),
                });
            } else {
                exports.push_str(line);
            }
        }
        Ok(exports)
    }
}
