//! `deno_core`-backed `Evaluator`, grounded in the teacher's
//! `dcl_deno/src/js/mod.rs` (`create_runtime`, `scene_thread`, `run_script`,
//! `op_require`): one `JsRuntime` per evaluator, `kalitech_host::ops` bound
//! in as an `Extension`, and raw `v8::Local`/`v8::Global` handling for
//! calling named functions off an evaluated module's exports object.
//!
//! Module source is wrapped in a small CommonJS shim (`module`/`exports`/
//! `require` locals) before being handed to `execute_script`, since the
//! teacher's own `require()` resolves to literal JS shim source for
//! builtins rather than bridging live Rust values — our builtins and
//! required modules are Rust-side, so `require()` here is implemented as
//! an op that evaluates the request through the registry and serializes
//! the result back across the FFI boundary as JSON.
//!
//! Scoped limitation: a nested `require()`'s result is bridged through
//! `serde_v8`, so a required module whose sole export is a function (not
//! JSON-representable) surfaces a `KalitechError::ScriptRuntime` from
//! `op_kalitech_require` rather than losing it silently. See `DESIGN.md`.

use std::{cell::Cell, cell::RefCell, rc::Rc};

use deno_core::{op2, v8, Extension, JsRuntime, RuntimeOptions};
use kalitech_common::KalitechError;
use kalitech_host::Engine;
use kalitech_registry::{Evaluator, RequireFn};
use kalitech_resolver::ModuleId;
use kalitech_world::{ScriptInstance, ScriptModule, SystemContext};
use serde_json::Value as JsonValue;

use crate::script_host::ScriptExports;

type ErasedRequire = dyn FnMut(&str) -> Result<DenoExports, KalitechError>;

thread_local! {
    static REQUIRE_SLOT: Cell<Option<*mut ErasedRequire>> = Cell::new(None);
}

struct RequireGuard;

impl Drop for RequireGuard {
    fn drop(&mut self) {
        REQUIRE_SLOT.with(|slot| slot.set(None));
    }
}

/// Installs `f` as the target of `op_kalitech_require` for the lifetime of
/// the returned guard.
///
/// # Safety
/// `f` borrows for `'a`, shorter than the `'static` the thread-local slot's
/// element type names. The raw pointer is only ever dereferenced from
/// `op_kalitech_require`, which can only run while `execute_script` (called
/// immediately after this function installs the guard, on the same thread,
/// with the guard held for the whole call) is on the stack. `RequireGuard`
/// clears the slot on `Drop`, which also runs on unwind, so the erased
/// lifetime is never read after `'a` actually ends.
fn install_require<'a>(f: &'a mut (dyn FnMut(&str) -> Result<DenoExports, KalitechError> + 'a)) -> RequireGuard {
    let ptr: *mut (dyn FnMut(&str) -> Result<DenoExports, KalitechError> + 'a) = f;
    let ptr: *mut ErasedRequire = unsafe { std::mem::transmute(ptr) };
    REQUIRE_SLOT.with(|slot| slot.set(Some(ptr)));
    RequireGuard
}

#[op2]
#[serde]
fn op_kalitech_require(scope: &mut v8::HandleScope, #[string] request: String) -> Result<JsonValue, deno_core::error::AnyError> {
    REQUIRE_SLOT.with(|slot| {
        let ptr = slot
            .get()
            .ok_or_else(|| deno_core::error::AnyError::msg("require() called outside of module evaluation"))?;
        // SAFETY: see `install_require`.
        let f = unsafe { &mut *ptr };
        let exports = f(&request).map_err(|e| deno_core::error::AnyError::msg(e.to_string()))?;
        let local = v8::Local::new(scope, exports.value.clone());
        serde_v8::from_v8::<JsonValue>(scope, local)
            .map_err(|e| deno_core::error::AnyError::msg(format!("could not bridge exports of '{request}' into JS (not JSON-representable): {e}")))
    })
}

fn wrap_commonjs(source: &str) -> String {
    format!(
        "(function() {{\n  var module = {{ exports: {{}} }};\n  var exports = module.exports;\n  var require = function(request) {{ return Deno.core.ops.op_kalitech_require(request); }};\n  (function(module, exports, require) {{\n{source}\n  }})(module, exports, require);\n  return module.exports;\n}})()"
    )
}

enum Shape {
    StartUpdateStop,
    InitUpdateDestroy,
}

fn has_method<'s>(scope: &mut v8::HandleScope<'s>, obj: v8::Local<'s, v8::Object>, name: &str) -> bool {
    get_method(scope, obj, name).is_some()
}

fn get_method<'s>(scope: &mut v8::HandleScope<'s>, obj: v8::Local<'s, v8::Object>, name: &str) -> Option<v8::Local<'s, v8::Function>> {
    let key = v8::String::new(scope, name)?;
    let prop = obj.get(scope, key.into())?;
    v8::Local::<v8::Function>::try_from(prop).ok()
}

fn shape_of<'a>(scope: &mut v8::HandleScope<'a>, obj: v8::Local<'a, v8::Object>) -> Option<Shape> {
    if has_method(scope, obj, "start") || has_method(scope, obj, "update") || has_method(scope, obj, "stop") {
        return Some(Shape::StartUpdateStop);
    }
    if has_method(scope, obj, "init") || has_method(scope, obj, "destroy") {
        return Some(Shape::InitUpdateDestroy);
    }
    None
}

/// Recognizes `{start,update,stop}`, `{init,update,destroy}`, a bare
/// callable factory, or `{create()}`, in that declared order (§4.K), and
/// returns the instance object plus its shape.
fn detect_shape<'s>(scope: &mut v8::HandleScope<'s>, value: v8::Local<'s, v8::Value>) -> Option<(v8::Local<'s, v8::Value>, Shape)> {
    if let Ok(obj) = v8::Local::<v8::Object>::try_from(value) {
        if let Some(shape) = shape_of(scope, obj) {
            return Some((value, shape));
        }
    }
    if let Ok(factory) = v8::Local::<v8::Function>::try_from(value) {
        let undefined = v8::undefined(scope).into();
        let produced = factory.call(scope, undefined, &[])?;
        let produced_obj = v8::Local::<v8::Object>::try_from(produced).ok()?;
        let shape = shape_of(scope, produced_obj)?;
        return Some((produced, shape));
    }
    if let Ok(obj) = v8::Local::<v8::Object>::try_from(value) {
        if let Some(create) = get_method(scope, obj, "create") {
            let produced = create.call(scope, value, &[])?;
            let produced_obj = v8::Local::<v8::Object>::try_from(produced).ok()?;
            let shape = shape_of(scope, produced_obj)?;
            return Some((produced, shape));
        }
    }
    None
}

fn call_method(runtime: &Rc<RefCell<JsRuntime>>, this: &v8::Global<v8::Value>, name: &str, id: &ModuleId, args: &[f64]) -> Result<(), KalitechError> {
    let mut rt = runtime.borrow_mut();
    let scope = &mut rt.handle_scope();
    let this_local = v8::Local::new(scope, this.clone());
    let Ok(obj) = v8::Local::<v8::Object>::try_from(this_local) else {
        return Ok(());
    };
    let Some(func) = get_method(scope, obj, name) else {
        return Ok(());
    };
    let js_args: Vec<v8::Local<v8::Value>> = args.iter().map(|a| v8::Number::new(scope, *a).into()).collect();
    let result = func.call(scope, this_local, &js_args);
    if result.is_none() {
        return Err(KalitechError::ScriptRuntime { id: id.clone(), msg: format!("{name}() threw") });
    }
    Ok(())
}

/// A module's evaluated exports under `DenoEvaluator`: a live handle
/// (`v8::Global`) into the evaluator's single `JsRuntime`, plus the id it
/// was evaluated under for error reporting.
#[derive(Clone)]
pub struct DenoExports {
    runtime: Rc<RefCell<JsRuntime>>,
    value: v8::Global<v8::Value>,
    id: ModuleId,
}

impl ScriptExports for DenoExports {
    fn world_descriptor(&self) -> Option<JsonValue> {
        let mut rt = self.runtime.borrow_mut();
        let scope = &mut rt.handle_scope();
        let local = v8::Local::new(scope, self.value.clone());
        if let Ok(obj) = v8::Local::<v8::Object>::try_from(local) {
            if let Some(key) = v8::String::new(scope, "world") {
                if let Some(prop) = obj.get(scope, key.into()) {
                    if !prop.is_undefined() {
                        if let Ok(json) = serde_v8::from_v8::<JsonValue>(scope, prop) {
                            return Some(json);
                        }
                    }
                }
            }
        }
        serde_v8::from_v8::<JsonValue>(scope, local).ok()
    }

    fn bootstrap(&self, _ctx: &SystemContext) -> Result<(), KalitechError> {
        call_method(&self.runtime, &self.value, "bootstrap", &self.id, &[])
    }

    fn into_script_module(self) -> Box<dyn ScriptModule> {
        Box::new(DenoModule { runtime: self.runtime, exports: self.value, id: self.id })
    }
}

struct DenoModule {
    runtime: Rc<RefCell<JsRuntime>>,
    exports: v8::Global<v8::Value>,
    id: ModuleId,
}

impl ScriptModule for DenoModule {
    fn instantiate(&self) -> Result<Box<dyn ScriptInstance>, KalitechError> {
        let (instance, shape) = {
            let mut rt = self.runtime.borrow_mut();
            let scope = &mut rt.handle_scope();
            let local = v8::Local::new(scope, self.exports.clone());
            let Some((instance_local, shape)) = detect_shape(scope, local) else {
                return Err(KalitechError::ScriptRuntime {
                    id: self.id.clone(),
                    msg: "exports match none of the recognized system shapes ({start,update,stop}, {init,update,destroy}, a factory function, or {create()})".to_owned(),
                });
            };
            (v8::Global::new(scope, instance_local), shape)
        };
        Ok(Box::new(DenoInstance { runtime: self.runtime.clone(), this: instance, id: self.id.clone(), shape }))
    }
}

struct DenoInstance {
    runtime: Rc<RefCell<JsRuntime>>,
    this: v8::Global<v8::Value>,
    id: ModuleId,
    shape: Shape,
}

impl ScriptInstance for DenoInstance {
    fn start(&mut self, _ctx: &SystemContext) -> Result<(), KalitechError> {
        let name = match self.shape {
            Shape::StartUpdateStop => "start",
            Shape::InitUpdateDestroy => "init",
        };
        call_method(&self.runtime, &self.this, name, &self.id, &[])
    }

    fn update(&mut self, _ctx: &SystemContext, tpf: f32) -> Result<(), KalitechError> {
        call_method(&self.runtime, &self.this, "update", &self.id, &[tpf as f64])
    }

    fn stop(&mut self, _ctx: &SystemContext) -> Result<(), KalitechError> {
        let name = match self.shape {
            Shape::StartUpdateStop => "stop",
            Shape::InitUpdateDestroy => "destroy",
        };
        call_method(&self.runtime, &self.this, name, &self.id, &[])
    }
}

/// Evaluates script modules on a single `JsRuntime`, with
/// `kalitech_host::ops` (plus `op_kalitech_require`) bound in as an
/// `Extension`. `&self` methods hold the runtime behind `Rc<RefCell<_>>`,
/// matching `Evaluator`'s contract for implementations backed by a live
/// interpreter.
pub struct DenoEvaluator {
    runtime: Rc<RefCell<JsRuntime>>,
}

impl DenoEvaluator {
    pub fn new(engine: Rc<RefCell<Engine>>) -> Self {
        let mut ops = kalitech_host::ops::ops();
        ops.push(op_kalitech_require());
        let ext = Extension {
            name: "kalitech_runtime",
            ops: ops.into(),
            ..Default::default()
        };
        let mut runtime = JsRuntime::new(RuntimeOptions {
            extensions: vec![ext],
            ..Default::default()
        });
        runtime.op_state().borrow_mut().put(engine);
        Self { runtime: Rc::new(RefCell::new(runtime)) }
    }
}

impl Evaluator for DenoEvaluator {
    type Exports = DenoExports;

    fn check_syntax(&self, id: &ModuleId, source: &str) -> Result<(), KalitechError> {
        let wrapped = wrap_commonjs(source);
        let mut rt = self.runtime.borrow_mut();
        let scope = &mut rt.handle_scope();
        let Some(code) = v8::String::new(scope, &wrapped) else {
            return Err(KalitechError::ScriptSyntax { id: id.clone(), line: 1, col: 1, msg: "source is not valid UTF-16".to_owned() });
        };
        if v8::Script::compile(scope, code, None).is_none() {
            return Err(KalitechError::ScriptSyntax { id: id.clone(), line: 1, col: 1, msg: "syntax error".to_owned() });
        }
        Ok(())
    }

    fn sentinel_exports(&self) -> Self::Exports {
        let mut rt = self.runtime.borrow_mut();
        let scope = &mut rt.handle_scope();
        let undefined: v8::Local<v8::Value> = v8::undefined(scope).into();
        let value = v8::Global::new(scope, undefined);
        DenoExports { runtime: self.runtime.clone(), value, id: String::new() }
    }

    fn evaluate(&self, id: &ModuleId, source: &str, require: &mut RequireFn<Self::Exports>) -> Result<Self::Exports, KalitechError> {
        let wrapped = wrap_commonjs(source);
        let _guard = install_require(require);
        let global = {
            let mut rt = self.runtime.borrow_mut();
            rt.execute_script("<kalitech module>", wrapped)
                .map_err(|e| KalitechError::ScriptRuntime { id: id.clone(), msg: e.to_string() })?
        };
        Ok(DenoExports { runtime: self.runtime.clone(), value: global, id: id.clone() })
    }
}
