//! `deno_core` op bindings exposing the `Engine` facade to scripts,
//! grounded in `dcl/src/js/engine.rs` and `dcl/src/js/mod.rs`'s per-module
//! `ops()` aggregation. Only the capabilities exercised directly by the
//! orchestrator's testable scenarios (§8) are bound here; the remaining
//! capabilities in `capabilities.rs` follow the identical
//! `#[op2]` + `Rc<RefCell<Engine>>` pattern when a concrete renderer/
//! physics/audio backend is wired in.

use std::{cell::RefCell, rc::Rc};

use deno_core::{op2, OpDecl, OpState};
use kalitech_ecs::EntityId;
use serde_json::Value as JsonValue;

use crate::engine::Engine;

fn engine(state: &Rc<RefCell<OpState>>) -> Rc<RefCell<Engine>> {
    state.borrow().borrow::<Rc<RefCell<Engine>>>().clone()
}

#[op2(fast)]
fn op_log_info(state: Rc<RefCell<OpState>>, #[string] message: String) {
    engine(&state).borrow().log_info(&message);
}

#[op2(fast)]
fn op_log_warn(state: Rc<RefCell<OpState>>, #[string] message: String) {
    engine(&state).borrow().log_warn(&message);
}

#[op2(fast)]
fn op_log_error(state: Rc<RefCell<OpState>>, #[string] message: String) {
    engine(&state).borrow().log_error(&message);
}

#[op2(fast)]
fn op_log_debug(state: Rc<RefCell<OpState>>, #[string] message: String) {
    engine(&state).borrow().log_debug(&message);
}

#[op2(fast)]
fn op_time_tpf(state: Rc<RefCell<OpState>>) -> f32 {
    engine(&state).borrow().tpf()
}

#[op2(fast)]
fn op_time_sec(state: Rc<RefCell<OpState>>) -> f32 {
    engine(&state).borrow().time_sec()
}

#[op2(fast)]
fn op_entity_create(state: Rc<RefCell<OpState>>) -> u32 {
    engine(&state).borrow_mut().entity_create()
}

#[op2(fast)]
fn op_entity_destroy(state: Rc<RefCell<OpState>>, id: u32) {
    engine(&state).borrow_mut().entity_destroy(id as EntityId);
}

#[op2]
#[serde]
fn op_events_emit(
    state: Rc<RefCell<OpState>>,
    #[string] topic: String,
    #[serde] payload: JsonValue,
) -> Result<(), deno_core::error::AnyError> {
    engine(&state).borrow().events.emit(&topic, &payload);
    Ok(())
}

#[op2]
#[serde]
fn op_input_snapshot(state: Rc<RefCell<OpState>>) -> Result<JsonValue, deno_core::error::AnyError> {
    let snapshot = engine(&state).borrow().input_snapshot();
    Ok(serde_json::json!({
        "dx": snapshot.dx,
        "dy": snapshot.dy,
        "wheel": snapshot.wheel,
        "mx": snapshot.mx,
        "my": snapshot.my,
        "keysDown": snapshot.keys_down.len(),
    }))
}

#[op2]
fn op_world_spawn(
    state: Rc<RefCell<OpState>>,
    #[serde] descriptor: JsonValue,
) -> Result<u32, deno_core::error::AnyError> {
    engine(&state)
        .borrow()
        .world_spawn(descriptor)
        .map_err(|e| deno_core::error::AnyError::msg(e.to_string()))
}

pub fn ops() -> Vec<OpDecl> {
    vec![
        op_log_info(),
        op_log_warn(),
        op_log_error(),
        op_log_debug(),
        op_time_tpf(),
        op_time_sec(),
        op_entity_create(),
        op_entity_destroy(),
        op_events_emit(),
        op_input_snapshot(),
        op_world_spawn(),
    ]
}
