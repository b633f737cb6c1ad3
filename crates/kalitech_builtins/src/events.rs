use std::{any::Any, cell::RefCell, rc::Rc};

use kalitech_common::KalitechError;
use kalitech_ecs::SubscriptionId;
use kalitech_host::Engine;
use serde_json::Value as JsonValue;

use crate::{kit::BuiltinKit, meta::BuiltinMeta, registry::Builtin};

pub struct EventsBuiltin;

impl Builtin for EventsBuiltin {
    fn meta(&self) -> BuiltinMeta {
        BuiltinMeta {
            name: "events",
            global_name: None,
            version: "1.0.0",
            description: "on/once/off/emit over the host event bus",
            engine_min: "0.1.0",
        }
    }

    fn create(&self, engine: Rc<RefCell<Engine>>, _kit: &BuiltinKit) -> Result<Rc<dyn Any>, KalitechError> {
        Ok(Rc::new(EventsApi { engine }))
    }
}

/// Exports of `@builtin/events`, a thin pass-through to `Engine::events`
/// (§4.E) so scripts get `on/once/off/emit` without reaching into the
/// engine facade's internals directly.
pub struct EventsApi {
    engine: Rc<RefCell<Engine>>,
}

impl EventsApi {
    pub fn on(&self, topic: &str, callback: impl FnMut(&JsonValue) + 'static) -> SubscriptionId {
        self.engine.borrow().events.on(topic, callback)
    }

    pub fn once(&self, topic: &str, callback: impl FnMut(&JsonValue) + 'static) -> SubscriptionId {
        self.engine.borrow().events.once(topic, callback)
    }

    pub fn off(&self, topic: &str, id: SubscriptionId) -> bool {
        self.engine.borrow().events.off(topic, id)
    }

    pub fn emit(&self, topic: &str, payload: &JsonValue) {
        self.engine.borrow().events.emit(topic, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::NullAliasInstaller;
    use crate::registry::BuiltinRegistry;
    use std::cell::Cell;

    #[test]
    fn emit_reaches_subscribers_registered_through_the_builtin() {
        let mut registry = BuiltinRegistry::new();
        registry.register(Box::new(EventsBuiltin));
        let engine = Rc::new(RefCell::new(Engine::new()));
        let api = registry
            .require_typed::<EventsApi>("@builtin/events", &engine, &NullAliasInstaller)
            .unwrap();

        let seen = Rc::new(Cell::new(0));
        let s = seen.clone();
        api.on("hit", move |_| s.set(s.get() + 1));
        api.emit("hit", &JsonValue::Null);
        assert_eq!(seen.get(), 1);
    }
}
