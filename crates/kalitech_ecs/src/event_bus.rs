use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
    rc::Rc,
};

use serde_json::Value as JsonValue;
use tracing::error;

pub type SubscriptionId = u64;

struct Subscriber {
    id: SubscriptionId,
    once: bool,
    removed: Cell<bool>,
    callback: RefCell<Box<dyn FnMut(&JsonValue)>>,
}

/// Synchronous, topic-keyed pub/sub (§4.E). Delivery happens on the
/// caller's thread inside `emit` — there is no implicit queue.
pub struct EventBus {
    separator: char,
    topics: RefCell<HashMap<String, Vec<Rc<Subscriber>>>>,
    next_id: Cell<SubscriptionId>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            separator: '.',
            topics: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }

    fn subscribe(&self, topic: &str, once: bool, callback: Box<dyn FnMut(&JsonValue)>) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let subscriber = Rc::new(Subscriber {
            id,
            once,
            removed: Cell::new(false),
            callback: RefCell::new(callback),
        });
        self.topics
            .borrow_mut()
            .entry(topic.to_owned())
            .or_default()
            .push(subscriber);
        id
    }

    /// Registers `callback` on `topic`, returning an id usable with `off`.
    pub fn on(&self, topic: &str, callback: impl FnMut(&JsonValue) + 'static) -> SubscriptionId {
        self.subscribe(topic, false, Box::new(callback))
    }

    /// Like `on`, but the subscriber is removed automatically after its
    /// first delivery.
    pub fn once(&self, topic: &str, callback: impl FnMut(&JsonValue) + 'static) -> SubscriptionId {
        self.subscribe(topic, true, Box::new(callback))
    }

    /// Removes a subscriber by id. Returns whether it was found.
    pub fn off(&self, topic: &str, id: SubscriptionId) -> bool {
        let mut topics = self.topics.borrow_mut();
        let Some(subscribers) = topics.get_mut(topic) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| {
            if s.id == id {
                s.removed.set(true);
                false
            } else {
                true
            }
        });
        subscribers.len() != before
    }

    /// Delivers `payload` to every subscriber live on `topic` at the time
    /// of this call. Subscribers added mid-emit are not in this snapshot
    /// and are delivered starting with the next `emit`; subscribers marked
    /// removed before their turn are skipped. A panicking subscriber is
    /// caught and logged without affecting the remaining subscribers.
    pub fn emit(&self, topic: &str, payload: &JsonValue) {
        let snapshot: Vec<Rc<Subscriber>> = self
            .topics
            .borrow()
            .get(topic)
            .cloned()
            .unwrap_or_default();

        let mut finished_once = Vec::new();
        for subscriber in &snapshot {
            if subscriber.removed.get() {
                continue;
            }
            let result = catch_unwind(AssertUnwindSafe(|| {
                (subscriber.callback.borrow_mut())(payload);
            }));
            if let Err(panic) = result {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_owned());
                error!(topic, message, "event subscriber panicked");
            }
            if subscriber.once {
                subscriber.removed.set(true);
                finished_once.push(subscriber.id);
            }
        }

        if !finished_once.is_empty() {
            if let Some(subs) = self.topics.borrow_mut().get_mut(topic) {
                subs.retain(|s| !finished_once.contains(&s.id));
            }
        }
    }

    /// A view over this bus that prefixes every topic with `prefix` and
    /// the configured separator (`scope("player").on("move", f)` ==
    /// `on("player.move", f)`).
    pub fn scope<'a>(&'a self, prefix: &str) -> ScopedBus<'a> {
        ScopedBus {
            bus: self,
            prefix: format!("{prefix}{}", self.separator),
        }
    }
}

pub struct ScopedBus<'a> {
    bus: &'a EventBus,
    prefix: String,
}

impl<'a> ScopedBus<'a> {
    pub fn on(&self, topic: &str, callback: impl FnMut(&JsonValue) + 'static) -> SubscriptionId {
        self.bus.on(&format!("{}{}", self.prefix, topic), callback)
    }

    pub fn once(&self, topic: &str, callback: impl FnMut(&JsonValue) + 'static) -> SubscriptionId {
        self.bus.once(&format!("{}{}", self.prefix, topic), callback)
    }

    pub fn off(&self, topic: &str, id: SubscriptionId) -> bool {
        self.bus.off(&format!("{}{}", self.prefix, topic), id)
    }

    pub fn emit(&self, topic: &str, payload: &JsonValue) {
        self.bus.emit(&format!("{}{}", self.prefix, topic), payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    #[test]
    fn emit_delivers_to_all_current_subscribers() {
        let bus = EventBus::new();
        let seen = Rc::new(StdRefCell::new(Vec::new()));
        let a = seen.clone();
        let b = seen.clone();
        bus.on("hit", move |p| a.borrow_mut().push(("a", p.clone())));
        bus.on("hit", move |p| b.borrow_mut().push(("b", p.clone())));
        bus.emit("hit", &JsonValue::from(1));
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn once_fires_a_single_time() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        bus.once("hit", move |_| c.set(c.get() + 1));
        bus.emit("hit", &JsonValue::Null);
        bus.emit("hit", &JsonValue::Null);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn subscriber_added_during_emit_waits_for_next_emit() {
        let bus = Rc::new(EventBus::new());
        let seen = Rc::new(Cell::new(0));
        let bus_clone = bus.clone();
        let seen_for_outer = seen.clone();
        bus.on("hit", move |_| {
            let seen_inner = seen_for_outer.clone();
            bus_clone.on("hit", move |_| seen_inner.set(seen_inner.get() + 1));
        });
        bus.emit("hit", &JsonValue::Null);
        assert_eq!(seen.get(), 0);
        bus.emit("hit", &JsonValue::Null);
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn off_prevents_future_delivery() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let id = bus.on("hit", move |_| c.set(c.get() + 1));
        bus.emit("hit", &JsonValue::Null);
        assert!(bus.off("hit", id));
        bus.emit("hit", &JsonValue::Null);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn panicking_subscriber_does_not_block_the_rest() {
        let bus = EventBus::new();
        let after = Rc::new(Cell::new(false));
        let flag = after.clone();
        bus.on("hit", |_| panic!("boom"));
        bus.on("hit", move |_| flag.set(true));
        bus.emit("hit", &JsonValue::Null);
        assert!(after.get());
    }

    #[test]
    fn scoped_topic_matches_dotted_topic() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        bus.on("player.move", move |_| c.set(c.get() + 1));
        bus.scope("player").emit("move", &JsonValue::Null);
        assert_eq!(count.get(), 1);
    }
}
