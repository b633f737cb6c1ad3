use std::{cell::RefCell, rc::Rc};

use kalitech_common::KalitechError;
use kalitech_host::Engine;
use tracing::error;

/// Carried to every system callback within one frame (§4.J). Wraps the
/// shared `Engine` facade so systems read the same time/input snapshot
/// and mutate the same ECS regardless of call order.
pub struct SystemContext {
    pub engine: Rc<RefCell<Engine>>,
}

impl SystemContext {
    pub fn new(engine: Rc<RefCell<Engine>>) -> Self {
        Self { engine }
    }
}

/// A participant in the world's per-frame tick (§4.J, §9 "abstract
/// interface with all methods defined" — no shape probing at this layer;
/// probing, where it exists, lives in the script-module adapter).
pub trait KSystem {
    fn start(&mut self, _ctx: &SystemContext) -> Result<(), KalitechError> {
        Ok(())
    }
    fn update(&mut self, _ctx: &SystemContext, _tpf: f32) -> Result<(), KalitechError> {
        Ok(())
    }
    fn stop(&mut self, _ctx: &SystemContext) -> Result<(), KalitechError> {
        Ok(())
    }
}

/// A frozen, ordered list of systems (§4.J). Started in declared order,
/// stopped in reverse; a system failing during `update` is logged and
/// skipped for the rest of this frame, but stays in the list.
pub struct KWorld {
    systems: Vec<Box<dyn KSystem>>,
}

impl KWorld {
    pub fn new(systems: Vec<Box<dyn KSystem>>) -> Self {
        Self { systems }
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn start(&mut self, ctx: &SystemContext) {
        for system in &mut self.systems {
            if let Err(e) = system.start(ctx) {
                error!("system start failed: {e}");
            }
        }
    }

    pub fn update(&mut self, ctx: &SystemContext, tpf: f32) {
        for system in &mut self.systems {
            if let Err(e) = system.update(ctx, tpf) {
                error!("system update failed: {e}");
            }
        }
    }

    pub fn stop(&mut self, ctx: &SystemContext) {
        for system in self.systems.iter_mut().rev() {
            if let Err(e) = system.stop(ctx) {
                error!("system stop failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc as StdRc;

    struct Recorder {
        name: &'static str,
        log: StdRc<RefCell<Vec<&'static str>>>,
        fail_update: bool,
    }

    impl KSystem for Recorder {
        fn start(&mut self, _ctx: &SystemContext) -> Result<(), KalitechError> {
            self.log.borrow_mut().push(self.name);
            Ok(())
        }
        fn update(&mut self, _ctx: &SystemContext, _tpf: f32) -> Result<(), KalitechError> {
            if self.fail_update {
                return Err(KalitechError::ScriptRuntime {
                    id: self.name.to_owned(),
                    msg: "boom".to_owned(),
                });
            }
            self.log.borrow_mut().push(self.name);
            Ok(())
        }
        fn stop(&mut self, _ctx: &SystemContext) -> Result<(), KalitechError> {
            self.log.borrow_mut().push(self.name);
            Ok(())
        }
    }

    fn ctx() -> SystemContext {
        SystemContext::new(StdRc::new(RefCell::new(Engine::new())))
    }

    #[test]
    fn stop_order_is_reverse_of_start() {
        let log = StdRc::new(RefCell::new(Vec::new()));
        let mut world = KWorld::new(vec![
            Box::new(Recorder { name: "a", log: log.clone(), fail_update: false }),
            Box::new(Recorder { name: "b", log: log.clone(), fail_update: false }),
        ]);
        let ctx = ctx();
        world.start(&ctx);
        world.stop(&ctx);
        assert_eq!(*log.borrow(), vec!["a", "b", "b", "a"]);
    }

    #[test]
    fn failing_system_does_not_block_the_rest_of_the_frame() {
        let _ = Cell::new(0);
        let log = StdRc::new(RefCell::new(Vec::new()));
        let mut world = KWorld::new(vec![
            Box::new(Recorder { name: "a", log: log.clone(), fail_update: true }),
            Box::new(Recorder { name: "b", log: log.clone(), fail_update: false }),
        ]);
        let ctx = ctx();
        world.update(&ctx, 0.016);
        assert_eq!(*log.borrow(), vec!["b"]);
        assert_eq!(world.len(), 2);
    }
}
