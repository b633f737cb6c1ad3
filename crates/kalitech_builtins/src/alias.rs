use std::{cell::RefCell, rc::Rc};

use kalitech_host::Engine;

/// Installs/removes the `globalThis.engine` alias around a builtin
/// factory's execution (§5 Open Question 2). Implemented by whatever
/// scripting backend owns the global object; `BuiltinRegistry` only
/// guarantees the install/remove pairing, even when the factory errors.
pub trait GlobalAliasInstaller {
    fn install_engine_alias(&self, engine: &Rc<RefCell<Engine>>);
    fn remove_engine_alias(&self);
}

/// No global object to touch (headless tests, non-scripting callers).
#[derive(Default)]
pub struct NullAliasInstaller;

impl GlobalAliasInstaller for NullAliasInstaller {
    fn install_engine_alias(&self, _engine: &Rc<RefCell<Engine>>) {}
    fn remove_engine_alias(&self) {}
}

/// Removes the alias on drop so an early return (including `?` from a
/// failing factory) can't leave it installed.
pub(crate) struct AliasGuard<'a> {
    installer: &'a dyn GlobalAliasInstaller,
}

impl<'a> AliasGuard<'a> {
    pub(crate) fn install(installer: &'a dyn GlobalAliasInstaller, engine: &Rc<RefCell<Engine>>) -> Self {
        installer.install_engine_alias(engine);
        Self { installer }
    }
}

impl Drop for AliasGuard<'_> {
    fn drop(&mut self) {
        self.installer.remove_engine_alias();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct RecordingInstaller {
        log: RefCell<Vec<&'static str>>,
    }
    impl GlobalAliasInstaller for RecordingInstaller {
        fn install_engine_alias(&self, _engine: &Rc<RefCell<Engine>>) {
            self.log.borrow_mut().push("install");
        }
        fn remove_engine_alias(&self) {
            self.log.borrow_mut().push("remove");
        }
    }

    #[test]
    fn guard_removes_alias_on_drop_even_after_a_panic_unwind_path() {
        let installer = RecordingInstaller::default();
        let engine = Rc::new(RefCell::new(Engine::new()));
        {
            let _guard = AliasGuard::install(&installer, &engine);
        }
        assert_eq!(*installer.log.borrow(), vec!["install", "remove"]);
    }

    #[test]
    fn guard_removes_alias_when_factory_body_returns_early() {
        let installer = RecordingInstaller::default();
        let engine = Rc::new(RefCell::new(Engine::new()));
        let called = Cell::new(false);
        let run = || -> Result<(), ()> {
            let _guard = AliasGuard::install(&installer, &engine);
            called.set(true);
            Err(())
        };
        let _ = run();
        assert!(called.get());
        assert_eq!(*installer.log.borrow(), vec!["install", "remove"]);
    }
}
