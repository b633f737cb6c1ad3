use std::{any::Any, cell::RefCell, rc::Rc};

use kalitech_common::KalitechError;
use kalitech_host::Engine;

use crate::{alias::GlobalAliasInstaller, registry::BuiltinRegistry};

/// The `K` parameter of a builtin factory (`fn(engine, K) -> exports`,
/// §4.M). Lets one builtin depend on another (e.g. a future `particles`
/// builtin reusing `math`) without the registry exposing its whole
/// internals to every factory.
pub struct BuiltinKit<'a> {
    pub(crate) registry: &'a BuiltinRegistry,
    pub(crate) engine: &'a Rc<RefCell<Engine>>,
    pub(crate) aliases: &'a dyn GlobalAliasInstaller,
}

impl<'a> BuiltinKit<'a> {
    pub fn require(&self, name: &str) -> Result<Rc<dyn Any>, KalitechError> {
        self.registry.require_name(name, self.engine, self.aliases)
    }

    pub fn require_typed<T: 'static>(&self, name: &str) -> Result<Rc<T>, KalitechError> {
        self.registry.require_typed_name(name, self.engine, self.aliases)
    }
}
