use kalitech_common::warn_once::WarnOnce;
use tracing::warn;

/// Holds an optional backend for one capability (§9 "model every
/// capability as an abstract interface... return explicit not-supported
/// errors rather than permitting probing"). The capability method itself
/// is always present on the facade; only the backend behind it is
/// optional, and its absence is reported once per capability via
/// `WarnOnce` rather than on every call.
pub struct CapabilitySlot<T: ?Sized> {
    name: &'static str,
    backend: Option<Box<T>>,
    warned: WarnOnce,
}

impl<T: ?Sized> CapabilitySlot<T> {
    pub fn empty(name: &'static str) -> Self {
        Self {
            name,
            backend: None,
            warned: WarnOnce::new(),
        }
    }

    pub fn install(&mut self, backend: Box<T>) {
        self.backend = Some(backend);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self) -> Option<&T> {
        let backend = self.backend.as_deref();
        if backend.is_none() && self.warned.should_warn(self.name) {
            warn!(capability = self.name, "capability not installed; calls return CapabilityMissing");
        }
        backend
    }

    pub fn is_installed(&self) -> bool {
        self.backend.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Dummy {
        fn ping(&self) -> u32;
    }

    struct Real;
    impl Dummy for Real {
        fn ping(&self) -> u32 {
            42
        }
    }

    #[test]
    fn empty_slot_returns_none() {
        let slot: CapabilitySlot<dyn Dummy> = CapabilitySlot::empty("dummy");
        assert!(slot.get().is_none());
    }

    #[test]
    fn installed_slot_delegates() {
        let mut slot: CapabilitySlot<dyn Dummy> = CapabilitySlot::empty("dummy");
        slot.install(Box::new(Real));
        assert_eq!(slot.get().unwrap().ping(), 42);
    }
}
