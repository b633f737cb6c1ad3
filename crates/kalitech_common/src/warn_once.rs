use parking_lot::Mutex;
use std::collections::HashSet;

/// Throttles repeated identical diagnostics to a single emission, mirroring
/// the `warnedSurface`/`warnedInput` dedup flags used by capability
/// implementations that degrade gracefully (§7 `CapabilityMissing`).
#[derive(Default)]
pub struct WarnOnce {
    seen: Mutex<HashSet<String>>,
}

impl WarnOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time `key` is seen, false on every subsequent call.
    pub fn should_warn(&self, key: &str) -> bool {
        let mut seen = self.seen.lock();
        if seen.contains(key) {
            false
        } else {
            seen.insert(key.to_owned());
            true
        }
    }

    pub fn reset(&self) {
        self.seen.lock().clear();
    }
}
