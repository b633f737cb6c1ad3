use kalitech_resolver::ModuleId;

/// Evaluation state machine for a single module (§3 `Module`).
///
/// `Evaluating` makes the module visible to itself (and to cyclic
/// requesters) via a sentinel exports value, avoiding reentrant
/// re-evaluation (§9 "graph cycles... explicit state machine, not lazy
/// promises").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Unloaded,
    Evaluating,
    Ready,
    Failed,
}

#[derive(Clone)]
pub struct Module<Exports> {
    pub id: ModuleId,
    pub source_hash: u64,
    pub version: u64,
    pub exports: Option<Exports>,
    pub state: ModuleState,
}

impl<Exports> Module<Exports> {
    pub fn unloaded(id: ModuleId) -> Self {
        Self {
            id,
            source_hash: 0,
            version: 0,
            exports: None,
            state: ModuleState::Unloaded,
        }
    }
}

/// Cheap, non-cryptographic hash used only to detect "source bytes changed"
/// between evaluations — not the SHA-1 gate in §4.L, which is a stronger,
/// explicitly-named check on the root descriptor only.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
