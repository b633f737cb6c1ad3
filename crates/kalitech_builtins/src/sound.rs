use std::{any::Any, cell::RefCell, rc::Rc};

use kalitech_common::KalitechError;
use kalitech_host::Engine;
use serde_json::Value as JsonValue;

use crate::{kit::BuiltinKit, meta::BuiltinMeta, registry::Builtin};

pub struct SoundBuiltin;

impl Builtin for SoundBuiltin {
    fn meta(&self) -> BuiltinMeta {
        BuiltinMeta {
            name: "sound",
            global_name: None,
            version: "1.0.0",
            description: "one-shot and handle-based audio playback",
            engine_min: "0.1.0",
        }
    }

    fn create(&self, engine: Rc<RefCell<Engine>>, _kit: &BuiltinKit) -> Result<Rc<dyn Any>, KalitechError> {
        Ok(Rc::new(SoundApi { engine }))
    }
}

/// Exports of `@builtin/sound`, backed by the out-of-scope `AudioBackend`
/// collaborator (§0). Absent a backend, `play` surfaces `CapabilityMissing`
/// rather than silently dropping the request, since a script waiting on
/// the returned handle has no other way to notice playback didn't happen.
pub struct SoundApi {
    engine: Rc<RefCell<Engine>>,
}

impl SoundApi {
    pub fn play(&self, cfg: JsonValue) -> Result<u32, KalitechError> {
        self.engine.borrow().audio_play(cfg)
    }

    pub fn stop(&self, handle: u32) -> Result<(), KalitechError> {
        self.engine.borrow().audio_stop(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::NullAliasInstaller;
    use crate::registry::BuiltinRegistry;

    fn api_without_backend() -> Rc<SoundApi> {
        let mut registry = BuiltinRegistry::new();
        registry.register(Box::new(SoundBuiltin));
        let engine = Rc::new(RefCell::new(Engine::new()));
        registry
            .require_typed::<SoundApi>("@builtin/sound", &engine, &NullAliasInstaller)
            .unwrap()
    }

    #[test]
    fn play_without_an_audio_backend_reports_capability_missing() {
        let api = api_without_backend();
        assert!(matches!(api.play(JsonValue::Null), Err(KalitechError::CapabilityMissing(_))));
    }

    #[test]
    fn play_with_a_noop_backend_succeeds() {
        let mut registry = BuiltinRegistry::new();
        registry.register(Box::new(SoundBuiltin));
        let engine = Rc::new(RefCell::new(Engine::new()));
        engine.borrow_mut().install_audio(Box::new(kalitech_host::NoopAudioBackend));
        let api = registry
            .require_typed::<SoundApi>("@builtin/sound", &engine, &NullAliasInstaller)
            .unwrap();
        assert!(api.play(JsonValue::Null).is_ok());
    }
}
