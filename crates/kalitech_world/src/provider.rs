use std::collections::HashMap;

use kalitech_common::KalitechError;
use serde_json::Value as JsonValue;

use crate::system::{KSystem, SystemContext};

/// Creates `KSystem` instances for one provider id (§4.I, service-loader
/// style registration mirroring the teacher's plugin registration
/// pattern).
pub trait SystemProvider {
    fn id(&self) -> &'static str;
    fn create(&self, ctx: &SystemContext, config: JsonValue) -> Result<Box<dyn KSystem>, KalitechError>;
}

#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<&'static str, Box<dyn SystemProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Box<dyn SystemProvider>) {
        self.providers.insert(provider.id(), provider);
    }

    pub fn get(&self, id: &str) -> Option<&dyn SystemProvider> {
        self.providers.get(id).map(|p| p.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopProvider;
    impl SystemProvider for NoopProvider {
        fn id(&self) -> &'static str {
            "noop"
        }
        fn create(&self, _ctx: &SystemContext, _config: JsonValue) -> Result<Box<dyn KSystem>, KalitechError> {
            struct Noop;
            impl KSystem for Noop {}
            Ok(Box::new(Noop))
        }
    }

    #[test]
    fn registered_provider_is_retrievable_by_id() {
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(NoopProvider));
        assert!(registry.get("noop").is_some());
        assert!(registry.get("missing").is_none());
    }
}
