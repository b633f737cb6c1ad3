use kalitech_common::KalitechError;

use crate::{
    descriptor::WorldDescriptor,
    provider::ProviderRegistry,
    system::{KWorld, SystemContext},
};

/// Filters entries missing `id`, sorts the rest by `order` ascending
/// (stable — equal orders preserve declaration order), and builds each
/// through its registered provider (§4.I). An unknown provider id raises
/// `UnknownSystem` and aborts the build; the caller is expected to keep
/// the previous world running on that error (§7 policy).
pub fn build_world(
    descriptor: &WorldDescriptor,
    ctx: &SystemContext,
    providers: &ProviderRegistry,
) -> Result<KWorld, KalitechError> {
    let mut entries: Vec<&crate::descriptor::SystemEntry> =
        descriptor.systems.iter().filter(|entry| entry.id.is_some()).collect();
    entries.sort_by_key(|entry| entry.order);

    let mut systems = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = entry.id.as_deref().expect("filtered for Some above");
        let provider = providers
            .get(id)
            .ok_or_else(|| KalitechError::UnknownSystem(id.to_owned()))?;
        systems.push(provider.create(ctx, entry.config.clone())?);
    }

    Ok(KWorld::new(systems))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SystemProvider;
    use crate::system::KSystem;
    use kalitech_host::Engine;
    use serde_json::Value as JsonValue;
    use std::{cell::RefCell, rc::Rc};

    struct OrderProvider {
        id: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl SystemProvider for OrderProvider {
        fn id(&self) -> &'static str {
            self.id
        }
        fn create(&self, _ctx: &SystemContext, _config: JsonValue) -> Result<Box<dyn KSystem>, KalitechError> {
            struct Recording {
                name: &'static str,
                log: Rc<RefCell<Vec<&'static str>>>,
            }
            impl KSystem for Recording {
                fn start(&mut self, _ctx: &SystemContext) -> Result<(), KalitechError> {
                    self.log.borrow_mut().push(self.name);
                    Ok(())
                }
            }
            Ok(Box::new(Recording { name: self.id, log: self.log.clone() }))
        }
    }

    fn ctx() -> SystemContext {
        SystemContext::new(Rc::new(RefCell::new(Engine::new())))
    }

    #[test]
    fn equal_order_preserves_declaration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(OrderProvider { id: "first", log: log.clone() }));
        registry.register(Box::new(OrderProvider { id: "second", log: log.clone() }));

        let descriptor: WorldDescriptor = serde_json::from_value(serde_json::json!({
            "name": "main",
            "systems": [
                {"id": "first", "order": 5, "config": {}},
                {"id": "second", "order": 5, "config": {}},
            ]
        }))
        .unwrap();

        let ctx = ctx();
        let mut world = build_world(&descriptor, &ctx, &registry).unwrap();
        world.start(&ctx);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn entries_missing_id_are_skipped() {
        let registry = ProviderRegistry::new();
        let descriptor: WorldDescriptor = serde_json::from_value(serde_json::json!({
            "name": "main",
            "systems": [{"order": 1}]
        }))
        .unwrap();
        let ctx = ctx();
        let world = build_world(&descriptor, &ctx, &registry).unwrap();
        assert!(world.is_empty());
    }

    #[test]
    fn unknown_provider_id_errors() {
        let registry = ProviderRegistry::new();
        let descriptor: WorldDescriptor = serde_json::from_value(serde_json::json!({
            "name": "main",
            "systems": [{"id": "nope", "order": 1}]
        }))
        .unwrap();
        let ctx = ctx();
        assert!(matches!(
            build_world(&descriptor, &ctx, &registry),
            Err(KalitechError::UnknownSystem(_))
        ));
    }
}
