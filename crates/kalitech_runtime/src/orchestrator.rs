use std::{cell::RefCell, collections::HashSet, rc::Rc};

use kalitech_builtins::{BuiltinRegistry, EntityApi, GlobalAliasInstaller};
use kalitech_common::KalitechError;
use kalitech_ecs::EntityId;
use kalitech_host::{Engine, WorldCapability};
use kalitech_registry::{Evaluator, ModuleRegistry, SourceProvider};
use kalitech_resolver::ModuleId;
use kalitech_watcher::ChangeWatcher;
use kalitech_world::{build_world, EntityEntry, JsSystemProvider, KWorld, ProviderRegistry, SystemContext, WorldDescriptor, WorldMode};
use serde_json::Value as JsonValue;
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use crate::script_host::{RuntimeScriptHost, ScriptExports};

const DEFAULT_RELOAD_COOLDOWN: f32 = 0.25;
const HOTRELOAD_CHANGED_TOPIC: &str = "hotreload:changed";

/// Bridges the `@builtin/entity` builtin's declarative spawner into the
/// engine-facing `WorldCapability` slot (§4.H `world`) so the world
/// descriptor's `entities` array and scripts calling `require("@builtin/entity")`
/// go through the exact same spawn path.
struct EntityApiWorldCapability(Rc<EntityApi>);

impl WorldCapability for EntityApiWorldCapability {
    fn spawn(&self, descriptor: JsonValue) -> Result<EntityId, KalitechError> {
        self.0.spawn_declarative(&descriptor)
    }
}

fn sha1_of(bytes: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

fn changed_to_json(changed: &HashSet<ModuleId>) -> JsonValue {
    JsonValue::Array(changed.iter().cloned().map(JsonValue::String).collect())
}

/// Merges an `entities[]` entry's `name`/`prefab` into the declarative
/// spawn config's `components` object, so both ways of naming an entity
/// (world-descriptor entry vs. a script's own `Entity.spawn`) land on the
/// same component shape. Entries whose `config` isn't an object spawn
/// with just the merged `name`/`prefab` components.
fn entity_spawn_config(entry: &EntityEntry) -> JsonValue {
    let mut cfg = if entry.config.is_object() {
        entry.config.clone()
    } else {
        serde_json::json!({})
    };
    if entry.name.is_some() || entry.prefab.is_some() {
        let obj = cfg.as_object_mut().expect("forced to an object above");
        let components = obj.entry("components").or_insert_with(|| serde_json::json!({}));
        if let Some(components) = components.as_object_mut() {
            if let Some(name) = &entry.name {
                components.entry("name").or_insert_with(|| JsonValue::String(name.clone()));
            }
            if let Some(prefab) = &entry.prefab {
                components.entry("prefab").or_insert_with(|| JsonValue::String(prefab.clone()));
            }
        }
    }
    cfg
}

/// Owns the module registry, watcher, host facade, and current world;
/// drives the per-frame procedure from §4.L.
pub struct RuntimeOrchestrator<E: Evaluator, S: SourceProvider>
where
    E::Exports: ScriptExports + 'static,
{
    registry: Rc<ModuleRegistry<E, S>>,
    builtins: Rc<BuiltinRegistry>,
    watcher: Box<dyn ChangeWatcher>,
    engine: Rc<RefCell<Engine>>,
    providers: Rc<ProviderRegistry>,
    ctx: SystemContext,
    main_id: ModuleId,
    world: Option<KWorld>,
    cooldown: f32,
    reload_cooldown: f32,
    dirty: bool,
    main_source_hash: Option<[u8; 20]>,
}

impl<E: Evaluator + 'static, S: SourceProvider + 'static> RuntimeOrchestrator<E, S>
where
    E::Exports: ScriptExports + 'static,
{
    /// Wires the entity builtin into `Engine`'s `world` capability slot,
    /// registers the always-present `jsSystem` provider, and performs one
    /// synchronous initial build (§4.L). A failing initial build is logged
    /// and leaves `world` unset; `update` then tolerates its absence every
    /// frame until something (an explicit retry, not bare hot-reload —
    /// the watcher is only polled once a world exists, per the pseudocode's
    /// literal ordering) rebuilds it successfully.
    pub fn new(
        registry: Rc<ModuleRegistry<E, S>>,
        builtins: Rc<BuiltinRegistry>,
        watcher: Box<dyn ChangeWatcher>,
        engine: Rc<RefCell<Engine>>,
        aliases: Rc<dyn GlobalAliasInstaller>,
        main_id: impl Into<ModuleId>,
    ) -> Self {
        let main_id = main_id.into();
        let entity_api = builtins
            .require_typed::<EntityApi>("@builtin/entity", &engine, aliases.as_ref())
            .expect("the entity builtin is always registered by register_defaults");
        engine.borrow_mut().install_world(Box::new(EntityApiWorldCapability(entity_api)));

        let host = Rc::new(RuntimeScriptHost::new(registry.clone(), builtins.clone(), engine.clone(), aliases));
        let mut providers = ProviderRegistry::new();
        providers.register(Box::new(JsSystemProvider::new(host)));

        let ctx = SystemContext::new(engine.clone());

        let mut orchestrator = Self {
            registry,
            builtins,
            watcher,
            engine,
            providers: Rc::new(providers),
            ctx,
            main_id,
            world: None,
            cooldown: 0.0,
            reload_cooldown: DEFAULT_RELOAD_COOLDOWN,
            dirty: false,
            main_source_hash: None,
        };

        if let Err(e) = orchestrator.rebuild_from_main() {
            warn!("initial world build failed, starting with no world: {e}");
        }
        orchestrator
    }

    pub fn with_reload_cooldown(mut self, seconds: f32) -> Self {
        self.reload_cooldown = seconds;
        self
    }

    pub fn engine(&self) -> &Rc<RefCell<Engine>> {
        &self.engine
    }

    pub fn has_world(&self) -> bool {
        self.world.is_some()
    }

    pub fn builtins(&self) -> &Rc<BuiltinRegistry> {
        &self.builtins
    }

    /// Forces the next `update` to rebuild regardless of watcher activity
    /// (used by callers that change the main descriptor's source out of
    /// band, e.g. an editor "reload now" action).
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// §4.L per-frame procedure, implemented verbatim.
    pub fn update(&mut self, tpf: f32) {
        self.engine.borrow_mut().update_time(tpf);
        if self.world.is_none() {
            return;
        }

        self.cooldown -= tpf;
        if self.cooldown <= 0.0 {
            let changed = self.watcher.poll_changed();
            if !changed.is_empty() {
                self.cooldown = self.reload_cooldown;
                self.registry.invalidate_many(&changed);
                self.engine.borrow().events.emit(HOTRELOAD_CHANGED_TOPIC, &changed_to_json(&changed));
                if changed.contains(&self.main_id) {
                    self.dirty = true;
                }
            }
        }

        if self.dirty {
            self.dirty = false;
            if let Err(e) = self.rebuild_from_main() {
                warn!("world rebuild failed, keeping previous world running: {e}");
            }
        }

        if let Some(world) = &mut self.world {
            world.update(&self.ctx, tpf);
        }
        self.engine.borrow_mut().end_frame_input();
    }

    /// Invalidates and requires the main module, extracts its `world`
    /// descriptor, applies editor mode, resets everything scoped to the
    /// previous world, builds and starts the new one, spawns its
    /// declarative entities, then runs the optional `bootstrap(ctx)` hook
    /// (§4.L `rebuildFromMain`). Skipped entirely when the main
    /// descriptor's source is byte-identical to the last build (§8
    /// testable property 9).
    ///
    /// Step order matches §4.L literally: engine state is reset and the
    /// old world stopped (in reverse system order) *before* the new world
    /// is built and started, with no rollback. A build failure after that
    /// point (e.g. an unknown system provider id) leaves `world` unset
    /// until a subsequent rebuild succeeds — there is no previous world
    /// left to fall back to once it has been stopped.
    fn rebuild_from_main(&mut self) -> Result<(), KalitechError> {
        let source = self.registry.source_provider().load(&self.main_id).ok_or_else(|| KalitechError::UnresolvedRequire {
            parent: self.main_id.clone(),
            request: self.main_id.clone(),
        })?;
        let hash = sha1_of(source.as_bytes());
        if self.main_source_hash == Some(hash) {
            debug!(id = %self.main_id, "main descriptor unchanged, skipping rebuild");
            return Ok(());
        }

        self.registry.invalidate(&self.main_id);
        let exports = self.registry.require_resolved(&self.main_id)?;
        let descriptor_json = exports.world_descriptor().ok_or_else(|| KalitechError::ScriptRuntime {
            id: self.main_id.clone(),
            msg: "main module does not export a world descriptor".to_owned(),
        })?;
        let descriptor: WorldDescriptor = serde_json::from_value(descriptor_json).map_err(|e| KalitechError::ScriptRuntime {
            id: self.main_id.clone(),
            msg: format!("invalid world descriptor: {e}"),
        })?;

        self.engine.borrow_mut().editor_set_enabled(descriptor.mode == Some(WorldMode::Editor));
        self.engine.borrow_mut().reset_world()?;

        if let Some(mut old) = self.world.take() {
            old.stop(&self.ctx);
        }

        let mut world = build_world(&descriptor, &self.ctx, &self.providers)?;
        world.start(&self.ctx);
        let system_count = world.len();
        self.world = Some(world);

        for entry in &descriptor.entities {
            let cfg = entity_spawn_config(entry);
            if let Err(e) = self.engine.borrow().world_spawn(cfg) {
                warn!(entity = ?entry.name, "failed to spawn declarative entity: {e}");
            }
        }

        exports.bootstrap(&self.ctx)?;

        self.main_source_hash = Some(hash);
        info!(id = %self.main_id, systems = system_count, entities = descriptor.entities.len(), "world rebuilt");
        Ok(())
    }
}
