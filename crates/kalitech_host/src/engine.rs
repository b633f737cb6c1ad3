use kalitech_common::{FrameClock, KalitechError};
use kalitech_ecs::{EcsStore, EntityId, EventBus, InputAggregator, InputSnapshot, SurfaceHandle, SurfaceKind, SurfaceRegistry};
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use crate::{
    capabilities::{
        AssetsCapability, CameraCapability, DebugCapability, EditorLinesCapability, HudCapability, LightCapability,
        MaterialCapability, MeshCapability, PhysicsCapability, RenderCapability, TerrainCapability,
    },
    capability_slot::CapabilitySlot,
    collaborators::AudioBackend,
    handles::MaterialHandle,
    main_thread::MainThreadQueue,
};

/// Spawns declarative entities from a world descriptor (§4.H `world`
/// capability, §4.I). Implemented by `kalitech_world` and installed into
/// the engine at orchestrator construction, keeping `kalitech_host` free
/// of a dependency on the world-builder crate.
pub trait WorldCapability {
    fn spawn(&self, descriptor: JsonValue) -> Result<EntityId, KalitechError>;
}

/// Backing spatial type for `EcsStore`'s physical scene graph is owned by
/// the renderer collaborator; the surface registry here only tracks
/// opaque handles (§4.F), not the renderer-side spatial itself.
pub type Surfaces = SurfaceRegistry<JsonValue>;

/// Single entry point exposing capability-partitioned sub-facades (§4.H).
/// Scripts only ever see `engine.<capability>()`.
pub struct Engine {
    pub ecs: EcsStore,
    pub surfaces: Surfaces,
    pub events: EventBus,
    pub input: InputAggregator,
    pub main_thread: MainThreadQueue,
    clock: FrameClock,
    editor_enabled: bool,

    assets: CapabilitySlot<dyn AssetsCapability>,
    material: CapabilitySlot<dyn MaterialCapability>,
    render: CapabilitySlot<dyn RenderCapability>,
    camera: CapabilitySlot<dyn CameraCapability>,
    physics: CapabilitySlot<dyn PhysicsCapability>,
    light: CapabilitySlot<dyn LightCapability>,
    debug: CapabilitySlot<dyn DebugCapability>,
    mesh: CapabilitySlot<dyn MeshCapability>,
    terrain: CapabilitySlot<dyn TerrainCapability>,
    editor_lines: CapabilitySlot<dyn EditorLinesCapability>,
    hud: CapabilitySlot<dyn HudCapability>,
    world: CapabilitySlot<dyn WorldCapability>,
    audio: CapabilitySlot<dyn AudioBackend>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            ecs: EcsStore::new(),
            surfaces: Surfaces::new(),
            events: EventBus::new(),
            input: InputAggregator::new(),
            main_thread: MainThreadQueue::new(),
            clock: FrameClock::default(),
            editor_enabled: false,
            assets: CapabilitySlot::empty("assets"),
            material: CapabilitySlot::empty("material"),
            render: CapabilitySlot::empty("render"),
            camera: CapabilitySlot::empty("camera"),
            physics: CapabilitySlot::empty("physics"),
            light: CapabilitySlot::empty("light"),
            debug: CapabilitySlot::empty("debug"),
            mesh: CapabilitySlot::empty("mesh"),
            terrain: CapabilitySlot::empty("terrain"),
            editor_lines: CapabilitySlot::empty("editorLines"),
            hud: CapabilitySlot::empty("hud"),
            world: CapabilitySlot::empty("world"),
            audio: CapabilitySlot::empty("audio"),
        }
    }

    pub fn install_assets(&mut self, backend: Box<dyn AssetsCapability>) {
        self.assets.install(backend);
    }
    pub fn install_material(&mut self, backend: Box<dyn MaterialCapability>) {
        self.material.install(backend);
    }
    pub fn install_render(&mut self, backend: Box<dyn RenderCapability>) {
        self.render.install(backend);
    }
    pub fn install_camera(&mut self, backend: Box<dyn CameraCapability>) {
        self.camera.install(backend);
    }
    pub fn install_physics(&mut self, backend: Box<dyn PhysicsCapability>) {
        self.physics.install(backend);
    }
    pub fn install_light(&mut self, backend: Box<dyn LightCapability>) {
        self.light.install(backend);
    }
    pub fn install_debug(&mut self, backend: Box<dyn DebugCapability>) {
        self.debug.install(backend);
    }
    pub fn install_mesh(&mut self, backend: Box<dyn MeshCapability>) {
        self.mesh.install(backend);
    }
    pub fn install_terrain(&mut self, backend: Box<dyn TerrainCapability>) {
        self.terrain.install(backend);
    }
    pub fn install_editor_lines(&mut self, backend: Box<dyn EditorLinesCapability>) {
        self.editor_lines.install(backend);
    }
    pub fn install_hud(&mut self, backend: Box<dyn HudCapability>) {
        self.hud.install(backend);
    }
    pub fn install_world(&mut self, backend: Box<dyn WorldCapability>) {
        self.world.install(backend);
    }
    pub fn install_audio(&mut self, backend: Box<dyn AudioBackend>) {
        self.audio.install(backend);
    }

    /// Wires every renderer-owned capability slot to the same backend
    /// instance's individual trait impls at once (§0 `trait Renderer`
    /// collaborator). Each concrete renderer must be cheaply constructible
    /// per-slot (e.g. a thin wrapper around a shared `Rc<RefCell<_>>`) since
    /// a trait object can't be re-split across slots after erasure.
    pub fn install_renderer<R>(&mut self, make: impl Fn() -> R)
    where
        R: crate::collaborators::Renderer + 'static,
    {
        self.install_render(Box::new(make()));
        self.install_camera(Box::new(make()));
        self.install_light(Box::new(make()));
        self.install_debug(Box::new(make()));
        self.install_mesh(Box::new(make()));
        self.install_terrain(Box::new(make()));
        self.install_editor_lines(Box::new(make()));
    }

    pub fn install_physics_world<P>(&mut self, backend: P)
    where
        P: crate::collaborators::PhysicsWorld + 'static,
    {
        self.physics.install(Box::new(backend));
    }

    fn missing(name: &'static str) -> KalitechError {
        KalitechError::CapabilityMissing(name.to_owned())
    }

    // -- log --
    pub fn log_info(&self, message: &str) {
        info!(target: "script", "{message}");
    }
    pub fn log_warn(&self, message: &str) {
        warn!(target: "script", "{message}");
    }
    pub fn log_error(&self, message: &str) {
        error!(target: "script", "{message}");
    }
    pub fn log_debug(&self, message: &str) {
        debug!(target: "script", "{message}");
    }

    // -- time --
    pub fn tpf(&self) -> f32 {
        self.clock.tpf()
    }
    pub fn time_sec(&self) -> f32 {
        self.clock.time_sec()
    }
    pub fn update_time(&mut self, tpf: f32) {
        self.clock.advance(tpf);
    }
    pub fn end_frame_input(&mut self) {
        self.input.end_frame();
    }
    pub fn input_snapshot(&self) -> InputSnapshot {
        self.input.consume_snapshot()
    }

    // -- editor --
    pub fn editor_set_enabled(&mut self, enabled: bool) {
        self.editor_enabled = enabled;
    }
    pub fn editor_enabled(&self) -> bool {
        self.editor_enabled
    }

    // -- entity --
    pub fn entity_create(&mut self) -> EntityId {
        self.ecs.create()
    }
    /// Destroying an entity also destroys (not merely detaches) any
    /// surface still attached to it (§8 scenario 5).
    pub fn entity_destroy(&mut self, id: EntityId) {
        if let Some(surface_id) = self.surfaces.detach_entity(id) {
            let _ = self.surfaces.destroy(surface_id);
        }
        self.ecs.destroy(id);
    }

    // -- surface --
    pub fn surface_register(&mut self, spatial: JsonValue, kind: SurfaceKind) -> SurfaceHandle {
        self.surfaces.register(spatial, kind)
    }
    pub fn surface_attach(&mut self, surface_id: u32, entity_id: EntityId) -> Result<(), KalitechError> {
        self.surfaces.attach(surface_id, entity_id)
    }
    pub fn surface_detach(&mut self, surface_id: u32) -> Result<(), KalitechError> {
        self.surfaces.detach_surface(surface_id)
    }
    pub fn surface_destroy(&mut self, surface_id: u32) -> Result<JsonValue, KalitechError> {
        self.surfaces.destroy(surface_id)
    }

    // -- pluggable capabilities, each a narrow delegate with explicit
    // CapabilityMissing on absence (§9 "no probing") --
    pub fn assets_read_text(&self, path: &str) -> Result<String, KalitechError> {
        self.assets.get().ok_or_else(|| Self::missing("assets"))?.read_text(path)
    }
    pub fn assets_load(&self, path: &str) -> Result<Vec<u8>, KalitechError> {
        self.assets.get().ok_or_else(|| Self::missing("assets"))?.load_asset(path)
    }

    pub fn material_create(&self, cfg: JsonValue) -> Result<MaterialHandle, KalitechError> {
        self.material.get().ok_or_else(|| Self::missing("material"))?.create(cfg)
    }

    pub fn render_ensure_scene(&self) -> Result<(), KalitechError> {
        match self.render.get() {
            Some(r) => r.ensure_scene(),
            None => Ok(()),
        }
    }
    pub fn render_skybox_cube(&self, path: &str) -> Result<(), KalitechError> {
        match self.render.get() {
            Some(r) => r.skybox_cube(path),
            None => Ok(()),
        }
    }
    pub fn render_fog_cfg(&self, color: [f32; 3], density: f32, distance: f32) -> Result<(), KalitechError> {
        match self.render.get() {
            Some(r) => r.fog_cfg(color, density, distance),
            None => Ok(()),
        }
    }
    pub fn render_post_cfg(&self, cfg: JsonValue) -> Result<(), KalitechError> {
        match self.render.get() {
            Some(r) => r.post_cfg(cfg),
            None => Ok(()),
        }
    }
    pub fn render_sun_shadows(&self, map_size: u32) -> Result<(), KalitechError> {
        let map_size = map_size.min(8192);
        match self.render.get() {
            Some(r) => r.sun_shadows(map_size),
            None => Ok(()),
        }
    }

    pub fn camera_set_location(&self, pos: [f32; 3]) -> Result<(), KalitechError> {
        self.camera.get().ok_or_else(|| Self::missing("camera"))?.set_location(pos)
    }
    pub fn camera_location(&self) -> Result<[f32; 3], KalitechError> {
        self.camera.get().ok_or_else(|| Self::missing("camera"))?.location()
    }

    pub fn physics_body(&self, cfg: JsonValue) -> Result<crate::handles::BodyHandle, KalitechError> {
        self.physics.get().ok_or_else(|| Self::missing("physics"))?.body(cfg)
    }

    pub fn light_create(&self, cfg: JsonValue) -> Result<crate::handles::LightHandle, KalitechError> {
        self.light.get().ok_or_else(|| Self::missing("light"))?.create(cfg)
    }

    pub fn debug_clear(&self) -> Result<(), KalitechError> {
        match self.debug.get() {
            Some(d) => d.clear(),
            None => Ok(()),
        }
    }

    /// Creates the surface through the renderer, then mirrors it into the
    /// host-side registry under the same id so `surface_attach`/`destroy`
    /// stay in sync with whatever the renderer allocated (§4.F).
    fn adopt_surface(&mut self, handle: SurfaceHandle) -> Result<SurfaceHandle, KalitechError> {
        // Id 0 is the registry's reserved "no surface" sentinel (§4.F); a
        // stub/no-op renderer that hands it back produced nothing to track.
        if handle.id != 0 {
            self.surfaces.register_existing(handle.id, JsonValue::Null, handle.kind)?;
        }
        Ok(handle)
    }

    pub fn mesh_create(&mut self, cfg: JsonValue) -> Result<SurfaceHandle, KalitechError> {
        let handle = self.mesh.get().ok_or_else(|| Self::missing("mesh"))?.create(cfg)?;
        self.adopt_surface(handle)
    }

    pub fn terrain_create_heightmap(&mut self, cfg: JsonValue) -> Result<SurfaceHandle, KalitechError> {
        let handle = self
            .terrain
            .get()
            .ok_or_else(|| Self::missing("terrain"))?
            .create_heightmap(cfg)?;
        self.adopt_surface(handle)
    }
    pub fn terrain_create_plane(&mut self, cfg: JsonValue) -> Result<SurfaceHandle, KalitechError> {
        let handle = self.terrain.get().ok_or_else(|| Self::missing("terrain"))?.create_plane(cfg)?;
        self.adopt_surface(handle)
    }
    pub fn terrain_splat_layer(&self, surface: SurfaceHandle, cfg: JsonValue) -> Result<(), KalitechError> {
        self.terrain
            .get()
            .ok_or_else(|| Self::missing("terrain"))?
            .splat_layer(surface, cfg)
    }

    pub fn audio_play(&self, cfg: JsonValue) -> Result<u32, KalitechError> {
        self.audio.get().ok_or_else(|| Self::missing("audio"))?.play(cfg)
    }
    pub fn audio_stop(&self, handle: u32) -> Result<(), KalitechError> {
        self.audio.get().ok_or_else(|| Self::missing("audio"))?.stop(handle)
    }

    pub fn editor_lines_create_grid_plane(&mut self, cfg: JsonValue) -> Result<SurfaceHandle, KalitechError> {
        let handle = self
            .editor_lines
            .get()
            .ok_or_else(|| Self::missing("editorLines"))?
            .create_grid_plane(cfg)?;
        self.adopt_surface(handle)
    }

    pub fn hud_create(&self, cfg: JsonValue) -> Result<crate::handles::HudHandle, KalitechError> {
        self.hud.get().ok_or_else(|| Self::missing("hud"))?.create(cfg)
    }

    pub fn world_spawn(&self, descriptor: JsonValue) -> Result<EntityId, KalitechError> {
        self.world.get().ok_or_else(|| Self::missing("world"))?.spawn(descriptor)
    }

    /// Tears down everything scoped to the current world ahead of a rebuild
    /// (§4.L, §5 "physics bodies are cleared first, then ECS reset, then
    /// surfaces destroyed"). A missing physics backend is a graceful no-op,
    /// same as every other absent capability.
    pub fn reset_world(&mut self) -> Result<(), KalitechError> {
        if let Some(physics) = self.physics.get() {
            physics.clear()?;
        }
        self.ecs.reset();
        self.surfaces.reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopMaterial;
    impl MaterialCapability for NoopMaterial {
        fn create(&self, _cfg: JsonValue) -> Result<MaterialHandle, KalitechError> {
            Ok(MaterialHandle(1))
        }
    }

    #[test]
    fn missing_capability_errors_explicitly() {
        let engine = Engine::new();
        let err = engine.material_create(JsonValue::Null);
        assert!(matches!(err, Err(KalitechError::CapabilityMissing(name)) if name == "material"));
    }

    #[test]
    fn installed_capability_delegates() {
        let mut engine = Engine::new();
        engine.install_material(Box::new(NoopMaterial));
        assert_eq!(engine.material_create(JsonValue::Null).unwrap(), MaterialHandle(1));
    }

    #[test]
    fn render_capability_no_ops_when_absent_rather_than_erroring() {
        let engine = Engine::new();
        assert!(engine.render_ensure_scene().is_ok());
    }

    #[test]
    fn install_renderer_wires_every_render_owned_slot() {
        let mut engine = Engine::new();
        engine.install_renderer(crate::collaborators::NoopRenderer::default);
        assert!(engine.render_ensure_scene().is_ok());
        assert!(engine.camera_location().is_ok());
        assert!(engine.mesh_create(JsonValue::Null).is_ok());
    }

    #[test]
    fn destroying_entity_detaches_its_surface() {
        let mut engine = Engine::new();
        let e = engine.entity_create();
        let handle = engine.surface_register(JsonValue::Null, SurfaceKind::Mesh);
        engine.surface_attach(handle.id, e).unwrap();
        engine.entity_destroy(e);
        assert!(!engine.surfaces.exists(handle.id));
    }

    #[test]
    fn reset_world_clears_ecs_and_surfaces() {
        let mut engine = Engine::new();
        let e = engine.entity_create();
        let handle = engine.surface_register(JsonValue::Null, SurfaceKind::Mesh);
        engine.surface_attach(handle.id, e).unwrap();
        engine.reset_world().unwrap();
        assert!(!engine.ecs.is_alive(e));
        assert!(!engine.surfaces.exists(handle.id));
    }

    #[test]
    fn reset_world_tolerates_a_missing_physics_backend() {
        let mut engine = Engine::new();
        assert!(engine.reset_world().is_ok());
    }
}
