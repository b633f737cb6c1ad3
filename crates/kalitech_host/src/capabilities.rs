use kalitech_common::KalitechError;
use serde_json::Value as JsonValue;

use crate::handles::{BodyHandle, HudHandle, LightHandle, MaterialHandle};

/// Reads asset bytes/text from the configured assets root (§4.H). Backed
/// by the out-of-scope `AssetDecoder` collaborator for anything beyond raw
/// bytes/text.
pub trait AssetsCapability {
    fn read_text(&self, path: &str) -> Result<String, KalitechError>;
    fn load_asset(&self, path: &str) -> Result<Vec<u8>, KalitechError>;
}

/// `cfg` is `{def, params, scales}` per §4.H; kept as `JsonValue` since the
/// schema is owned by content, not the runtime.
pub trait MaterialCapability {
    fn create(&self, cfg: JsonValue) -> Result<MaterialHandle, KalitechError>;
}

pub trait RenderCapability {
    fn ensure_scene(&self) -> Result<(), KalitechError>;
    fn skybox_cube(&self, path: &str) -> Result<(), KalitechError>;
    fn fog_cfg(&self, color: [f32; 3], density: f32, distance: f32) -> Result<(), KalitechError>;
    fn post_cfg(&self, cfg: JsonValue) -> Result<(), KalitechError>;
    fn sun_shadows(&self, map_size: u32) -> Result<(), KalitechError>;
}

pub trait CameraCapability {
    fn set_location(&self, pos: [f32; 3]) -> Result<(), KalitechError>;
    fn set_yaw(&self, yaw: f32) -> Result<(), KalitechError>;
    fn set_pitch(&self, pitch: f32) -> Result<(), KalitechError>;
    fn set_yaw_pitch(&self, yaw: f32, pitch: f32) -> Result<(), KalitechError>;
    fn move_local(&self, delta: [f32; 3]) -> Result<(), KalitechError>;
    fn location(&self) -> Result<[f32; 3], KalitechError>;
}

pub trait PhysicsCapability {
    fn body(&self, cfg: JsonValue) -> Result<BodyHandle, KalitechError>;
    fn position(&self, id: BodyHandle, set: Option<[f32; 3]>) -> Result<[f32; 3], KalitechError>;
    fn velocity(&self, id: BodyHandle, set: Option<[f32; 3]>) -> Result<[f32; 3], KalitechError>;
    fn remove(&self, id: BodyHandle) -> Result<(), KalitechError>;
    /// Drops every body (§4.L world rebuild: "physics bodies are cleared
    /// first" before the ECS is reset).
    fn clear(&self) -> Result<(), KalitechError>;
}

pub trait LightCapability {
    fn create(&self, cfg: JsonValue) -> Result<LightHandle, KalitechError>;
    fn set(&self, id: LightHandle, cfg: JsonValue) -> Result<(), KalitechError>;
    fn enable(&self, id: LightHandle, enabled: bool) -> Result<(), KalitechError>;
    fn destroy(&self, id: LightHandle) -> Result<(), KalitechError>;
}

pub trait DebugCapability {
    fn line(&self, cfg: JsonValue) -> Result<(), KalitechError>;
    fn ray(&self, cfg: JsonValue) -> Result<(), KalitechError>;
    fn axes(&self, cfg: JsonValue) -> Result<(), KalitechError>;
    fn tick(&self, dt: f32) -> Result<(), KalitechError>;
    fn clear(&self) -> Result<(), KalitechError>;
    fn enabled(&self, enabled: bool) -> Result<(), KalitechError>;
}

pub trait MeshCapability {
    fn create(&self, cfg: JsonValue) -> Result<kalitech_ecs::SurfaceHandle, KalitechError>;
}

pub trait TerrainCapability {
    fn create_heightmap(&self, cfg: JsonValue) -> Result<kalitech_ecs::SurfaceHandle, KalitechError>;
    fn create_plane(&self, cfg: JsonValue) -> Result<kalitech_ecs::SurfaceHandle, KalitechError>;
    fn splat_layer(&self, surface: kalitech_ecs::SurfaceHandle, cfg: JsonValue) -> Result<(), KalitechError>;
}

pub trait EditorLinesCapability {
    fn create_grid_plane(&self, cfg: JsonValue) -> Result<kalitech_ecs::SurfaceHandle, KalitechError>;
    fn destroy(&self, handle: kalitech_ecs::SurfaceHandle) -> Result<(), KalitechError>;
}

pub trait HudCapability {
    fn create(&self, cfg: JsonValue) -> Result<HudHandle, KalitechError>;
    fn tick(&self, dt: f32) -> Result<(), KalitechError>;
    fn destroy(&self, id: HudHandle) -> Result<(), KalitechError>;
}
