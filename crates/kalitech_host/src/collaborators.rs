//! The four external collaborators named out of scope for this runtime
//! (renderer, physics solver, audio backend, asset decoder). Each is a
//! narrow trait; a real engine implements them and wires its
//! implementation into `Engine`'s per-capability slots. The `Noop*`
//! stubs here exist only to exercise the facade's contract end-to-end
//! without a real backend.

use kalitech_common::KalitechError;
use serde_json::Value as JsonValue;

use crate::{
    capabilities::{
        AssetsCapability, CameraCapability, DebugCapability, EditorLinesCapability, LightCapability,
        MeshCapability, RenderCapability, TerrainCapability,
    },
    handles::{BodyHandle, LightHandle},
};

/// Everything a renderer backend provides. A real implementation shares
/// one `Rc<RefCell<_>>` scene-graph handle across the individual trait
/// impls it registers with `Engine`; these stay separate capability
/// slots rather than one combined object so a backend can support a
/// subset (e.g. render without HUD).
pub trait Renderer:
    RenderCapability + CameraCapability + LightCapability + DebugCapability + MeshCapability + TerrainCapability + EditorLinesCapability
{
}

pub trait PhysicsWorld: crate::capabilities::PhysicsCapability {}

pub trait AudioBackend {
    fn play(&self, cfg: JsonValue) -> Result<u32, KalitechError>;
    fn stop(&self, handle: u32) -> Result<(), KalitechError>;
}

pub trait AssetDecoder: AssetsCapability {}

#[derive(Default)]
pub struct NoopRenderer;

impl RenderCapability for NoopRenderer {
    fn ensure_scene(&self) -> Result<(), KalitechError> {
        Ok(())
    }
    fn skybox_cube(&self, _path: &str) -> Result<(), KalitechError> {
        Ok(())
    }
    fn fog_cfg(&self, _color: [f32; 3], _density: f32, _distance: f32) -> Result<(), KalitechError> {
        Ok(())
    }
    fn post_cfg(&self, _cfg: JsonValue) -> Result<(), KalitechError> {
        Ok(())
    }
    fn sun_shadows(&self, _map_size: u32) -> Result<(), KalitechError> {
        Ok(())
    }
}

impl CameraCapability for NoopRenderer {
    fn set_location(&self, _pos: [f32; 3]) -> Result<(), KalitechError> {
        Ok(())
    }
    fn set_yaw(&self, _yaw: f32) -> Result<(), KalitechError> {
        Ok(())
    }
    fn set_pitch(&self, _pitch: f32) -> Result<(), KalitechError> {
        Ok(())
    }
    fn set_yaw_pitch(&self, _yaw: f32, _pitch: f32) -> Result<(), KalitechError> {
        Ok(())
    }
    fn move_local(&self, _delta: [f32; 3]) -> Result<(), KalitechError> {
        Ok(())
    }
    fn location(&self) -> Result<[f32; 3], KalitechError> {
        Ok([0.0, 0.0, 0.0])
    }
}

impl LightCapability for NoopRenderer {
    fn create(&self, _cfg: JsonValue) -> Result<LightHandle, KalitechError> {
        Ok(LightHandle(0))
    }
    fn set(&self, _id: LightHandle, _cfg: JsonValue) -> Result<(), KalitechError> {
        Ok(())
    }
    fn enable(&self, _id: LightHandle, _enabled: bool) -> Result<(), KalitechError> {
        Ok(())
    }
    fn destroy(&self, _id: LightHandle) -> Result<(), KalitechError> {
        Ok(())
    }
}

impl DebugCapability for NoopRenderer {
    fn line(&self, _cfg: JsonValue) -> Result<(), KalitechError> {
        Ok(())
    }
    fn ray(&self, _cfg: JsonValue) -> Result<(), KalitechError> {
        Ok(())
    }
    fn axes(&self, _cfg: JsonValue) -> Result<(), KalitechError> {
        Ok(())
    }
    fn tick(&self, _dt: f32) -> Result<(), KalitechError> {
        Ok(())
    }
    fn clear(&self) -> Result<(), KalitechError> {
        Ok(())
    }
    fn enabled(&self, _enabled: bool) -> Result<(), KalitechError> {
        Ok(())
    }
}

impl MeshCapability for NoopRenderer {
    fn create(&self, _cfg: JsonValue) -> Result<kalitech_ecs::SurfaceHandle, KalitechError> {
        Ok(kalitech_ecs::SurfaceHandle { id: 0, kind: kalitech_ecs::SurfaceKind::Mesh })
    }
}

impl TerrainCapability for NoopRenderer {
    fn create_heightmap(&self, _cfg: JsonValue) -> Result<kalitech_ecs::SurfaceHandle, KalitechError> {
        Ok(kalitech_ecs::SurfaceHandle { id: 0, kind: kalitech_ecs::SurfaceKind::Terrain })
    }
    fn create_plane(&self, _cfg: JsonValue) -> Result<kalitech_ecs::SurfaceHandle, KalitechError> {
        Ok(kalitech_ecs::SurfaceHandle { id: 0, kind: kalitech_ecs::SurfaceKind::Terrain })
    }
    fn splat_layer(&self, _surface: kalitech_ecs::SurfaceHandle, _cfg: JsonValue) -> Result<(), KalitechError> {
        Ok(())
    }
}

impl EditorLinesCapability for NoopRenderer {
    fn create_grid_plane(&self, _cfg: JsonValue) -> Result<kalitech_ecs::SurfaceHandle, KalitechError> {
        Ok(kalitech_ecs::SurfaceHandle { id: 0, kind: kalitech_ecs::SurfaceKind::EditorGrid })
    }
    fn destroy(&self, _handle: kalitech_ecs::SurfaceHandle) -> Result<(), KalitechError> {
        Ok(())
    }
}

impl Renderer for NoopRenderer {}

#[derive(Default)]
pub struct NoopPhysicsWorld;

impl crate::capabilities::PhysicsCapability for NoopPhysicsWorld {
    fn body(&self, _cfg: JsonValue) -> Result<BodyHandle, KalitechError> {
        Ok(BodyHandle(0))
    }
    fn position(&self, _id: BodyHandle, set: Option<[f32; 3]>) -> Result<[f32; 3], KalitechError> {
        Ok(set.unwrap_or([0.0, 0.0, 0.0]))
    }
    fn velocity(&self, _id: BodyHandle, set: Option<[f32; 3]>) -> Result<[f32; 3], KalitechError> {
        Ok(set.unwrap_or([0.0, 0.0, 0.0]))
    }
    fn remove(&self, _id: BodyHandle) -> Result<(), KalitechError> {
        Ok(())
    }
    fn clear(&self) -> Result<(), KalitechError> {
        Ok(())
    }
}
impl PhysicsWorld for NoopPhysicsWorld {}

#[derive(Default)]
pub struct NoopAudioBackend;
impl AudioBackend for NoopAudioBackend {
    fn play(&self, _cfg: JsonValue) -> Result<u32, KalitechError> {
        Ok(0)
    }
    fn stop(&self, _handle: u32) -> Result<(), KalitechError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct NoopAssetDecoder;
impl AssetsCapability for NoopAssetDecoder {
    fn read_text(&self, _path: &str) -> Result<String, KalitechError> {
        Ok(String::new())
    }
    fn load_asset(&self, _path: &str) -> Result<Vec<u8>, KalitechError> {
        Ok(Vec::new())
    }
}
impl AssetDecoder for NoopAssetDecoder {}
