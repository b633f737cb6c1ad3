pub mod error;
pub mod launcher_config;
pub mod logging;
pub mod warn_once;

pub use error::{KalitechError, Result};
pub use warn_once::WarnOnce;

/// Monotonic frame clock shared by the orchestrator and every `ctx.time()`
/// accessor (§5 "Systems see the same `ctx.time()` within one frame").
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    time_sec: f32,
    tpf: f32,
}

impl FrameClock {
    pub fn advance(&mut self, tpf: f32) {
        self.tpf = tpf;
        self.time_sec += tpf;
    }

    pub fn tpf(&self) -> f32 {
        self.tpf
    }

    pub fn time_sec(&self) -> f32 {
        self.time_sec
    }
}
