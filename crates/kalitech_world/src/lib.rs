pub mod builder;
pub mod descriptor;
pub mod js_provider;
pub mod js_system;
pub mod provider;
pub mod system;

pub use builder::build_world;
pub use descriptor::{EntityEntry, SystemEntry, WorldDescriptor, WorldMode};
pub use js_provider::JsSystemProvider;
pub use js_system::{JsWorldSystem, ScriptHost, ScriptInstance, ScriptModule};
pub use provider::{ProviderRegistry, SystemProvider};
pub use system::{KSystem, KWorld, SystemContext};
