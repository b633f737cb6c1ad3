pub mod capabilities;
pub mod capability_slot;
pub mod collaborators;
pub mod engine;
pub mod handles;
pub mod main_thread;
pub mod ops;

pub use capability_slot::CapabilitySlot;
pub use collaborators::{AssetDecoder, AudioBackend, NoopAssetDecoder, NoopAudioBackend, NoopPhysicsWorld, NoopRenderer, PhysicsWorld, Renderer};
pub use engine::{Engine, WorldCapability};
pub use main_thread::MainThreadQueue;
