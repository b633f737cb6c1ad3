pub mod deno_evaluator;
pub mod json_evaluator;
pub mod orchestrator;
pub mod script_host;

pub use deno_evaluator::{DenoEvaluator, DenoExports};
pub use json_evaluator::{JsonEvaluator, JsonExports};
pub use orchestrator::RuntimeOrchestrator;
pub use script_host::{RuntimeScriptHost, ScriptExports};
