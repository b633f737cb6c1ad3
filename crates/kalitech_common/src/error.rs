use thiserror::Error;

/// The error taxonomy from the runtime's design (propagation rules live
/// alongside each variant; see module docs in the crates that raise them).
#[derive(Error, Debug, Clone)]
pub enum KalitechError {
    #[error("unresolved require: {request:?} from {parent:?}")]
    UnresolvedRequire { parent: String, request: String },

    #[error("script syntax error in {id}:{line}:{col}: {msg}")]
    ScriptSyntax {
        id: String,
        line: u32,
        col: u32,
        msg: String,
    },

    #[error("script runtime error in {id}: {msg}")]
    ScriptRuntime { id: String, msg: String },

    #[error("context cancelled")]
    ContextCancelled,

    #[error("unknown system provider: {0}")]
    UnknownSystem(String),

    #[error("capability missing: {0}")]
    CapabilityMissing(String),

    #[error("invalid handle: {0}")]
    InvalidHandle(String),
}

pub type Result<T> = std::result::Result<T, KalitechError>;

impl KalitechError {
    /// True for exceptions raised during interpreter shutdown that should be
    /// swallowed rather than logged (§4.K shutdown-safe calls).
    pub fn is_shutdown_noise(&self) -> bool {
        matches!(self, KalitechError::ContextCancelled)
            || match self {
                KalitechError::ScriptRuntime { msg, .. } => is_cancellation_message(msg),
                _ => false,
            }
    }
}

/// Heuristic used by shutdown-safe interop calls: message text that
/// indicates the interpreter/context was already closed or cancelled.
pub fn is_cancellation_message(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    lower.contains("cancelled") || lower.contains("canceled") || lower.contains("context closed")
        || lower.contains("isolate terminated")
}
