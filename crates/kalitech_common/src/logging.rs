use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the process-wide tracing subscriber: a terminal layer plus a
/// rolling file layer under `log_dir`. Mirrors the teacher's split between
/// console output and a per-session log file (`SESSION_LOG` in `src/main.rs`).
pub fn init_logging(log_dir: &Path) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::never(
        log_dir,
        format!("{}.log", chrono_like_timestamp()),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| anyhow::anyhow!("logging already initialized: {e}"))?;

    Ok(guard)
}

/// Cheap timestamp without pulling in `chrono` just for a filename.
fn chrono_like_timestamp() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("session-{}", now.as_secs())
}
