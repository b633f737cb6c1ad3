use std::{cell::RefCell, path::PathBuf, rc::Rc, sync::Arc, time::Instant};

use kalitech_builtins::{register_defaults, BuiltinRegistry, GlobalAliasInstaller, NullAliasInstaller};
use kalitech_common::{launcher_config::LauncherConfig, logging};
use kalitech_host::Engine;
use kalitech_registry::{FsSourceProvider, ModuleRegistry};
use kalitech_resolver::{AliasStrategy, ResolverChain};
use kalitech_runtime::{DenoEvaluator, RuntimeOrchestrator};
use kalitech_watcher::ChangeWatcher;
use tracing::info;

/// Target frame time for the headless orchestrator loop; no renderer owns
/// the pacing here, so `main` provides its own fixed tick.
const TICK: std::time::Duration = std::time::Duration::from_millis(16);

fn project_dirs() -> directories::ProjectDirs {
    directories::ProjectDirs::from("dev", "kalitech", "kalitech")
        .expect("no valid home directory for this platform")
}

fn make_watcher(assets_root: &PathBuf, enabled: bool) -> Box<dyn ChangeWatcher> {
    #[cfg(feature = "hot_reload")]
    if enabled {
        match kalitech_watcher::FsWatcher::new(assets_root) {
            Ok(w) => return Box::new(w),
            Err(e) => tracing::warn!("failed to start filesystem watcher, hot reload disabled: {e}"),
        }
    }
    let _ = (assets_root, enabled);
    Box::new(kalitech_watcher::NullWatcher)
}

fn main() -> anyhow::Result<()> {
    let dirs = project_dirs();
    let log_dir = dirs.data_local_dir().to_path_buf();
    let _log_guard = logging::init_logging(&log_dir)?;

    let mut args = pico_args::Arguments::from_env();

    let launcher_config_path = dirs.config_dir().join("kalitech.conf");
    let launcher = LauncherConfig::load(&launcher_config_path).unwrap_or_default();

    let assets_root: PathBuf = args
        .opt_value_from_str::<_, PathBuf>("--assets")
        .ok()
        .flatten()
        .or_else(|| launcher.get("assets_root").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./Mods"));
    let main_module: String = args
        .opt_value_from_str::<_, String>("--main")
        .ok()
        .flatten()
        .or_else(|| launcher.get("main").map(str::to_owned))
        .unwrap_or_else(|| "main.js".to_owned());
    let hot_reload = args
        .opt_value_from_str::<_, bool>("--hot-reload")
        .ok()
        .flatten()
        .unwrap_or_else(|| launcher.get_bool("hot_reload", true));

    info!(assets = %assets_root.display(), main = %main_module, hot_reload, "starting kalitech");

    let engine = Rc::new(RefCell::new(Engine::new()));

    let resolver = ResolverChain::default_chain(
        "Mods",
        Arc::new(AliasStrategy::new(Default::default())),
        vec!["Scripts/".to_owned(), "Mods/".to_owned()],
    );
    let source = FsSourceProvider::new(assets_root.clone());
    let registry = Rc::new(ModuleRegistry::new(resolver, source, DenoEvaluator::new(engine.clone())));

    let mut builtins = BuiltinRegistry::new();
    register_defaults(&mut builtins);
    let builtins = Rc::new(builtins);

    let aliases: Rc<dyn GlobalAliasInstaller> = Rc::new(NullAliasInstaller);
    let watcher = make_watcher(&assets_root, hot_reload);

    let mut orchestrator = RuntimeOrchestrator::new(registry, builtins, watcher, engine, aliases, main_module);

    if !orchestrator.has_world() {
        tracing::warn!("initial world build failed; running anyway in case hot reload recovers it");
    }

    let mut last = Instant::now();
    loop {
        let now = Instant::now();
        let tpf = (now - last).as_secs_f32();
        last = now;

        orchestrator.update(tpf);

        let elapsed = now.elapsed();
        if elapsed < TICK {
            std::thread::sleep(TICK - elapsed);
        }
    }
}
