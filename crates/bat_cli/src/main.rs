//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load config, initialize logging and bootstrap a demo extension set.
//! - Print the resolved registration order and mounted surface.
//!
//! Usage: `bat [config.json]`

use bat_core::{
    core_version, init_logging, AppConfig, Controller, Extension, ExtensionError, ExtensionId,
    Host, MountKind,
};
use log::info;
use once_cell::sync::OnceCell;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

const DEFAULT_CACHE_ADDRESS: &str = "127.0.0.1:6379";

/// Key-value cache client holder.
struct CacheExtension {
    address: String,
}

impl Extension for CacheExtension {
    fn name(&self) -> &str {
        "builtin.cache"
    }

    fn register(&self, host: &mut Host) -> Result<(), ExtensionError> {
        host.logger("cache_extension")
            .info("cache_ready", format!("address={}", self.address));
        Ok(())
    }
}

/// Session middleware backed by the cache extension.
struct SessionExtension {
    cookie_name: String,
    cache: OnceCell<Arc<CacheExtension>>,
}

impl Extension for SessionExtension {
    fn name(&self) -> &str {
        "builtin.session"
    }

    fn requirements(&self) -> Vec<ExtensionId> {
        vec![ExtensionId::of::<CacheExtension>()]
    }

    fn register(&self, host: &mut Host) -> Result<(), ExtensionError> {
        let cache = host.get::<CacheExtension>()?;
        host.logger("session_extension").info(
            "session_ready",
            format!("cookie={} store={}", self.cookie_name, cache.address),
        );
        self.cache
            .set(cache)
            .map_err(|_| format!("{} registered twice", self.name()))?;
        host.mount(self.name(), MountKind::Middleware, "ensure-session");
        host.mount(self.name(), MountKind::Middleware, "attach-session-id");
        Ok(())
    }
}

/// One-shot flash messages stored in the session.
struct FlashExtension;

impl Extension for FlashExtension {
    fn name(&self) -> &str {
        "builtin.flash"
    }

    fn requirements(&self) -> Vec<ExtensionId> {
        vec![ExtensionId::of::<SessionExtension>()]
    }

    fn register(&self, host: &mut Host) -> Result<(), ExtensionError> {
        let session = host.get::<SessionExtension>()?;
        let store = session
            .cache
            .get()
            .ok_or("session registered without a cache")?;
        host.logger("flash_extension")
            .info("flash_ready", format!("store={}", store.address));
        host.mount(
            self.name(),
            MountKind::Middleware,
            format!("flash:{}", session.cookie_name),
        );
        Ok(())
    }
}

struct MainController;

impl Controller for MainController {
    fn name(&self) -> &str {
        "main"
    }

    fn register(&self, host: &mut Host) -> Result<(), ExtensionError> {
        host.get::<FlashExtension>()?;
        host.mount(self.name(), MountKind::Route, "GET /");
        Ok(())
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::default(),
    }
    .with_env_overrides()?;
    init_logging(&config.logging)?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    // Deliberately out of dependency order.
    let extensions: Vec<Arc<dyn Extension>> = vec![
        Arc::new(FlashExtension),
        Arc::new(SessionExtension {
            cookie_name: "session".to_string(),
            cache: OnceCell::new(),
        }),
        Arc::new(CacheExtension {
            address: DEFAULT_CACHE_ADDRESS.to_string(),
        }),
    ];

    let mut host = Host::new();
    host.bootstrap(extensions)?;
    host.register_controllers(&[&MainController])?;

    println!("bat_core version={}", core_version());
    for (position, (_, extension)) in host.registry().iter().enumerate() {
        println!("extension[{position}]={}", extension.name());
    }
    for mount in host.mounts() {
        println!("mount {:?} {} owner={}", mount.kind, mount.target, mount.owner);
    }
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("bat: {err}");
            ExitCode::FAILURE
        }
    }
}
