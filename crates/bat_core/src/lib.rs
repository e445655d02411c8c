//! Extension bootstrap core for bat applications.
//! Orders, registers and exposes independently-authored extensions.

pub mod config;
pub mod controller;
pub mod error;
pub mod extension;
pub mod host;
pub mod logging;

pub use config::{AppConfig, ConfigError, LogOutput, LoggingConfig};
pub use controller::Controller;
pub use error::{BootstrapError, BootstrapResult, LookupError};
pub use extension::registry::Registry;
pub use extension::{Extension, ExtensionError, ExtensionId};
pub use host::{bootstrap, ExtensionLogger, Host, HostState, Mount, MountKind};
pub use logging::{default_log_level, init_logging, logging_status};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
