//! Host application object and registration driver.
//!
//! # Responsibility
//! - Own the extension registry for one application instance.
//! - Drive extension registration in resolved order, fail-fast.
//! - Collect opaque mount descriptors published by extensions/controllers.
//!
//! # Invariants
//! - Bootstrap runs at most once per host, including re-entrant calls made
//!   from inside a `register` hook.
//! - An extension becomes visible through `get` right after its own
//!   `register` succeeds, before the next extension registers.
//! - Registry contents never change after bootstrap completes.
//! - A failed host exposes no extensions and no mounts.

use crate::controller::Controller;
use crate::error::{BootstrapError, BootstrapResult, LookupError};
use crate::extension::graph::DependencyGraph;
use crate::extension::registry::Registry;
use crate::extension::resolve::resolve_order;
use crate::extension::{Extension, ExtensionId};
use log::{debug, error, info, warn};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Bootstrap lifecycle of one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Pending,
    /// `register` hooks are running.
    Bootstrapping,
    Ready,
    Failed,
}

/// Kind of functionality mounted into the surrounding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
    Route,
    Middleware,
}

/// Opaque descriptor of mounted functionality.
///
/// The bootstrap subsystem only records these; serving them is up to the
/// application framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub owner: String,
    pub kind: MountKind,
    pub target: String,
}

/// Application object handed to extension and controller hooks.
pub struct Host {
    host_id: Uuid,
    state: HostState,
    registry: Registry,
    mounts: Vec<Mount>,
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl Host {
    pub fn new() -> Self {
        Self {
            host_id: Uuid::new_v4(),
            state: HostState::Pending,
            registry: Registry::new(),
            mounts: Vec::new(),
        }
    }

    /// Unique id of this host, included in log lines.
    pub fn host_id(&self) -> Uuid {
        self.host_id
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Consumes the host and returns its registry.
    pub fn into_registry(self) -> Registry {
        self.registry
    }

    /// Returns the registered extension of kind `T`.
    ///
    /// # Errors
    /// - `LookupError` when `T` is not registered (yet).
    pub fn get<T: Extension>(&self) -> Result<Arc<T>, LookupError> {
        self.registry.get::<T>()
    }

    /// Records functionality mounted by `owner`.
    pub fn mount(&mut self, owner: &str, kind: MountKind, target: impl Into<String>) {
        let mount = Mount {
            owner: owner.to_string(),
            kind,
            target: target.into(),
        };
        debug!(
            "event=host_mount module=host host_id={} owner={} kind={:?} target={}",
            self.host_id, mount.owner, mount.kind, mount.target
        );
        self.mounts.push(mount);
    }

    /// Mounted functionality in mount order.
    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// Returns a logger sink scoped to `module`.
    pub fn logger(&self, module: &str) -> ExtensionLogger {
        ExtensionLogger {
            host_id: self.host_id,
            module: module.to_string(),
        }
    }

    /// Orders and registers `extensions`, then marks the host ready.
    ///
    /// # Errors
    /// - `AlreadyBootstrapped` on a second call, or on a nested call made
    ///   while this host is still bootstrapping.
    /// - Graph/resolution errors before any `register` is invoked.
    /// - `Registration` wrapping the first failing `register` hook; no later
    ///   extension is registered.
    pub fn bootstrap(&mut self, extensions: Vec<Arc<dyn Extension>>) -> BootstrapResult<()> {
        if self.state != HostState::Pending {
            warn!(
                "event=extension_bootstrap module=host status=rejected host_id={} state={:?}",
                self.host_id, self.state
            );
            return Err(BootstrapError::AlreadyBootstrapped);
        }

        self.state = HostState::Bootstrapping;
        let started_at = Instant::now();
        info!(
            "event=extension_bootstrap module=host status=start host_id={} count={}",
            self.host_id,
            extensions.len()
        );

        match self.bootstrap_inner(&extensions) {
            Ok(()) => {
                self.state = HostState::Ready;
                info!(
                    "event=extension_bootstrap module=host status=ok host_id={} count={} duration_ms={}",
                    self.host_id,
                    self.registry.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                self.state = HostState::Failed;
                self.registry = Registry::new();
                self.mounts.clear();
                error!(
                    "event=extension_bootstrap module=host status=error host_id={} duration_ms={} error={}",
                    self.host_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn bootstrap_inner(&mut self, extensions: &[Arc<dyn Extension>]) -> BootstrapResult<()> {
        let ordered: Vec<(ExtensionId, Arc<dyn Extension>)> = {
            let graph = DependencyGraph::build(extensions)?;
            resolve_order(&graph)?
                .into_iter()
                .map(|position| {
                    let node = graph.node(position);
                    (node.id, Arc::clone(node.extension))
                })
                .collect()
        };
        info!(
            "event=extension_order module=host host_id={} order={}",
            self.host_id,
            ordered
                .iter()
                .map(|(_, extension)| extension.name())
                .collect::<Vec<_>>()
                .join(",")
        );

        for (position, (id, extension)) in ordered.into_iter().enumerate() {
            debug!(
                "event=extension_register module=host status=start host_id={} extension={} position={}",
                self.host_id,
                extension.name(),
                position
            );
            if let Err(source) = extension.register(self) {
                error!(
                    "event=extension_register module=host status=error host_id={} extension={} position={} error={}",
                    self.host_id,
                    extension.name(),
                    position,
                    source
                );
                return Err(BootstrapError::Registration {
                    extension: id,
                    name: extension.name().to_string(),
                    position,
                    source,
                });
            }
            debug!(
                "event=extension_register module=host status=ok host_id={} extension={} position={}",
                self.host_id,
                extension.name(),
                position
            );
            self.registry.insert(id, extension);
        }
        Ok(())
    }

    /// Registers application controllers in the given order, fail-fast.
    ///
    /// # Errors
    /// - `NotBootstrapped` unless extension bootstrap succeeded.
    /// - `ControllerRegistration` wrapping the first failing hook.
    pub fn register_controllers(&mut self, controllers: &[&dyn Controller]) -> BootstrapResult<()> {
        if self.state != HostState::Ready {
            return Err(BootstrapError::NotBootstrapped);
        }

        for (position, controller) in controllers.iter().enumerate() {
            if let Err(source) = controller.register(self) {
                error!(
                    "event=controller_register module=host status=error host_id={} controller={} position={} error={}",
                    self.host_id,
                    controller.name(),
                    position,
                    source
                );
                return Err(BootstrapError::ControllerRegistration {
                    name: controller.name().to_string(),
                    position,
                    source,
                });
            }
            debug!(
                "event=controller_register module=host status=ok host_id={} controller={} position={}",
                self.host_id,
                controller.name(),
                position
            );
        }
        Ok(())
    }
}

/// Bootstraps `extensions` on a fresh host and returns its registry.
pub fn bootstrap(extensions: Vec<Arc<dyn Extension>>) -> BootstrapResult<Registry> {
    let mut host = Host::new();
    host.bootstrap(extensions)?;
    Ok(host.into_registry())
}

/// Logger sink handed to extensions, tagging lines with host and module.
#[derive(Debug, Clone)]
pub struct ExtensionLogger {
    host_id: Uuid,
    module: String,
}

impl ExtensionLogger {
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn debug(&self, event: &str, message: impl Display) {
        debug!(
            "event={event} module={} host_id={} {message}",
            self.module, self.host_id
        );
    }

    pub fn info(&self, event: &str, message: impl Display) {
        info!(
            "event={event} module={} host_id={} {message}",
            self.module, self.host_id
        );
    }

    pub fn warn(&self, event: &str, message: impl Display) {
        warn!(
            "event={event} module={} host_id={} {message}",
            self.module, self.host_id
        );
    }

    pub fn error(&self, event: &str, message: impl Display) {
        error!(
            "event={event} module={} host_id={} {message}",
            self.module, self.host_id
        );
    }
}
