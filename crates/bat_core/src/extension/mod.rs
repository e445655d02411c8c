//! Extension bootstrap subsystem.
//!
//! Extensions declare which other extension kinds they require, are
//! registered into a [`Host`] exactly once in an order that respects those
//! requirements, and can then be looked up by type from the [`Registry`].
//!
//! # Invariants
//! - Extension instances are shared as `Arc<dyn Extension>`; identity is
//!   stable for the whole process.
//! - Resolution order is deterministic for a given input order.
//! - The first failure aborts bootstrap; nothing is skipped or retried.
//!
//! [`Host`]: crate::host::Host
//! [`Registry`]: crate::extension::registry::Registry

pub mod graph;
pub mod id;
pub mod registry;
pub mod resolve;

use crate::host::Host;
use id::ExtensionAny;

pub use id::{is_valid_extension_name, ExtensionId};

/// Error type returned by extension and controller `register` hooks.
pub type ExtensionError = Box<dyn std::error::Error + Send + Sync>;

/// Plugin contract implemented by every extension kind.
pub trait Extension: ExtensionAny {
    /// Display name used in logs and diagnostics, e.g. `builtin.session`.
    fn name(&self) -> &str;

    /// Extension kinds that must be registered before this one.
    fn requirements(&self) -> Vec<ExtensionId> {
        Vec::new()
    }

    /// Registers this extension into `host`.
    ///
    /// Every declared requirement is already queryable through
    /// [`Host::get`] when this is called.
    fn register(&self, host: &mut Host) -> Result<(), ExtensionError>;
}
