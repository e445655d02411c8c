//! Application controller contract.
//!
//! Controllers are registered after extension bootstrap and typically mount
//! routes while pulling their collaborators from the registry.

use crate::extension::ExtensionError;
use crate::host::Host;

pub trait Controller {
    /// Name used in logs and errors, e.g. `main`.
    fn name(&self) -> &str;

    fn register(&self, host: &mut Host) -> Result<(), ExtensionError>;
}
