//! Bootstrap and lookup error types.
//!
//! # Invariants
//! - Every variant carries enough context (identifier, position) to
//!   diagnose the misconfiguration without re-running bootstrap.
//! - Wrapped extension errors stay reachable through `Error::source`.

use crate::extension::{ExtensionError, ExtensionId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Fatal bootstrap errors.
#[derive(Debug)]
pub enum BootstrapError {
    /// Extension display name violates the naming contract.
    InvalidExtension {
        id: ExtensionId,
        name: String,
    },
    /// Two supplied extensions share one kind.
    DuplicateExtension {
        id: ExtensionId,
        first_position: usize,
        second_position: usize,
    },
    /// A declared requirement is not among the supplied extensions.
    MissingDependency {
        extension: ExtensionId,
        requirement: ExtensionId,
    },
    /// Requirements among supplied extensions form a cycle.
    CyclicDependency {
        unresolved: Vec<ExtensionId>,
        cycle: Vec<ExtensionId>,
    },
    /// An extension `register` hook failed.
    Registration {
        extension: ExtensionId,
        name: String,
        position: usize,
        source: ExtensionError,
    },
    AlreadyBootstrapped,
    NotBootstrapped,
    /// A controller `register` hook failed.
    ControllerRegistration {
        name: String,
        position: usize,
        source: ExtensionError,
    },
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidExtension { id, name } => write!(
                f,
                "extension {id} has invalid name `{name}` (expected lowercase segments joined by `.`, `_` or `-`)"
            ),
            Self::DuplicateExtension {
                id,
                first_position,
                second_position,
            } => write!(
                f,
                "extension {id} supplied more than once (positions {first_position} and {second_position})"
            ),
            Self::MissingDependency {
                extension,
                requirement,
            } => write!(
                f,
                "extension {extension} requires {requirement}, which was not supplied"
            ),
            Self::CyclicDependency { cycle, .. } => {
                write!(f, "cyclic extension dependency detected: ")?;
                write_chain(f, cycle)
            }
            Self::Registration {
                extension,
                name,
                position,
                source,
            } => write!(
                f,
                "extension {extension} (`{name}`) failed to register at position {position}: {source}"
            ),
            Self::AlreadyBootstrapped => write!(f, "extensions were already bootstrapped on this host"),
            Self::NotBootstrapped => {
                write!(f, "extensions must be bootstrapped before controllers register")
            }
            Self::ControllerRegistration {
                name,
                position,
                source,
            } => write!(
                f,
                "controller `{name}` failed to register at position {position}: {source}"
            ),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registration { source, .. } | Self::ControllerRegistration { source, .. } => {
                Some(&**source)
            }
            _ => None,
        }
    }
}

fn write_chain(f: &mut Formatter<'_>, ids: &[ExtensionId]) -> std::fmt::Result {
    for (index, id) in ids.iter().enumerate() {
        if index > 0 {
            write!(f, " -> ")?;
        }
        write!(f, "{id}")?;
    }
    Ok(())
}

/// Requested extension kind was never registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupError {
    pub requested: ExtensionId,
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "extension {} is not registered; declare it as a requirement",
            self.requested
        )
    }
}

impl Error for LookupError {}
