//! Extension kind identifiers.
//!
//! # Responsibility
//! - Derive one stable identifier per concrete extension type.
//! - Allow deriving the identifier from a bare type, without an instance.
//!
//! # Invariants
//! - Two instances of the same concrete type always share one identifier.
//! - Distinct concrete types never collide (`TypeId` equality only).

use crate::extension::Extension;
use once_cell::sync::Lazy;
use regex::Regex;
use std::any::{Any, TypeId};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

static EXTENSION_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+([._-][a-z0-9]+)*$").expect("valid extension name regex")
});

/// Identifier naming one extension kind.
///
/// Used both as dependency graph node and as registry key. Unordered:
/// `TypeId` order is not stable across builds.
#[derive(Clone, Copy)]
pub struct ExtensionId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ExtensionId {
    /// Identifier of extension kind `T`.
    pub fn of<T: Extension>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Identifier of a live extension instance.
    ///
    /// Always equal to `ExtensionId::of::<Concrete>()` for the instance's
    /// concrete type.
    pub fn of_extension(extension: &dyn Extension) -> Self {
        Self {
            type_id: extension.as_any().type_id(),
            type_name: extension.type_name(),
        }
    }

    /// Fully qualified Rust type name of the extension kind.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path, e.g. `SessionExtension`.
    pub fn short_name(&self) -> &'static str {
        let base = self.type_name.split('<').next().unwrap_or(self.type_name);
        match base.rfind("::") {
            Some(index) => &self.type_name[index + 2..],
            None => self.type_name,
        }
    }
}

impl PartialEq for ExtensionId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ExtensionId {}

impl Hash for ExtensionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl Debug for ExtensionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExtensionId({})", self.type_name)
    }
}

impl Display for ExtensionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Upcasting helpers implemented for every extension type.
///
/// Kept separate so that the blanket impl fills them in; extension authors
/// never implement this trait by hand.
pub trait ExtensionAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any_arc(self: std::sync::Arc<Self>) -> std::sync::Arc<dyn Any + Send + Sync>;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> ExtensionAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: std::sync::Arc<Self>) -> std::sync::Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Returns whether `value` is a valid extension display name.
///
/// Names are lowercase ascii segments joined by `.`, `_` or `-`,
/// e.g. `builtin.session`.
pub fn is_valid_extension_name(value: &str) -> bool {
    EXTENSION_NAME_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::{is_valid_extension_name, ExtensionId};
    use crate::extension::{Extension, ExtensionError};
    use crate::host::Host;
    use std::collections::HashSet;
    use std::sync::Arc;

    struct CacheExtension;
    struct SessionExtension;

    impl Extension for CacheExtension {
        fn name(&self) -> &str {
            "test.cache"
        }

        fn register(&self, _host: &mut Host) -> Result<(), ExtensionError> {
            Ok(())
        }
    }

    impl Extension for SessionExtension {
        fn name(&self) -> &str {
            "test.session"
        }

        fn register(&self, _host: &mut Host) -> Result<(), ExtensionError> {
            Ok(())
        }
    }

    #[test]
    fn instance_and_type_identifiers_agree() {
        let first: Arc<dyn Extension> = Arc::new(CacheExtension);
        let second: Arc<dyn Extension> = Arc::new(CacheExtension);

        assert_eq!(
            ExtensionId::of_extension(first.as_ref()),
            ExtensionId::of::<CacheExtension>()
        );
        assert_eq!(
            ExtensionId::of_extension(first.as_ref()),
            ExtensionId::of_extension(second.as_ref())
        );
    }

    #[test]
    fn distinct_kinds_never_collide() {
        let ids: HashSet<ExtensionId> = [
            ExtensionId::of::<CacheExtension>(),
            ExtensionId::of::<SessionExtension>(),
            ExtensionId::of::<CacheExtension>(),
        ]
        .into_iter()
        .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(
            ExtensionId::of::<CacheExtension>(),
            ExtensionId::of::<SessionExtension>()
        );
    }

    #[test]
    fn display_uses_short_type_name() {
        let id = ExtensionId::of::<SessionExtension>();
        assert_eq!(id.to_string(), "SessionExtension");
        assert!(id.type_name().ends_with("::SessionExtension"));
    }

    #[test]
    fn validates_extension_names() {
        assert!(is_valid_extension_name("builtin.session"));
        assert!(is_valid_extension_name("cache-v2"));
        assert!(is_valid_extension_name("flash_messages"));

        assert!(!is_valid_extension_name(""));
        assert!(!is_valid_extension_name("Session"));
        assert!(!is_valid_extension_name("builtin..session"));
        assert!(!is_valid_extension_name(".session"));
        assert!(!is_valid_extension_name("session."));
        assert!(!is_valid_extension_name("my session"));
    }
}
