//! Registered extension store and typed lookup.
//!
//! # Invariants
//! - At most one instance per extension kind.
//! - Iteration order equals registration order.
//! - Lookups return the exact `Arc` that was inserted, never a default.

use crate::error::LookupError;
use crate::extension::id::ExtensionAny;
use crate::extension::{Extension, ExtensionId};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Extensions registered by one bootstrap, keyed by kind.
#[derive(Default)]
pub struct Registry {
    entries: Vec<(ExtensionId, Arc<dyn Extension>)>,
    index: HashMap<ExtensionId, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly registered extension.
    ///
    /// Callers guarantee the kind is not present yet; the graph builder
    /// rejects duplicate kinds before any insertion happens.
    pub(crate) fn insert(&mut self, id: ExtensionId, extension: Arc<dyn Extension>) {
        debug_assert!(!self.index.contains_key(&id), "extension {id} inserted twice");
        self.index.insert(id, self.entries.len());
        self.entries.push((id, extension));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains<T: Extension>(&self) -> bool {
        self.index.contains_key(&ExtensionId::of::<T>())
    }

    /// Returns the registered instance of extension kind `T`.
    ///
    /// # Errors
    /// - `LookupError` when `T` was never registered.
    pub fn get<T: Extension>(&self) -> Result<Arc<T>, LookupError> {
        let requested = ExtensionId::of::<T>();
        let extension = Arc::clone(self.get_by_id(requested)?);
        extension
            .into_any_arc()
            .downcast::<T>()
            .map_err(|_| LookupError { requested })
    }

    /// Returns the registered instance for `id` as a trait object.
    pub fn get_by_id(&self, id: ExtensionId) -> Result<&Arc<dyn Extension>, LookupError> {
        self.index
            .get(&id)
            .map(|index| &self.entries[*index].1)
            .ok_or(LookupError { requested: id })
    }

    /// Registered kinds in registration order.
    pub fn ids(&self) -> Vec<ExtensionId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Registered extensions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ExtensionId, &Arc<dyn Extension>)> {
        self.entries.iter().map(|(id, extension)| (*id, extension))
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, extension)| (id, extension.name())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::extension::{Extension, ExtensionError, ExtensionId};
    use crate::host::Host;
    use std::sync::Arc;

    struct Cache {
        url: String,
    }

    struct Templates;

    impl Extension for Cache {
        fn name(&self) -> &str {
            "cache"
        }

        fn register(&self, _host: &mut Host) -> Result<(), ExtensionError> {
            Ok(())
        }
    }

    impl Extension for Templates {
        fn name(&self) -> &str {
            "templates"
        }

        fn register(&self, _host: &mut Host) -> Result<(), ExtensionError> {
            Ok(())
        }
    }

    #[test]
    fn typed_lookup_returns_inserted_instance() {
        let cache = Arc::new(Cache {
            url: "valkey://localhost:6379".to_string(),
        });
        let mut registry = Registry::new();
        registry.insert(ExtensionId::of::<Cache>(), cache.clone());

        let loaded = registry.get::<Cache>().expect("cache should be registered");
        assert!(Arc::ptr_eq(&loaded, &cache));
        assert_eq!(loaded.url, "valkey://localhost:6379");
        assert!(registry.contains::<Cache>());
    }

    #[test]
    fn lookup_of_unregistered_kind_fails() {
        let mut registry = Registry::new();
        registry.insert(
            ExtensionId::of::<Cache>(),
            Arc::new(Cache {
                url: String::new(),
            }),
        );

        let err = registry
            .get::<Templates>()
            .err()
            .expect("templates were never registered");
        assert_eq!(err.requested, ExtensionId::of::<Templates>());
        assert!(!registry.contains::<Templates>());
        assert!(registry.get_by_id(ExtensionId::of::<Templates>()).is_err());
    }

    #[test]
    fn iterates_in_registration_order() {
        let mut registry = Registry::new();
        registry.insert(ExtensionId::of::<Templates>(), Arc::new(Templates));
        registry.insert(
            ExtensionId::of::<Cache>(),
            Arc::new(Cache {
                url: String::new(),
            }),
        );

        assert_eq!(
            registry.ids(),
            vec![ExtensionId::of::<Templates>(), ExtensionId::of::<Cache>()]
        );
        let names: Vec<&str> = registry.iter().map(|(_, ext)| ext.name()).collect();
        assert_eq!(names, vec!["templates", "cache"]);
        assert_eq!(registry.len(), 2);
    }
}
