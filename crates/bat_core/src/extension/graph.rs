//! Requirement graph construction.
//!
//! # Responsibility
//! - Validate supplied extensions (names, duplicate kinds).
//! - Build `requirement -> dependents` adjacency and per-node in-degree.
//!
//! # Invariants
//! - Node order equals input order; dependents lists are appended in input
//!   order.
//! - `in_degree` counts distinct requirements, present in the input or not.
//! - Building is pure: no extension hook is invoked.

use crate::error::{BootstrapError, BootstrapResult};
use crate::extension::{is_valid_extension_name, Extension, ExtensionId};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// One supplied extension with its derived identity.
pub struct GraphNode<'a> {
    pub id: ExtensionId,
    pub requirements: Vec<ExtensionId>,
    pub extension: &'a Arc<dyn Extension>,
}

/// Requirement graph over one bootstrap input.
pub struct DependencyGraph<'a> {
    nodes: Vec<GraphNode<'a>>,
    positions: HashMap<ExtensionId, usize>,
    dependents: HashMap<ExtensionId, Vec<usize>>,
    in_degree: Vec<usize>,
}

impl<'a> DependencyGraph<'a> {
    /// Builds the graph for `extensions`, preserving input order.
    ///
    /// # Errors
    /// - `InvalidExtension` when a display name is malformed.
    /// - `DuplicateExtension` when two inputs share one kind.
    pub fn build(extensions: &'a [Arc<dyn Extension>]) -> BootstrapResult<Self> {
        let mut nodes = Vec::with_capacity(extensions.len());
        let mut positions = HashMap::with_capacity(extensions.len());
        let mut dependents: HashMap<ExtensionId, Vec<usize>> = HashMap::new();
        let mut in_degree = Vec::with_capacity(extensions.len());

        for (position, extension) in extensions.iter().enumerate() {
            let id = ExtensionId::of_extension(extension.as_ref());
            let name = extension.name();
            if !is_valid_extension_name(name) {
                return Err(BootstrapError::InvalidExtension {
                    id,
                    name: name.to_string(),
                });
            }
            if let Some(first_position) = positions.insert(id, position) {
                return Err(BootstrapError::DuplicateExtension {
                    id,
                    first_position,
                    second_position: position,
                });
            }

            let mut requirements: Vec<ExtensionId> = Vec::new();
            for requirement in extension.requirements() {
                if !requirements.contains(&requirement) {
                    requirements.push(requirement);
                }
            }
            for requirement in &requirements {
                dependents.entry(*requirement).or_default().push(position);
            }
            debug!(
                "event=extension_graph module=extension status=ok extension={} position={} requirements={}",
                id,
                position,
                requirements.len()
            );

            in_degree.push(requirements.len());
            nodes.push(GraphNode {
                id,
                requirements,
                extension,
            });
        }

        Ok(Self {
            nodes,
            positions,
            dependents,
            in_degree,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, position: usize) -> &GraphNode<'a> {
        &self.nodes[position]
    }

    /// Input position of the extension with `id`, if it was supplied.
    pub fn position_of(&self, id: ExtensionId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Input positions of extensions requiring `id`, in input order.
    pub fn dependents_of(&self, id: ExtensionId) -> &[usize] {
        self.dependents.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Initial in-degree per node, indexed by input position.
    pub fn in_degrees(&self) -> &[usize] {
        &self.in_degree
    }
}

#[cfg(test)]
mod tests {
    use super::DependencyGraph;
    use crate::error::BootstrapError;
    use crate::extension::{Extension, ExtensionError, ExtensionId};
    use crate::host::Host;
    use std::sync::Arc;

    struct Valkey;
    struct Session;
    struct Flash;
    struct BadName;

    impl Extension for Valkey {
        fn name(&self) -> &str {
            "valkey"
        }

        fn register(&self, _host: &mut Host) -> Result<(), ExtensionError> {
            Ok(())
        }
    }

    impl Extension for Session {
        fn name(&self) -> &str {
            "session"
        }

        fn requirements(&self) -> Vec<ExtensionId> {
            vec![ExtensionId::of::<Valkey>(), ExtensionId::of::<Valkey>()]
        }

        fn register(&self, _host: &mut Host) -> Result<(), ExtensionError> {
            Ok(())
        }
    }

    impl Extension for Flash {
        fn name(&self) -> &str {
            "flash"
        }

        fn requirements(&self) -> Vec<ExtensionId> {
            vec![ExtensionId::of::<Session>(), ExtensionId::of::<Valkey>()]
        }

        fn register(&self, _host: &mut Host) -> Result<(), ExtensionError> {
            Ok(())
        }
    }

    impl Extension for BadName {
        fn name(&self) -> &str {
            "Bad Name"
        }

        fn register(&self, _host: &mut Host) -> Result<(), ExtensionError> {
            Ok(())
        }
    }

    #[test]
    fn builds_dependents_in_input_order() {
        let extensions: Vec<Arc<dyn Extension>> =
            vec![Arc::new(Flash), Arc::new(Session), Arc::new(Valkey)];
        let graph = DependencyGraph::build(&extensions).expect("graph should build");

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.dependents_of(ExtensionId::of::<Valkey>()), &[0, 1]);
        assert_eq!(graph.dependents_of(ExtensionId::of::<Session>()), &[0]);
        assert!(graph.dependents_of(ExtensionId::of::<Flash>()).is_empty());
        assert_eq!(graph.position_of(ExtensionId::of::<Valkey>()), Some(2));
    }

    #[test]
    fn collapses_duplicate_requirements() {
        let extensions: Vec<Arc<dyn Extension>> = vec![Arc::new(Valkey), Arc::new(Session)];
        let graph = DependencyGraph::build(&extensions).expect("graph should build");

        assert_eq!(graph.in_degrees(), &[0, 1]);
        assert_eq!(graph.node(1).requirements, vec![ExtensionId::of::<Valkey>()]);
    }

    #[test]
    fn counts_requirements_missing_from_input() {
        let extensions: Vec<Arc<dyn Extension>> = vec![Arc::new(Flash)];
        let graph = DependencyGraph::build(&extensions).expect("graph should build");

        assert_eq!(graph.in_degrees(), &[2]);
        assert_eq!(graph.position_of(ExtensionId::of::<Session>()), None);
    }

    #[test]
    fn rejects_duplicate_kinds() {
        let extensions: Vec<Arc<dyn Extension>> =
            vec![Arc::new(Valkey), Arc::new(Session), Arc::new(Valkey)];
        let err = DependencyGraph::build(&extensions)
            .err()
            .expect("duplicate kind must fail");

        match err {
            BootstrapError::DuplicateExtension {
                id,
                first_position,
                second_position,
            } => {
                assert_eq!(id, ExtensionId::of::<Valkey>());
                assert_eq!(first_position, 0);
                assert_eq!(second_position, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_invalid_names() {
        let extensions: Vec<Arc<dyn Extension>> = vec![Arc::new(Valkey), Arc::new(BadName)];
        let err = DependencyGraph::build(&extensions)
            .err()
            .expect("invalid name must fail");
        assert!(matches!(err, BootstrapError::InvalidExtension { ref name, .. } if name == "Bad Name"));
    }

    #[test]
    fn empty_input_builds_empty_graph() {
        let extensions: Vec<Arc<dyn Extension>> = Vec::new();
        let graph = DependencyGraph::build(&extensions).expect("empty graph should build");
        assert!(graph.is_empty());
    }
}
