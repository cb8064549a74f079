/// Defines how `CLEAR` and `DROP` behave if they address a single named graph that does not exist.
///
/// Whether this is an error differs between RDF stores. The behavior is therefore a configuration
/// option instead of being hard-coded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MissingGraphPolicy {
    /// Raise [StorageError::GraphNotFound](crate::StorageError::GraphNotFound).
    #[default]
    Error,
    /// Treat the operation as a no-op.
    Ignore,
}

/// Defines whether the store keeps named graphs that do not contain any triple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EmptyGraphPolicy {
    /// Empty named graphs are kept. `CREATE GRAPH` registers an empty graph and `CLEAR` keeps the
    /// registration.
    #[default]
    Retain,
    /// The store cannot represent empty named graphs. A named graph exists iff it contains at least
    /// one triple. `CREATE GRAPH` on a non-existing graph is a no-op and a graph ceases to exist
    /// once its last triple is removed.
    Discard,
}

/// The configuration of a [GraphStore](crate::GraphStore).
///
/// ```
/// use rdf_update_storage::{EmptyGraphPolicy, GraphStoreConfig, MissingGraphPolicy};
///
/// let config = GraphStoreConfig::new()
///     .with_missing_graph_policy(MissingGraphPolicy::Ignore)
///     .with_empty_graph_policy(EmptyGraphPolicy::Discard);
/// assert_eq!(config.missing_graph_policy(), MissingGraphPolicy::Ignore);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GraphStoreConfig {
    missing_graph_policy: MissingGraphPolicy,
    empty_graph_policy: EmptyGraphPolicy,
}

impl GraphStoreConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the [MissingGraphPolicy].
    #[must_use]
    pub fn with_missing_graph_policy(mut self, policy: MissingGraphPolicy) -> Self {
        self.missing_graph_policy = policy;
        self
    }

    /// Sets the [EmptyGraphPolicy].
    #[must_use]
    pub fn with_empty_graph_policy(mut self, policy: EmptyGraphPolicy) -> Self {
        self.empty_graph_policy = policy;
        self
    }

    pub fn missing_graph_policy(&self) -> MissingGraphPolicy {
        self.missing_graph_policy
    }

    pub fn empty_graph_policy(&self) -> EmptyGraphPolicy {
        self.empty_graph_policy
    }
}
