use rdf_update_model::{BlankNode, NamedNode};
use std::error::Error;

/// An error raised by the [GraphStore](crate::GraphStore).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The named graph does not exist.
    #[error("The graph {0} does not exist")]
    GraphNotFound(NamedNode),
    /// The named graph already exists.
    #[error("The graph {0} already exists")]
    GraphAlreadyExists(NamedNode),
    /// Graphs are identified by IRIs, a blank node cannot be used as a graph name.
    #[error("The blank node {0} cannot be used as a graph name")]
    BlankNodeGraphName(BlankNode),
    /// Error related to data corruption.
    #[error(transparent)]
    Corruption(#[from] CorruptionError),
}

/// An error returned if some content of the store is corrupted (e.g., the indexes disagree).
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct CorruptionError(#[from] CorruptionErrorKind);

#[derive(Debug, thiserror::Error)]
enum CorruptionErrorKind {
    #[error("{0}")]
    Msg(String),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl CorruptionError {
    /// Builds an error from another error.
    #[inline]
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self(CorruptionErrorKind::Other(error.into()))
    }

    /// Builds an error from a printable error message.
    #[inline]
    pub fn msg(msg: impl Into<String>) -> Self {
        Self(CorruptionErrorKind::Msg(msg.into()))
    }
}
