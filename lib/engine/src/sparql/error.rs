use crate::sparql::UpdateOperation;
use crate::sparql::source::RdfSourceError;
use oxrdfio::RdfParseError;
use rdf_update_model::{NamedNode, Variable};
use rdf_update_storage::StorageError;
use spargebra::SparqlSyntaxError;
use std::convert::Infallible;
use std::error::Error;
use std::fmt;

/// An error raised while evaluating a single update operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum UpdateEvaluationError {
    /// Error when `DROP`, `CLEAR`, `ADD`, `COPY`, or `MOVE` address a named graph that does not
    /// exist.
    #[error("The graph {0} does not exist")]
    GraphNotFound(NamedNode),
    /// Error when `CREATE` tries to create an already existing graph.
    #[error("The graph {0} already exists")]
    GraphAlreadyExists(NamedNode),
    /// The source of a `LOAD` could not be retrieved.
    #[error("The source {iri} could not be retrieved: {error}")]
    SourceUnavailable {
        iri: NamedNode,
        #[source]
        error: Box<dyn Error + Send + Sync + 'static>,
    },
    /// The source of a `LOAD` is not a valid RDF document.
    #[error("The source {iri} could not be parsed: {error}")]
    Parsing {
        iri: NamedNode,
        #[source]
        error: RdfParseError,
    },
    /// `INSERT DATA` or `DELETE DATA` contain a variable.
    #[error("The variable {0} is not allowed in ground data")]
    VariableInGroundData(Variable),
    /// The parameters of the operation are structurally invalid.
    #[error("Malformed operation: {0}")]
    MalformedOperation(String),
    /// An error from the storage that indicates a corrupted store.
    #[error(transparent)]
    Storage(StorageError),
}

/// The kind of an [UpdateEvaluationError], without any payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum UpdateErrorKind {
    GraphNotFound,
    GraphAlreadyExists,
    SourceUnavailable,
    ParseError,
    VariableInGroundData,
    MalformedOperation,
    /// The store is corrupted. This kind indicates a bug and is never produced by valid input.
    Internal,
}

impl UpdateEvaluationError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedOperation(message.into())
    }

    /// Returns the [UpdateErrorKind] of this error.
    pub fn kind(&self) -> UpdateErrorKind {
        match self {
            Self::GraphNotFound(_) => UpdateErrorKind::GraphNotFound,
            Self::GraphAlreadyExists(_) => UpdateErrorKind::GraphAlreadyExists,
            Self::SourceUnavailable { .. } => UpdateErrorKind::SourceUnavailable,
            Self::Parsing { .. } => UpdateErrorKind::ParseError,
            Self::VariableInGroundData(_) => UpdateErrorKind::VariableInGroundData,
            Self::MalformedOperation(_) => UpdateErrorKind::MalformedOperation,
            Self::Storage(_) => UpdateErrorKind::Internal,
        }
    }

    /// Returns true if a `SILENT` modifier on `operation` turns this error into a no-op.
    ///
    /// `SILENT` only suppresses errors that relate to a missing or already existing target. It
    /// never suppresses errors in the operation itself.
    pub fn is_silenceable(&self, operation: &UpdateOperation) -> bool {
        match (self.kind(), operation) {
            (
                UpdateErrorKind::GraphNotFound,
                UpdateOperation::Clear { .. }
                | UpdateOperation::Drop { .. }
                | UpdateOperation::Add { .. }
                | UpdateOperation::Copy { .. }
                | UpdateOperation::Move { .. },
            )
            | (UpdateErrorKind::GraphAlreadyExists, UpdateOperation::Create { .. })
            | (
                UpdateErrorKind::SourceUnavailable | UpdateErrorKind::ParseError,
                UpdateOperation::Load { .. },
            ) => true,
            _ => false,
        }
    }

    pub(crate) fn from_source_error(iri: NamedNode, error: RdfSourceError) -> Self {
        match error {
            RdfSourceError::Unavailable(error) => Self::SourceUnavailable { iri, error },
            RdfSourceError::Parsing(error) => Self::Parsing { iri, error },
        }
    }
}

impl From<StorageError> for UpdateEvaluationError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::GraphNotFound(graph) => Self::GraphNotFound(graph),
            StorageError::GraphAlreadyExists(graph) => Self::GraphAlreadyExists(graph),
            StorageError::BlankNodeGraphName(bnode) => {
                Self::malformed(format!("The blank node {bnode} cannot be used as a graph name"))
            }
            error => Self::Storage(error),
        }
    }
}

impl From<Infallible> for UpdateEvaluationError {
    #[inline]
    fn from(error: Infallible) -> Self {
        match error {}
    }
}

/// An error raised while turning SPARQL Update text into an [Update](crate::sparql::Update).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum UpdateSyntaxError {
    /// The text is not valid SPARQL 1.1 Update.
    #[error(transparent)]
    Syntax(#[from] SparqlSyntaxError),
    /// The `WHERE` clause uses a graph pattern other than basic graph patterns, joins, and `GRAPH`.
    #[error("The graph pattern {0} is not supported in update operations")]
    UnsupportedPattern(String),
    /// The update uses a term that cannot be stored (e.g., an RDF-star triple term).
    #[error("The term {0} is not supported in update operations")]
    UnsupportedTerm(String),
}

/// An error returned by executing an [Update](crate::sparql::Update).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum UpdateError {
    /// The update text could not be parsed.
    #[error(transparent)]
    Syntax(#[from] UpdateSyntaxError),
    /// The operation at `index` failed. All previous operations remain applied.
    #[error("Operation {index} failed: {error}")]
    Operation {
        index: usize,
        #[source]
        error: UpdateEvaluationError,
    },
}

impl From<Infallible> for UpdateError {
    #[inline]
    fn from(error: Infallible) -> Self {
        match error {}
    }
}

impl UpdateError {
    /// Returns the [UpdateErrorKind] of a failed operation.
    pub fn kind(&self) -> Option<UpdateErrorKind> {
        match self {
            Self::Syntax(_) => None,
            Self::Operation { error, .. } => Some(error.kind()),
        }
    }

    /// Returns the index of the failed operation.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Syntax(_) => None,
            Self::Operation { index, .. } => Some(*index),
        }
    }
}

impl fmt::Display for UpdateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GraphNotFound => "GraphNotFound",
            Self::GraphAlreadyExists => "GraphAlreadyExists",
            Self::SourceUnavailable => "SourceUnavailable",
            Self::ParseError => "ParseError",
            Self::VariableInGroundData => "VariableInGroundData",
            Self::MalformedOperation => "MalformedOperation",
            Self::Internal => "Internal",
        };
        f.write_str(name)
    }
}
