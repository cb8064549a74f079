//! [SPARQL 1.1 Update](https://www.w3.org/TR/sparql11-update/) implementation.

mod algebra;
mod binding;
pub mod error;
mod matcher;
pub mod source;
mod statements;
mod update;

pub use crate::sparql::algebra::{Update, UpdateDataset, UpdateOperation};
pub use crate::sparql::binding::{Binding, BindingIter};
pub use crate::sparql::matcher::{DatasetView, PatternMatcher};
pub use crate::sparql::update::UpdateExecutor;
pub use error::{UpdateError, UpdateErrorKind, UpdateEvaluationError, UpdateSyntaxError};
pub use rdf_update_model::{BlankNodeMatchingMode, Variable, VariableNameParseError};
#[cfg(feature = "http-client")]
pub use source::HttpRdfSource;
pub use source::{DefaultRdfSource, FileRdfSource, RdfSource, RdfSourceError, StaticRdfSource};
pub use spargebra::SparqlSyntaxError;

/// Options for SPARQL update evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// How blank nodes in `WHERE` patterns are matched.
    pub blank_node_mode: BlankNodeMatchingMode,
}

impl UpdateOptions {
    #[must_use]
    pub fn with_blank_node_mode(mut self, blank_node_mode: BlankNodeMatchingMode) -> Self {
        self.blank_node_mode = blank_node_mode;
        self
    }
}
