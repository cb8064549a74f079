//! The data model of the RDF update engine.
//!
//! Terms, triples, and quads are the ones from [oxrdf], while the pattern types (triple and quad
//! patterns with variables) come from [spargebra]. This crate re-exports both such that the other
//! crates of the workspace depend on a single model.

mod blank_node_mode;
mod pattern;

pub use blank_node_mode::BlankNodeMatchingMode;
pub use pattern::GraphPattern;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::vocab;
pub use oxrdf::{
    BlankNode, BlankNodeRef, Graph, GraphName, GraphNameRef, IriParseError, Literal, LiteralRef,
    NamedNode, NamedNodeRef, Quad, QuadRef, Subject, SubjectRef, Term, TermRef, Triple, TripleRef,
    Variable, VariableNameParseError, VariableRef,
};

// Re-export the spargebra pattern types.
pub use spargebra::algebra::GraphTarget;
pub use spargebra::term::{
    GraphNamePattern, NamedNodePattern, QuadPattern, TermPattern, TriplePattern,
};
