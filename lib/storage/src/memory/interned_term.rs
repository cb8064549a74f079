use std::sync::Arc;

/// An RDF term whose strings are interned.
///
/// Building an [InternedTerm] for a lookup only clones reference-counted pointers, such that
/// looking up a term never allocates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InternedTerm {
    NamedNode(Arc<str>),
    BlankNode(Arc<str>),
    TypedLiteral(Arc<str>, Arc<str>),
    LangString(Arc<str>, Arc<str>),
}
