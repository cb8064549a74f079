use crate::CorruptionError;
use crate::index::EncodedQuad;
use crate::memory::interned_term::InternedTerm;
use crate::memory::object_id::{DEFAULT_GRAPH_ID, ObjectId};
use rdf_update_model::{
    GraphName, GraphNameRef, NamedNode, Quad, QuadRef, Subject, Term, TermRef,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Maintains a mapping between RDF terms and object ids in memory.
///
/// The mapping happens on two levels: first, all strings are interned, second, the interned term
/// that refers to the interned strings is mapped to an object id.
///
/// Object ids are allocated with a counter that starts at 1, as 0 is the [DEFAULT_GRAPH_ID]. Ids
/// are never released. A term that has been removed from the store keeps its id and is re-used
/// once the term is inserted again.
#[derive(Debug)]
pub struct ObjectIdMapping {
    /// Contains the next free object id.
    next_id: ObjectId,
    /// Maps object ids to terms. The term with id `n` is stored at position `n - 1`.
    id2term: Vec<Term>,
    /// A set for interning strings.
    strings: FxHashSet<Arc<str>>,
    /// Maps interned terms to their object id.
    term2id: FxHashMap<InternedTerm, ObjectId>,
}

impl Default for ObjectIdMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectIdMapping {
    /// Creates a new empty [ObjectIdMapping].
    pub fn new() -> Self {
        Self {
            next_id: ObjectId::from(1), // Start at 1 to account for the default graph.
            id2term: Vec::new(),
            strings: FxHashSet::default(),
            term2id: FxHashMap::default(),
        }
    }

    /// Looks up the id of `term` without interning it.
    pub fn try_get_term_id<'term>(&self, term: impl Into<TermRef<'term>>) -> Option<ObjectId> {
        self.try_get_interned_term(term.into())
            .and_then(|term| self.term2id.get(&term).copied())
    }

    /// Looks up the id of `graph_name` without interning it.
    ///
    /// Blank nodes are not valid graph names and yield [None].
    pub fn try_get_graph_id(&self, graph_name: GraphNameRef<'_>) -> Option<ObjectId> {
        match graph_name {
            GraphNameRef::NamedNode(nn) => self.try_get_term_id(nn),
            GraphNameRef::BlankNode(_) => None,
            GraphNameRef::DefaultGraph => Some(DEFAULT_GRAPH_ID),
        }
    }

    /// Returns the id of `term`, allocating a new one if the term is not yet interned.
    pub fn encode_term<'term>(
        &mut self,
        term: impl Into<TermRef<'term>>,
    ) -> Result<ObjectId, CorruptionError> {
        let term = term.into();
        if let Some(id) = self.try_get_term_id(term) {
            return Ok(id);
        }

        let interned = self.intern_term(term)?;
        let id = self.next_id;
        self.next_id = id
            .next()
            .ok_or_else(|| CorruptionError::msg("The object id space is exhausted"))?;
        self.id2term.push(term.into_owned());
        self.term2id.insert(interned, id);
        Ok(id)
    }

    /// Builds the [InternedTerm] of `term` if all of its strings are already interned.
    #[allow(
        unreachable_patterns,
        reason = "Triple terms only exist if RDF-star is enabled"
    )]
    fn try_get_interned_term(&self, term: TermRef<'_>) -> Option<InternedTerm> {
        let string = |value: &str| self.strings.get(value).map(Arc::clone);
        Some(match term {
            TermRef::NamedNode(nn) => InternedTerm::NamedNode(string(nn.as_str())?),
            TermRef::BlankNode(bnode) => InternedTerm::BlankNode(string(bnode.as_str())?),
            TermRef::Literal(literal) => match literal.language() {
                Some(language) => {
                    InternedTerm::LangString(string(literal.value())?, string(language)?)
                }
                None => InternedTerm::TypedLiteral(
                    string(literal.value())?,
                    string(literal.datatype().as_str())?,
                ),
            },
            _ => return None,
        })
    }

    #[allow(
        unreachable_patterns,
        reason = "Triple terms only exist if RDF-star is enabled"
    )]
    fn intern_term(&mut self, term: TermRef<'_>) -> Result<InternedTerm, CorruptionError> {
        Ok(match term {
            TermRef::NamedNode(nn) => InternedTerm::NamedNode(self.intern_str(nn.as_str())),
            TermRef::BlankNode(bnode) => InternedTerm::BlankNode(self.intern_str(bnode.as_str())),
            TermRef::Literal(literal) => match literal.language() {
                Some(language) => InternedTerm::LangString(
                    self.intern_str(literal.value()),
                    self.intern_str(language),
                ),
                None => InternedTerm::TypedLiteral(
                    self.intern_str(literal.value()),
                    self.intern_str(literal.datatype().as_str()),
                ),
            },
            term => {
                return Err(CorruptionError::msg(format!(
                    "The term {term} cannot be interned"
                )));
            }
        })
    }

    fn intern_str(&mut self, value: &str) -> Arc<str> {
        if let Some(interned) = self.strings.get(value) {
            return Arc::clone(interned);
        }
        let interned = Arc::<str>::from(value);
        self.strings.insert(Arc::clone(&interned));
        interned
    }

    /// Returns the id of the named graph `graph_name`. Callers must reject blank nodes before.
    pub fn encode_graph_name(
        &mut self,
        graph_name: GraphNameRef<'_>,
    ) -> Result<ObjectId, CorruptionError> {
        match graph_name {
            GraphNameRef::NamedNode(nn) => self.encode_term(nn),
            GraphNameRef::BlankNode(bnode) => Err(CorruptionError::msg(format!(
                "The blank node {bnode} cannot be encoded as a graph name"
            ))),
            GraphNameRef::DefaultGraph => Ok(DEFAULT_GRAPH_ID),
        }
    }

    /// Encodes the entire `quad`, interning all terms.
    pub fn encode_quad(
        &mut self,
        quad: QuadRef<'_>,
    ) -> Result<EncodedQuad<ObjectId>, CorruptionError> {
        Ok(EncodedQuad {
            graph_name: self.encode_graph_name(quad.graph_name)?,
            subject: self.encode_term(quad.subject)?,
            predicate: self.encode_term(quad.predicate)?,
            object: self.encode_term(quad.object)?,
        })
    }

    /// Encodes the `quad` if all of its terms are already interned. Otherwise, the quad cannot be
    /// part of the store and [None] is returned.
    pub fn try_encode_quad(&self, quad: QuadRef<'_>) -> Option<EncodedQuad<ObjectId>> {
        Some(EncodedQuad {
            graph_name: self.try_get_graph_id(quad.graph_name)?,
            subject: self.try_get_term_id(quad.subject)?,
            predicate: self.try_get_term_id(quad.predicate)?,
            object: self.try_get_term_id(quad.object)?,
        })
    }

    /// Returns the term with the given `id`.
    pub fn decode_term(&self, id: ObjectId) -> Result<&Term, CorruptionError> {
        usize::try_from(id.as_u32())
            .ok()
            .and_then(|idx| idx.checked_sub(1))
            .and_then(|idx| self.id2term.get(idx))
            .ok_or_else(|| CorruptionError::msg(format!("Unknown object id {id}")))
    }

    /// Returns the graph name with the given `id`.
    pub fn decode_graph_name(&self, id: ObjectId) -> Result<GraphName, CorruptionError> {
        if id == DEFAULT_GRAPH_ID {
            return Ok(GraphName::DefaultGraph);
        }
        Ok(GraphName::NamedNode(self.decode_named_node(id)?))
    }

    pub fn decode_named_node(&self, id: ObjectId) -> Result<NamedNode, CorruptionError> {
        match self.decode_term(id)? {
            Term::NamedNode(nn) => Ok(nn.clone()),
            term => Err(CorruptionError::msg(format!(
                "The object id {id} refers to {term}, which is not an IRI"
            ))),
        }
    }

    /// Decodes an entire quad.
    pub fn decode_quad(&self, quad: &EncodedQuad<ObjectId>) -> Result<Quad, CorruptionError> {
        let subject = match self.decode_term(quad.subject)? {
            Term::NamedNode(nn) => Subject::NamedNode(nn.clone()),
            Term::BlankNode(bnode) => Subject::BlankNode(bnode.clone()),
            term => {
                return Err(CorruptionError::msg(format!(
                    "The term {term} is used as a subject"
                )));
            }
        };
        Ok(Quad::new(
            subject,
            self.decode_named_node(quad.predicate)?,
            self.decode_term(quad.object)?.clone(),
            self.decode_graph_name(quad.graph_name)?,
        ))
    }
}
