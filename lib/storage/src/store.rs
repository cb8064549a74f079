use crate::index::{EncodedQuad, IndexComponents, IndexPermutations, ScanInstructions};
use crate::memory::{DEFAULT_GRAPH_ID, MemQuadIndex, ObjectId, ObjectIdMapping};
use crate::{EmptyGraphPolicy, GraphStoreConfig, MissingGraphPolicy, StorageError};
use rdf_update_model::{
    Graph, GraphNameRef, GraphTarget, NamedNode, NamedNodeRef, Quad, QuadRef,
    SubjectRef, TermRef, Triple,
};
use rustc_hash::FxHashSet;

/// An in-memory RDF dataset that holds exactly one default graph and a registry of named graphs.
///
/// The default graph always exists. It can be cleared but never be removed. A named graph exists
/// iff its IRI is registered. Whether an empty named graph stays registered is governed by the
/// [EmptyGraphPolicy].
///
/// ```
/// use rdf_update_model::{GraphNameRef, NamedNodeRef, QuadRef};
/// use rdf_update_storage::GraphStore;
///
/// let ex = NamedNodeRef::new("http://example.com")?;
/// let graph = NamedNodeRef::new("http://example.com/g")?;
///
/// let mut store = GraphStore::new();
/// store.insert(QuadRef::new(ex, ex, ex, graph))?;
///
/// assert!(store.has_graph(graph));
/// assert_eq!(store.graph(GraphNameRef::NamedNode(graph))?.len(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug)]
pub struct GraphStore {
    config: GraphStoreConfig,
    mapping: ObjectIdMapping,
    indexes: IndexPermutations<MemQuadIndex, FxHashSet<ObjectId>>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    /// Creates an empty [GraphStore] with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GraphStoreConfig::default())
    }

    /// Creates an empty [GraphStore] with the given `config`.
    pub fn with_config(config: GraphStoreConfig) -> Self {
        let indexes = vec![
            MemQuadIndex::new(IndexComponents::GSPO),
            MemQuadIndex::new(IndexComponents::GPOS),
            MemQuadIndex::new(IndexComponents::GOSP),
        ];
        Self {
            config,
            mapping: ObjectIdMapping::new(),
            indexes: IndexPermutations::new(FxHashSet::default(), indexes),
        }
    }

    pub fn config(&self) -> &GraphStoreConfig {
        &self.config
    }

    /// Returns the number of quads in the store.
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Returns true if the store contains no quads. Empty named graphs may still exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the named graph `graph_name` exists.
    pub fn has_graph(&self, graph_name: NamedNodeRef<'_>) -> bool {
        self.named_graph_id(graph_name).is_some()
    }

    /// Returns all existing named graphs, sorted by IRI.
    pub fn named_graphs(&self) -> Result<Vec<NamedNode>, StorageError> {
        let mut graphs = self
            .indexes
            .named_graphs()
            .into_iter()
            .map(|id| self.mapping.decode_named_node(id))
            .collect::<Result<Vec<_>, _>>()?;
        graphs.sort_unstable();
        Ok(graphs)
    }

    /// Returns the triples of the given graph.
    ///
    /// A missing named graph yields an empty graph.
    pub fn graph(&self, graph_name: GraphNameRef<'_>) -> Result<Graph, StorageError> {
        let mut graph = Graph::new();
        for quad in self.quads_for_pattern(None, None, None, Some(graph_name)) {
            graph.insert(&Triple::from(quad?));
        }
        Ok(graph)
    }

    /// Returns true if the store contains the `quad`.
    pub fn contains(&self, quad: QuadRef<'_>) -> bool {
        self.mapping
            .try_encode_quad(quad)
            .is_some_and(|quad| self.indexes.contains(&quad))
    }

    /// Returns all quads in the store.
    pub fn quads(&self) -> QuadIter<'_> {
        self.quads_for_pattern(None, None, None, None)
    }

    /// Returns all quads matching the given pattern. [None] matches any term.
    ///
    /// The lookup uses the index whose sort order has the longest bound prefix.
    pub fn quads_for_pattern(
        &self,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph_name: Option<GraphNameRef<'_>>,
    ) -> QuadIter<'_> {
        let instructions = self.scan_instructions(subject, predicate, object, graph_name);
        QuadIter {
            mapping: &self.mapping,
            inner: instructions.map(|instructions| self.indexes.scan(&instructions)),
        }
    }

    /// Registers the empty named graph `graph_name`.
    ///
    /// Under [EmptyGraphPolicy::Discard], the registration is not materialized and the graph only
    /// starts to exist once a triple is inserted.
    pub fn create_graph(&mut self, graph_name: NamedNodeRef<'_>) -> Result<(), StorageError> {
        if self.has_graph(graph_name) {
            return Err(StorageError::GraphAlreadyExists(graph_name.into_owned()));
        }

        if self.config.empty_graph_policy() == EmptyGraphPolicy::Retain {
            let id = self.mapping.encode_term(graph_name)?;
            self.indexes.insert_named_graph(id);
        }
        Ok(())
    }

    /// Removes the named graph `graph_name` and all its triples.
    ///
    /// Returns the number of removed quads.
    pub fn drop_graph(&mut self, graph_name: NamedNodeRef<'_>) -> Result<usize, StorageError> {
        let Some(id) = self.existing_graph_id(graph_name)? else {
            return Ok(0);
        };
        let removed = self.indexes.clear_graph(id);
        self.indexes.unregister_named_graph(&id);
        Ok(removed)
    }

    /// Removes all triples from the graphs addressed by `target`. Named graphs stay registered
    /// unless the [EmptyGraphPolicy] discards empty graphs.
    ///
    /// Only a single missing named graph is an error (subject to the [MissingGraphPolicy]).
    /// Returns the number of removed quads.
    pub fn clear(&mut self, target: &GraphTarget) -> Result<usize, StorageError> {
        match target {
            GraphTarget::NamedNode(graph_name) => {
                let Some(id) = self.existing_graph_id(graph_name.as_ref())? else {
                    return Ok(0);
                };
                Ok(self.clear_named_graph(id))
            }
            GraphTarget::DefaultGraph => Ok(self.indexes.clear_graph(DEFAULT_GRAPH_ID)),
            GraphTarget::NamedGraphs => Ok(self.clear_named_graphs()),
            GraphTarget::AllGraphs => {
                let removed = self.indexes.clear_graph(DEFAULT_GRAPH_ID);
                Ok(removed + self.clear_named_graphs())
            }
        }
    }

    /// Removes the graphs addressed by `target`. Named graphs are removed from the registry while
    /// the default graph is only cleared.
    ///
    /// Only a single missing named graph is an error (subject to the [MissingGraphPolicy]).
    /// Returns the number of removed quads.
    pub fn drop_graphs(&mut self, target: &GraphTarget) -> Result<usize, StorageError> {
        match target {
            GraphTarget::NamedNode(graph_name) => self.drop_graph(graph_name.as_ref()),
            GraphTarget::DefaultGraph => Ok(self.indexes.clear_graph(DEFAULT_GRAPH_ID)),
            GraphTarget::NamedGraphs => {
                let mut removed = 0;
                for id in self.indexes.named_graphs() {
                    removed += self.indexes.clear_graph(id);
                    self.indexes.unregister_named_graph(&id);
                }
                Ok(removed)
            }
            GraphTarget::AllGraphs => {
                let removed = self.len();
                self.indexes.clear();
                Ok(removed)
            }
        }
    }

    /// Inserts a single quad. Returns true if the quad was not yet present.
    pub fn insert(&mut self, quad: QuadRef<'_>) -> Result<bool, StorageError> {
        check_graph_name(quad.graph_name)?;
        let encoded = self.mapping.encode_quad(quad)?;
        Ok(self.indexes.insert(&[encoded]) == 1)
    }

    /// Removes a single quad. Returns true if the quad was present.
    pub fn remove(&mut self, quad: QuadRef<'_>) -> Result<bool, StorageError> {
        check_graph_name(quad.graph_name)?;
        let encoded = self.mapping.try_encode_quad(quad).into_iter().collect();
        Ok(self.remove_encoded(encoded) == 1)
    }

    /// Inserts all `quads` (set union). Named graphs of the quads are created if necessary.
    ///
    /// Nothing is inserted if one of the quads has an invalid graph name. Returns the number of
    /// quads that were not yet present.
    pub fn add_quads(&mut self, quads: &[Quad]) -> Result<usize, StorageError> {
        for quad in quads {
            check_graph_name(quad.graph_name.as_ref())?;
        }
        let encoded = quads
            .iter()
            .map(|quad| self.mapping.encode_quad(quad.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.indexes.insert(&encoded))
    }

    /// Removes all `quads` (set difference). Absent quads are skipped.
    ///
    /// Returns the number of quads that were present.
    pub fn remove_quads(&mut self, quads: &[Quad]) -> Result<usize, StorageError> {
        for quad in quads {
            check_graph_name(quad.graph_name.as_ref())?;
        }
        let encoded = quads
            .iter()
            .filter_map(|quad| self.mapping.try_encode_quad(quad.as_ref()))
            .collect();
        Ok(self.remove_encoded(encoded))
    }

    /// Replaces the content of `graph_name` with `triples`. A named graph is created if it does not
    /// exist yet.
    ///
    /// Returns the number of quads in the graph afterward.
    pub fn replace_graph(
        &mut self,
        graph_name: GraphNameRef<'_>,
        triples: impl IntoIterator<Item = Triple>,
    ) -> Result<usize, StorageError> {
        check_graph_name(graph_name)?;
        let id = self.mapping.encode_graph_name(graph_name)?;
        self.indexes.clear_graph(id);

        let quads = triples
            .into_iter()
            .map(|triple| triple.in_graph(graph_name.into_owned()))
            .collect::<Vec<_>>();
        let encoded = quads
            .iter()
            .map(|quad| self.mapping.encode_quad(quad.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let inserted = self.indexes.insert(&encoded);

        if id != DEFAULT_GRAPH_ID {
            match self.config.empty_graph_policy() {
                EmptyGraphPolicy::Retain => {
                    self.indexes.insert_named_graph(id);
                }
                EmptyGraphPolicy::Discard if inserted == 0 => {
                    self.indexes.unregister_named_graph(&id);
                }
                EmptyGraphPolicy::Discard => {}
            }
        }
        Ok(inserted)
    }

    /// Checks the internal consistency of the store.
    pub fn validate(&self) -> Result<(), StorageError> {
        self.indexes.validate()?;
        for id in self.indexes.named_graphs() {
            self.mapping.decode_named_node(id)?;
        }
        Ok(())
    }

    /// Encodes the bound terms of a pattern. Returns [None] if a bound term is not known to the
    /// store, in which case no quad can match.
    fn scan_instructions(
        &self,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph_name: Option<GraphNameRef<'_>>,
    ) -> Option<ScanInstructions<ObjectId>> {
        Some(ScanInstructions::new(
            bind(graph_name, |g| self.mapping.try_get_graph_id(g))?,
            bind(subject, |s| self.mapping.try_get_term_id(s))?,
            bind(predicate, |p| self.mapping.try_get_term_id(p))?,
            bind(object, |o| self.mapping.try_get_term_id(o))?,
        ))
    }

    fn named_graph_id(&self, graph_name: NamedNodeRef<'_>) -> Option<ObjectId> {
        self.mapping
            .try_get_term_id(graph_name)
            .filter(|id| self.indexes.contains_named_graph(id))
    }

    /// Looks up an existing named graph. A missing graph is either an error or [None], depending on
    /// the [MissingGraphPolicy].
    fn existing_graph_id(
        &self,
        graph_name: NamedNodeRef<'_>,
    ) -> Result<Option<ObjectId>, StorageError> {
        match (
            self.named_graph_id(graph_name),
            self.config.missing_graph_policy(),
        ) {
            (Some(id), _) => Ok(Some(id)),
            (None, MissingGraphPolicy::Error) => {
                Err(StorageError::GraphNotFound(graph_name.into_owned()))
            }
            (None, MissingGraphPolicy::Ignore) => Ok(None),
        }
    }

    fn clear_named_graph(&mut self, id: ObjectId) -> usize {
        let removed = self.indexes.clear_graph(id);
        if self.config.empty_graph_policy() == EmptyGraphPolicy::Discard {
            self.indexes.unregister_named_graph(&id);
        }
        removed
    }

    fn clear_named_graphs(&mut self) -> usize {
        self.indexes
            .named_graphs()
            .into_iter()
            .map(|id| self.clear_named_graph(id))
            .sum()
    }

    fn remove_encoded(&mut self, quads: Vec<EncodedQuad<ObjectId>>) -> usize {
        let removed = self.indexes.remove(&quads);
        if self.config.empty_graph_policy() == EmptyGraphPolicy::Discard {
            let touched = quads
                .iter()
                .map(|quad| quad.graph_name)
                .filter(|id| *id != DEFAULT_GRAPH_ID)
                .collect::<FxHashSet<_>>();
            for id in touched {
                if self.indexes.graph_len(id) == 0 {
                    self.indexes.unregister_named_graph(&id);
                }
            }
        }
        removed
    }
}

/// An iterator over the quads of a [GraphStore].
pub struct QuadIter<'store> {
    mapping: &'store ObjectIdMapping,
    inner: Option<Box<dyn Iterator<Item = EncodedQuad<ObjectId>> + 'store>>,
}

impl Iterator for QuadIter<'_> {
    type Item = Result<Quad, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let quad = self.inner.as_mut()?.next()?;
        Some(self.mapping.decode_quad(&quad).map_err(StorageError::from))
    }
}

/// Looks up the id of an optional term. Returns `Some(None)` for an unbound term and [None] if a
/// bound term is not known to the store.
fn bind<T>(
    term: Option<T>,
    lookup: impl FnOnce(T) -> Option<ObjectId>,
) -> Option<Option<ObjectId>> {
    match term {
        None => Some(None),
        Some(term) => lookup(term).map(Some),
    }
}

fn check_graph_name(graph_name: GraphNameRef<'_>) -> Result<(), StorageError> {
    match graph_name {
        GraphNameRef::BlankNode(bnode) => {
            Err(StorageError::BlankNodeGraphName(bnode.into_owned()))
        }
        GraphNameRef::NamedNode(_) | GraphNameRef::DefaultGraph => Ok(()),
    }
}
