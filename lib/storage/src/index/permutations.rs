use crate::CorruptionError;
use crate::index::{
    EncodedTerm, IndexComponents, NamedGraphStorage, QuadIndex, ScanInstructions,
};

/// Represents a quad with encoded terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedQuad<TTerm: EncodedTerm> {
    /// The graph name.
    pub graph_name: TTerm,
    /// The subject.
    pub subject: TTerm,
    /// The predicate.
    pub predicate: TTerm,
    /// The object.
    pub object: TTerm,
}

impl<TTerm: EncodedTerm> EncodedQuad<TTerm> {
    /// Creates a new [IndexQuad] for an index with the given `components`.
    pub fn for_index(&self, components: IndexComponents) -> IndexQuad<TTerm> {
        let gspo = [self.graph_name, self.subject, self.predicate, self.object];
        IndexQuad((*components.inner()).map(|c| gspo[c.gspo_index()]))
    }

    /// Restores an [EncodedQuad] from a `quad` that is sorted for `components`.
    pub fn from_index(quad: &IndexQuad<TTerm>, components: IndexComponents) -> Self {
        let mut gspo = [TTerm::MIN; 4];
        for (term, component) in quad.0.iter().zip(components.inner()) {
            gspo[component.gspo_index()] = *term;
        }
        let [graph_name, subject, predicate, object] = gspo;
        Self {
            graph_name,
            subject,
            predicate,
            object,
        }
    }
}

/// A quad that is sorted for some index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexQuad<TTerm: EncodedTerm>(pub [TTerm; 4]);

/// Represents a set of multiple indexes, each of which indexes a different ordering of the
/// quad components (e.g., GSPO, GPOS). This is necessary as different quad patterns require
/// different index structures.
///
/// For example, the pattern `<S> <P> ?o` can be best served by having a GSPO index. The scan
/// would then look up `<S>` and `<P>` and scan the entries binding them to `?o`. However, the
/// pattern `?s <P> <O>` cannot be efficiently evaluated with a GSPO index. For this pattern, the
/// store should use a GPOS index.
///
/// The [IndexPermutations] keeps all indexes consistent and stores the registry of named graphs.
#[derive(Debug)]
pub struct IndexPermutations<TIndex: QuadIndex, TGraphs: NamedGraphStorage<Term = TIndex::Term>>
{
    /// The [NamedGraphStorage] that is used to separately store named graphs.
    named_graphs: TGraphs,
    /// The index variations.
    indexes: Vec<TIndex>,
}

impl<TIndex, TGraphs> IndexPermutations<TIndex, TGraphs>
where
    TIndex: QuadIndex,
    TGraphs: NamedGraphStorage<Term = TIndex::Term>,
{
    /// Creates a new [IndexPermutations].
    pub fn new(named_graphs: TGraphs, indexes: Vec<TIndex>) -> Self {
        Self {
            named_graphs,
            indexes,
        }
    }

    /// Chooses the index for scanning the given GSPO `instructions`.
    pub fn choose_index(
        &self,
        instructions: &ScanInstructions<TIndex::Term>,
    ) -> Option<&TIndex> {
        self.indexes
            .iter()
            .rev() // Prefer GSPO (max by uses the last on equality)
            .max_by_key(|index| {
                index.compute_scan_score(&instructions.reorder(index.components()))
            })
    }

    /// Returns all quads matching the GSPO `instructions`.
    pub fn scan<'index>(
        &'index self,
        instructions: &ScanInstructions<TIndex::Term>,
    ) -> Box<dyn Iterator<Item = EncodedQuad<TIndex::Term>> + 'index> {
        let Some(index) = self.choose_index(instructions) else {
            return Box::new(std::iter::empty());
        };
        let components = index.components();
        Box::new(
            index
                .scan(&instructions.reorder(components))
                .map(move |quad| EncodedQuad::from_index(&quad, components)),
        )
    }

    pub fn contains(&self, quad: &EncodedQuad<TIndex::Term>) -> bool {
        self.indexes
            .first()
            .is_some_and(|index| index.contains(&quad.for_index(index.components())))
    }

    pub fn len(&self) -> usize {
        self.indexes.first().map_or(0, TIndex::len)
    }

    /// Returns the number of quads in `graph_name`.
    pub fn graph_len(&self, graph_name: TIndex::Term) -> usize {
        self.scan(&ScanInstructions::new(Some(graph_name), None, None, None))
            .count()
    }

    /// Inserts the `quads` and registers their named graphs. Returns the number of new quads.
    pub fn insert(&mut self, quads: &[EncodedQuad<TIndex::Term>]) -> usize {
        let mut count = 0;
        for index in &mut self.indexes {
            let components = index.components();
            count = index.insert(quads.iter().map(|q| q.for_index(components)));
        }

        for quad in quads.iter().filter(|q| !q.graph_name.is_default_graph()) {
            self.named_graphs.insert(quad.graph_name);
        }

        count
    }

    /// Removes the `quads`. Returns the number of quads that were present.
    pub fn remove(&mut self, quads: &[EncodedQuad<TIndex::Term>]) -> usize {
        let mut count = 0;
        for index in &mut self.indexes {
            let components = index.components();
            count = index.remove(quads.iter().map(|q| q.for_index(components)));
        }
        count
    }

    pub fn insert_named_graph(&mut self, graph_name: TIndex::Term) -> bool {
        self.named_graphs.insert(graph_name)
    }

    /// Removes `graph_name` from the registry. The quads of the graph are not touched.
    pub fn unregister_named_graph(&mut self, graph_name: &TIndex::Term) -> bool {
        self.named_graphs.remove(graph_name)
    }

    pub fn named_graphs(&self) -> Vec<TIndex::Term> {
        self.named_graphs.iter().collect()
    }

    pub fn contains_named_graph(&self, graph_name: &TIndex::Term) -> bool {
        self.named_graphs.contains(graph_name)
    }

    /// Removes all quads and all named graphs.
    pub fn clear(&mut self) {
        for index in &mut self.indexes {
            index.clear();
        }
        self.named_graphs.clear();
    }

    /// Removes all quads of `graph_name`. Returns the number of removed quads.
    pub fn clear_graph(&mut self, graph_name: TIndex::Term) -> usize {
        let mut count = 0;
        for index in &mut self.indexes {
            count = index.clear_graph(graph_name);
        }
        count
    }

    /// Checks that all indexes hold the same quads and that every graph name that is used by a
    /// quad is registered.
    pub fn validate(&self) -> Result<(), CorruptionError> {
        let Some(primary) = self.indexes.first() else {
            return Ok(());
        };
        let primary_components = primary.components();
        let all = ScanInstructions::new(None, None, None, None);

        for index in &self.indexes[1..] {
            if index.len() != primary.len() {
                return Err(CorruptionError::msg(format!(
                    "The {} index contains {} quads while the {} index contains {}",
                    index.components(),
                    index.len(),
                    primary_components,
                    primary.len()
                )));
            }
        }

        for quad in primary.scan(&all) {
            let quad = EncodedQuad::from_index(&quad, primary_components);
            for index in &self.indexes[1..] {
                if !index.contains(&quad.for_index(index.components())) {
                    return Err(CorruptionError::msg(format!(
                        "Quad {quad:?} is missing in the {} index",
                        index.components()
                    )));
                }
            }
            if !quad.graph_name.is_default_graph()
                && !self.named_graphs.contains(&quad.graph_name)
            {
                return Err(CorruptionError::msg(format!(
                    "The graph {:?} is used by a quad but not registered",
                    quad.graph_name
                )));
            }
        }

        Ok(())
    }
}
