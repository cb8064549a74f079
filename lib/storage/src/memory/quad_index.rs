use crate::index::{
    EncodedTerm, IndexComponent, IndexComponents, IndexQuad, NamedGraphStorage, QuadIndex,
    ScanInstructions,
};
use crate::memory::object_id::ObjectId;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Represents a single permutation of a quad index held in-memory. The index is sorted from left
/// to right.
///
/// Given the components GPOS, the index could look like this:
/// ```text
/// ?graph   ?predicate  ?object  ?subject
/// ┌─────┐    ┌─────┐   ┌─────┐   ┌─────┐
/// │   0 │    │   1 │   │   4 │   │   4 │
/// ├─────┤    ├─────┤   ├─────┤   ├─────┤
/// │   0 │    │   1 │   │   7 │   │   7 │
/// ├─────┤    ├─────┤   ├─────┤   ├─────┤
/// │   0 │    │   2 │   │   1 │   │   1 │
/// ├─────┤    ├─────┤   ├─────┤   ├─────┤
/// │ ... │    │ ... │   │ ... │   │ ... │
/// └─────┘    └─────┘   └─────┘   └─────┘
/// ```
///
/// A scan whose bound components form a prefix of the ordering is a single range query on the
/// sorted set. Bound components after the first unbound one are filtered during the scan.
#[derive(Debug)]
pub struct MemQuadIndex {
    /// The index content.
    data: BTreeSet<IndexQuad<ObjectId>>,
    /// Differentiates between multiple configurations (e.g., GSPO, GPOS).
    components: IndexComponents,
}

impl MemQuadIndex {
    /// Creates a new empty [MemQuadIndex].
    pub fn new(components: IndexComponents) -> Self {
        Self {
            data: BTreeSet::new(),
            components,
        }
    }

    /// Computes the smallest and largest quad that share the bound prefix of `instructions`.
    fn prefix_bounds(
        instructions: &ScanInstructions<ObjectId>,
    ) -> (IndexQuad<ObjectId>, IndexQuad<ObjectId>) {
        let prefix_len = instructions.bound_prefix_len();
        let mut lower = [ObjectId::MIN; 4];
        let mut upper = [ObjectId::MAX; 4];
        for (i, term) in instructions.0.iter().take(prefix_len).enumerate() {
            if let Some(term) = term {
                lower[i] = *term;
                upper[i] = *term;
            }
        }
        (IndexQuad(lower), IndexQuad(upper))
    }
}

impl QuadIndex for MemQuadIndex {
    type Term = ObjectId;

    fn components(&self) -> IndexComponents {
        self.components
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn compute_scan_score(&self, instructions: &ScanInstructions<ObjectId>) -> usize {
        instructions.bound_prefix_len()
    }

    fn scan<'index>(
        &'index self,
        instructions: &ScanInstructions<ObjectId>,
    ) -> Box<dyn Iterator<Item = IndexQuad<ObjectId>> + 'index> {
        let instructions = *instructions;
        let (lower, upper) = Self::prefix_bounds(&instructions);
        Box::new(
            self.data
                .range(lower..=upper)
                .filter(move |quad| instructions.matches(quad))
                .copied(),
        )
    }

    fn contains(&self, quad: &IndexQuad<ObjectId>) -> bool {
        self.data.contains(quad)
    }

    fn insert(&mut self, quads: impl IntoIterator<Item = IndexQuad<ObjectId>>) -> usize {
        quads
            .into_iter()
            .filter(|quad| self.data.insert(*quad))
            .count()
    }

    fn remove(&mut self, quads: impl IntoIterator<Item = IndexQuad<ObjectId>>) -> usize {
        quads
            .into_iter()
            .filter(|quad| self.data.remove(quad))
            .count()
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn clear_graph(&mut self, graph_name: ObjectId) -> usize {
        let before = self.data.len();
        let position = self.components.position(IndexComponent::GraphName);
        self.data.retain(|quad| quad.0[position] != graph_name);
        before - self.data.len()
    }
}

impl Display for MemQuadIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} quads)", self.components, self.data.len())
    }
}

impl NamedGraphStorage for FxHashSet<ObjectId> {
    type Term = ObjectId;

    fn contains(&self, graph_name: &ObjectId) -> bool {
        FxHashSet::contains(self, graph_name)
    }

    fn iter(&self) -> impl Iterator<Item = ObjectId> {
        FxHashSet::iter(self).copied()
    }

    fn insert(&mut self, graph_name: ObjectId) -> bool {
        FxHashSet::insert(self, graph_name)
    }

    fn remove(&mut self, graph_name: &ObjectId) -> bool {
        FxHashSet::remove(self, graph_name)
    }

    fn clear(&mut self) {
        FxHashSet::clear(self);
    }
}
