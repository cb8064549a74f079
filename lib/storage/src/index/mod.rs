//! Contains general data structures on quad indexes.
//!
//! A quad index represents a particular sorting of the quad components graph name, subject,
//! predicate, and object. For example, the [IndexComponents::GSPO] index represents that exact
//! ordering while the [IndexComponents::GPOS] has the predicate as the second component. A lookup
//! whose bound components form a prefix of the index ordering can be answered with a single range
//! scan.
//!
//! The primary trait in this module is the [QuadIndex]. [IndexPermutations] provides access to
//! multiple indexes while implementing the reordering logic.

mod components;
mod permutations;

pub use components::*;
pub use permutations::*;
use std::fmt::Debug;
use std::hash::Hash;

/// Represents a single instance of a quad index with a given ordering.
pub trait QuadIndex {
    /// The data structure that is used to represent a single RDF term.
    type Term: EncodedTerm;

    /// Returns the components of the index.
    fn components(&self) -> IndexComponents;

    /// Returns the total number of quads.
    fn len(&self) -> usize;

    /// Computes the "scan score" for the given `instructions`.
    ///
    /// The `instructions` are already reordered for this index. The higher the scan score, the
    /// better is the index suited for scanning a particular pattern.
    fn compute_scan_score(&self, instructions: &ScanInstructions<Self::Term>) -> usize;

    /// Returns all quads that match the `instructions`. The `instructions` are already reordered
    /// for this index and the returned quads are in the order of the index.
    fn scan<'index>(
        &'index self,
        instructions: &ScanInstructions<Self::Term>,
    ) -> Box<dyn Iterator<Item = IndexQuad<Self::Term>> + 'index>;

    /// Returns true if the index contains the `quad`.
    fn contains(&self, quad: &IndexQuad<Self::Term>) -> bool;

    /// Inserts a list of quads and returns the number of quads that were not yet present.
    fn insert(&mut self, quads: impl IntoIterator<Item = IndexQuad<Self::Term>>)
    -> usize;

    /// Removes a list of quads and returns the number of quads that were present.
    fn remove(&mut self, quads: impl IntoIterator<Item = IndexQuad<Self::Term>>)
    -> usize;

    /// Clears the entire index
    fn clear(&mut self);

    /// Clears the given `graph_name` and returns the number of removed quads.
    fn clear_graph(&mut self, graph_name: Self::Term) -> usize;
}

/// The data structure that is used to represent a single RDF term inside an index.
///
/// The term encoding must have a special value for the default graph. [EncodedTerm::MIN] and
/// [EncodedTerm::MAX] bound the range of all encoded terms and are used for range scans.
pub trait EncodedTerm:
    Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    /// The smallest encoded term.
    const MIN: Self;
    /// The largest encoded term.
    const MAX: Self;

    /// Returns true if the encoded term is the default graph.
    fn is_default_graph(&self) -> bool;
}

/// Implements a separate storage for named graphs. As a named graph may exist without any
/// associated quads, this must be a separate data structure.
pub trait NamedGraphStorage {
    /// This is the same term type as the quad index itself.
    type Term;

    /// Returns true if the `graph_name` is a named graph and part of this [NamedGraphStorage].
    fn contains(&self, graph_name: &Self::Term) -> bool;

    /// Returns an iterator over all named graphs in the [NamedGraphStorage].
    fn iter(&self) -> impl Iterator<Item = Self::Term>;

    /// Inserts the `graph_name` into the [NamedGraphStorage].
    fn insert(&mut self, graph_name: Self::Term) -> bool;

    /// Removes the `graph_name` from the [NamedGraphStorage].
    fn remove(&mut self, graph_name: &Self::Term) -> bool;

    /// Removes all named graphs.
    fn clear(&mut self);
}

/// Scan instructions capture which parts of a quad are bound to a fixed term. Unbound parts match
/// any term.
///
/// Freshly created instructions are in GSPO order. Use [ScanInstructions::reorder] to obtain the
/// instructions for another index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanInstructions<TTerm: EncodedTerm>(pub [Option<TTerm>; 4]);

impl<TTerm: EncodedTerm> ScanInstructions<TTerm> {
    /// Creates new [ScanInstructions] from the bound components.
    pub fn new(
        graph_name: Option<TTerm>,
        subject: Option<TTerm>,
        predicate: Option<TTerm>,
        object: Option<TTerm>,
    ) -> Self {
        Self([graph_name, subject, predicate, object])
    }

    /// Reorders GSPO instructions to the given `components`.
    #[must_use]
    pub fn reorder(&self, components: IndexComponents) -> Self {
        let mut result = [None; 4];
        for (target, component) in result.iter_mut().zip(components.inner()) {
            *target = self.0[component.gspo_index()];
        }
        Self(result)
    }

    /// Returns the number of leading components that are bound.
    pub fn bound_prefix_len(&self) -> usize {
        self.0.iter().take_while(|term| term.is_some()).count()
    }

    /// Returns true if the `quad` (in the same ordering as the instructions) matches.
    pub fn matches(&self, quad: &IndexQuad<TTerm>) -> bool {
        self.0
            .iter()
            .zip(quad.0.iter())
            .all(|(instruction, term)| {
                instruction.is_none() || *instruction == Some(*term)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reorder_to_gpos() {
        let instructions = ScanInstructions::new(Some(Id(1)), None, Some(Id(3)), None);
        let reordered = instructions.reorder(IndexComponents::GPOS);
        assert_eq!(reordered.0, [Some(Id(1)), Some(Id(3)), None, None]);
        assert_eq!(reordered.bound_prefix_len(), 2);
        assert_eq!(instructions.bound_prefix_len(), 1);
    }

    #[test]
    fn matches_ignores_unbound_components() {
        let instructions = ScanInstructions::new(None, Some(Id(2)), None, Some(Id(4)));
        assert!(instructions.matches(&IndexQuad([Id(9), Id(2), Id(7), Id(4)])));
        assert!(!instructions.matches(&IndexQuad([Id(9), Id(2), Id(7), Id(5)])));
    }

    #[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
    struct Id(u32);

    impl EncodedTerm for Id {
        const MIN: Self = Id(0);
        const MAX: Self = Id(u32::MAX);

        fn is_default_graph(&self) -> bool {
            self.0 == 0
        }
    }
}
