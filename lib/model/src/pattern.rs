use oxrdf::Variable;
use spargebra::term::{
    GraphNamePattern, NamedNodePattern, QuadPattern, TermPattern, TriplePattern,
};
use std::fmt::{Display, Formatter};

/// A conjunctive graph pattern, i.e., an ordered list of quad patterns that must all match.
///
/// A quad pattern whose graph name is [GraphNamePattern::DefaultGraph] is not scoped by a `GRAPH`
/// clause. It is matched against the unnamed graph of the dataset view, which is not necessarily
/// the default graph of the store (e.g., `WITH` and `USING` change it).
///
/// The order of the patterns is the order in which they are joined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GraphPattern {
    patterns: Vec<QuadPattern>,
}

impl GraphPattern {
    /// Creates a new [GraphPattern] from a list of quad patterns.
    pub fn new(patterns: Vec<QuadPattern>) -> Self {
        Self { patterns }
    }

    /// Creates a [GraphPattern] whose triple patterns are not scoped by any `GRAPH` clause.
    pub fn from_triples(triples: impl IntoIterator<Item = TriplePattern>) -> Self {
        triples
            .into_iter()
            .map(|triple| QuadPattern {
                subject: triple.subject,
                predicate: triple.predicate,
                object: triple.object,
                graph_name: GraphNamePattern::DefaultGraph,
            })
            .collect()
    }

    /// Scopes all unscoped patterns with `graph_name`, as a `GRAPH graph_name { ... }` clause
    /// would do. Patterns that already have a graph name keep it.
    #[must_use]
    pub fn in_graph(self, graph_name: &GraphNamePattern) -> Self {
        self.patterns
            .into_iter()
            .map(|pattern| {
                if pattern.graph_name == GraphNamePattern::DefaultGraph {
                    QuadPattern {
                        graph_name: graph_name.clone(),
                        ..pattern
                    }
                } else {
                    pattern
                }
            })
            .collect()
    }

    /// Appends the patterns of `other`, yielding the conjunction of both patterns.
    #[must_use]
    pub fn join(mut self, other: GraphPattern) -> Self {
        self.patterns.extend(other.patterns);
        self
    }

    /// Returns the quad patterns in join order.
    pub fn patterns(&self) -> &[QuadPattern] {
        &self.patterns
    }

    /// Consumes the pattern and returns the quad patterns.
    pub fn into_patterns(self) -> Vec<QuadPattern> {
        self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the variables of the pattern in the order of their first occurrence.
    pub fn variables(&self) -> Vec<Variable> {
        let mut variables = Vec::new();
        let mut push = |variable: &Variable| {
            if !variables.contains(variable) {
                variables.push(variable.clone());
            }
        };
        for pattern in &self.patterns {
            if let TermPattern::Variable(v) = &pattern.subject {
                push(v);
            }
            if let NamedNodePattern::Variable(v) = &pattern.predicate {
                push(v);
            }
            if let TermPattern::Variable(v) = &pattern.object {
                push(v);
            }
            if let GraphNamePattern::Variable(v) = &pattern.graph_name {
                push(v);
            }
        }
        variables
    }
}

impl From<Vec<QuadPattern>> for GraphPattern {
    fn from(patterns: Vec<QuadPattern>) -> Self {
        Self::new(patterns)
    }
}

impl FromIterator<QuadPattern> for GraphPattern {
    fn from_iter<T: IntoIterator<Item = QuadPattern>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for GraphPattern {
    type Item = QuadPattern;
    type IntoIter = std::vec::IntoIter<QuadPattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.into_iter()
    }
}

impl Display for GraphPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for pattern in &self.patterns {
            match &pattern.graph_name {
                GraphNamePattern::DefaultGraph => write!(
                    f,
                    " {} {} {} .",
                    pattern.subject, pattern.predicate, pattern.object
                )?,
                graph_name => write!(
                    f,
                    " GRAPH {graph_name} {{ {} {} {} }}",
                    pattern.subject, pattern.predicate, pattern.object
                )?,
            }
        }
        f.write_str(" }")
    }
}
