use crate::sparql::algebra::UpdateDataset;
use crate::sparql::binding::{Binding, BindingIter};
use crate::sparql::error::UpdateEvaluationError;
use rdf_update_model::{
    BlankNode, BlankNodeMatchingMode, GraphName, GraphNamePattern, GraphNameRef, GraphPattern,
    NamedNode, NamedNodePattern, NamedNodeRef, Quad, SubjectRef, Term, TermPattern, TermRef,
    Triple, Variable,
};
use rdf_update_storage::GraphStore;
use rustc_hash::FxHashSet;
use std::iter::once;
use std::rc::Rc;
use std::sync::Arc;

/// The graphs that are visible to the evaluation of one `WHERE` clause.
///
/// Unscoped patterns are matched against the merge of the `default` graphs. `GRAPH` patterns only
/// see the `named` graphs, or every named graph of the store if `named` is [None].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetView {
    default: Vec<GraphName>,
    named: Option<Vec<NamedNode>>,
}

impl Default for DatasetView {
    fn default() -> Self {
        Self {
            default: vec![GraphName::DefaultGraph],
            named: None,
        }
    }
}

impl DatasetView {
    pub fn new(default: Vec<GraphName>, named: Option<Vec<NamedNode>>) -> Self {
        Self { default, named }
    }

    /// The view of a `WITH graph` clause: `graph` is the unnamed graph and every named graph is
    /// visible.
    pub fn with_graph(graph: NamedNode) -> Self {
        Self::new(vec![GraphName::NamedNode(graph)], None)
    }

    /// Builds the view of a modify operation. `USING` takes precedence over `WITH`.
    pub fn for_modify(with: Option<&NamedNode>, using: Option<&UpdateDataset>) -> Self {
        match (using, with) {
            (Some(using), _) => Self::new(using.default.clone(), using.named.clone()),
            (None, Some(with)) => Self::with_graph(with.clone()),
            (None, None) => Self::default(),
        }
    }

    pub fn default_graphs(&self) -> &[GraphName] {
        &self.default
    }

    pub fn named_graphs(&self) -> Option<&[NamedNode]> {
        self.named.as_deref()
    }

    fn is_named_graph_visible(&self, graph: &NamedNode) -> bool {
        self.named
            .as_ref()
            .map_or(true, |named| named.contains(graph))
    }
}

/// Evaluates conjunctive graph patterns against a [GraphStore].
///
/// The patterns are joined in their given order with a depth-first nested-loop join. Each quad
/// pattern is answered with an index lookup that uses every position that is already bound.
#[derive(Debug, Clone, Copy)]
pub struct PatternMatcher<'store> {
    store: &'store GraphStore,
    mode: BlankNodeMatchingMode,
}

impl<'store> PatternMatcher<'store> {
    pub fn new(store: &'store GraphStore) -> Self {
        Self {
            store,
            mode: BlankNodeMatchingMode::default(),
        }
    }

    #[must_use]
    pub fn with_blank_node_mode(mut self, mode: BlankNodeMatchingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns a lazy iterator over the distinct bindings of `pattern` in `view`.
    ///
    /// An empty pattern yields a single empty binding.
    pub fn evaluate(
        &self,
        pattern: &GraphPattern,
        view: &DatasetView,
    ) -> Result<BindingIter<'store>, UpdateEvaluationError> {
        let plan = Rc::new(PreparedPattern::try_new(pattern, view, self.mode)?);
        let variables = Arc::clone(&plan.variables);
        let store = self.store;

        let mut rows: Box<dyn Iterator<Item = RowResult> + 'store> =
            Box::new(once(Ok(vec![None; plan.slot_count])));
        for index in 0..plan.patterns.len() {
            let plan = Rc::clone(&plan);
            rows = Box::new(rows.flat_map(
                move |row| -> Box<dyn Iterator<Item = RowResult> + 'store> {
                    match row {
                        Ok(row) => plan.candidates(store, index, row),
                        Err(error) => Box::new(once(Err(error))),
                    }
                },
            ));
        }

        let visible = variables.len();
        let mut seen = FxHashSet::default();
        let bindings = rows.filter_map(move |row| match row {
            Ok(mut row) => {
                row.truncate(visible);
                seen.insert(row.clone())
                    .then(|| Ok(Binding::new(Arc::clone(&variables), row)))
            }
            Err(error) => Some(Err(error)),
        });
        Ok(BindingIter::new(Arc::clone(&plan.variables), Box::new(bindings)))
    }
}

type Row = Vec<Option<Term>>;
type RowResult = Result<Row, UpdateEvaluationError>;

/// A term position of a prepared quad pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PreparedTerm {
    Constant(Term),
    Slot(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PreparedGraph {
    /// Matched against the unnamed graph of the view.
    Unnamed,
    Constant(NamedNode),
    Slot(usize),
}

#[derive(Debug)]
struct PreparedQuad {
    subject: PreparedTerm,
    predicate: PreparedTerm,
    object: PreparedTerm,
    graph_name: PreparedGraph,
}

/// A graph pattern whose variables are replaced by slots of a row.
///
/// The first slots are the variables of the pattern. In [BlankNodeMatchingMode::Variable], the
/// blank nodes of the pattern take the remaining slots and are dropped from the final bindings.
#[derive(Debug)]
struct PreparedPattern {
    variables: Arc<[Variable]>,
    slot_count: usize,
    patterns: Vec<PreparedQuad>,
    view: DatasetView,
}

impl PreparedPattern {
    fn try_new(
        pattern: &GraphPattern,
        view: &DatasetView,
        mode: BlankNodeMatchingMode,
    ) -> Result<Self, UpdateEvaluationError> {
        let variables = pattern.variables();
        let mut blank_nodes = Vec::<BlankNode>::new();

        let mut prepare_term = |term: &TermPattern| -> Result<PreparedTerm, UpdateEvaluationError> {
            Ok(match term {
                TermPattern::NamedNode(node) => PreparedTerm::Constant(node.clone().into()),
                TermPattern::Literal(literal) => PreparedTerm::Constant(literal.clone().into()),
                TermPattern::BlankNode(node) => match mode {
                    BlankNodeMatchingMode::Filter => PreparedTerm::Constant(node.clone().into()),
                    BlankNodeMatchingMode::Variable => {
                        let position = blank_nodes
                            .iter()
                            .position(|b| b == node)
                            .unwrap_or_else(|| {
                                blank_nodes.push(node.clone());
                                blank_nodes.len() - 1
                            });
                        PreparedTerm::Slot(variables.len() + position)
                    }
                },
                TermPattern::Variable(variable) => PreparedTerm::Slot(slot(&variables, variable)),
                #[allow(
                    unreachable_patterns,
                    reason = "Triple terms only exist if RDF-star is enabled"
                )]
                term => {
                    return Err(UpdateEvaluationError::malformed(format!(
                        "The term {term} is not supported in patterns"
                    )));
                }
            })
        };

        let mut patterns = Vec::with_capacity(pattern.len());
        for quad in pattern.patterns() {
            let subject = prepare_term(&quad.subject)?;
            let object = prepare_term(&quad.object)?;
            let predicate = match &quad.predicate {
                NamedNodePattern::NamedNode(node) => PreparedTerm::Constant(node.clone().into()),
                NamedNodePattern::Variable(variable) => {
                    PreparedTerm::Slot(slot(&variables, variable))
                }
            };
            let graph_name = match &quad.graph_name {
                GraphNamePattern::DefaultGraph => PreparedGraph::Unnamed,
                GraphNamePattern::NamedNode(node) => PreparedGraph::Constant(node.clone()),
                GraphNamePattern::Variable(variable) => {
                    PreparedGraph::Slot(slot(&variables, variable))
                }
            };
            patterns.push(PreparedQuad {
                subject,
                predicate,
                object,
                graph_name,
            });
        }

        Ok(Self {
            slot_count: variables.len() + blank_nodes.len(),
            variables: variables.into(),
            patterns,
            view: view.clone(),
        })
    }

    /// Returns all extensions of `row` that match the pattern at `index`.
    fn candidates<'store>(
        &self,
        store: &'store GraphStore,
        index: usize,
        row: Row,
    ) -> Box<dyn Iterator<Item = RowResult> + 'store> {
        let pattern = &self.patterns[index];
        let subject = resolve(&pattern.subject, &row);
        let predicate = resolve(&pattern.predicate, &row);
        let object = resolve(&pattern.object, &row);

        let subject = match subject.map(as_subject) {
            None => None,
            Some(Some(subject)) => Some(subject),
            Some(None) => return Box::new(std::iter::empty()),
        };
        let predicate = match predicate {
            None => None,
            Some(TermRef::NamedNode(predicate)) => Some(predicate),
            Some(_) => return Box::new(std::iter::empty()),
        };

        let quads: Vec<Result<Quad, UpdateEvaluationError>> = match &pattern.graph_name {
            PreparedGraph::Unnamed => {
                self.unnamed_graph_quads(store, subject, predicate, object)
            }
            PreparedGraph::Constant(graph) => {
                self.named_graph_quads(store, graph, subject, predicate, object)
            }
            PreparedGraph::Slot(slot) => match &row[*slot] {
                Some(Term::NamedNode(graph)) => {
                    self.named_graph_quads(store, graph, subject, predicate, object)
                }
                Some(_) => Vec::new(),
                None => self.all_named_graph_quads(store, subject, predicate, object),
            },
        };

        let mut extensions = Vec::new();
        for quad in quads {
            match quad {
                Ok(quad) => {
                    if let Some(extension) = unify(pattern, &row, quad) {
                        extensions.push(Ok(extension));
                    }
                }
                Err(error) => extensions.push(Err(error)),
            }
        }
        Box::new(extensions.into_iter())
    }

    /// The quads of the merged unnamed graph. Triples that occur in multiple merged graphs are
    /// returned once, with the default graph as graph name.
    fn unnamed_graph_quads(
        &self,
        store: &GraphStore,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
    ) -> Vec<Result<Quad, UpdateEvaluationError>> {
        let mut seen = FxHashSet::<Triple>::default();
        let mut quads = Vec::new();
        for graph in &self.view.default {
            for quad in
                store.quads_for_pattern(subject, predicate, object, Some(graph.as_ref()))
            {
                match quad {
                    Ok(quad) => {
                        let triple = Triple::from(quad);
                        if self.view.default.len() == 1 || seen.insert(triple.clone()) {
                            quads.push(Ok(triple.in_graph(GraphName::DefaultGraph)));
                        }
                    }
                    Err(error) => quads.push(Err(error.into())),
                }
            }
        }
        quads
    }

    fn named_graph_quads(
        &self,
        store: &GraphStore,
        graph: &NamedNode,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
    ) -> Vec<Result<Quad, UpdateEvaluationError>> {
        if !self.view.is_named_graph_visible(graph) {
            return Vec::new();
        }
        store
            .quads_for_pattern(
                subject,
                predicate,
                object,
                Some(GraphNameRef::NamedNode(graph.as_ref())),
            )
            .map(|quad| quad.map_err(Into::into))
            .collect()
    }

    /// The quads of every visible named graph. The default graph is never part of the result.
    fn all_named_graph_quads(
        &self,
        store: &GraphStore,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
    ) -> Vec<Result<Quad, UpdateEvaluationError>> {
        store
            .quads_for_pattern(subject, predicate, object, None)
            .filter_map(|quad| match quad {
                Ok(quad) => {
                    let visible = matches!(
                        &quad.graph_name,
                        GraphName::NamedNode(graph) if self.view.is_named_graph_visible(graph)
                    );
                    visible.then_some(Ok(quad))
                }
                Err(error) => Some(Err(error.into())),
            })
            .collect()
    }
}

fn slot(variables: &[Variable], variable: &Variable) -> usize {
    // GraphPattern::variables contains every variable of the pattern.
    variables
        .iter()
        .position(|v| v == variable)
        .unwrap_or(variables.len())
}

fn resolve<'row>(term: &'row PreparedTerm, row: &'row Row) -> Option<TermRef<'row>> {
    match term {
        PreparedTerm::Constant(term) => Some(term.as_ref()),
        PreparedTerm::Slot(slot) => row[*slot].as_ref().map(Term::as_ref),
    }
}

/// Returns [None] if the term cannot be the subject of a triple.
#[allow(
    unreachable_patterns,
    reason = "Triple terms only exist if RDF-star is enabled"
)]
fn as_subject(term: TermRef<'_>) -> Option<SubjectRef<'_>> {
    match term {
        TermRef::NamedNode(node) => Some(SubjectRef::NamedNode(node)),
        TermRef::BlankNode(node) => Some(SubjectRef::BlankNode(node)),
        _ => None,
    }
}

/// Extends `row` with the terms of `quad`. Returns [None] if a slot is already bound to a
/// different term, including slots that occur multiple times in the same pattern.
fn unify(pattern: &PreparedQuad, row: &Row, quad: Quad) -> Option<Row> {
    let mut row = row.clone();
    let mut bind = |position: &PreparedTerm, term: Term| -> bool {
        match position {
            PreparedTerm::Constant(constant) => *constant == term,
            PreparedTerm::Slot(slot) => match &row[*slot] {
                Some(bound) => *bound == term,
                None => {
                    row[*slot] = Some(term);
                    true
                }
            },
        }
    };

    let graph_bound = match (&pattern.graph_name, quad.graph_name) {
        (PreparedGraph::Slot(slot), GraphName::NamedNode(graph)) => {
            bind(&PreparedTerm::Slot(*slot), graph.into())
        }
        (PreparedGraph::Slot(_), _) => false,
        (PreparedGraph::Unnamed | PreparedGraph::Constant(_), _) => true,
    };
    let matches = graph_bound
        && bind(&pattern.subject, quad.subject.into())
        && bind(&pattern.predicate, quad.predicate.into())
        && bind(&pattern.object, quad.object);
    matches.then_some(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_update_model::{Literal, QuadPattern, QuadRef};

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    fn var(name: &str) -> TermPattern {
        TermPattern::Variable(Variable::new_unchecked(name))
    }

    fn quad_pattern(
        subject: TermPattern,
        predicate: NamedNodePattern,
        object: TermPattern,
        graph_name: GraphNamePattern,
    ) -> QuadPattern {
        QuadPattern {
            subject,
            predicate,
            object,
            graph_name,
        }
    }

    fn evaluate(store: &GraphStore, pattern: &GraphPattern, view: &DatasetView) -> Vec<Binding> {
        PatternMatcher::new(store)
            .evaluate(pattern, view)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn empty_pattern_yields_one_empty_binding() {
        let store = GraphStore::new();

        let bindings = evaluate(&store, &GraphPattern::default(), &DatasetView::default());

        assert_eq!(bindings.len(), 1);
        assert!(bindings[0].is_empty());
    }

    #[test]
    fn join_shares_variables() {
        let mut store = GraphStore::new();
        store
            .add_quads(&[
                Quad::new(ex("a"), ex("knows"), ex("b"), GraphName::DefaultGraph),
                Quad::new(ex("b"), ex("knows"), ex("c"), GraphName::DefaultGraph),
                Quad::new(ex("c"), ex("name"), Literal::from("C"), GraphName::DefaultGraph),
            ])
            .unwrap();
        let pattern = GraphPattern::new(vec![
            quad_pattern(
                var("x"),
                ex("knows").into(),
                var("y"),
                GraphNamePattern::DefaultGraph,
            ),
            quad_pattern(
                var("y"),
                ex("name").into(),
                var("name"),
                GraphNamePattern::DefaultGraph,
            ),
        ]);

        let bindings = evaluate(&store, &pattern, &DatasetView::default());

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].get("x"), Some(&ex("b").into()));
        assert_eq!(bindings[0].get("name"), Some(&Literal::from("C").into()));
    }

    #[test]
    fn repeated_variable_in_one_pattern() {
        let mut store = GraphStore::new();
        store
            .add_quads(&[
                Quad::new(ex("a"), ex("p"), ex("a"), GraphName::DefaultGraph),
                Quad::new(ex("a"), ex("p"), ex("b"), GraphName::DefaultGraph),
            ])
            .unwrap();
        let pattern = GraphPattern::new(vec![quad_pattern(
            var("x"),
            ex("p").into(),
            var("x"),
            GraphNamePattern::DefaultGraph,
        )]);

        let bindings = evaluate(&store, &pattern, &DatasetView::default());

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].get("x"), Some(&ex("a").into()));
    }

    #[test]
    fn graph_variable_excludes_default_graph() {
        let mut store = GraphStore::new();
        store
            .add_quads(&[
                Quad::new(ex("s"), ex("p"), ex("o"), GraphName::DefaultGraph),
                Quad::new(ex("s"), ex("p"), ex("o"), ex("g1")),
                Quad::new(ex("s"), ex("p"), ex("o"), ex("g2")),
            ])
            .unwrap();
        let pattern = GraphPattern::new(vec![quad_pattern(
            var("s"),
            ex("p").into(),
            var("o"),
            GraphNamePattern::Variable(Variable::new_unchecked("g")),
        )]);

        let mut graphs = evaluate(&store, &pattern, &DatasetView::default())
            .iter()
            .filter_map(|binding| binding.get("g").cloned())
            .collect::<Vec<_>>();
        graphs.sort_unstable_by_key(ToString::to_string);

        assert_eq!(graphs, vec![ex("g1").into(), ex("g2").into()]);
    }

    #[test]
    fn graph_variable_respects_named_graphs_of_view() {
        let mut store = GraphStore::new();
        store
            .add_quads(&[
                Quad::new(ex("s"), ex("p"), ex("o"), ex("g1")),
                Quad::new(ex("s"), ex("p"), ex("o"), ex("g2")),
            ])
            .unwrap();
        let pattern = GraphPattern::new(vec![quad_pattern(
            var("s"),
            ex("p").into(),
            var("o"),
            GraphNamePattern::Variable(Variable::new_unchecked("g")),
        )]);
        let view = DatasetView::new(vec![GraphName::DefaultGraph], Some(vec![ex("g2")]));

        let bindings = evaluate(&store, &pattern, &view);

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].get("g"), Some(&ex("g2").into()));
    }

    #[test]
    fn fixed_graph_outside_of_view_matches_nothing() {
        let mut store = GraphStore::new();
        store
            .insert(QuadRef::new(&ex("s"), &ex("p"), &ex("o"), &ex("g1")))
            .unwrap();
        let pattern = GraphPattern::new(vec![quad_pattern(
            var("s"),
            ex("p").into(),
            var("o"),
            GraphNamePattern::NamedNode(ex("g1")),
        )]);
        let view = DatasetView::new(vec![GraphName::DefaultGraph], Some(Vec::new()));

        assert!(evaluate(&store, &pattern, &view).is_empty());
        assert_eq!(evaluate(&store, &pattern, &DatasetView::default()).len(), 1);
    }

    #[test]
    fn unnamed_graph_is_merge_of_default_graphs() {
        let mut store = GraphStore::new();
        store
            .add_quads(&[
                Quad::new(ex("s"), ex("p"), ex("o"), ex("g1")),
                Quad::new(ex("s"), ex("p"), ex("o"), ex("g2")),
                Quad::new(ex("s"), ex("p"), ex("other"), ex("g2")),
            ])
            .unwrap();
        let pattern = GraphPattern::new(vec![quad_pattern(
            var("s"),
            ex("p").into(),
            var("o"),
            GraphNamePattern::DefaultGraph,
        )]);
        let view = DatasetView::new(
            vec![GraphName::from(ex("g1")), GraphName::from(ex("g2"))],
            None,
        );

        assert_eq!(evaluate(&store, &pattern, &view).len(), 2);
        assert!(evaluate(&store, &pattern, &DatasetView::default()).is_empty());
    }

    #[test]
    fn blank_nodes_as_variables_or_filters() {
        let mut store = GraphStore::new();
        let blank = BlankNode::new_unchecked("b1");
        store
            .add_quads(&[
                Quad::new(ex("s1"), ex("p"), ex("o"), GraphName::DefaultGraph),
                Quad::new(ex("s2"), ex("p"), ex("o"), GraphName::DefaultGraph),
                Quad::new(blank.clone(), ex("p"), ex("o"), GraphName::DefaultGraph),
            ])
            .unwrap();
        let pattern = GraphPattern::new(vec![quad_pattern(
            TermPattern::BlankNode(blank),
            ex("p").into(),
            var("o"),
            GraphNamePattern::DefaultGraph,
        )]);

        let as_variable = evaluate(&store, &pattern, &DatasetView::default());
        assert_eq!(as_variable.len(), 1, "the hidden variable does not create duplicates");
        assert_eq!(as_variable[0].variables().len(), 1);

        let as_filter: Vec<_> = PatternMatcher::new(&store)
            .with_blank_node_mode(BlankNodeMatchingMode::Filter)
            .evaluate(&pattern, &DatasetView::default())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(as_filter.len(), 1);
    }

    #[test]
    fn literal_in_subject_position_matches_nothing() {
        let mut store = GraphStore::new();
        store
            .insert(QuadRef::new(
                &ex("s"),
                &ex("p"),
                &Term::from(Literal::from("o")),
                GraphNameRef::DefaultGraph,
            ))
            .unwrap();
        let pattern = GraphPattern::new(vec![
            quad_pattern(
                var("s"),
                ex("p").into(),
                var("o"),
                GraphNamePattern::DefaultGraph,
            ),
            quad_pattern(
                var("o"),
                ex("p").into(),
                var("x"),
                GraphNamePattern::DefaultGraph,
            ),
        ]);

        assert!(evaluate(&store, &pattern, &DatasetView::default()).is_empty());
    }

    #[test]
    fn evaluation_is_restartable() {
        let mut store = GraphStore::new();
        store
            .insert(QuadRef::new(
                &ex("s"),
                &ex("p"),
                &ex("o"),
                GraphNameRef::DefaultGraph,
            ))
            .unwrap();
        let pattern = GraphPattern::new(vec![quad_pattern(
            var("s"),
            var_predicate("p"),
            var("o"),
            GraphNamePattern::DefaultGraph,
        )]);
        let matcher = PatternMatcher::new(&store);

        let first = matcher
            .evaluate(&pattern, &DatasetView::default())
            .unwrap()
            .count();
        let second = matcher
            .evaluate(&pattern, &DatasetView::default())
            .unwrap()
            .count();

        assert_eq!(first, 1);
        assert_eq!(first, second);
    }

    fn var_predicate(name: &str) -> NamedNodePattern {
        NamedNodePattern::Variable(Variable::new_unchecked(name))
    }
}
