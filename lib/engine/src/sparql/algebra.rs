//! The typed representation of SPARQL 1.1 Update operations.

use crate::sparql::error::UpdateSyntaxError;
use crate::sparql::statements::{
    split_statements, GraphReference, GraphTransfer, Statement, TransferKind,
};
use rdf_update_model::{
    GraphName, GraphNamePattern, GraphPattern, GraphTarget, Iri, NamedNode, NamedNodePattern,
    QuadPattern, Subject, Term, TermPattern,
};
use spargebra::GraphUpdateOperation;
use spargebra::term::{GroundQuad, GroundQuadPattern, GroundSubject, GroundTerm, GroundTermPattern};
use std::fmt;
use std::str::FromStr;

/// A single SPARQL 1.1 Update operation.
///
/// Graph names are plain [GraphName]s. A blank node graph name is rejected during execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpdateOperation {
    /// `LOAD source INTO GRAPH destination`
    Load {
        silent: bool,
        source: NamedNode,
        destination: GraphName,
    },
    /// `CLEAR target`
    Clear { silent: bool, target: GraphTarget },
    /// `DROP target`
    Drop { silent: bool, target: GraphTarget },
    /// `CREATE GRAPH graph`
    Create { silent: bool, graph: NamedNode },
    /// `ADD source TO destination`
    Add {
        silent: bool,
        source: GraphName,
        destination: GraphName,
    },
    /// `COPY source TO destination`
    Copy {
        silent: bool,
        source: GraphName,
        destination: GraphName,
    },
    /// `MOVE source TO destination`
    Move {
        silent: bool,
        source: GraphName,
        destination: GraphName,
    },
    /// `INSERT DATA { data }`
    ///
    /// The data is kept as patterns such that variables can be reported during execution.
    InsertData { data: Vec<QuadPattern> },
    /// `DELETE DATA { data }`
    DeleteData { data: Vec<QuadPattern> },
    /// `WITH with DELETE { delete } INSERT { insert } USING using WHERE { pattern }`
    Modify {
        with: Option<NamedNode>,
        delete: Vec<QuadPattern>,
        insert: Vec<QuadPattern>,
        using: Option<UpdateDataset>,
        pattern: GraphPattern,
    },
}

impl UpdateOperation {
    /// Creates a `DELETE WHERE { pattern }` operation, i.e., a modify operation that uses the
    /// pattern as delete template.
    pub fn delete_where(pattern: GraphPattern) -> Self {
        Self::Modify {
            with: None,
            delete: pattern.patterns().to_vec(),
            insert: Vec::new(),
            using: None,
            pattern,
        }
    }

    /// Returns the SPARQL keyword of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load { .. } => "LOAD",
            Self::Clear { .. } => "CLEAR",
            Self::Drop { .. } => "DROP",
            Self::Create { .. } => "CREATE",
            Self::Add { .. } => "ADD",
            Self::Copy { .. } => "COPY",
            Self::Move { .. } => "MOVE",
            Self::InsertData { .. } => "INSERT DATA",
            Self::DeleteData { .. } => "DELETE DATA",
            Self::Modify { .. } => "MODIFY",
        }
    }

    /// Returns true if the operation carries the `SILENT` modifier.
    pub fn is_silent(&self) -> bool {
        match self {
            Self::Load { silent, .. }
            | Self::Clear { silent, .. }
            | Self::Drop { silent, .. }
            | Self::Create { silent, .. }
            | Self::Add { silent, .. }
            | Self::Copy { silent, .. }
            | Self::Move { silent, .. } => *silent,
            Self::InsertData { .. } | Self::DeleteData { .. } | Self::Modify { .. } => false,
        }
    }
}

/// The dataset of a modify operation, as given by `USING` and `USING NAMED`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UpdateDataset {
    /// The graphs that are merged into the unnamed graph of the `WHERE` clause.
    pub default: Vec<GraphName>,
    /// The graphs that are visible through `GRAPH`. [None] makes all named graphs of the store
    /// visible.
    pub named: Option<Vec<NamedNode>>,
}

impl UpdateDataset {
    /// Creates a dataset whose unnamed graph is the merge of `default`. All named graphs of the
    /// store stay visible.
    pub fn new(default: Vec<GraphName>) -> Self {
        Self {
            default,
            named: None,
        }
    }

    /// Restricts the visible named graphs to `named`.
    #[must_use]
    pub fn with_named_graphs(mut self, named: Vec<NamedNode>) -> Self {
        self.named = Some(named);
        self
    }
}

/// An ordered sequence of update operations.
///
/// ```
/// use rdf_update_engine::sparql::Update;
///
/// let update = Update::parse(
///     "CLEAR SILENT GRAPH <http://example.com/g> ; CREATE GRAPH <http://example.com/g>",
///     None,
/// )?;
/// assert_eq!(update.operations().len(), 2);
/// assert!(update.operations()[0].is_silent());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Update {
    operations: Vec<UpdateOperation>,
    base_iri: Option<Iri<String>>,
}

impl Update {
    /// Creates an [Update] from typed operations.
    pub fn new(operations: Vec<UpdateOperation>) -> Self {
        Self {
            operations,
            base_iri: None,
        }
    }

    /// Parses a SPARQL 1.1 Update.
    ///
    /// `ADD`, `COPY`, and `MOVE` are kept as single operations, such that a missing source graph
    /// is reported. `WITH` is rewritten by the parser into a modify operation whose templates and
    /// pattern are scoped to the graph.
    pub fn parse(update: &str, base_iri: Option<&str>) -> Result<Self, UpdateSyntaxError> {
        let parsed = spargebra::Update::parse(update, base_iri)?;
        let statements = split_statements(update);
        let operations = if statements.iter().any(|s| s.transfer.is_some()) {
            lower_statements(&statements, base_iri)?
        } else {
            lower_operations(&parsed.operations)?
        };
        Ok(Self {
            operations,
            base_iri: parsed.base_iri,
        })
    }

    pub fn operations(&self) -> &[UpdateOperation] {
        &self.operations
    }

    pub fn base_iri(&self) -> Option<&Iri<String>> {
        self.base_iri.as_ref()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl From<Vec<UpdateOperation>> for Update {
    fn from(operations: Vec<UpdateOperation>) -> Self {
        Self::new(operations)
    }
}

impl From<UpdateOperation> for Update {
    fn from(operation: UpdateOperation) -> Self {
        Self::new(vec![operation])
    }
}

impl FromIterator<UpdateOperation> for Update {
    fn from_iter<T: IntoIterator<Item = UpdateOperation>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'update> IntoIterator for &'update Update {
    type Item = &'update UpdateOperation;
    type IntoIter = std::slice::Iter<'update, UpdateOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl FromStr for Update {
    type Err = UpdateSyntaxError;

    fn from_str(update: &str) -> Result<Self, Self::Err> {
        Self::parse(update, None)
    }
}

impl TryFrom<&str> for Update {
    type Error = UpdateSyntaxError;

    fn try_from(update: &str) -> Result<Self, Self::Error> {
        Self::from_str(update)
    }
}

impl TryFrom<&String> for Update {
    type Error = UpdateSyntaxError;

    fn try_from(update: &String) -> Result<Self, Self::Error> {
        Self::from_str(update)
    }
}

impl fmt::Display for UpdateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let silent = if self.is_silent() { " SILENT" } else { "" };
        match self {
            Self::Load {
                source,
                destination,
                ..
            } => match destination {
                GraphName::DefaultGraph => write!(f, "LOAD{silent} {source}"),
                destination => write!(f, "LOAD{silent} {source} INTO GRAPH {destination}"),
            },
            Self::Clear { target, .. } => write!(f, "CLEAR{silent} {target}"),
            Self::Drop { target, .. } => write!(f, "DROP{silent} {target}"),
            Self::Create { graph, .. } => write!(f, "CREATE{silent} GRAPH {graph}"),
            Self::Add {
                source,
                destination,
                ..
            }
            | Self::Copy {
                source,
                destination,
                ..
            }
            | Self::Move {
                source,
                destination,
                ..
            } => write!(
                f,
                "{}{silent} {} TO {}",
                self.name(),
                GraphOrDefault(source),
                GraphOrDefault(destination)
            ),
            Self::InsertData { data } => {
                write!(f, "INSERT DATA {}", GraphPattern::new(data.clone()))
            }
            Self::DeleteData { data } => {
                write!(f, "DELETE DATA {}", GraphPattern::new(data.clone()))
            }
            Self::Modify {
                with,
                delete,
                insert,
                using,
                pattern,
            } => {
                if let Some(with) = with {
                    write!(f, "WITH {with} ")?;
                }
                if !delete.is_empty() {
                    write!(f, "DELETE {} ", GraphPattern::new(delete.clone()))?;
                }
                if !insert.is_empty() {
                    write!(f, "INSERT {} ", GraphPattern::new(insert.clone()))?;
                }
                if let Some(using) = using {
                    for graph in &using.default {
                        write!(f, "USING {} ", GraphOrDefault(graph))?;
                    }
                    for graph in using.named.iter().flatten() {
                        write!(f, "USING NAMED {graph} ")?;
                    }
                }
                write!(f, "WHERE {pattern}")
            }
        }
    }
}

struct GraphOrDefault<'a>(&'a GraphName);

impl fmt::Display for GraphOrDefault<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            GraphName::DefaultGraph => f.write_str("DEFAULT"),
            GraphName::NamedNode(node) => write!(f, "GRAPH {node}"),
            GraphName::BlankNode(node) => write!(f, "GRAPH {node}"),
        }
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(base_iri) = &self.base_iri {
            writeln!(f, "BASE <{base_iri}>")?;
        }
        for (i, operation) in self.operations.iter().enumerate() {
            if i > 0 {
                writeln!(f, " ;")?;
            }
            write!(f, "{operation}")?;
        }
        Ok(())
    }
}

/// Lowers statement by statement, such that graph transfers are not rewritten by spargebra.
fn lower_statements(
    statements: &[Statement<'_>],
    base_iri: Option<&str>,
) -> Result<Vec<UpdateOperation>, UpdateSyntaxError> {
    let mut operations = Vec::with_capacity(statements.len());
    for statement in statements {
        if let Some(transfer) = statement.transfer {
            operations.push(lower_transfer(transfer, &statement.prologue, base_iri)?);
        } else if !statement.body.is_empty() {
            let parsed = spargebra::Update::parse(
                &format!("{}{}", statement.prologue, statement.body),
                base_iri,
            )?;
            operations.extend(lower_operations(&parsed.operations)?);
        }
    }
    Ok(operations)
}

fn lower_transfer(
    transfer: GraphTransfer<'_>,
    prologue: &str,
    base_iri: Option<&str>,
) -> Result<UpdateOperation, UpdateSyntaxError> {
    let silent = transfer.silent;
    let source = resolve_graph_reference(transfer.source, prologue, base_iri)?;
    let destination = resolve_graph_reference(transfer.destination, prologue, base_iri)?;
    Ok(match transfer.kind {
        TransferKind::Add => UpdateOperation::Add {
            silent,
            source,
            destination,
        },
        TransferKind::Copy => UpdateOperation::Copy {
            silent,
            source,
            destination,
        },
        TransferKind::Move => UpdateOperation::Move {
            silent,
            source,
            destination,
        },
    })
}

/// Resolves prefixed names and relative IRIs by letting spargebra parse a `CLEAR` of the graph.
fn resolve_graph_reference(
    reference: GraphReference<'_>,
    prologue: &str,
    base_iri: Option<&str>,
) -> Result<GraphName, UpdateSyntaxError> {
    let GraphReference::Iri(iri) = reference else {
        return Ok(GraphName::DefaultGraph);
    };
    let parsed =
        spargebra::Update::parse(&format!("{prologue}CLEAR SILENT GRAPH {iri}"), base_iri)?;
    match parsed.operations.as_slice() {
        [GraphUpdateOperation::Clear {
            graph: GraphTarget::NamedNode(node),
            ..
        }] => Ok(GraphName::NamedNode(node.clone())),
        _ => Err(UpdateSyntaxError::UnsupportedTerm(iri.to_owned())),
    }
}

fn lower_operations(
    operations: &[GraphUpdateOperation],
) -> Result<Vec<UpdateOperation>, UpdateSyntaxError> {
    operations.iter().map(lower_operation).collect()
}

fn lower_operation(
    operation: &GraphUpdateOperation,
) -> Result<UpdateOperation, UpdateSyntaxError> {
    Ok(match operation {
        GraphUpdateOperation::InsertData { data } => UpdateOperation::InsertData {
            data: data.iter().map(lower_quad).collect::<Result<_, _>>()?,
        },
        GraphUpdateOperation::DeleteData { data } => UpdateOperation::DeleteData {
            data: data.iter().map(lower_ground_quad).collect::<Result<_, _>>()?,
        },
        GraphUpdateOperation::DeleteInsert {
            delete,
            insert,
            using,
            pattern,
        } => UpdateOperation::Modify {
            with: None,
            delete: delete
                .iter()
                .map(lower_ground_quad_pattern)
                .collect::<Result<_, _>>()?,
            insert: insert.clone(),
            using: using.as_ref().map(|using| UpdateDataset {
                default: using
                    .default
                    .iter()
                    .map(|graph| GraphName::NamedNode(graph.clone()))
                    .collect(),
                named: using.named.clone(),
            }),
            pattern: lower_graph_pattern(pattern)?,
        },
        GraphUpdateOperation::Load {
            silent,
            source,
            destination,
        } => UpdateOperation::Load {
            silent: *silent,
            source: source.clone(),
            destination: lower_graph_name(destination),
        },
        GraphUpdateOperation::Clear { silent, graph } => UpdateOperation::Clear {
            silent: *silent,
            target: graph.clone(),
        },
        GraphUpdateOperation::Create { silent, graph } => UpdateOperation::Create {
            silent: *silent,
            graph: graph.clone(),
        },
        GraphUpdateOperation::Drop { silent, graph } => UpdateOperation::Drop {
            silent: *silent,
            target: graph.clone(),
        },
    })
}

/// Lowers a `WHERE` clause. Only conjunctive patterns (basic graph patterns, joins, and `GRAPH`)
/// are supported.
fn lower_graph_pattern(
    pattern: &spargebra::algebra::GraphPattern,
) -> Result<GraphPattern, UpdateSyntaxError> {
    use spargebra::algebra::GraphPattern as Algebra;

    match pattern {
        Algebra::Bgp { patterns } => Ok(GraphPattern::from_triples(patterns.iter().cloned())),
        Algebra::Join { left, right } => {
            Ok(lower_graph_pattern(left)?.join(lower_graph_pattern(right)?))
        }
        Algebra::Graph { name, inner } => {
            let graph_name = match name {
                NamedNodePattern::NamedNode(node) => GraphNamePattern::NamedNode(node.clone()),
                NamedNodePattern::Variable(variable) => {
                    GraphNamePattern::Variable(variable.clone())
                }
            };
            Ok(lower_graph_pattern(inner)?.in_graph(&graph_name))
        }
        pattern => Err(UpdateSyntaxError::UnsupportedPattern(pattern.to_string())),
    }
}

fn lower_graph_name(graph_name: &spargebra::term::GraphName) -> GraphName {
    match graph_name {
        spargebra::term::GraphName::NamedNode(node) => GraphName::NamedNode(node.clone()),
        spargebra::term::GraphName::DefaultGraph => GraphName::DefaultGraph,
    }
}

fn lower_graph_name_pattern(graph_name: &spargebra::term::GraphName) -> GraphNamePattern {
    match graph_name {
        spargebra::term::GraphName::NamedNode(node) => GraphNamePattern::NamedNode(node.clone()),
        spargebra::term::GraphName::DefaultGraph => GraphNamePattern::DefaultGraph,
    }
}

fn lower_quad(quad: &spargebra::term::Quad) -> Result<QuadPattern, UpdateSyntaxError> {
    Ok(QuadPattern {
        subject: lower_subject(&quad.subject)?,
        predicate: NamedNodePattern::NamedNode(quad.predicate.clone()),
        object: lower_term(&quad.object)?,
        graph_name: lower_graph_name_pattern(&quad.graph_name),
    })
}

fn lower_ground_quad(quad: &GroundQuad) -> Result<QuadPattern, UpdateSyntaxError> {
    Ok(QuadPattern {
        subject: lower_ground_subject(&quad.subject)?,
        predicate: NamedNodePattern::NamedNode(quad.predicate.clone()),
        object: lower_ground_term(&quad.object)?,
        graph_name: lower_graph_name_pattern(&quad.graph_name),
    })
}

fn lower_ground_quad_pattern(
    quad: &GroundQuadPattern,
) -> Result<QuadPattern, UpdateSyntaxError> {
    Ok(QuadPattern {
        subject: lower_ground_term_pattern(&quad.subject)?,
        predicate: quad.predicate.clone(),
        object: lower_ground_term_pattern(&quad.object)?,
        graph_name: quad.graph_name.clone(),
    })
}

#[allow(
    unreachable_patterns,
    reason = "Triple terms only exist if RDF-star is enabled"
)]
fn lower_subject(subject: &Subject) -> Result<TermPattern, UpdateSyntaxError> {
    match subject {
        Subject::NamedNode(node) => Ok(TermPattern::NamedNode(node.clone())),
        Subject::BlankNode(node) => Ok(TermPattern::BlankNode(node.clone())),
        subject => Err(UpdateSyntaxError::UnsupportedTerm(subject.to_string())),
    }
}

#[allow(
    unreachable_patterns,
    reason = "Triple terms only exist if RDF-star is enabled"
)]
fn lower_term(term: &Term) -> Result<TermPattern, UpdateSyntaxError> {
    match term {
        Term::NamedNode(node) => Ok(TermPattern::NamedNode(node.clone())),
        Term::BlankNode(node) => Ok(TermPattern::BlankNode(node.clone())),
        Term::Literal(literal) => Ok(TermPattern::Literal(literal.clone())),
        term => Err(UpdateSyntaxError::UnsupportedTerm(term.to_string())),
    }
}

#[allow(
    unreachable_patterns,
    reason = "Triple terms only exist if RDF-star is enabled"
)]
fn lower_ground_subject(subject: &GroundSubject) -> Result<TermPattern, UpdateSyntaxError> {
    match subject {
        GroundSubject::NamedNode(node) => Ok(TermPattern::NamedNode(node.clone())),
        subject => Err(UpdateSyntaxError::UnsupportedTerm(subject.to_string())),
    }
}

#[allow(
    unreachable_patterns,
    reason = "Triple terms only exist if RDF-star is enabled"
)]
fn lower_ground_term(term: &GroundTerm) -> Result<TermPattern, UpdateSyntaxError> {
    match term {
        GroundTerm::NamedNode(node) => Ok(TermPattern::NamedNode(node.clone())),
        GroundTerm::Literal(literal) => Ok(TermPattern::Literal(literal.clone())),
        term => Err(UpdateSyntaxError::UnsupportedTerm(term.to_string())),
    }
}

#[allow(
    unreachable_patterns,
    reason = "Triple terms only exist if RDF-star is enabled"
)]
fn lower_ground_term_pattern(
    term: &GroundTermPattern,
) -> Result<TermPattern, UpdateSyntaxError> {
    match term {
        GroundTermPattern::NamedNode(node) => Ok(TermPattern::NamedNode(node.clone())),
        GroundTermPattern::Literal(literal) => Ok(TermPattern::Literal(literal.clone())),
        GroundTermPattern::Variable(variable) => Ok(TermPattern::Variable(variable.clone())),
        term => Err(UpdateSyntaxError::UnsupportedTerm(term.to_string())),
    }
}
