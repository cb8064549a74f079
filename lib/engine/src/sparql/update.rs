use crate::sparql::algebra::{Update, UpdateDataset, UpdateOperation};
use crate::sparql::binding::Binding;
use crate::sparql::error::{UpdateError, UpdateEvaluationError};
use crate::sparql::matcher::{DatasetView, PatternMatcher};
use crate::sparql::source::RdfSource;
use crate::sparql::UpdateOptions;
use rdf_update_model::{
    BlankNode, GraphName, GraphNamePattern, GraphPattern, GraphTarget, NamedNode,
    NamedNodePattern, Quad, QuadPattern, Subject, Term, TermPattern, TripleRef,
};
use rdf_update_storage::GraphStore;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

/// Applies [Update]s to a [GraphStore].
///
/// Operations are executed strictly in order. Every operation sees the effects of all previous
/// operations. If an operation fails and the failure is not silenced by `SILENT`, the execution
/// stops and the previous operations stay applied.
///
/// ```
/// use rdf_update_engine::sparql::{StaticRdfSource, Update, UpdateExecutor};
/// use rdf_update_storage::GraphStore;
///
/// let mut store = GraphStore::new();
/// let source = StaticRdfSource::new();
/// let update = Update::parse(
///     "INSERT DATA { GRAPH <http://example.com/g> { <http://example.com/s> <http://example.com/p> 1 } }",
///     None,
/// )?;
///
/// UpdateExecutor::new(&mut store, &source).execute(&update)?;
/// assert_eq!(store.len(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct UpdateExecutor<'a> {
    store: &'a mut GraphStore,
    source: &'a dyn RdfSource,
    options: UpdateOptions,
}

impl<'a> UpdateExecutor<'a> {
    /// Creates an executor that mutates `store` and resolves `LOAD` with `source`.
    pub fn new(store: &'a mut GraphStore, source: &'a dyn RdfSource) -> Self {
        Self {
            store,
            source,
            options: UpdateOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: UpdateOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes all operations of `update` in order.
    pub fn execute(&mut self, update: &Update) -> Result<(), UpdateError> {
        for (index, operation) in update.operations().iter().enumerate() {
            debug!(index, operation = operation.name(), "Executing update operation");
            match self.execute_operation(operation) {
                Ok(()) => {}
                Err(error) if operation.is_silent() && error.is_silenceable(operation) => {
                    warn!(
                        index,
                        operation = operation.name(),
                        error = %error,
                        "Ignoring failure of silent operation"
                    );
                }
                Err(error) => return Err(UpdateError::Operation { index, error }),
            }
        }
        Ok(())
    }

    /// Executes a single operation. `SILENT` is not applied.
    ///
    /// Every check of an operation happens before its first write, so a failed operation leaves
    /// the store unchanged.
    pub fn execute_operation(
        &mut self,
        operation: &UpdateOperation,
    ) -> Result<(), UpdateEvaluationError> {
        match operation {
            UpdateOperation::Load {
                source,
                destination,
                ..
            } => self.load(source, destination),
            UpdateOperation::Clear { target, .. } => {
                let removed = self.store.clear(target)?;
                debug!(removed, "Cleared {target}");
                Ok(())
            }
            UpdateOperation::Drop { target, .. } => {
                let removed = self.store.drop_graphs(target)?;
                debug!(removed, "Dropped {target}");
                Ok(())
            }
            UpdateOperation::Create { graph, .. } => {
                self.store.create_graph(graph.as_ref())?;
                Ok(())
            }
            UpdateOperation::Add {
                source,
                destination,
                ..
            } => self.add(source, destination),
            UpdateOperation::Copy {
                source,
                destination,
                ..
            } => self.copy(source, destination),
            UpdateOperation::Move {
                source,
                destination,
                ..
            } => self.move_graph(source, destination),
            UpdateOperation::InsertData { data } => self.insert_data(data),
            UpdateOperation::DeleteData { data } => self.delete_data(data),
            UpdateOperation::Modify {
                with,
                delete,
                insert,
                using,
                pattern,
            } => self.modify(with.as_ref(), delete, insert, using.as_ref(), pattern),
        }
    }

    fn load(
        &mut self,
        source: &NamedNode,
        destination: &GraphName,
    ) -> Result<(), UpdateEvaluationError> {
        check_graph_name(destination)?;
        let triples = self
            .source
            .fetch(source.as_ref())
            .map_err(|error| UpdateEvaluationError::from_source_error(source.clone(), error))?;
        let quads = triples
            .into_iter()
            .map(|triple| triple.in_graph(destination.clone()))
            .collect::<Vec<_>>();
        let inserted = self.store.add_quads(&quads)?;
        info!(source = %source, inserted, "Loaded document");
        Ok(())
    }

    fn add(
        &mut self,
        source: &GraphName,
        destination: &GraphName,
    ) -> Result<(), UpdateEvaluationError> {
        check_graph_name(destination)?;
        self.check_source_exists(source)?;
        if source == destination {
            return Ok(());
        }
        let quads = self
            .store
            .graph(source.as_ref())?
            .iter()
            .map(|triple| triple.in_graph(destination.as_ref()).into_owned())
            .collect::<Vec<_>>();
        self.store.add_quads(&quads)?;
        Ok(())
    }

    fn copy(
        &mut self,
        source: &GraphName,
        destination: &GraphName,
    ) -> Result<(), UpdateEvaluationError> {
        check_graph_name(destination)?;
        self.check_source_exists(source)?;
        if source == destination {
            return Ok(());
        }
        let graph = self.store.graph(source.as_ref())?;
        self.store
            .replace_graph(destination.as_ref(), graph.iter().map(TripleRef::into_owned))?;
        Ok(())
    }

    fn move_graph(
        &mut self,
        source: &GraphName,
        destination: &GraphName,
    ) -> Result<(), UpdateEvaluationError> {
        check_graph_name(destination)?;
        self.check_source_exists(source)?;
        if source == destination {
            return Ok(());
        }
        self.copy(source, destination)?;
        match source {
            GraphName::NamedNode(source) => {
                self.store.drop_graph(source.as_ref())?;
            }
            GraphName::DefaultGraph | GraphName::BlankNode(_) => {
                self.store.clear(&GraphTarget::DefaultGraph)?;
            }
        }
        Ok(())
    }

    fn insert_data(&mut self, data: &[QuadPattern]) -> Result<(), UpdateEvaluationError> {
        let mut blank_nodes = FxHashMap::<BlankNode, BlankNode>::default();
        let quads = data
            .iter()
            .map(|quad| {
                ground_quad(quad, |node| {
                    Ok(blank_nodes.entry(node.clone()).or_default().clone())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let inserted = self.store.add_quads(&quads)?;
        debug!(inserted, "Inserted data");
        Ok(())
    }

    fn delete_data(&mut self, data: &[QuadPattern]) -> Result<(), UpdateEvaluationError> {
        let quads = data
            .iter()
            .map(|quad| {
                ground_quad(quad, |node| {
                    Err(UpdateEvaluationError::malformed(format!(
                        "The blank node {node} is not allowed in DELETE DATA"
                    )))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let removed = self.store.remove_quads(&quads)?;
        debug!(removed, "Deleted data");
        Ok(())
    }

    fn modify(
        &mut self,
        with: Option<&NamedNode>,
        delete: &[QuadPattern],
        insert: &[QuadPattern],
        using: Option<&UpdateDataset>,
        pattern: &GraphPattern,
    ) -> Result<(), UpdateEvaluationError> {
        if let Some(node) = delete.iter().find_map(template_blank_node) {
            return Err(UpdateEvaluationError::malformed(format!(
                "The blank node {node} is not allowed in a DELETE template"
            )));
        }

        let view = DatasetView::for_modify(with, using);
        let bindings = PatternMatcher::new(self.store)
            .with_blank_node_mode(self.options.blank_node_mode)
            .evaluate(pattern, &view)?
            .collect::<Result<Vec<_>, _>>()?;

        let default_graph = with.map_or(GraphName::DefaultGraph, |with| with.clone().into());
        let mut deletions = Vec::new();
        let mut insertions = Vec::new();
        for binding in &bindings {
            deletions.extend(
                delete
                    .iter()
                    .filter_map(|template| {
                        instantiate(template, binding, &default_graph, &mut FxHashMap::default())
                    }),
            );
        }
        for binding in &bindings {
            let mut blank_nodes = FxHashMap::default();
            insertions.extend(insert.iter().filter_map(|template| {
                instantiate(template, binding, &default_graph, &mut blank_nodes)
            }));
        }

        let removed = self.store.remove_quads(&deletions)?;
        let inserted = self.store.add_quads(&insertions)?;
        info!(
            bindings = bindings.len(),
            removed, inserted, "Applied modify operation"
        );
        Ok(())
    }

    /// ADD, COPY, and MOVE require an existing source graph. The default graph always exists.
    fn check_source_exists(&self, source: &GraphName) -> Result<(), UpdateEvaluationError> {
        match source {
            GraphName::NamedNode(source) if self.store.has_graph(source.as_ref()) => Ok(()),
            GraphName::NamedNode(source) => {
                Err(UpdateEvaluationError::GraphNotFound(source.clone()))
            }
            GraphName::DefaultGraph => Ok(()),
            GraphName::BlankNode(_) => check_graph_name(source),
        }
    }
}

fn check_graph_name(graph_name: &GraphName) -> Result<(), UpdateEvaluationError> {
    match graph_name {
        GraphName::BlankNode(node) => Err(UpdateEvaluationError::malformed(format!(
            "The blank node {node} cannot be used as a graph name"
        ))),
        GraphName::NamedNode(_) | GraphName::DefaultGraph => Ok(()),
    }
}

/// Turns a quad of `INSERT DATA` or `DELETE DATA` into a quad of the store. Blank nodes are mapped
/// with `blank_node`.
fn ground_quad(
    quad: &QuadPattern,
    mut blank_node: impl FnMut(&BlankNode) -> Result<BlankNode, UpdateEvaluationError>,
) -> Result<Quad, UpdateEvaluationError> {
    let mut ground_term = |term: &TermPattern| -> Result<Term, UpdateEvaluationError> {
        match term {
            TermPattern::NamedNode(node) => Ok(node.clone().into()),
            TermPattern::BlankNode(node) => Ok(blank_node(node)?.into()),
            TermPattern::Literal(literal) => Ok(literal.clone().into()),
            TermPattern::Variable(variable) => {
                Err(UpdateEvaluationError::VariableInGroundData(variable.clone()))
            }
            #[allow(
                unreachable_patterns,
                reason = "Triple terms only exist if RDF-star is enabled"
            )]
            term => Err(UpdateEvaluationError::malformed(format!(
                "The term {term} is not supported in ground data"
            ))),
        }
    };

    let subject = ground_term(&quad.subject)?;
    let object = ground_term(&quad.object)?;
    let predicate = match &quad.predicate {
        NamedNodePattern::NamedNode(node) => node.clone(),
        NamedNodePattern::Variable(variable) => {
            return Err(UpdateEvaluationError::VariableInGroundData(variable.clone()));
        }
    };
    let graph_name = match &quad.graph_name {
        GraphNamePattern::NamedNode(node) => GraphName::NamedNode(node.clone()),
        GraphNamePattern::DefaultGraph => GraphName::DefaultGraph,
        GraphNamePattern::Variable(variable) => {
            return Err(UpdateEvaluationError::VariableInGroundData(variable.clone()));
        }
    };
    let subject = into_subject(subject).ok_or_else(|| {
        UpdateEvaluationError::malformed(format!(
            "The term {} cannot be used as a subject",
            quad.subject
        ))
    })?;
    Ok(Quad::new(subject, predicate, object, graph_name))
}

/// Instantiates a template for one binding.
///
/// Returns [None] if a variable of the template is unbound or bound to a term that cannot be used
/// in its position (e.g., a literal as subject).
fn instantiate(
    template: &QuadPattern,
    binding: &Binding,
    default_graph: &GraphName,
    blank_nodes: &mut FxHashMap<BlankNode, BlankNode>,
) -> Option<Quad> {
    let mut term = |term: &TermPattern| -> Option<Term> {
        match term {
            TermPattern::NamedNode(node) => Some(node.clone().into()),
            TermPattern::BlankNode(node) => {
                Some(blank_nodes.entry(node.clone()).or_default().clone().into())
            }
            TermPattern::Literal(literal) => Some(literal.clone().into()),
            TermPattern::Variable(variable) => binding.get(variable).cloned(),
            #[allow(
                unreachable_patterns,
                reason = "Triple terms only exist if RDF-star is enabled"
            )]
            _ => None,
        }
    };

    let subject = into_subject(term(&template.subject)?)?;
    let object = term(&template.object)?;
    let predicate = match &template.predicate {
        NamedNodePattern::NamedNode(node) => node.clone(),
        NamedNodePattern::Variable(variable) => match binding.get(variable)? {
            Term::NamedNode(node) => node.clone(),
            _ => return None,
        },
    };
    let graph_name = match &template.graph_name {
        GraphNamePattern::DefaultGraph => default_graph.clone(),
        GraphNamePattern::NamedNode(node) => node.clone().into(),
        GraphNamePattern::Variable(variable) => match binding.get(variable)? {
            Term::NamedNode(node) => node.clone().into(),
            _ => return None,
        },
    };
    Some(Quad::new(subject, predicate, object, graph_name))
}

#[allow(
    unreachable_patterns,
    reason = "Triple terms only exist if RDF-star is enabled"
)]
fn into_subject(term: Term) -> Option<Subject> {
    match term {
        Term::NamedNode(node) => Some(node.into()),
        Term::BlankNode(node) => Some(node.into()),
        _ => None,
    }
}

fn template_blank_node(template: &QuadPattern) -> Option<&BlankNode> {
    [&template.subject, &template.object]
        .into_iter()
        .find_map(|term| match term {
            TermPattern::BlankNode(node) => Some(node),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_update_model::{Literal, Variable};
    use std::sync::Arc;

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    fn binding(values: Vec<(&str, Term)>) -> Binding {
        let variables = values
            .iter()
            .map(|(name, _)| Variable::new_unchecked(*name))
            .collect::<Vec<_>>();
        Binding::new(
            Arc::from(variables),
            values.into_iter().map(|(_, term)| Some(term)).collect(),
        )
    }

    fn template(subject: TermPattern, graph_name: GraphNamePattern) -> QuadPattern {
        QuadPattern {
            subject,
            predicate: ex("p").into(),
            object: TermPattern::Variable(Variable::new_unchecked("o")),
            graph_name,
        }
    }

    #[test]
    fn instantiate_unscoped_template_uses_default_graph() {
        let binding = binding(vec![
            ("s", ex("s").into()),
            ("o", Literal::from("o").into()),
        ]);
        let template = template(
            TermPattern::Variable(Variable::new_unchecked("s")),
            GraphNamePattern::DefaultGraph,
        );

        let quad = instantiate(
            &template,
            &binding,
            &ex("with").into(),
            &mut FxHashMap::default(),
        );

        assert_eq!(
            quad,
            Some(Quad::new(ex("s"), ex("p"), Literal::from("o"), ex("with")))
        );
    }

    #[test]
    fn instantiate_skips_unbound_and_ill_typed() {
        let binding = binding(vec![("s", Literal::from("literal").into())]);
        let template = template(
            TermPattern::Variable(Variable::new_unchecked("s")),
            GraphNamePattern::DefaultGraph,
        );

        let quad = instantiate(
            &template,
            &binding,
            &GraphName::DefaultGraph,
            &mut FxHashMap::default(),
        );

        assert_eq!(quad, None);
    }

    #[test]
    fn ground_quad_rejects_variables() {
        let template = template(TermPattern::NamedNode(ex("s")), GraphNamePattern::DefaultGraph);

        let result = ground_quad(&template, |node| Ok(node.clone()));

        assert!(matches!(
            result,
            Err(UpdateEvaluationError::VariableInGroundData(v)) if v.as_str() == "o"
        ));
    }

    #[test]
    fn template_blank_nodes_are_detected() {
        let template = template(
            TermPattern::BlankNode(BlankNode::new_unchecked("b")),
            GraphNamePattern::DefaultGraph,
        );
        assert!(template_blank_node(&template).is_some());
    }
}
