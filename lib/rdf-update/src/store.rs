//! API to access an in-memory [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset).
//!
//! The entry point of the module is the [`Store`] struct.
//!
//! Usage example:
//! ```
//! use rdf_update::model::*;
//! use rdf_update::store::Store;
//!
//! let store = Store::default();
//!
//! // insertion
//! let ex = NamedNode::new("http://example.com")?;
//! let quad = Quad::new(ex.clone(), ex.clone(), ex.clone(), GraphName::DefaultGraph);
//! store.insert(&quad)?;
//!
//! // quad filter
//! let results = store.quads_for_pattern(None, None, None, None)?;
//! assert_eq!(vec![quad], results);
//!
//! // SPARQL update
//! store.update("DELETE WHERE { ?s ?p ?o }")?;
//! assert!(store.is_empty());
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::error::{LoaderError, SerializerError};
use oxrdfio::{RdfFormat, RdfParser, RdfSerializer};
use rdf_update_engine::sparql::{
    DefaultRdfSource, RdfSource, Update, UpdateError, UpdateExecutor, UpdateOptions,
};
use rdf_update_model::{
    Graph, GraphName, GraphNameRef, GraphTarget, NamedNode, NamedNodeRef, Quad, QuadRef,
    SubjectRef, TermRef,
};
use rdf_update_storage::{GraphStore, GraphStoreConfig, StorageError};
use std::io::{Read, Write};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

/// An [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset) store.
///
/// The store can be updated using [SPARQL 1.1 Update](https://www.w3.org/TR/sparql11-update/).
/// Clones share the same data. A whole update takes the write lock, so concurrent updates are
/// applied one after the other.
///
/// Usage example:
/// ```
/// use rdf_update::model::*;
/// use rdf_update::store::Store;
///
/// let store = Store::default();
/// store.update(
///     "INSERT DATA { GRAPH <http://example.com/g> { <http://example.com> <http://example.com> 1 } } ;
///      COPY <http://example.com/g> TO DEFAULT",
/// )?;
///
/// assert_eq!(store.len(), 2);
/// assert_eq!(store.named_graphs()?, vec![NamedNode::new("http://example.com/g")?]);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<RwLock<GraphStore>>,
    source: Arc<dyn RdfSource + Send + Sync>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates an empty [Store] with the default [GraphStoreConfig].
    pub fn new() -> Store {
        Self::with_config(GraphStoreConfig::default())
    }

    /// Creates an empty [Store] whose graph lifecycle follows `config`.
    ///
    /// ```
    /// use rdf_update::model::NamedNodeRef;
    /// use rdf_update::storage::{EmptyGraphPolicy, GraphStoreConfig};
    /// use rdf_update::store::Store;
    ///
    /// let store = Store::with_config(
    ///     GraphStoreConfig::new().with_empty_graph_policy(EmptyGraphPolicy::Discard),
    /// );
    /// store.update("CREATE GRAPH <http://example.com/g>")?;
    ///
    /// assert!(!store.contains_named_graph(NamedNodeRef::new("http://example.com/g")?));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn with_config(config: GraphStoreConfig) -> Store {
        Self {
            inner: Arc::new(RwLock::new(GraphStore::with_config(config))),
            source: Arc::new(DefaultRdfSource::new()),
        }
    }

    /// Replaces the [RdfSource] that resolves the documents of `LOAD`.
    #[must_use]
    pub fn with_source(mut self, source: impl RdfSource + Send + Sync + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    /// Executes a [SPARQL 1.1 update](https://www.w3.org/TR/sparql11-update/).
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::model::*;
    /// use rdf_update::store::Store;
    ///
    /// let store = Store::default();
    /// // insertion
    /// store.update("INSERT DATA { <http://example.com> <http://example.com> <http://example.com> }")?;
    ///
    /// // we inspect the store contents
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// assert!(store.contains(QuadRef::new(ex, ex, ex, GraphNameRef::DefaultGraph)));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn update(
        &self,
        update: impl TryInto<Update, Error = impl Into<UpdateError>>,
    ) -> Result<(), UpdateError> {
        self.update_opt(update, UpdateOptions::default())
    }

    /// Executes a [SPARQL 1.1 update](https://www.w3.org/TR/sparql11-update/) with some options.
    ///
    /// ```
    /// use rdf_update::model::BlankNodeMatchingMode;
    /// use rdf_update::sparql::UpdateOptions;
    /// use rdf_update::store::Store;
    ///
    /// let store = Store::default();
    /// store.update_opt(
    ///     "INSERT { <http://example.com/s> <http://example.com/p> ?o } WHERE { _:b <http://example.com/p> ?o }",
    ///     UpdateOptions::default().with_blank_node_mode(BlankNodeMatchingMode::Filter),
    /// )?;
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn update_opt(
        &self,
        update: impl TryInto<Update, Error = impl Into<UpdateError>>,
        options: impl Into<UpdateOptions>,
    ) -> Result<(), UpdateError> {
        let update = update.try_into().map_err(Into::into)?;
        let mut store = self.write();
        UpdateExecutor::new(&mut store, self.source.as_ref())
            .with_options(options.into())
            .execute(&update)
    }

    /// Loads a RDF file into the store.
    ///
    /// Blank nodes are renamed such that they do not clash with existing blank nodes. Nothing is
    /// inserted if the file is invalid.
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::io::{RdfFormat, RdfParser};
    /// use rdf_update::model::*;
    /// use rdf_update::store::Store;
    ///
    /// let store = Store::default();
    ///
    /// // insert a dataset file
    /// let file = b"<http://example.com> <http://example.com> <http://example.com> <http://example.com/g> .";
    /// store.load_from_reader(RdfFormat::NQuads, file.as_ref())?;
    ///
    /// // insert a graph file
    /// let file = b"<> <> <> .";
    /// store.load_from_reader(
    ///     RdfParser::from_format(RdfFormat::Turtle)
    ///         .with_base_iri("http://example.com")?
    ///         .without_named_graphs()
    ///         .with_default_graph(NamedNodeRef::new("http://example.com/g2")?),
    ///     file.as_ref()
    /// )?;
    ///
    /// // we inspect the store contents
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// assert!(store.contains(QuadRef::new(ex, ex, ex, NamedNodeRef::new("http://example.com/g")?)));
    /// assert!(store.contains(QuadRef::new(ex, ex, ex, NamedNodeRef::new("http://example.com/g2")?)));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn load_from_reader(
        &self,
        parser: impl Into<RdfParser>,
        reader: impl Read,
    ) -> Result<(), LoaderError> {
        let quads = parser
            .into()
            .rename_blank_nodes()
            .for_reader(reader)
            .collect::<Result<Vec<_>, _>>()?;
        let inserted = self.write().add_quads(&quads)?;
        info!(read = quads.len(), inserted, "Loaded quads into the store");
        Ok(())
    }

    /// Loads a graph file into the graph `to_graph_name`.
    ///
    /// ```
    /// use rdf_update::io::RdfFormat;
    /// use rdf_update::model::*;
    /// use rdf_update::store::Store;
    ///
    /// let store = Store::default();
    /// let g = NamedNodeRef::new("http://example.com/g")?;
    /// store.load_graph(
    ///     "<s> <p> <o> .".as_bytes(),
    ///     RdfFormat::Turtle,
    ///     g,
    ///     Some("http://example.com/"),
    /// )?;
    ///
    /// assert_eq!(store.graph(g)?.len(), 1);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn load_graph<'a>(
        &self,
        reader: impl Read,
        format: RdfFormat,
        to_graph_name: impl Into<GraphNameRef<'a>>,
        base_iri: Option<&str>,
    ) -> Result<(), LoaderError> {
        let mut parser = RdfParser::from_format(format)
            .without_named_graphs()
            .with_default_graph(to_graph_name.into().into_owned());
        if let Some(base_iri) = base_iri {
            parser = parser
                .with_base_iri(base_iri)
                .map_err(|error| LoaderError::InvalidBaseIri {
                    iri: base_iri.into(),
                    error,
                })?;
        }
        self.load_from_reader(parser, reader)
    }

    /// Retrieves quads with a filter on each quad component.
    ///
    /// The result is a snapshot. Later changes of the store are not reflected.
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::model::*;
    /// use rdf_update::store::Store;
    ///
    /// let store = Store::default();
    ///
    /// // insertion
    /// let ex = NamedNode::new("http://example.com")?;
    /// let quad = Quad::new(ex.clone(), ex.clone(), ex.clone(), GraphName::DefaultGraph);
    /// store.insert(&quad)?;
    ///
    /// // quad filter by object
    /// let results = store.quads_for_pattern(None, None, Some((&ex).into()), None)?;
    /// assert_eq!(vec![quad], results);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn quads_for_pattern(
        &self,
        subject: Option<SubjectRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph_name: Option<GraphNameRef<'_>>,
    ) -> Result<Vec<Quad>, StorageError> {
        self.read()
            .quads_for_pattern(subject, predicate, object, graph_name)
            .collect()
    }

    /// Returns all the quads contained in the store.
    pub fn quads(&self) -> Result<Vec<Quad>, StorageError> {
        self.quads_for_pattern(None, None, None, None)
    }

    /// Returns the triples of a graph. A missing named graph yields an empty graph.
    pub fn graph<'a>(&self, graph_name: impl Into<GraphNameRef<'a>>) -> Result<Graph, StorageError> {
        self.read().graph(graph_name.into())
    }

    /// Checks if this store contains a given quad.
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::model::*;
    /// use rdf_update::store::Store;
    ///
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// let quad = QuadRef::new(ex, ex, ex, ex);
    ///
    /// let store = Store::default();
    /// assert!(!store.contains(quad));
    ///
    /// store.insert(quad)?;
    /// assert!(store.contains(quad));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn contains<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        self.read().contains(quad.into())
    }

    /// Returns the number of quads in the store.
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::model::*;
    /// use rdf_update::store::Store;
    ///
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// let store = Store::default();
    /// store.insert(QuadRef::new(ex, ex, ex, ex))?;
    /// store.insert(QuadRef::new(ex, ex, ex, GraphNameRef::DefaultGraph))?;
    /// assert_eq!(2, store.len());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns if the store is empty. Empty named graphs do not count.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Adds a quad to this store.
    ///
    /// Returns `true` if the quad was not already in the store.
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::model::*;
    /// use rdf_update::store::Store;
    ///
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// let quad = QuadRef::new(ex, ex, ex, GraphNameRef::DefaultGraph);
    ///
    /// let store = Store::default();
    /// assert!(store.insert(quad)?);
    /// assert!(!store.insert(quad)?);
    ///
    /// assert!(store.contains(quad));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn insert<'a>(&self, quad: impl Into<QuadRef<'a>>) -> Result<bool, StorageError> {
        self.write().insert(quad.into())
    }

    /// Atomically adds a set of quads to this store.
    ///
    /// Returns the number of quads that were not already in the store.
    pub fn extend(
        &self,
        quads: impl IntoIterator<Item = impl Into<Quad>>,
    ) -> Result<usize, StorageError> {
        let quads = quads.into_iter().map(Into::into).collect::<Vec<_>>();
        self.write().add_quads(&quads)
    }

    /// Removes a quad from this store.
    ///
    /// Returns `true` if the quad was in the store and has been removed.
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::model::*;
    /// use rdf_update::store::Store;
    ///
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// let quad = QuadRef::new(ex, ex, ex, GraphNameRef::DefaultGraph);
    ///
    /// let store = Store::default();
    /// store.insert(quad)?;
    /// assert!(store.remove(quad)?);
    /// assert!(!store.remove(quad)?);
    ///
    /// assert!(!store.contains(quad));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn remove<'a>(&self, quad: impl Into<QuadRef<'a>>) -> Result<bool, StorageError> {
        self.write().remove(quad.into())
    }

    /// Dumps the store into a file.
    ///
    /// ```
    /// use rdf_update::io::RdfFormat;
    /// use rdf_update::store::Store;
    ///
    /// let file =
    ///     "<http://example.com> <http://example.com> <http://example.com> <http://example.com> .\n"
    ///         .as_bytes();
    ///
    /// let store = Store::default();
    /// store.load_from_reader(RdfFormat::NQuads, file)?;
    ///
    /// let buffer = store.dump_to_writer(RdfFormat::NQuads, Vec::new())?;
    /// assert_eq!(file, buffer.as_slice());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn dump_to_writer<W: Write>(
        &self,
        serializer: impl Into<RdfSerializer>,
        writer: W,
    ) -> Result<W, SerializerError> {
        let serializer = serializer.into();
        if !serializer.format().supports_datasets() {
            return Err(SerializerError::DatasetFormatExpected(serializer.format()));
        }
        let mut serializer = serializer.for_writer(writer);
        for quad in self.quads()? {
            serializer.serialize_quad(&quad)?;
        }
        Ok(serializer.finish()?)
    }

    /// Dumps a store graph into a file.
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::io::RdfFormat;
    /// use rdf_update::model::*;
    /// use rdf_update::store::Store;
    ///
    /// let file = "<http://example.com> <http://example.com> <http://example.com> .\n".as_bytes();
    ///
    /// let store = Store::default();
    /// store.load_from_reader(RdfFormat::NTriples, file)?;
    ///
    /// let mut buffer = Vec::new();
    /// store.dump_graph_to_writer(GraphNameRef::DefaultGraph, RdfFormat::NTriples, &mut buffer)?;
    /// assert_eq!(file, buffer.as_slice());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn dump_graph_to_writer<'a, W: Write>(
        &self,
        from_graph_name: impl Into<GraphNameRef<'a>>,
        serializer: impl Into<RdfSerializer>,
        writer: W,
    ) -> Result<W, SerializerError> {
        let mut serializer = serializer.into().for_writer(writer);
        for triple in &self.graph(from_graph_name)? {
            serializer.serialize_triple(triple)?;
        }
        Ok(serializer.finish()?)
    }

    /// Returns all the store named graphs, sorted by IRI.
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::model::*;
    /// use rdf_update::store::Store;
    ///
    /// let ex = NamedNode::new("http://example.com")?;
    /// let store = Store::default();
    /// store.insert(QuadRef::new(&ex, &ex, &ex, &ex))?;
    /// store.insert(QuadRef::new(&ex, &ex, &ex, GraphNameRef::DefaultGraph))?;
    /// assert_eq!(vec![ex], store.named_graphs()?);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn named_graphs(&self) -> Result<Vec<NamedNode>, StorageError> {
        self.read().named_graphs()
    }

    /// Checks if the store contains a given graph.
    pub fn contains_named_graph<'a>(&self, graph_name: impl Into<NamedNodeRef<'a>>) -> bool {
        self.read().has_graph(graph_name.into())
    }

    /// Inserts an empty graph into this store.
    ///
    /// Returns `true` if the graph was not already in the store.
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::model::NamedNodeRef;
    /// use rdf_update::store::Store;
    ///
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// let store = Store::default();
    /// assert!(store.insert_named_graph(ex)?);
    /// assert!(!store.insert_named_graph(ex)?);
    ///
    /// assert_eq!(store.named_graphs()?, vec![ex.into_owned()]);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn insert_named_graph<'a>(
        &self,
        graph_name: impl Into<NamedNodeRef<'a>>,
    ) -> Result<bool, StorageError> {
        match self.write().create_graph(graph_name.into()) {
            Ok(()) => Ok(true),
            Err(StorageError::GraphAlreadyExists(_)) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Clears a graph from this store. Named graphs stay registered.
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::model::{NamedNodeRef, QuadRef};
    /// use rdf_update::store::Store;
    ///
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// let quad = QuadRef::new(ex, ex, ex, ex);
    /// let store = Store::default();
    /// store.insert(quad)?;
    /// assert_eq!(1, store.len());
    ///
    /// store.clear_graph(ex)?;
    /// assert!(store.is_empty());
    /// assert_eq!(1, store.named_graphs()?.len());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn clear_graph<'a>(
        &self,
        graph_name: impl Into<GraphNameRef<'a>>,
    ) -> Result<(), StorageError> {
        let target = match graph_name.into().into_owned() {
            GraphName::NamedNode(node) => GraphTarget::NamedNode(node),
            GraphName::DefaultGraph => GraphTarget::DefaultGraph,
            GraphName::BlankNode(node) => return Err(StorageError::BlankNodeGraphName(node)),
        };
        self.write().clear(&target)?;
        Ok(())
    }

    /// Removes a graph from this store.
    ///
    /// Returns `true` if the graph was in the store and has been removed.
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::model::{NamedNodeRef, QuadRef};
    /// use rdf_update::store::Store;
    ///
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// let quad = QuadRef::new(ex, ex, ex, ex);
    /// let store = Store::default();
    /// store.insert(quad)?;
    /// assert_eq!(1, store.len());
    ///
    /// assert!(store.remove_named_graph(ex)?);
    /// assert!(store.is_empty());
    /// assert_eq!(0, store.named_graphs()?.len());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn remove_named_graph<'a>(
        &self,
        graph_name: impl Into<NamedNodeRef<'a>>,
    ) -> Result<bool, StorageError> {
        let graph_name = graph_name.into();
        let mut store = self.write();
        if !store.has_graph(graph_name) {
            return Ok(false);
        }
        store.drop_graph(graph_name)?;
        Ok(true)
    }

    /// Clears the store, including all named graphs.
    ///
    /// Usage example:
    /// ```
    /// use rdf_update::model::*;
    /// use rdf_update::store::Store;
    ///
    /// let ex = NamedNodeRef::new("http://example.com")?;
    /// let store = Store::default();
    /// store.insert(QuadRef::new(ex, ex, ex, ex))?;
    /// store.insert(QuadRef::new(ex, ex, ex, GraphNameRef::DefaultGraph))?;
    /// assert_eq!(2, store.len());
    ///
    /// store.clear()?;
    /// assert!(store.is_empty());
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn clear(&self) -> Result<(), StorageError> {
        self.write().drop_graphs(&GraphTarget::AllGraphs)?;
        Ok(())
    }

    /// Validates that all the store invariants hold in the data storage
    pub fn validate(&self) -> Result<(), StorageError> {
        self.read().validate()
    }

    /// The graph store is never left half-mutated by a panic, so a poisoned lock is recovered.
    fn read(&self) -> RwLockReadGuard<'_, GraphStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use rdf_update_model::{BlankNode, Literal, Subject, Term};
    use std::collections::HashSet;

    #[test]
    fn test_send_sync() {
        fn is_send_sync<T: Send + Sync>() {}
        is_send_sync::<Store>();
    }

    #[test]
    fn test_clones_share_data() -> Result<(), StorageError> {
        let store = Store::default();
        let ex = NamedNodeRef::new_unchecked("http://example.com");

        store.clone().insert(QuadRef::new(ex, ex, ex, GraphNameRef::DefaultGraph))?;

        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[test]
    fn test_blank_node_graph_name_is_rejected() {
        let store = Store::default();
        let ex = NamedNodeRef::new_unchecked("http://example.com");
        let graph = GraphName::BlankNode(BlankNode::default());

        let result = store.insert(QuadRef::new(ex, ex, ex, graph.as_ref()));

        assert!(matches!(result, Err(StorageError::BlankNodeGraphName(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn store() -> Result<(), StorageError> {
        let main_s = Subject::from(BlankNode::default());
        let main_p = NamedNode::new_unchecked("http://example.com");
        let main_o = Term::from(Literal::from(1));
        let main_g = GraphName::from(NamedNode::new_unchecked("http://example.com/g"));

        let default_quad = Quad::new(
            main_s.clone(),
            main_p.clone(),
            main_o.clone(),
            GraphName::DefaultGraph,
        );
        let named_quad = Quad::new(
            main_s.clone(),
            main_p.clone(),
            main_o.clone(),
            main_g.clone(),
        );
        let default_quads = vec![
            Quad::new(
                main_s.clone(),
                main_p.clone(),
                Literal::from(0),
                GraphName::DefaultGraph,
            ),
            default_quad.clone(),
            Quad::new(
                main_s.clone(),
                main_p.clone(),
                Literal::from(200_000_000),
                GraphName::DefaultGraph,
            ),
        ];

        let store = Store::default();
        for quad in &default_quads {
            assert!(store.insert(quad)?);
        }
        assert!(store.insert(&named_quad)?);
        assert!(!store.insert(&default_quad)?);

        assert_eq!(store.len(), 4);
        assert_eq!(
            store
                .quads_for_pattern(None, None, None, Some(GraphNameRef::DefaultGraph))?
                .into_iter()
                .collect::<HashSet<_>>(),
            default_quads.iter().cloned().collect::<HashSet<_>>()
        );
        assert_eq!(
            store.quads_for_pattern(
                Some(main_s.as_ref()),
                Some(main_p.as_ref()),
                Some(main_o.as_ref()),
                None
            )?
            .len(),
            2
        );
        assert_eq!(
            store.quads_for_pattern(None, None, None, Some(main_g.as_ref()))?,
            vec![named_quad.clone()]
        );

        assert!(store.remove(&named_quad)?);
        assert!(!store.remove(&named_quad)?);
        assert!(store.contains_named_graph(NamedNodeRef::new_unchecked("http://example.com/g")));
        store.validate()?;
        Ok(())
    }
}
