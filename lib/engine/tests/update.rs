use insta::assert_snapshot;
use oxrdfio::RdfFormat;
use rdf_update_engine::sparql::{
    StaticRdfSource, Update, UpdateError, UpdateErrorKind, UpdateExecutor, UpdateOperation,
};
use rdf_update_model::{
    BlankNode, GraphName, GraphNamePattern, GraphNameRef, GraphPattern, GraphTarget, NamedNode,
    NamedNodePattern, Quad, QuadPattern, TermPattern, Variable,
};
use rdf_update_storage::{GraphStore, GraphStoreConfig, MissingGraphPolicy};

fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

fn graph(name: &str) -> GraphName {
    ex(name).into()
}

fn populated_store() -> GraphStore {
    let mut store = GraphStore::new();
    store
        .add_quads(&[
            Quad::new(ex("a"), ex("p"), ex("b"), GraphName::DefaultGraph),
            Quad::new(ex("s1"), ex("p"), ex("o1"), ex("g1")),
            Quad::new(ex("s2"), ex("p"), ex("o2"), ex("g1")),
            Quad::new(ex("old"), ex("p"), ex("old"), ex("g2")),
        ])
        .unwrap();
    store
}

fn execute(store: &mut GraphStore, update: impl Into<Update>) -> Result<(), UpdateError> {
    UpdateExecutor::new(store, &StaticRdfSource::new()).execute(&update.into())
}

fn execute_text(store: &mut GraphStore, update: &str) -> Result<(), UpdateError> {
    execute(store, Update::parse(update, None).unwrap())
}

fn dump(store: &GraphStore) -> String {
    let mut lines = store
        .quads()
        .map(|quad| quad.map(|quad| quad.to_string()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    lines.sort();
    lines.join("\n")
}

#[test]
fn add_is_superset_and_idempotent() {
    let mut store = populated_store();
    let source_before = store.graph(GraphNameRef::NamedNode(ex("g1").as_ref())).unwrap();
    let add = UpdateOperation::Add {
        silent: false,
        source: graph("g1"),
        destination: graph("g2"),
    };

    execute(&mut store, add.clone()).unwrap();
    let after_first = store.graph(graph("g2").as_ref()).unwrap();
    execute(&mut store, add).unwrap();
    let after_second = store.graph(graph("g2").as_ref()).unwrap();

    for triple in &source_before {
        assert!(after_first.contains(triple));
    }
    assert_eq!(after_first.len(), 3);
    assert_eq!(after_first, after_second);
    assert_eq!(store.graph(graph("g1").as_ref()).unwrap(), source_before);
}

#[test]
fn add_missing_source_fails_unless_silent() {
    let mut store = populated_store();
    let add = |silent| UpdateOperation::Add {
        silent,
        source: graph("missing"),
        destination: graph("g2"),
    };

    let error = execute(&mut store, add(false)).unwrap_err();
    assert_eq!(error.kind(), Some(UpdateErrorKind::GraphNotFound));
    assert_eq!(error.index(), Some(0));

    execute(&mut store, add(true)).unwrap();
    assert_eq!(store.len(), 4);
}

#[test]
fn copy_and_move_missing_source_fail_unless_silent() {
    let operations: [fn(bool) -> UpdateOperation; 2] = [
        |silent| UpdateOperation::Copy {
            silent,
            source: graph("missing"),
            destination: graph("g2"),
        },
        |silent| UpdateOperation::Move {
            silent,
            source: graph("missing"),
            destination: graph("g2"),
        },
    ];

    for operation in operations {
        let mut store = populated_store();
        let before = dump(&store);

        let error = execute(&mut store, operation(false)).unwrap_err();
        assert_eq!(error.kind(), Some(UpdateErrorKind::GraphNotFound));
        assert_eq!(error.index(), Some(0));
        assert_eq!(dump(&store), before);

        execute(&mut store, operation(true)).unwrap();
        assert_eq!(dump(&store), before);
        assert!(store.has_graph(ex("g2").as_ref()));
    }
}

#[test]
fn parsed_transfer_from_missing_source_leaves_destination() {
    for keyword in ["ADD", "COPY", "MOVE"] {
        let mut store = populated_store();
        let before = dump(&store);

        let update = format!(
            "{keyword} GRAPH <http://example.com/missing> TO GRAPH <http://example.com/g2>"
        );
        let error = execute_text(&mut store, &update).unwrap_err();
        assert_eq!(error.kind(), Some(UpdateErrorKind::GraphNotFound), "{keyword}");
        assert_eq!(error.index(), Some(0), "{keyword}");
        assert_eq!(dump(&store), before, "{keyword}");

        let update =
            format!("{keyword} SILENT <http://example.com/missing> TO <http://example.com/g2>");
        execute_text(&mut store, &update).unwrap();
        assert_eq!(dump(&store), before, "{keyword}");
        assert!(store.has_graph(ex("g2").as_ref()), "{keyword}");
    }
}

#[test]
fn parsed_copy_from_empty_graph_keeps_destination() {
    let mut store = populated_store();

    execute_text(
        &mut store,
        "CREATE GRAPH <http://example.com/empty> ; \
         COPY <http://example.com/empty> TO <http://example.com/g2>",
    )
    .unwrap();

    assert!(store.has_graph(ex("g2").as_ref()));
    assert!(store.graph(graph("g2").as_ref()).unwrap().is_empty());
    assert!(store.has_graph(ex("empty").as_ref()));
}

#[test]
fn copy_replaces_destination() {
    let mut store = populated_store();
    let source_before = store.graph(graph("g1").as_ref()).unwrap();

    execute(
        &mut store,
        UpdateOperation::Copy {
            silent: false,
            source: graph("g1"),
            destination: graph("g2"),
        },
    )
    .unwrap();

    assert_eq!(store.graph(graph("g2").as_ref()).unwrap(), source_before);
    assert_eq!(store.graph(graph("g1").as_ref()).unwrap(), source_before);
}

#[test]
fn copy_to_itself_is_noop() {
    let mut store = populated_store();
    let before = dump(&store);

    execute(
        &mut store,
        UpdateOperation::Copy {
            silent: false,
            source: graph("g1"),
            destination: graph("g1"),
        },
    )
    .unwrap();

    assert_eq!(dump(&store), before);
}

#[test]
fn move_named_graph_removes_source() {
    let mut store = populated_store();
    let source_before = store.graph(graph("g1").as_ref()).unwrap();

    execute(
        &mut store,
        UpdateOperation::Move {
            silent: false,
            source: graph("g1"),
            destination: graph("g2"),
        },
    )
    .unwrap();

    assert_eq!(store.graph(graph("g2").as_ref()).unwrap(), source_before);
    assert!(!store.has_graph(ex("g1").as_ref()));
}

#[test]
fn move_default_graph_clears_it() {
    let mut store = populated_store();
    let source_before = store.graph(GraphNameRef::DefaultGraph).unwrap();

    execute(
        &mut store,
        UpdateOperation::Move {
            silent: false,
            source: GraphName::DefaultGraph,
            destination: graph("g3"),
        },
    )
    .unwrap();

    assert_eq!(store.graph(graph("g3").as_ref()).unwrap(), source_before);
    assert!(store.graph(GraphNameRef::DefaultGraph).unwrap().is_empty());
}

#[test]
fn drop_all_removes_named_graphs() {
    let mut store = populated_store();

    execute_text(&mut store, "DROP ALL").unwrap();

    assert!(store.is_empty());
    assert!(store.named_graphs().unwrap().is_empty());
}

#[test]
fn clear_all_keeps_named_graphs() {
    let mut store = populated_store();

    execute_text(&mut store, "CLEAR ALL").unwrap();

    assert!(store.is_empty());
    assert_eq!(store.named_graphs().unwrap(), vec![ex("g1"), ex("g2")]);
}

#[test]
fn variables_in_ground_data_fail_without_mutation() {
    let pattern = QuadPattern {
        subject: TermPattern::Variable(Variable::new_unchecked("x")),
        predicate: NamedNodePattern::NamedNode(ex("p")),
        object: TermPattern::NamedNode(ex("o")),
        graph_name: GraphNamePattern::DefaultGraph,
    };

    for operation in [
        UpdateOperation::InsertData {
            data: vec![pattern.clone()],
        },
        UpdateOperation::DeleteData {
            data: vec![pattern.clone()],
        },
    ] {
        let mut store = populated_store();
        let before = dump(&store);

        let error = execute(&mut store, operation).unwrap_err();

        assert_eq!(error.kind(), Some(UpdateErrorKind::VariableInGroundData));
        assert_eq!(dump(&store), before);
    }
}

#[test]
fn swap_uses_bindings_from_before_mutation() {
    let mut store = GraphStore::new();
    store
        .add_quads(&[Quad::new(ex("a"), ex("p"), ex("b"), GraphName::DefaultGraph)])
        .unwrap();

    execute_text(
        &mut store,
        "PREFIX ex: <http://example.com/> \
         DELETE { ?x ex:p ?y } INSERT { ?y ex:p ?x } WHERE { ?x ex:p ?y }",
    )
    .unwrap();

    assert_snapshot!(
        dump(&store),
        @"<http://example.com/b> <http://example.com/p> <http://example.com/a>"
    );
}

#[test]
fn clear_missing_graph_follows_policy() {
    let mut store = populated_store();
    let before = dump(&store);

    execute_text(&mut store, "CLEAR SILENT GRAPH <http://example.com/missing>").unwrap();
    assert_eq!(dump(&store), before);

    let error = execute_text(&mut store, "CLEAR GRAPH <http://example.com/missing>").unwrap_err();
    assert_eq!(error.kind(), Some(UpdateErrorKind::GraphNotFound));

    let mut store = GraphStore::with_config(
        GraphStoreConfig::new().with_missing_graph_policy(MissingGraphPolicy::Ignore),
    );
    execute_text(&mut store, "CLEAR GRAPH <http://example.com/missing>").unwrap();
}

#[test]
fn load_unreachable_source() {
    let mut store = populated_store();
    let before = dump(&store);

    execute_text(
        &mut store,
        "LOAD SILENT <http://example.com/unreachable> INTO GRAPH <http://example.com/g1>",
    )
    .unwrap();
    assert_eq!(dump(&store), before);

    let error = execute_text(
        &mut store,
        "LOAD <http://example.com/unreachable> INTO GRAPH <http://example.com/g1>",
    )
    .unwrap_err();
    assert_eq!(error.kind(), Some(UpdateErrorKind::SourceUnavailable));
    assert_eq!(dump(&store), before);
}

#[test]
fn load_invalid_document_writes_nothing() {
    let mut store = GraphStore::new();
    let iri = ex("broken");
    let source = StaticRdfSource::new().with_document(
        iri.as_ref(),
        RdfFormat::Turtle,
        "<http://example.com/s> <http://example.com/p> <http://example.com/o> .\n<broken",
    );
    let update = Update::from(UpdateOperation::Load {
        silent: false,
        source: iri,
        destination: GraphName::DefaultGraph,
    });

    let error = UpdateExecutor::new(&mut store, &source)
        .execute(&update)
        .unwrap_err();

    assert_eq!(error.kind(), Some(UpdateErrorKind::ParseError));
    assert!(store.is_empty());
}

#[test]
fn load_into_named_graph() {
    let mut store = GraphStore::new();
    let iri = ex("data");
    let source = StaticRdfSource::new().with_document(
        iri.as_ref(),
        RdfFormat::Turtle,
        "@prefix ex: <http://example.com/> . ex:s ex:p \"one\", \"two\" .",
    );

    UpdateExecutor::new(&mut store, &source)
        .execute(
            &Update::parse(
                "LOAD <http://example.com/data> INTO GRAPH <http://example.com/g>",
                None,
            )
            .unwrap(),
        )
        .unwrap();

    assert_snapshot!(dump(&store), @r#"
    <http://example.com/s> <http://example.com/p> "one" <http://example.com/g>
    <http://example.com/s> <http://example.com/p> "two" <http://example.com/g>
    "#);
}

#[test]
fn create_existing_graph() {
    let mut store = populated_store();

    let error = execute_text(&mut store, "CREATE GRAPH <http://example.com/g1>").unwrap_err();
    assert_eq!(error.kind(), Some(UpdateErrorKind::GraphAlreadyExists));

    execute_text(&mut store, "CREATE SILENT GRAPH <http://example.com/g1>").unwrap();
    execute_text(&mut store, "CREATE GRAPH <http://example.com/new>").unwrap();
    assert!(store.has_graph(ex("new").as_ref()));
}

#[test]
fn failed_operation_keeps_previous_operations() {
    let mut store = GraphStore::new();

    let error = execute_text(
        &mut store,
        "INSERT DATA { <http://example.com/s> <http://example.com/p> 1 } ; \
         DROP GRAPH <http://example.com/missing> ; \
         INSERT DATA { <http://example.com/s> <http://example.com/p> 2 }",
    )
    .unwrap_err();

    assert_eq!(error.index(), Some(1));
    assert_eq!(store.len(), 1);
}

#[test]
fn insert_template_mints_fresh_blank_nodes_per_binding() {
    let mut store = GraphStore::new();
    execute_text(
        &mut store,
        "PREFIX ex: <http://example.com/> INSERT DATA { ex:alice ex:name 'Alice' . ex:bob ex:name 'Bob' }",
    )
    .unwrap();

    execute_text(
        &mut store,
        "PREFIX ex: <http://example.com/> \
         INSERT { _:card ex:owner ?person } WHERE { ?person ex:name ?name }",
    )
    .unwrap();

    let cards = store
        .quads_for_pattern(None, Some(ex("owner").as_ref()), None, None)
        .map(|quad| quad.map(|quad| quad.subject))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(cards.len(), 2);
    assert_ne!(cards[0], cards[1]);
}

#[test]
fn insert_data_blank_nodes_are_renamed_per_operation() {
    let mut store = GraphStore::new();
    let update = "PREFIX ex: <http://example.com/> INSERT DATA { _:b ex:p ex:o }";

    execute_text(&mut store, update).unwrap();
    execute_text(&mut store, update).unwrap();

    assert_eq!(store.len(), 2);
}

#[test]
fn delete_template_with_blank_node_is_malformed() {
    let mut store = populated_store();
    let pattern = QuadPattern {
        subject: TermPattern::BlankNode(BlankNode::new_unchecked("b")),
        predicate: NamedNodePattern::NamedNode(ex("p")),
        object: TermPattern::Variable(Variable::new_unchecked("o")),
        graph_name: GraphNamePattern::DefaultGraph,
    };

    let error = execute(
        &mut store,
        UpdateOperation::Modify {
            with: None,
            delete: vec![pattern],
            insert: Vec::new(),
            using: None,
            pattern: GraphPattern::default(),
        },
    )
    .unwrap_err();

    assert_eq!(error.kind(), Some(UpdateErrorKind::MalformedOperation));
}

#[test]
fn with_scopes_templates_and_where_clause() {
    let mut store = populated_store();

    execute_text(
        &mut store,
        "PREFIX ex: <http://example.com/> \
         WITH ex:g1 DELETE { ?s ex:p ?o } INSERT { ?s ex:q ?o } WHERE { ?s ex:p ?o }",
    )
    .unwrap();

    assert_snapshot!(dump(&store), @r"
    <http://example.com/a> <http://example.com/p> <http://example.com/b>
    <http://example.com/old> <http://example.com/p> <http://example.com/old> <http://example.com/g2>
    <http://example.com/s1> <http://example.com/q> <http://example.com/o1> <http://example.com/g1>
    <http://example.com/s2> <http://example.com/q> <http://example.com/o2> <http://example.com/g1>
    ");
}

#[test]
fn using_replaces_unnamed_graph_of_where_clause() {
    let mut store = populated_store();

    execute_text(
        &mut store,
        "PREFIX ex: <http://example.com/> \
         INSERT { ?s ex:seen true } USING ex:g2 WHERE { ?s ex:p ?o }",
    )
    .unwrap();

    let seen = store
        .quads_for_pattern(None, Some(ex("seen").as_ref()), None, None)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].subject, ex("old").into());
    assert_eq!(seen[0].graph_name, GraphName::DefaultGraph);
}

#[test]
fn delete_where_removes_matches_from_named_graphs() {
    let mut store = populated_store();

    execute_text(
        &mut store,
        "PREFIX ex: <http://example.com/> DELETE WHERE { GRAPH ?g { ?s ex:p ?o } }",
    )
    .unwrap();

    assert_eq!(
        dump(&store),
        "<http://example.com/a> <http://example.com/p> <http://example.com/b>"
    );
}

#[test]
fn drop_default_only_clears_it() {
    let mut store = populated_store();

    execute(
        &mut store,
        UpdateOperation::Drop {
            silent: false,
            target: GraphTarget::DefaultGraph,
        },
    )
    .unwrap();

    assert!(store.graph(GraphNameRef::DefaultGraph).unwrap().is_empty());
    assert_eq!(store.len(), 3);
}
