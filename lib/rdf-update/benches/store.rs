#![allow(clippy::panic)]

use codspeed_criterion_compat::{criterion_group, criterion_main, Criterion};
use rdf_update::model::Term;
use rdf_update::store::Store;
use rdf_update_model::{GraphName, NamedNode, Quad, Subject};

fn store_insert(c: &mut Criterion) {
    c.bench_function("Store::insert", |b| {
        b.iter(|| {
            let store = Store::new();
            for quad in generate_quads(10_000) {
                store.insert(quad.as_ref()).unwrap();
            }
        });
    });
}

fn store_modify(c: &mut Criterion) {
    let store = Store::new();
    store.extend(generate_quads(10_000)).unwrap();
    c.bench_function("Store::update (DELETE/INSERT WHERE)", |b| {
        b.iter(|| {
            store
                .update(
                    "DELETE { ?s ?p ?o } INSERT { GRAPH <http://example.com/g> { ?s ?p ?o } } \
                     WHERE { ?s ?p ?o } ; \
                     MOVE <http://example.com/g> TO DEFAULT",
                )
                .unwrap();
        });
    });
}

criterion_group!(store, store_insert, store_modify);
criterion_main!(store);

fn generate_quads(count: u64) -> impl Iterator<Item = Quad> {
    (0..count).map(|i| {
        let subject = format!("http://example.com/subject{i}");
        let predicate = format!("http://example.com/predicate{i}");
        let object = format!("http://example.com/object{i}");
        Quad::new(
            Subject::NamedNode(NamedNode::new_unchecked(subject)),
            NamedNode::new_unchecked(predicate),
            Term::NamedNode(NamedNode::new_unchecked(object)),
            GraphName::DefaultGraph,
        )
    })
}
