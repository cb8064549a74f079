#![doc(test(attr(deny(warnings))))]

//! Evaluates SPARQL 1.1 Update operations against a [GraphStore](rdf_update_storage::GraphStore).
//!
//! An [Update](sparql::Update) is either parsed from text or assembled from typed
//! [UpdateOperation](sparql::UpdateOperation)s. The [UpdateExecutor](sparql::UpdateExecutor) applies
//! the operations in order, using the [PatternMatcher](sparql::PatternMatcher) to evaluate the
//! `WHERE` clause of modify operations.

pub mod sparql;
