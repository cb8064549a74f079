#![doc(test(attr(deny(warnings))))]

//! Contains the graph store of the RDF update engine.
//!
//! The entry point is the [GraphStore], which holds exactly one default graph and a registry of
//! named graphs. Terms are interned into object ids and quads are kept in multiple sorted
//! permutation indexes, such that any lookup with a bound prefix can be answered with a range scan.

mod config;
mod error;
pub(crate) mod index;
mod memory;
mod store;

pub use config::{EmptyGraphPolicy, GraphStoreConfig, MissingGraphPolicy};
pub use error::{CorruptionError, StorageError};
pub use store::{GraphStore, QuadIter};
