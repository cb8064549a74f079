//! Utilities to read and write RDF graphs and datasets using [OxRDF I/O](https://crates.io/crates/oxrdfio).
//!
//! The entry points of this module are the two [`RdfParser`] and [`RdfSerializer`] structs.

pub use oxrdfio::{RdfFormat, RdfParseError, RdfParser, RdfSerializer, RdfSyntaxError};
