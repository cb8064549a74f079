//! The in-memory implementation of the quad indexes.
mod interned_term;
mod object_id;
mod object_id_mapping;
mod quad_index;

pub use object_id::{DEFAULT_GRAPH_ID, ObjectId};
pub use object_id_mapping::ObjectIdMapping;
pub use quad_index::MemQuadIndex;
