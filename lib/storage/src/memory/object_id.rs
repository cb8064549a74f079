use crate::index::EncodedTerm;
use std::fmt::{Display, Formatter};

/// The object id is a 32-bit unsigned integer used to uniquely identify an interned RDF term.
///
/// # Default Graph
///
/// The default graph is represented by the [DEFAULT_GRAPH_ID]. No term is ever assigned this id.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub struct ObjectId(u32);

/// The id of the default graph.
pub const DEFAULT_GRAPH_ID: ObjectId = ObjectId(0);

impl ObjectId {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the next id or [None] if the id space is exhausted.
    pub fn next(self) -> Option<ObjectId> {
        self.0.checked_add(1).map(ObjectId)
    }
}

impl EncodedTerm for ObjectId {
    const MIN: Self = ObjectId(0);
    const MAX: Self = ObjectId(u32::MAX);

    fn is_default_graph(&self) -> bool {
        *self == DEFAULT_GRAPH_ID
    }
}

impl From<u32> for ObjectId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
