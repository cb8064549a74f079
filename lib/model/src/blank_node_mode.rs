/// Defines how a blank node inside a `WHERE` pattern is matched against the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlankNodeMatchingMode {
    /// A blank node is interpreted as a variable that is not part of the resulting bindings.
    #[default]
    Variable,
    /// A blank node is interpreted as a constant filter.
    Filter,
}
