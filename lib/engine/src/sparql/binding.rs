use crate::sparql::error::UpdateEvaluationError;
use rdf_update_model::{Term, Variable, VariableRef};
use std::fmt;
use std::sync::Arc;

/// A mapping from the variables of a graph pattern to terms.
///
/// All bindings of one evaluation share the same variable order. A variable that is not bound is
/// [None]. Two bindings are equal iff they assign the same terms, which collapses duplicates.
///
/// ```
/// use rdf_update_engine::sparql::{DatasetView, PatternMatcher};
/// use rdf_update_model::{GraphPattern, NamedNodeRef, QuadRef, TriplePattern, Variable};
/// use rdf_update_storage::GraphStore;
///
/// let ex = NamedNodeRef::new("http://example.com")?;
/// let mut store = GraphStore::new();
/// store.insert(QuadRef::new(ex, ex, ex, rdf_update_model::GraphNameRef::DefaultGraph))?;
///
/// let pattern = GraphPattern::from_triples([TriplePattern {
///     subject: Variable::new("s")?.into(),
///     predicate: ex.into_owned().into(),
///     object: ex.into_owned().into(),
/// }]);
/// for binding in PatternMatcher::new(&store).evaluate(&pattern, &DatasetView::default())? {
///     assert_eq!(binding?.get("s"), Some(&ex.into_owned().into()));
/// }
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    variables: Arc<[Variable]>,
    values: Vec<Option<Term>>,
}

impl Binding {
    pub(crate) fn new(variables: Arc<[Variable]>, values: Vec<Option<Term>>) -> Self {
        Self { variables, values }
    }

    /// Returns the term bound to `variable`.
    ///
    /// Accepts a variable name (`"s"`), a [Variable], or a variable index.
    #[inline]
    pub fn get(&self, variable: impl VariableLookup) -> Option<&Term> {
        self.values
            .get(variable.index(&self.variables)?)
            .and_then(Option::as_ref)
    }

    /// Returns the variables of the binding in pattern order.
    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Returns the values in the same order as [Binding::variables].
    #[inline]
    pub fn values(&self) -> &[Option<Term>] {
        &self.values
    }

    /// Returns the bound variables together with their terms.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.variables
            .iter()
            .zip(&self.values)
            .filter_map(|(variable, value)| Some((variable, value.as_ref()?)))
    }

    pub fn len(&self) -> usize {
        self.values.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (variable, term)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {variable} = {term}")?;
        }
        f.write_str(" }")
    }
}

/// A way to identify a variable of a [Binding].
pub trait VariableLookup {
    fn index(self, variables: &[Variable]) -> Option<usize>;
}

impl VariableLookup for usize {
    #[inline]
    fn index(self, _: &[Variable]) -> Option<usize> {
        Some(self)
    }
}

impl VariableLookup for &str {
    #[inline]
    fn index(self, variables: &[Variable]) -> Option<usize> {
        variables.iter().position(|v| v.as_str() == self)
    }
}

impl VariableLookup for VariableRef<'_> {
    #[inline]
    fn index(self, variables: &[Variable]) -> Option<usize> {
        variables.iter().position(|v| v.as_ref() == self)
    }
}

impl VariableLookup for &Variable {
    #[inline]
    fn index(self, variables: &[Variable]) -> Option<usize> {
        self.as_ref().index(variables)
    }
}

/// A lazy iterator over the [Binding]s of a graph pattern.
///
/// The iterator borrows the store, so the store cannot change while bindings are produced.
pub struct BindingIter<'store> {
    variables: Arc<[Variable]>,
    inner: Box<dyn Iterator<Item = Result<Binding, UpdateEvaluationError>> + 'store>,
}

impl<'store> BindingIter<'store> {
    pub(crate) fn new(
        variables: Arc<[Variable]>,
        inner: Box<dyn Iterator<Item = Result<Binding, UpdateEvaluationError>> + 'store>,
    ) -> Self {
        Self { variables, inner }
    }

    /// The variables of the produced bindings.
    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
}

impl Iterator for BindingIter<'_> {
    type Item = Result<Binding, UpdateEvaluationError>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_update_model::{Literal, NamedNode};

    fn binding() -> Binding {
        Binding::new(
            vec![Variable::new_unchecked("s"), Variable::new_unchecked("o")].into(),
            vec![
                Some(NamedNode::new_unchecked("http://e/s").into()),
                None,
            ],
        )
    }

    #[test]
    fn lookup_by_name_index_and_variable() {
        let binding = binding();
        let expected = Term::from(NamedNode::new_unchecked("http://e/s"));

        assert_eq!(binding.get("s"), Some(&expected));
        assert_eq!(binding.get(0), Some(&expected));
        assert_eq!(binding.get(&Variable::new_unchecked("s")), Some(&expected));
        assert_eq!(binding.get("o"), None);
        assert_eq!(binding.get("missing"), None);
        assert_eq!(binding.len(), 1);
    }

    #[test]
    fn display_skips_unbound() {
        let mut binding = binding();
        assert_eq!(binding.to_string(), "{ ?s = <http://e/s> }");

        binding.values[1] = Some(Literal::new_simple_literal("o").into());
        assert_eq!(binding.to_string(), "{ ?s = <http://e/s>, ?o = \"o\" }");
    }
}
