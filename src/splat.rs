use std::ops::Deref;

/// Result of a figure accessor: every matching model, in order.
///
/// Most figures have exactly one x axis, one y grid and so on, so [`single`]
/// covers the common case while the zero and many cases stay explicit.
///
/// [`single`]: Splat::single
#[derive(Clone, Debug, PartialEq)]
pub struct Splat<T>(Vec<T>);

impl<T> Splat<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self(items)
    }

    /// The only match, or `None` when there are zero or several.
    pub fn single(&self) -> Option<&T> {
        match self.0.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn into_single(self) -> Option<T> {
        let mut items = self.0;
        if items.len() == 1 { items.pop() } else { None }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.0
    }

    /// Apply `f` to every match, e.g. to set a label on all axes at once.
    pub fn for_each(self, f: impl FnMut(T)) {
        self.0.into_iter().for_each(f);
    }

    pub fn chain(mut self, other: Splat<T>) -> Self {
        self.0.extend(other.0);
        self
    }
}

impl<T> Deref for Splat<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> IntoIterator for Splat<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T> FromIterator<T> for Splat<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
