//! Subscript representation for einsum notation.

use core::fmt;

use smallvec::SmallVec;

/// Inline storage for the labels of one tensor.
pub type Labels = SmallVec<[char; 8]>;

/// A single index in an einsum subscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    /// A named index (any alphabetic character).
    Named(char),
    /// Ellipsis representing zero or more batch dimensions.
    Ellipsis,
}

impl Index {
    /// Returns the character if this is a named index.
    #[inline]
    pub fn as_char(&self) -> Option<char> {
        match self {
            Index::Named(c) => Some(*c),
            Index::Ellipsis => None,
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Named(c) => write!(f, "{}", c),
            Index::Ellipsis => write!(f, "..."),
        }
    }
}

/// The indices of a single tensor.
///
/// For example, in `ij,jk->ik`, the subscripts are `ij`, `jk`, and `ik`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscript {
    indices: SmallVec<[Index; 8]>,
    ellipsis_pos: Option<usize>,
    explicit_count: usize,
}

impl Subscript {
    /// Creates an empty subscript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a subscript from a sequence of named labels.
    pub fn from_chars(chars: impl IntoIterator<Item = char>) -> Self {
        let mut subscript = Self::new();
        for c in chars {
            subscript.push_named(c);
        }
        subscript
    }

    /// Adds a named index.
    pub fn push_named(&mut self, c: char) {
        self.indices.push(Index::Named(c));
        self.explicit_count += 1;
    }

    /// Adds an ellipsis. A second ellipsis is ignored.
    pub fn push_ellipsis(&mut self) {
        if self.ellipsis_pos.is_none() {
            self.ellipsis_pos = Some(self.indices.len());
            self.indices.push(Index::Ellipsis);
        }
    }

    #[inline]
    pub fn has_ellipsis(&self) -> bool {
        self.ellipsis_pos.is_some()
    }

    /// Returns the number of explicit (non-ellipsis) indices.
    #[inline]
    pub fn explicit_count(&self) -> usize {
        self.explicit_count
    }

    /// Returns the total number of index entries (including ellipsis as 1).
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Index> {
        self.indices.iter()
    }

    /// Returns an iterator over named indices only (excluding ellipsis).
    pub fn named_indices(&self) -> impl Iterator<Item = char> + '_ {
        self.indices.iter().filter_map(|i| i.as_char())
    }

    /// Collects the named indices into inline label storage.
    pub fn labels(&self) -> Labels {
        self.named_indices().collect()
    }

    pub fn contains(&self, c: char) -> bool {
        self.named_indices().any(|x| x == c)
    }

    /// Counts occurrences of a named index.
    pub fn count(&self, c: char) -> usize {
        self.named_indices().filter(|&x| x == c).count()
    }

    /// Replaces the ellipsis with explicit batch indices.
    ///
    /// The result never contains an ellipsis.
    pub fn expand_ellipsis(&self, batch_indices: &[char]) -> Subscript {
        let mut expanded = Subscript::new();
        for idx in &self.indices {
            match idx {
                Index::Ellipsis => batch_indices.iter().for_each(|&c| expanded.push_named(c)),
                Index::Named(c) => expanded.push_named(*c),
            }
        }
        expanded
    }
}

impl fmt::Display for Subscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for idx in &self.indices {
            write!(f, "{}", idx)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Subscript {
    type Item = &'a Index;
    type IntoIter = core::slice::Iter<'a, Index>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter()
    }
}
