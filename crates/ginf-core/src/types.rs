use std::fmt;

use serde::{Deserialize, Serialize};

/// Unordered vertex pair, stored canonically with `first <= second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge(usize, usize);

impl Edge {
    /// Creates the canonical pair for `{i, j}`.
    pub fn new(i: usize, j: usize) -> Self {
        if i <= j {
            Self(i, j)
        } else {
            Self(j, i)
        }
    }

    /// Smaller endpoint.
    pub fn first(&self) -> usize {
        self.0
    }

    /// Larger endpoint.
    pub fn second(&self) -> usize {
        self.1
    }

    /// Returns `true` for a pair `(v, v)`.
    pub fn is_self_loop(&self) -> bool {
        self.0 == self.1
    }

    /// Returns the endpoints as a tuple.
    pub fn endpoints(&self) -> (usize, usize) {
        (self.0, self.1)
    }
}

impl From<(usize, usize)> for Edge {
    fn from((i, j): (usize, usize)) -> Self {
        Edge::new(i, j)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// Iterates every unordered pair `(i, j)` with `i <= j < size`, in lexicographic order.
pub fn all_pairs(size: usize) -> impl Iterator<Item = Edge> {
    (0..size).flat_map(move |i| (i..size).map(move |j| Edge(i, j)))
}

/// Block label of every vertex.
pub type Labels = Vec<usize>;

/// Hierarchy of label assignments, finest level first.
pub type NestedLabels = Vec<Labels>;
