use crate::tree::{NodeRef, NodeView};
use std::fmt;

/// Result of one evaluation: the root it ran against and the matches in
/// document order.
#[derive(Clone)]
pub struct Match<R = NodeRef, N = NodeRef> {
    pub root: R,
    pub matches: Vec<N>,
}

impl<R, N> Match<R, N> {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, N> {
        self.matches.iter()
    }

    pub fn first(&self) -> Option<&N> {
        self.matches.first()
    }
}

impl<R: NodeView, N: NodeView> Match<R, N> {
    /// Addresses of the matches, the stable way to compare results across queries.
    pub fn addresses(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.to_node().address()).collect()
    }
}

impl<R, N> IntoIterator for Match<R, N> {
    type Item = N;
    type IntoIter = std::vec::IntoIter<N>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

impl<'a, R, N> IntoIterator for &'a Match<R, N> {
    type Item = &'a N;
    type IntoIter = std::slice::Iter<'a, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

impl<R: NodeView, N: NodeView> fmt::Debug for Match<R, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("root", &self.root.to_node().address())
            .field("matches", &self.addresses())
            .finish()
    }
}
