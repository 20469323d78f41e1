use std::fmt;

use crate::criterion::Score;
use crate::schema::AttributeIndex;

/// Index into a `Vec<Node>` arena, identifying a specific node in a decision tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// Create a new node index from a zero-based arena position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The edge from a parent that leads to a node.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Branch {
    /// The tree root has no incoming edge.
    Root,
    /// Rows whose discrete code equals this value.
    Value(usize),
    /// Rows whose continuous reading is `<=` the threshold.
    AtMost(f64),
    /// Rows whose continuous reading is `>` the threshold.
    Above(f64),
}

/// How a decomposed node routes rows to its children.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SplitRule {
    /// One child per known value of a discrete attribute.
    Discrete,
    /// Two children: `<= threshold` first, `> threshold` second.
    Continuous {
        /// Boundary between the two children.
        threshold: f64,
    },
}

/// Decomposition chosen for an internal node.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Split {
    pub(crate) attribute: AttributeIndex,
    pub(crate) rule: SplitRule,
    pub(crate) children: Vec<NodeIndex>,
    pub(crate) score: Score,
}

impl Split {
    /// Attribute the node was decomposed on.
    #[must_use]
    pub fn attribute(&self) -> AttributeIndex {
        self.attribute
    }

    /// Routing rule of the split.
    #[must_use]
    pub fn rule(&self) -> SplitRule {
        self.rule
    }

    /// Children in creation order.
    #[must_use]
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// Criterion value that selected this split.
    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }
}

/// A node in a decision tree arena.
///
/// The parent link is an index, used only to look up the parent's majority
/// class when this node received no training rows.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) branch: Branch,
    pub(crate) class_counts: Vec<usize>,
    pub(crate) split: Option<Split>,
}

impl Node {
    pub(crate) fn new(parent: Option<NodeIndex>, branch: Branch, class_counts: Vec<usize>) -> Self {
        Self {
            parent,
            branch,
            class_counts,
            split: None,
        }
    }

    /// Parent node, absent for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Edge that leads here from the parent.
    #[must_use]
    pub fn branch(&self) -> Branch {
        self.branch
    }

    /// Training rows per class that reached this node.
    #[must_use]
    pub fn class_counts(&self) -> &[usize] {
        &self.class_counts
    }

    /// The decomposition, if this node is internal.
    #[must_use]
    pub fn split(&self) -> Option<&Split> {
        self.split.as_ref()
    }

    /// Return `true` if this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    /// Number of training rows that reached this node.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.class_counts.iter().sum()
    }

    /// Return `true` if no training row reached this node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.class_counts.iter().all(|&c| c == 0)
    }

    /// Most frequent class at this node.
    #[must_use]
    pub fn majority_class(&self) -> usize {
        majority_class(&self.class_counts)
    }
}

/// Index of the largest count; the first index wins ties.
#[must_use]
pub fn majority_class(counts: &[usize]) -> usize {
    let mut best = 0;
    for (i, &count) in counts.iter().enumerate().skip(1) {
        if count > counts[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_index_roundtrip() {
        let ni = NodeIndex::new(42);
        assert_eq!(ni.index(), 42);
        assert_eq!(format!("{ni}"), "42");
    }

    #[test]
    fn majority_prefers_lowest_on_tie() {
        assert_eq!(majority_class(&[2, 5, 5]), 1);
        assert_eq!(majority_class(&[3, 3]), 0);
        assert_eq!(majority_class(&[0, 0, 1]), 2);
        assert_eq!(majority_class(&[]), 0);
    }

    #[test]
    fn empty_node() {
        let node = Node::new(Some(NodeIndex::new(0)), Branch::Value(1), vec![0, 0]);
        assert!(node.is_empty());
        assert!(node.is_leaf());
        assert_eq!(node.n_rows(), 0);
        assert_eq!(node.parent(), Some(NodeIndex::new(0)));
    }

    #[test]
    fn counts_and_majority() {
        let node = Node::new(None, Branch::Root, vec![1, 4, 2]);
        assert_eq!(node.n_rows(), 7);
        assert_eq!(node.majority_class(), 1);
        assert_eq!(node.branch(), Branch::Root);
    }
}
