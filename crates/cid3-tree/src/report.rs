//! Size and error summaries of fitted models.

use crate::dataset::Dataset;
use crate::forest::RandomForest;
use crate::tree::DecisionTree;

/// Shape summary of a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TreeStats {
    /// Nodes that received at least one training row.
    pub nodes: usize,
    /// Leaves that received at least one training row.
    pub rules: usize,
}

impl TreeStats {
    /// Count the non-empty nodes and leaves of `tree`.
    #[must_use]
    pub fn of(tree: &DecisionTree) -> Self {
        let mut nodes = 0;
        let mut rules = 0;
        for node in tree.nodes().iter().filter(|n| !n.is_empty()) {
            nodes += 1;
            if node.is_leaf() {
                rules += 1;
            }
        }
        Self { nodes, rules }
    }
}

/// Correct and incorrect classifications over a row set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ErrorReport {
    /// Rows classified as their recorded class.
    pub correct: usize,
    /// Rows classified as anything else.
    pub incorrect: usize,
}

impl ErrorReport {
    /// Score `tree` on `rows` of `dataset`.
    #[must_use]
    pub fn tree(tree: &DecisionTree, dataset: &Dataset, rows: &[usize]) -> Self {
        let class = dataset.schema().class_index();
        Self::tally(rows, |row| {
            let point = &dataset.points()[row];
            tree.predict(point, dataset.domains()) == point.code(class)
        })
    }

    /// Score `forest` on `rows`; a row counts as correct when the members
    /// voting for its recorded class outnumber the rest.
    #[must_use]
    pub fn forest(forest: &RandomForest, dataset: &Dataset, rows: &[usize]) -> Self {
        let class = dataset.schema().class_index();
        Self::tally(rows, |row| {
            let point = &dataset.points()[row];
            forest.votes_correct(point, point.code(class), dataset.domains())
        })
    }

    fn tally(rows: &[usize], mut is_correct: impl FnMut(usize) -> bool) -> Self {
        let correct = rows.iter().filter(|&&row| is_correct(row)).count();
        Self {
            correct,
            incorrect: rows.len() - correct,
        }
    }

    /// Number of rows scored.
    #[must_use]
    pub fn total(&self) -> usize {
        self.correct + self.incorrect
    }

    /// Misclassified share in percent; `0.0` for an empty row set.
    #[must_use]
    pub fn error_percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            100.0 * self.incorrect as f64 / total as f64
        }
    }
}
