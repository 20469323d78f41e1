//! Inference for single trees and forests.

use crate::dataset::DataPoint;
use crate::domain::Domains;
use crate::forest::RandomForest;
use crate::node::{Branch, NodeIndex, SplitRule};
use crate::tree::DecisionTree;

impl DecisionTree {
    /// Walk from the root to the node that classifies `point`.
    ///
    /// A discrete split with no child for the point's code stops at the
    /// split node itself, as does a continuous split whose reading cannot
    /// be decoded.
    #[must_use]
    pub fn descend(&self, point: &DataPoint, domains: &Domains) -> NodeIndex {
        let mut current = self.root();
        while let Some(split) = self.node(current).split() {
            let code = point.code(split.attribute());
            let next = match split.rule() {
                SplitRule::Discrete => split
                    .children()
                    .iter()
                    .copied()
                    .find(|&c| self.node(c).branch() == Branch::Value(code)),
                SplitRule::Continuous { threshold } => {
                    domains.number(split.attribute(), code).map(|x| {
                        if x <= threshold {
                            split.children()[0]
                        } else {
                            split.children()[1]
                        }
                    })
                }
            };
            match next {
                Some(child) => current = child,
                None => break,
            }
        }
        current
    }

    /// Predicted class code for `point`.
    ///
    /// An empty leaf answers with its parent's majority class.
    #[must_use]
    pub fn predict(&self, point: &DataPoint, domains: &Domains) -> usize {
        let reached = self.node(self.descend(point, domains));
        match reached.parent() {
            Some(parent) if reached.is_empty() => self.node(parent).majority_class(),
            _ => reached.majority_class(),
        }
    }
}

impl RandomForest {
    /// Predicted class code by plurality vote; ties go to the lower code.
    #[must_use]
    pub fn predict(&self, point: &DataPoint, domains: &Domains, n_classes: usize) -> usize {
        let mut votes = vec![0usize; n_classes.max(1)];
        for tree in &self.trees {
            let class = tree.predict(point, domains);
            if class >= votes.len() {
                votes.resize(class + 1, 0);
            }
            votes[class] += 1;
        }
        crate::node::majority_class(&votes)
    }

    /// Return `true` if more members predict `class` than do not.
    #[must_use]
    pub fn votes_correct(&self, point: &DataPoint, class: usize, domains: &Domains) -> bool {
        let correct = self
            .trees
            .iter()
            .filter(|tree| tree.predict(point, domains) == class)
            .count();
        correct > self.trees.len() - correct
    }
}
