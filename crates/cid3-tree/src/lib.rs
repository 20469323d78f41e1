//! Decision-tree induction: encode, grow, evaluate, persist.
//!
//! Builds classification trees with the Certainty, Entropy, or Gini
//! criterion over mixed discrete/continuous attributes, random-subspace
//! forests trained in parallel via rayon, 10-fold cross-validation, and
//! compressed model persistence. No file parsing lives here.

mod criterion;
mod dataset;
mod domain;
mod error;
mod eval;
mod forest;
mod impute;
mod model;
mod node;
mod predict;
mod report;
mod rules;
mod schema;
mod serialize;
mod threshold;
mod tree;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 13579;

pub use criterion::{Criterion, Score};
pub use dataset::{DataPoint, Dataset, Partition};
pub use domain::{Domain, Domains, MISSING_MARKER, Value};
pub use error::TreeError;
pub use eval::{CrossValidation, CrossValidationResult, FoldModel, N_FOLDS, fold_partition};
pub use forest::{ForestConfig, RandomForest, subspace_size};
pub use impute::Imputation;
pub use model::{Classifier, Model};
pub use node::{Branch, Node, NodeIndex, Split, SplitRule, majority_class};
pub use report::{ErrorReport, TreeStats};
pub use rules::{RuleNode, RuleTest, RuleTree};
pub use schema::{Attribute, AttributeIndex, AttributeKind, Schema};
pub use tree::{DecisionTree, TreeConfig};
