//! 10-fold cross-validation of trees and forests.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{info, instrument};

use crate::criterion::Criterion;
use crate::dataset::Dataset;
use crate::error::TreeError;
use crate::forest::ForestConfig;
use crate::model::Classifier;
use crate::tree::TreeConfig;

/// Number of cross-validation folds.
pub const N_FOLDS: usize = 10;

/// What each fold trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FoldModel {
    /// One decision tree per fold.
    Tree,
    /// A forest per fold.
    Forest {
        /// Trees per fold forest.
        n_trees: usize,
    },
}

/// Cross-validation configuration.
///
/// # Defaults
///
/// | Parameter   | Default     |
/// |-------------|-------------|
/// | `criterion` | `Certainty` |
/// | `seed`      | 13579       |
/// | `model`     | `Tree`      |
#[derive(Debug, Clone)]
pub struct CrossValidation {
    criterion: Criterion,
    seed: u64,
    model: FoldModel,
}

/// Per-fold held-out errors and their summary.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CrossValidationResult {
    /// Held-out error percentage of each fold.
    pub fold_errors: Vec<f64>,
    /// Held-out rows in each fold.
    pub fold_sizes: Vec<usize>,
    /// Mean of the fold errors.
    pub mean_error: f64,
    /// Population standard deviation of the fold errors over √10.
    pub standard_error: f64,
}

impl CrossValidation {
    /// Create a cross-validation config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: Criterion::Certainty,
            seed: crate::DEFAULT_SEED,
            model: FoldModel::Tree,
        }
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the seed for the shuffle and fold forests.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train a forest of `n_trees` per fold instead of a single tree.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn with_forest(mut self, n_trees: usize) -> Result<Self, TreeError> {
        if n_trees == 0 {
            return Err(TreeError::InvalidTreeCount { n_trees });
        }
        self.model = FoldModel::Forest { n_trees };
        Ok(self)
    }

    /// Return the fold model.
    #[must_use]
    pub fn model(&self) -> FoldModel {
        self.model
    }

    /// Shuffle the training rows once, then train and score one model per fold.
    ///
    /// Folds are trained in parallel; scoring starts once every fold is built.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::TooFewRowsForFolds`] | fewer training rows than folds |
    /// | Other tree errors | From fold training |
    #[instrument(skip_all, fields(n_folds = N_FOLDS, n_rows = dataset.train_rows().len()))]
    pub fn evaluate(&self, dataset: &Dataset) -> Result<CrossValidationResult, TreeError> {
        let mut rows = dataset.train_rows().to_vec();
        if rows.len() < N_FOLDS {
            return Err(TreeError::TooFewRowsForFolds {
                n_rows: rows.len(),
                n_folds: N_FOLDS,
            });
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rows.shuffle(&mut rng);
        let folds = fold_partition(&rows);

        let models = (0..N_FOLDS)
            .into_par_iter()
            .map(|fold| {
                let train: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != fold)
                    .flat_map(|(_, rows)| rows.iter().copied())
                    .collect();
                self.fit_fold(dataset, &train, fold)
            })
            .collect::<Result<Vec<_>, TreeError>>()?;

        let mut fold_errors = Vec::with_capacity(N_FOLDS);
        for (fold, (model, held_out)) in models.iter().zip(&folds).enumerate() {
            let report = model.errors(dataset, held_out);
            let error = report.error_percent();
            info!(fold, n_rows = held_out.len(), error, "fold completed");
            fold_errors.push(error);
        }

        let n = N_FOLDS as f64;
        let mean_error = fold_errors.iter().sum::<f64>() / n;
        let variance = fold_errors
            .iter()
            .map(|e| (e - mean_error).powi(2))
            .sum::<f64>()
            / n;
        let standard_error = variance.sqrt() / n.sqrt();

        info!(mean_error, standard_error, "cross-validation complete");

        Ok(CrossValidationResult {
            fold_errors,
            fold_sizes: folds.iter().map(Vec::len).collect(),
            mean_error,
            standard_error,
        })
    }

    fn fit_fold(&self, dataset: &Dataset, train: &[usize], fold: usize) -> Result<Classifier, TreeError> {
        match self.model {
            FoldModel::Tree => TreeConfig::new()
                .with_criterion(self.criterion)
                .with_seed(self.seed)
                .fit(dataset, train)
                .map(Classifier::Tree),
            FoldModel::Forest { n_trees } => ForestConfig::new(n_trees)?
                .with_criterion(self.criterion)
                .with_seed(self.seed.wrapping_add(fold as u64))
                .fit(dataset, train)
                .map(Classifier::Forest),
        }
    }
}

impl Default for CrossValidation {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `rows` into [`N_FOLDS`] contiguous chunks of `len / N_FOLDS` rows;
/// the remainder is dealt one row per fold starting at fold 0.
#[must_use]
pub fn fold_partition(rows: &[usize]) -> Vec<Vec<usize>> {
    let chunk = rows.len() / N_FOLDS;
    let mut folds: Vec<Vec<usize>> = (0..N_FOLDS)
        .map(|i| rows[i * chunk..(i + 1) * chunk].to_vec())
        .collect();
    for (k, &row) in rows[chunk * N_FOLDS..].iter().enumerate() {
        folds[k].push(row);
    }
    folds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Partition;
    use crate::schema::{Attribute, AttributeKind, Schema};

    fn dataset(n: usize) -> Dataset {
        let schema = Schema::new(vec![
            Attribute::new("x", AttributeKind::Continuous),
            Attribute::new("parity", AttributeKind::Discrete),
        ])
        .unwrap();
        let mut ds = Dataset::new(schema);
        for i in 0..n {
            let x = i.to_string();
            let parity = if i % 2 == 0 { "even" } else { "odd" };
            let label = if i < n / 2 { "low" } else { "high" };
            ds.push_record(&[&x, parity, label], Partition::Train).unwrap();
        }
        ds
    }

    #[test]
    fn hundred_rows_make_equal_folds() {
        let rows: Vec<usize> = (0..100).collect();
        let folds = fold_partition(&rows);
        assert_eq!(folds.len(), N_FOLDS);
        assert!(folds.iter().all(|f| f.len() == 10));
    }

    #[test]
    fn remainder_goes_to_leading_folds() {
        let rows: Vec<usize> = (0..103).collect();
        let folds = fold_partition(&rows);
        let sizes: Vec<usize> = folds.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![11, 11, 11, 10, 10, 10, 10, 10, 10, 10]);
        assert_eq!(folds[0].last(), Some(&100));
        assert_eq!(folds[2].last(), Some(&102));
        let mut all: Vec<usize> = folds.concat();
        all.sort_unstable();
        assert_eq!(all, rows);
    }

    #[test]
    fn too_few_rows_rejected() {
        let err = CrossValidation::new().evaluate(&dataset(9)).unwrap_err();
        assert!(matches!(
            err,
            TreeError::TooFewRowsForFolds { n_rows: 9, n_folds: 10 }
        ));
    }

    #[test]
    fn separable_data_has_low_error() {
        let result = CrossValidation::new().evaluate(&dataset(100)).unwrap();
        assert_eq!(result.fold_errors.len(), N_FOLDS);
        assert_eq!(result.fold_sizes, vec![10; N_FOLDS]);
        assert!(result.mean_error <= 10.0, "mean error {}", result.mean_error);
        assert!(result.standard_error >= 0.0);
    }

    #[test]
    fn forest_folds_are_deterministic() {
        let ds = dataset(60);
        let cv = CrossValidation::new()
            .with_criterion(Criterion::Gini)
            .with_seed(5)
            .with_forest(3)
            .unwrap();
        let a = cv.evaluate(&ds).unwrap();
        let b = cv.evaluate(&ds).unwrap();
        assert_eq!(a.fold_errors, b.fold_errors);
        assert_eq!(cv.model(), FoldModel::Forest { n_trees: 3 });
    }

    #[test]
    fn zero_tree_forest_rejected() {
        assert!(matches!(
            CrossValidation::new().with_forest(0),
            Err(TreeError::InvalidTreeCount { n_trees: 0 })
        ));
    }
}
