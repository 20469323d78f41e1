//! Random-subspace forests with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::criterion::Criterion;
use crate::dataset::Dataset;
use crate::error::TreeError;
use crate::schema::{AttributeIndex, AttributeKind, Schema};
use crate::tree::{DecisionTree, TreeConfig};

/// Configuration for forest training.
///
/// Every tree sees the same rows; diversity comes only from the random
/// attribute subsets, which are redrawn before each child is decomposed.
///
/// # Defaults
///
/// | Parameter   | Default     |
/// |-------------|-------------|
/// | `criterion` | `Certainty` |
/// | `seed`      | 13579       |
#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) criterion: Criterion,
    pub(crate) seed: u64,
}

impl ForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, TreeError> {
        if n_trees == 0 {
            return Err(TreeError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            criterion: Criterion::Certainty,
            seed: crate::DEFAULT_SEED,
        })
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the global seed; tree `i` is seeded with `seed + i + 1`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Return the global seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Grow every tree in parallel over `rows` of `dataset`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::EmptyDataset`] | `rows` is empty |
    #[instrument(skip_all, fields(n_trees = self.n_trees, n_rows = rows.len()))]
    pub fn fit(&self, dataset: &Dataset, rows: &[usize]) -> Result<RandomForest, TreeError> {
        if rows.is_empty() {
            return Err(TreeError::EmptyDataset);
        }
        let schema = dataset.schema();
        let subspace = subspace_size(schema.candidate_attributes().len());

        info!(
            n_trees = self.n_trees,
            subspace,
            criterion = %self.criterion,
            "training random forest"
        );

        let criterion = self.criterion;
        let seed = self.seed;

        let trees = (0..self.n_trees)
            .into_par_iter()
            .map(|i| {
                let tree_seed = seed.wrapping_add(i as u64 + 1);
                let mut rng = ChaCha8Rng::seed_from_u64(tree_seed);
                let attributes = draw_subspace(&mut rng, schema, subspace);
                let tree = TreeConfig::new()
                    .with_criterion(criterion)
                    .with_seed(tree_seed)
                    .with_redraw(subspace)
                    .fit_with(dataset, rows, attributes)?;
                debug!(tree = i, n_nodes = tree.n_nodes(), "tree built");
                Ok(tree)
            })
            .collect::<Result<Vec<_>, TreeError>>()?;

        info!(n_trees = trees.len(), "random forest training complete");

        Ok(RandomForest { trees, subspace })
    }
}

/// A fitted forest.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) subspace: usize,
}

impl RandomForest {
    /// Return the member trees.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Attributes drawn per node.
    #[must_use]
    pub fn subspace(&self) -> usize {
        self.subspace
    }
}

/// `floor(log2(usable + 1))` attributes per subset.
#[must_use]
pub fn subspace_size(usable: usize) -> usize {
    ((usable + 1) as f64).log2().floor() as usize
}

/// Draw `size` distinct, non-ignored, non-class attributes.
pub(crate) fn draw_subspace(rng: &mut impl Rng, schema: &Schema, size: usize) -> Vec<AttributeIndex> {
    let upper = schema.len() - 1;
    let mut drawn: Vec<AttributeIndex> = Vec::with_capacity(size);
    while drawn.len() < size {
        let candidate = AttributeIndex::new(rng.gen_range(0..upper));
        if schema.kind(candidate) != AttributeKind::Ignore && !drawn.contains(&candidate) {
            drawn.push(candidate);
        }
    }
    drawn
}
