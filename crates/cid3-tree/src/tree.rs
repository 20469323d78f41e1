use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    TreeError,
    criterion::{Criterion, Evaluation, ProbabilityTables, Subset},
    dataset::{DataPoint, Dataset},
    domain::Domains,
    forest::draw_subspace,
    node::{Branch, Node, NodeIndex, Split, SplitRule},
    schema::{AttributeIndex, AttributeKind, Schema},
};

/// Configuration for a single decision tree.
///
/// Construct via [`TreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter   | Default       |
/// |-------------|---------------|
/// | `criterion` | `Certainty`   |
/// | `seed`      | 13579         |
#[derive(Debug, Clone)]
pub struct TreeConfig {
    pub(crate) criterion: Criterion,
    pub(crate) seed: u64,
    /// Random-subspace size redrawn before every child, in forest mode.
    pub(crate) redraw: Option<usize>,
}

impl TreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: Criterion::Certainty,
            seed: crate::DEFAULT_SEED,
            redraw: None,
        }
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the seed for per-node attribute redraws.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub(crate) fn with_redraw(mut self, subspace: usize) -> Self {
        self.redraw = Some(subspace);
        self
    }

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Grow a tree over `rows` of `dataset`, considering every usable attribute.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::EmptyDataset`] | `rows` is empty |
    #[instrument(skip(self, dataset, rows), fields(criterion = %self.criterion, n_rows = rows.len()))]
    pub fn fit(&self, dataset: &Dataset, rows: &[usize]) -> Result<DecisionTree, TreeError> {
        let candidates = dataset.schema().candidate_attributes();
        self.fit_with(dataset, rows, candidates)
    }

    /// Grow a tree whose root considers only `candidates`.
    pub(crate) fn fit_with(
        &self,
        dataset: &Dataset,
        rows: &[usize],
        candidates: Vec<AttributeIndex>,
    ) -> Result<DecisionTree, TreeError> {
        if rows.is_empty() {
            return Err(TreeError::EmptyDataset);
        }
        let schema = dataset.schema();
        let domains = dataset.domains();
        let n_classes = domains.size(schema.class_index());

        let mut builder = Builder {
            schema,
            domains,
            points: dataset.points(),
            criterion: self.criterion,
            n_classes,
            redraw: self.redraw,
            nodes: Vec::new(),
        };
        let counts = builder.class_counts(rows);
        builder.nodes.push(Node::new(None, Branch::Root, counts));
        builder.decompose(NodeIndex::new(0), rows.to_vec(), &candidates, self.seed);

        debug!(n_nodes = builder.nodes.len(), "decision tree built");

        Ok(DecisionTree {
            nodes: builder.nodes,
            criterion: self.criterion,
        })
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

struct Builder<'a> {
    schema: &'a Schema,
    domains: &'a Domains,
    points: &'a [DataPoint],
    criterion: Criterion,
    n_classes: usize,
    redraw: Option<usize>,
    nodes: Vec<Node>,
}

impl Builder<'_> {
    fn class_counts(&self, rows: &[usize]) -> Vec<usize> {
        let class = self.schema.class_index();
        let mut counts = vec![0; self.n_classes];
        for &row in rows {
            counts[self.points[row].code(class)] += 1;
        }
        counts
    }

    /// Return `true` if `attribute` decomposes `node` or any of its ancestors.
    fn used_on_path(&self, node: NodeIndex, attribute: AttributeIndex) -> bool {
        let mut current = Some(node);
        while let Some(idx) = current {
            let n = &self.nodes[idx.index()];
            if n.split.as_ref().is_some_and(|s| s.attribute == attribute) {
                return true;
            }
            current = n.parent;
        }
        false
    }

    fn best_split(
        &self,
        node: NodeIndex,
        rows: &[usize],
        candidates: &[AttributeIndex],
    ) -> Option<(AttributeIndex, Evaluation)> {
        let subset = Subset {
            schema: self.schema,
            domains: self.domains,
            points: self.points,
            rows,
            n_classes: self.n_classes,
        };
        let tables = ProbabilityTables::compute(&subset, candidates);
        let class = self.schema.class_index();

        let mut best: Option<(AttributeIndex, Evaluation)> = None;
        for &attribute in candidates {
            if attribute == class {
                continue;
            }
            if self.schema.kind(attribute) == AttributeKind::Discrete
                && self.used_on_path(node, attribute)
            {
                continue;
            }
            let Some(evaluation) = self.criterion.evaluate(&subset, attribute, &tables) else {
                continue;
            };
            let better = best.as_ref().is_none_or(|(_, current)| {
                self.criterion
                    .improves(evaluation.score.value(), current.score.value())
            });
            if better {
                best = Some((attribute, evaluation));
            }
        }
        best
    }

    fn decompose(
        &mut self,
        node: NodeIndex,
        rows: Vec<usize>,
        candidates: &[AttributeIndex],
        seed: u64,
    ) {
        if rows.len() <= 1 {
            return;
        }
        let present = self.nodes[node.index()]
            .class_counts
            .iter()
            .filter(|&&c| c != 0)
            .count();
        if present <= 1 {
            return;
        }

        let Some((attribute, evaluation)) = self.best_split(node, &rows, candidates) else {
            return;
        };

        let rule = match (self.schema.kind(attribute), evaluation.threshold) {
            (AttributeKind::Continuous, Some(threshold)) => SplitRule::Continuous { threshold },
            _ => SplitRule::Discrete,
        };
        let partitions = match rule {
            SplitRule::Continuous { threshold } => {
                self.partition_continuous(&rows, attribute, threshold)
            }
            SplitRule::Discrete => self.partition_discrete(&rows, attribute),
        };
        drop(rows);

        let mut children = Vec::with_capacity(partitions.len());
        let mut child_rows = Vec::with_capacity(partitions.len());
        for (branch, subset) in partitions {
            let idx = NodeIndex::new(self.nodes.len());
            let counts = self.class_counts(&subset);
            self.nodes.push(Node::new(Some(node), branch, counts));
            children.push(idx);
            child_rows.push(subset);
        }

        debug!(
            node = node.index(),
            attribute = self.schema.attribute(attribute).name(),
            score = %evaluation.score,
            threshold = ?evaluation.threshold,
            n_children = children.len(),
            "node decomposed"
        );

        self.nodes[node.index()].split = Some(Split {
            attribute,
            rule,
            children: children.clone(),
            score: evaluation.score,
        });

        if matches!(rule, SplitRule::Continuous { .. }) && child_rows.iter().any(Vec::is_empty) {
            return;
        }

        match self.redraw {
            Some(subspace) => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                for (j, (child, subset)) in children.into_iter().zip(child_rows).enumerate() {
                    let attributes = draw_subspace(&mut rng, self.schema, subspace);
                    let child_seed = seed.wrapping_add(1 + j as u64);
                    self.decompose(child, subset, &attributes, child_seed);
                }
            }
            None => {
                for (j, (child, subset)) in children.into_iter().zip(child_rows).enumerate() {
                    let child_seed = seed.wrapping_add(1 + j as u64);
                    self.decompose(child, subset, candidates, child_seed);
                }
            }
        }
    }

    /// One partition per known value, skipping a still-unbound missing code.
    fn partition_discrete(&self, rows: &[usize], attribute: AttributeIndex) -> Vec<(Branch, Vec<usize>)> {
        let domain = self.domains.get(attribute);
        (0..domain.len())
            .filter(|&code| domain.decode(code).is_some_and(|v| !v.is_missing()))
            .map(|code| {
                let subset = rows
                    .iter()
                    .copied()
                    .filter(|&row| self.points[row].code(attribute) == code)
                    .collect();
                (Branch::Value(code), subset)
            })
            .collect()
    }

    fn partition_continuous(
        &self,
        rows: &[usize],
        attribute: AttributeIndex,
        threshold: f64,
    ) -> Vec<(Branch, Vec<usize>)> {
        let (below, above): (Vec<usize>, Vec<usize>) = rows.iter().copied().partition(|&row| {
            self.domains
                .number(attribute, self.points[row].code(attribute))
                .is_some_and(|x| x <= threshold)
        });
        vec![
            (Branch::AtMost(threshold), below),
            (Branch::Above(threshold), above),
        ]
    }
}

/// A fitted decision tree.
///
/// Stored as an arena-based `Vec<Node>`; the root is always index 0.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) criterion: Criterion,
}

impl DecisionTree {
    /// Index of the root node.
    #[must_use]
    pub fn root(&self) -> NodeIndex {
        NodeIndex::new(0)
    }

    /// Return the node at `index`.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.index()]
    }

    /// Return every node in arena order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Criterion the tree was grown with.
    #[must_use]
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Total number of nodes, including empty ones.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Maximum root-to-leaf edge count.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_leaf())
            .map(|(i, _)| self.ancestors(NodeIndex::new(i)).count())
            .max()
            .unwrap_or(0)
    }

    /// Ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(self.node(node).parent, move |&p| self.node(p).parent)
    }

    /// Name of the root split attribute, if the root was decomposed.
    #[must_use]
    pub fn root_attribute<'s>(&self, schema: &'s Schema) -> Option<&'s str> {
        self.node(self.root())
            .split()
            .map(|s| schema.attribute(s.attribute).name())
    }
}
