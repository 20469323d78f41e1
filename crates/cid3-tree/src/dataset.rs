//! Encoded rows, the shared symbol tables, and train/test partitions.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::domain::{Domains, Value};
use crate::error::TreeError;
use crate::impute::Imputation;
use crate::schema::{AttributeIndex, Schema};

/// One encoded row: a code per attribute, class last.
///
/// Rows built from cases files carry no class code.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DataPoint {
    codes: Box<[usize]>,
}

impl DataPoint {
    /// Create a row from its attribute codes.
    #[must_use]
    pub fn new(codes: Vec<usize>) -> Self {
        Self {
            codes: codes.into_boxed_slice(),
        }
    }

    /// Return the code of `attribute`.
    #[must_use]
    pub fn code(&self, attribute: AttributeIndex) -> usize {
        self.codes[attribute.index()]
    }

    /// Return all codes in column order.
    #[must_use]
    pub fn codes(&self) -> &[usize] {
        &self.codes
    }
}

/// Which partition a freshly read record joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// Rows used to grow trees.
    Train,
    /// Held-out rows used only for evaluation.
    Test,
}

/// All rows of one run plus the symbol tables that encode them.
///
/// Rows live once in a pool; the train and test partitions are lists of
/// row indices into it.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Schema,
    domains: Domains,
    points: Vec<DataPoint>,
    train: Vec<usize>,
    test: Vec<usize>,
    class_counts: Vec<usize>,
}

impl Dataset {
    /// Create an empty dataset for `schema`.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        let domains = Domains::new(&schema);
        Self {
            schema,
            domains,
            points: Vec::new(),
            train: Vec::new(),
            test: Vec::new(),
            class_counts: Vec::new(),
        }
    }

    /// Encode a full record (one field per attribute, class last) into `partition`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::FieldCount`] | `fields.len()` differs from the schema length |
    /// | [`TreeError::InvalidNumber`] | a continuous field is not a number or missing marker |
    pub fn push_record(&mut self, fields: &[&str], partition: Partition) -> Result<(), TreeError> {
        let point = encode_fields(&self.schema, &mut self.domains, fields, self.schema.len())?;
        let row = self.points.len();
        match partition {
            Partition::Train => {
                let class = point.code(self.schema.class_index());
                if self.class_counts.len() <= class {
                    self.class_counts.resize(class + 1, 0);
                }
                self.class_counts[class] += 1;
                self.train.push(row);
            }
            Partition::Test => self.test.push(row),
        }
        self.points.push(point);
        Ok(())
    }

    /// Grow the training class counts to the current class domain.
    ///
    /// Test records may introduce class values never seen in training.
    pub fn sync_class_counts(&mut self) {
        let n_classes = self.domains.size(self.schema.class_index());
        if self.class_counts.len() < n_classes {
            debug!(
                from = self.class_counts.len(),
                to = n_classes,
                "class counts resized"
            );
            self.class_counts.resize(n_classes, 0);
        }
    }

    /// Shuffle the training rows and move the last 20% into the test partition.
    pub fn partition(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.train.shuffle(&mut rng);
        let keep = self.train.len() * 80 / 100;
        let held_out = self.train.split_off(keep);
        self.test.extend(held_out);
        self.recount_classes();
        info!(
            train = self.train.len(),
            test = self.test.len(),
            "partitioned training rows"
        );
    }

    /// Move every test row into the training partition.
    pub fn merge_test_into_train(&mut self) {
        let test = std::mem::take(&mut self.test);
        self.train.extend(test);
        self.recount_classes();
    }

    /// Compute mean/mode replacements over the training rows and bind them to
    /// every missing marker.
    pub fn impute(&mut self) -> Imputation {
        let imputation = Imputation::compute(&self.schema, &self.domains, &self.points, &self.train);
        imputation.apply(&self.schema, &mut self.domains);
        imputation
    }

    fn recount_classes(&mut self) {
        let class = self.schema.class_index();
        let mut counts = vec![0; self.domains.size(class)];
        for &row in &self.train {
            counts[self.points[row].code(class)] += 1;
        }
        self.class_counts = counts;
    }

    /// Return the attribute schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Return the shared symbol tables.
    #[must_use]
    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    /// Return the whole row pool.
    #[must_use]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Return the training row indices.
    #[must_use]
    pub fn train_rows(&self) -> &[usize] {
        &self.train
    }

    /// Return the test row indices.
    #[must_use]
    pub fn test_rows(&self) -> &[usize] {
        &self.test
    }

    /// Return `true` if any test rows are present.
    #[must_use]
    pub fn has_test(&self) -> bool {
        !self.test.is_empty()
    }

    /// Class frequencies among the training rows.
    #[must_use]
    pub fn class_counts(&self) -> &[usize] {
        &self.class_counts
    }

    /// Number of distinct class values seen so far.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.domains.size(self.schema.class_index())
    }

    /// Split into the parts a persisted model keeps.
    #[must_use]
    pub fn into_parts(self) -> (Schema, Domains) {
        (self.schema, self.domains)
    }
}

/// Encode `fields` under `schema`, expecting exactly `expected` fields.
pub(crate) fn encode_fields(
    schema: &Schema,
    domains: &mut Domains,
    fields: &[&str],
    expected: usize,
) -> Result<DataPoint, TreeError> {
    if fields.len() != expected {
        return Err(TreeError::FieldCount {
            expected,
            got: fields.len(),
        });
    }
    let mut codes = Vec::with_capacity(expected);
    for (i, raw) in fields.iter().enumerate() {
        let attribute = AttributeIndex::new(i);
        let spec = schema.attribute(attribute);
        let value = Value::parse(raw, spec.kind(), spec.name())?;
        codes.push(domains.encode(attribute, value));
    }
    Ok(DataPoint::new(codes))
}
