//! A fitted classifier bundled with everything inference needs.

use crate::dataset::{DataPoint, Dataset};
use crate::domain::{Domains, Value};
use crate::error::TreeError;
use crate::forest::RandomForest;
use crate::impute::Imputation;
use crate::report::ErrorReport;
use crate::schema::{AttributeIndex, Schema};
use crate::tree::DecisionTree;

/// Either a single tree or a forest.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Classifier {
    /// One decision tree.
    Tree(DecisionTree),
    /// A random-subspace forest.
    Forest(RandomForest),
}

impl Classifier {
    /// Predicted class code for `point`.
    #[must_use]
    pub fn predict(&self, point: &DataPoint, domains: &Domains, n_classes: usize) -> usize {
        match self {
            Classifier::Tree(tree) => tree.predict(point, domains),
            Classifier::Forest(forest) => forest.predict(point, domains, n_classes),
        }
    }

    /// Score the classifier on `rows` of `dataset`.
    #[must_use]
    pub fn errors(&self, dataset: &Dataset, rows: &[usize]) -> ErrorReport {
        match self {
            Classifier::Tree(tree) => ErrorReport::tree(tree, dataset, rows),
            Classifier::Forest(forest) => ErrorReport::forest(forest, dataset, rows),
        }
    }

    /// File extension of a saved model of this kind.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Classifier::Tree(_) => "tree",
            Classifier::Forest(_) => "forest",
        }
    }
}

/// A persisted unit: schema, symbol tables, imputed values, and classifier.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Model {
    pub(crate) schema: Schema,
    pub(crate) domains: Domains,
    pub(crate) imputation: Imputation,
    pub(crate) classifier: Classifier,
}

impl Model {
    /// Bundle a classifier with the dataset it was trained on.
    #[must_use]
    pub fn new(dataset: Dataset, imputation: Imputation, classifier: Classifier) -> Self {
        let (schema, domains) = dataset.into_parts();
        Self {
            schema,
            domains,
            imputation,
            classifier,
        }
    }

    /// Return the attribute schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Return the symbol tables.
    #[must_use]
    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    /// Return the stored replacement values.
    #[must_use]
    pub fn imputation(&self) -> &Imputation {
        &self.imputation
    }

    /// Return the classifier.
    #[must_use]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Predicted class code for an encoded point.
    #[must_use]
    pub fn classify(&self, point: &DataPoint) -> usize {
        let n_classes = self.domains.size(self.schema.class_index());
        self.classifier.predict(point, &self.domains, n_classes)
    }

    /// Decode a class code to its label.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownClass`] if `code` was never assigned.
    pub fn class_label(&self, code: usize) -> Result<&Value, TreeError> {
        self.domains
            .get(self.schema.class_index())
            .decode(code)
            .ok_or(TreeError::UnknownClass { code })
    }

    /// Encode an unlabeled case, one field per non-class attribute.
    ///
    /// Missing markers take the stored replacement; unseen values get fresh codes.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::FieldCount`] | `fields.len()` is not the number of non-class attributes |
    /// | [`TreeError::InvalidNumber`] | a continuous field is not a number or missing marker |
    pub fn encode_case(&mut self, fields: &[&str]) -> Result<DataPoint, TreeError> {
        let expected = self.schema.len() - 1;
        if fields.len() != expected {
            return Err(TreeError::FieldCount {
                expected,
                got: fields.len(),
            });
        }
        let mut codes = Vec::with_capacity(expected);
        for (i, raw) in fields.iter().enumerate() {
            let attribute = AttributeIndex::new(i);
            let spec = self.schema.attribute(attribute);
            let value = Value::parse(raw, spec.kind(), spec.name())?;
            let value = self.imputation.fill(attribute, value);
            codes.push(self.domains.encode(attribute, value));
        }
        Ok(DataPoint::new(codes))
    }

    /// Encode and classify one unlabeled case, returning its class label.
    ///
    /// # Errors
    ///
    /// Propagates the failures of [`Model::encode_case`] and [`Model::class_label`].
    pub fn classify_case(&mut self, fields: &[&str]) -> Result<Value, TreeError> {
        let point = self.encode_case(fields)?;
        let code = self.classify(&point);
        self.class_label(code).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Partition;
    use crate::forest::ForestConfig;
    use crate::schema::{Attribute, AttributeKind};
    use crate::tree::TreeConfig;

    fn weather() -> Dataset {
        let schema = Schema::new(vec![
            Attribute::new("age", AttributeKind::Continuous),
            Attribute::new("color", AttributeKind::Discrete),
        ])
        .unwrap();
        let mut ds = Dataset::new(schema);
        for r in [
            ["25", "red", "yes"],
            ["30", "blue", "no"],
            ["26", "red", "yes"],
            ["?", "blue", "no"],
        ] {
            ds.push_record(&r, Partition::Train).unwrap();
        }
        ds
    }

    fn tree_model() -> Model {
        let mut ds = weather();
        let imputation = ds.impute();
        let tree = TreeConfig::new().fit(&ds, ds.train_rows()).unwrap();
        Model::new(ds, imputation, Classifier::Tree(tree))
    }

    #[test]
    fn classifies_cases() {
        let mut model = tree_model();
        assert_eq!(model.classify_case(&["25", "red"]).unwrap(), Value::Symbol("yes".into()));
        assert_eq!(model.classify_case(&["31", "blue"]).unwrap(), Value::Symbol("no".into()));
    }

    #[test]
    fn missing_case_fields_are_imputed() {
        let mut model = tree_model();
        let point = model.encode_case(&["?", "?"]).unwrap();
        let age = AttributeIndex::new(0);
        assert_eq!(model.domains().number(age, point.code(age)), Some(27.0));
        let color = model.domains().get(AttributeIndex::new(1)).decode(point.code(AttributeIndex::new(1)));
        assert_eq!(color, Some(&Value::Symbol("red".into())));
    }

    #[test]
    fn case_field_count_is_checked() {
        let mut model = tree_model();
        let err = model.encode_case(&["25", "red", "yes"]).unwrap_err();
        assert!(matches!(err, TreeError::FieldCount { expected: 2, got: 3 }));
    }

    #[test]
    fn unknown_class_code() {
        let model = tree_model();
        assert!(matches!(model.class_label(9), Err(TreeError::UnknownClass { code: 9 })));
    }

    #[test]
    fn forest_model_extension() {
        let mut ds = weather();
        let imputation = ds.impute();
        let forest = ForestConfig::new(3).unwrap().fit(&ds, ds.train_rows()).unwrap();
        let model = Model::new(ds, imputation, Classifier::Forest(forest));
        assert_eq!(model.classifier().extension(), "forest");
        assert_eq!(tree_model().classifier().extension(), "tree");
    }
}
