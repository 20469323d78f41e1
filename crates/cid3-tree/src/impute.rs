//! Mean/mode imputation of missing markers.

use tracing::debug;

use crate::dataset::DataPoint;
use crate::domain::{Domains, Value};
use crate::schema::{AttributeIndex, AttributeKind, Schema};

/// Replacement value per attribute: the training mean for continuous
/// attributes, the training mode for discrete ones.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Imputation {
    values: Vec<Option<Value>>,
}

impl Imputation {
    /// Compute replacements over the training `rows`.
    ///
    /// Missing readings are excluded from both the mean and the mode. A
    /// continuous attribute with no reading at all imputes `0.0`.
    #[must_use]
    pub fn compute(schema: &Schema, domains: &Domains, points: &[DataPoint], rows: &[usize]) -> Self {
        let class = schema.class_index();
        let values = (0..schema.len())
            .map(AttributeIndex::new)
            .map(|a| {
                if a == class {
                    return None;
                }
                match schema.kind(a) {
                    AttributeKind::Continuous => Some(Value::number(mean(domains, points, rows, a))),
                    AttributeKind::Discrete => mode(domains, points, rows, a),
                    AttributeKind::Ignore => None,
                }
            })
            .collect();
        Self { values }
    }

    /// Bind every attribute's missing code to its replacement.
    pub(crate) fn apply(&self, schema: &Schema, domains: &mut Domains) {
        for (i, value) in self.values.iter().enumerate() {
            let Some(value) = value else { continue };
            let attribute = AttributeIndex::new(i);
            if let Some(code) = domains.get_mut(attribute).rebind_missing(value.clone()) {
                debug!(
                    attribute = schema.attribute(attribute).name(),
                    code,
                    value = %value,
                    "imputed missing marker"
                );
            }
        }
    }

    /// Replacement for `attribute`, if it has one.
    #[must_use]
    pub fn value(&self, attribute: AttributeIndex) -> Option<&Value> {
        self.values.get(attribute.index()).and_then(Option::as_ref)
    }

    /// Substitute the replacement when `value` is the missing marker.
    #[must_use]
    pub fn fill(&self, attribute: AttributeIndex, value: Value) -> Value {
        match (&value, self.value(attribute)) {
            (Value::Missing, Some(replacement)) => replacement.clone(),
            _ => value,
        }
    }
}

fn mean(domains: &Domains, points: &[DataPoint], rows: &[usize], attribute: AttributeIndex) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &row in rows {
        if let Some(x) = domains.number(attribute, points[row].code(attribute)) {
            sum += x;
            count += 1;
        }
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Most frequent non-missing value; ties go to the lowest code.
fn mode(
    domains: &Domains,
    points: &[DataPoint],
    rows: &[usize],
    attribute: AttributeIndex,
) -> Option<Value> {
    let domain = domains.get(attribute);
    let mut frequencies = vec![0usize; domain.len()];
    for &row in rows {
        frequencies[points[row].code(attribute)] += 1;
    }
    let mut best = 0usize;
    let mut best_code = 0usize;
    for (code, &count) in frequencies.iter().enumerate() {
        let missing = domain.decode(code).is_none_or(Value::is_missing);
        if !missing && count > best {
            best = count;
            best_code = code;
        }
    }
    domain.decode(best_code).filter(|v| !v.is_missing()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, Partition};
    use crate::schema::Attribute;

    fn dataset(rows: &[[&str; 3]]) -> Dataset {
        let schema = Schema::new(vec![
            Attribute::new("age", AttributeKind::Continuous),
            Attribute::new("color", AttributeKind::Discrete),
        ])
        .unwrap();
        let mut ds = Dataset::new(schema);
        for r in rows {
            ds.push_record(r, Partition::Train).unwrap();
        }
        ds
    }

    #[test]
    fn mean_skips_missing_readings() {
        let mut ds = dataset(&[["10", "red", "y"], ["?", "red", "n"], ["20", "blue", "y"]]);
        let imputation = ds.impute();
        let age = AttributeIndex::new(0);
        assert_eq!(imputation.value(age), Some(&Value::number(15.0)));
        let missing_row = &ds.points()[1];
        assert_eq!(ds.domains().number(age, missing_row.code(age)), Some(15.0));
    }

    #[test]
    fn nan_counts_as_missing() {
        let mut ds = dataset(&[["4", "red", "y"], ["NaN", "red", "n"]]);
        ds.impute();
        let age = AttributeIndex::new(0);
        assert_eq!(ds.domains().number(age, ds.points()[1].code(age)), Some(4.0));
    }

    #[test]
    fn mode_ignores_marker_and_breaks_ties_low() {
        let mut ds = dataset(&[
            ["1", "?", "y"],
            ["2", "?", "y"],
            ["3", "?", "n"],
            ["4", "blue", "n"],
            ["5", "red", "y"],
        ]);
        let imputation = ds.impute();
        let color = AttributeIndex::new(1);
        assert_eq!(imputation.value(color), Some(&Value::Symbol("blue".into())));
        let missing = ds.points()[0].code(color);
        assert_eq!(ds.domains().get(color).decode(missing), Some(&Value::Symbol("blue".into())));
        assert_eq!(ds.domains().get(color).missing_code(), None);
    }

    #[test]
    fn all_missing_continuous_imputes_zero() {
        let mut ds = dataset(&[["?", "red", "y"], ["?", "red", "n"]]);
        let imputation = ds.impute();
        assert_eq!(imputation.value(AttributeIndex::new(0)), Some(&Value::number(0.0)));
    }

    #[test]
    fn fill_replaces_only_missing() {
        let mut ds = dataset(&[["10", "red", "y"], ["30", "red", "n"]]);
        let imputation = ds.impute();
        let age = AttributeIndex::new(0);
        assert_eq!(imputation.fill(age, Value::Missing), Value::number(20.0));
        assert_eq!(imputation.fill(age, Value::number(1.0)), Value::number(1.0));
        assert_eq!(imputation.value(AttributeIndex::new(2)), None);
    }
}
