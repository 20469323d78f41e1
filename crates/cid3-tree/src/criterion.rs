//! Split-quality criteria: Certainty, Entropy, and Gini.

use std::fmt;
use std::str::FromStr;

use crate::dataset::DataPoint;
use crate::domain::Domains;
use crate::error::TreeError;
use crate::schema::{AttributeIndex, AttributeKind, Schema};
use crate::threshold::{LowerSide, SideCounts, boundary_thresholds, central_thresholds, count_sides};

/// Criterion used to rank candidate attributes at a node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default,
    serde::Serialize, serde::Deserialize,
)]
pub enum Criterion {
    /// Σ_v Σ_c |P(c, v) − P(v) / n_classes|; higher wins.
    #[default]
    Certainty,
    /// Weighted conditional entropy; lower wins.
    Entropy,
    /// Weighted Gini impurity; lower wins.
    Gini,
}

impl Criterion {
    /// Return `true` if `candidate` beats `best` under this criterion.
    pub(crate) fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Criterion::Certainty => candidate > best,
            Criterion::Entropy | Criterion::Gini => candidate < best,
        }
    }

    fn lower_side(self) -> LowerSide {
        match self {
            Criterion::Certainty | Criterion::Gini => LowerSide::Inclusive,
            Criterion::Entropy => LowerSide::Strict,
        }
    }

    /// Score `attribute` over the rows of `subset`.
    ///
    /// Returns `None` when the attribute offers no usable split: a zero
    /// Certainty score, or a continuous attribute without class boundaries.
    pub(crate) fn evaluate(
        self,
        subset: &Subset<'_>,
        attribute: AttributeIndex,
        tables: &ProbabilityTables,
    ) -> Option<Evaluation> {
        let evaluation = match subset.schema.kind(attribute) {
            AttributeKind::Discrete => {
                let table = tables.get(attribute)?;
                Evaluation {
                    score: Score::new(self.discrete_score(table, subset.n_classes)),
                    threshold: None,
                }
            }
            AttributeKind::Continuous => self.continuous_evaluation(subset, attribute)?,
            AttributeKind::Ignore => return None,
        };
        if self == Criterion::Certainty && evaluation.score.value() == 0.0 {
            return None;
        }
        Some(evaluation)
    }

    fn discrete_score(self, table: &ValueProbabilities, n_classes: usize) -> f64 {
        let nc = n_classes as f64;
        let mut total = 0.0;
        for v in 0..table.prob.len() {
            let p_value = table.prob[v];
            match self {
                Criterion::Certainty => {
                    total += table.joint[v]
                        .iter()
                        .map(|&joint| (joint - p_value / nc).abs())
                        .sum::<f64>();
                }
                Criterion::Entropy => {
                    let h: f64 = table.conditional[v]
                        .iter()
                        .filter(|&&p| p != 0.0)
                        .map(|&p| -p * p.ln())
                        .sum();
                    total += p_value * h;
                }
                Criterion::Gini => {
                    let sum_sq: f64 = table.conditional[v].iter().map(|&p| p * p).sum();
                    total += p_value * (1.0 - sum_sq);
                }
            }
        }
        total
    }

    fn continuous_evaluation(
        self,
        subset: &Subset<'_>,
        attribute: AttributeIndex,
    ) -> Option<Evaluation> {
        let candidates = boundary_thresholds(
            subset
                .readings(attribute)
                .filter(|(value, _)| !value.is_nan()),
        );
        let thresholds = central_thresholds(&candidates);
        if thresholds.is_empty() {
            return None;
        }
        let sides = count_sides(
            subset.readings(attribute),
            &thresholds,
            subset.n_classes,
            self.lower_side(),
        );
        let n = subset.rows.len() as f64;

        let mut best: Option<(f64, f64)> = None;
        for side in &sides {
            let score = self.side_score(side, n, subset.n_classes);
            best = match (self, best) {
                // Certainty only accepts scores strictly above zero.
                (Criterion::Certainty, None) if score > 0.0 => Some((score, side.threshold)),
                (Criterion::Certainty, None) => None,
                (_, None) => Some((score, side.threshold)),
                (_, Some((best_score, _))) if self.improves(score, best_score) => {
                    Some((score, side.threshold))
                }
                (_, keep) => keep,
            };
        }

        let (score, threshold) = best.unwrap_or((0.0, 0.0));
        Some(Evaluation {
            score: Score::new(score),
            threshold: Some(threshold),
        })
    }

    fn side_score(self, side: &SideCounts, n: f64, n_classes: usize) -> f64 {
        let p_below = side.below as f64 / n;
        let p_above = side.above as f64 / n;
        let nc = n_classes as f64;
        let mut below = 0.0;
        let mut above = 0.0;
        for c in 0..n_classes {
            let joint_below = side.class_below[c] as f64 / n;
            let joint_above = side.class_above[c] as f64 / n;
            match self {
                Criterion::Certainty => {
                    below += (joint_below - p_below / nc).abs();
                    above += (joint_above - p_above / nc).abs();
                }
                Criterion::Entropy => {
                    if joint_below != 0.0 && p_below != 0.0 {
                        let p = joint_below / p_below;
                        below += -p * p.ln();
                    }
                    if joint_above != 0.0 && p_above != 0.0 {
                        let p = joint_above / p_above;
                        above += -p * p.ln();
                    }
                }
                Criterion::Gini => {
                    if p_below != 0.0 {
                        below += (joint_below / p_below).powi(2);
                    }
                    if p_above != 0.0 {
                        above += (joint_above / p_above).powi(2);
                    }
                }
            }
        }
        match self {
            Criterion::Certainty => below + above,
            Criterion::Entropy => below * p_below + above * p_above,
            Criterion::Gini => {
                let gini_below = if p_below != 0.0 { 1.0 - below } else { 0.0 };
                let gini_above = if p_above != 0.0 { 1.0 - above } else { 0.0 };
                gini_below * p_below + gini_above * p_above
            }
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Criterion::Certainty => "certainty",
            Criterion::Entropy => "entropy",
            Criterion::Gini => "gini",
        };
        f.write_str(name)
    }
}

impl FromStr for Criterion {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "certainty" => Ok(Criterion::Certainty),
            "e" | "entropy" => Ok(Criterion::Entropy),
            "g" | "gini" => Ok(Criterion::Gini),
            _ => Err(TreeError::UnknownCriterion { name: s.to_string() }),
        }
    }
}

/// Criterion value of a split, kept on the decomposed node.
#[derive(
    Debug, Clone, Copy, PartialEq, PartialOrd,
    serde::Serialize, serde::Deserialize,
)]
pub struct Score(f64);

impl Score {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw criterion value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Outcome of scoring one attribute. Discrete attributes carry no threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Evaluation {
    pub(crate) score: Score,
    pub(crate) threshold: Option<f64>,
}

/// Rows reaching a node, with everything needed to read their codes.
pub(crate) struct Subset<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) domains: &'a Domains,
    pub(crate) points: &'a [DataPoint],
    pub(crate) rows: &'a [usize],
    pub(crate) n_classes: usize,
}

impl Subset<'_> {
    fn class_of(&self, row: usize) -> usize {
        self.points[row].code(self.schema.class_index())
    }

    /// `(numeric reading, class)` for every row; undecodable readings are NaN.
    fn readings(&self, attribute: AttributeIndex) -> impl Iterator<Item = (f64, usize)> + '_ {
        self.rows.iter().map(move |&row| {
            let value = self
                .domains
                .number(attribute, self.points[row].code(attribute))
                .unwrap_or(f64::NAN);
            (value, self.class_of(row))
        })
    }
}

/// P(v), P(v, c), and P(c | v) of one discrete attribute over a subset.
#[derive(Debug, Clone)]
pub(crate) struct ValueProbabilities {
    prob: Vec<f64>,
    joint: Vec<Vec<f64>>,
    conditional: Vec<Vec<f64>>,
}

/// Probability tables for every discrete candidate, filled in one data pass.
#[derive(Debug, Clone)]
pub(crate) struct ProbabilityTables {
    tables: Vec<Option<ValueProbabilities>>,
}

impl ProbabilityTables {
    pub(crate) fn compute(subset: &Subset<'_>, attributes: &[AttributeIndex]) -> Self {
        let mut tables: Vec<Option<ValueProbabilities>> = vec![None; subset.schema.len()];
        let discrete: Vec<AttributeIndex> = attributes
            .iter()
            .copied()
            .filter(|&a| {
                a != subset.schema.class_index() && subset.schema.kind(a) == AttributeKind::Discrete
            })
            .collect();
        for &a in &discrete {
            let size = subset.domains.size(a);
            tables[a.index()] = Some(ValueProbabilities {
                prob: vec![0.0; size],
                joint: vec![vec![0.0; subset.n_classes]; size],
                conditional: vec![vec![0.0; subset.n_classes]; size],
            });
        }

        for &row in subset.rows {
            let point = &subset.points[row];
            let class = subset.class_of(row);
            for &a in &discrete {
                if let Some(table) = tables[a.index()].as_mut() {
                    let v = point.code(a);
                    table.prob[v] += 1.0;
                    table.joint[v][class] += 1.0;
                }
            }
        }

        let n = subset.rows.len() as f64;
        for table in tables.iter_mut().flatten() {
            for v in 0..table.prob.len() {
                table.prob[v] /= n;
                for c in 0..subset.n_classes {
                    table.joint[v][c] /= n;
                    // An absent value has no conditional distribution.
                    table.conditional[v][c] = if table.prob[v] != 0.0 {
                        table.joint[v][c] / table.prob[v]
                    } else {
                        0.0
                    };
                }
            }
        }
        Self { tables }
    }

    fn get(&self, attribute: AttributeIndex) -> Option<&ValueProbabilities> {
        self.tables.get(attribute.index()).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Value;
    use crate::schema::Attribute;

    struct Fixture {
        schema: Schema,
        domains: Domains,
        points: Vec<DataPoint>,
    }

    impl Fixture {
        fn new(kinds: &[AttributeKind], rows: &[&[&str]]) -> Self {
            let declared = kinds
                .iter()
                .enumerate()
                .map(|(i, &k)| Attribute::new(format!("a{i}"), k))
                .collect();
            let schema = Schema::new(declared).unwrap();
            let mut domains = Domains::new(&schema);
            let points = rows
                .iter()
                .map(|fields| {
                    let codes = fields
                        .iter()
                        .enumerate()
                        .map(|(i, raw)| {
                            let a = AttributeIndex::new(i);
                            let value = Value::parse(raw, schema.kind(a), "a").unwrap();
                            domains.encode(a, value)
                        })
                        .collect();
                    DataPoint::new(codes)
                })
                .collect();
            Self {
                schema,
                domains,
                points,
            }
        }

        fn subset<'a>(&'a self, rows: &'a [usize]) -> Subset<'a> {
            Subset {
                schema: &self.schema,
                domains: &self.domains,
                points: &self.points,
                rows,
                n_classes: self.domains.size(self.schema.class_index()),
            }
        }

        fn evaluate(&self, criterion: Criterion, attribute: usize) -> Option<Evaluation> {
            let rows: Vec<usize> = (0..self.points.len()).collect();
            let subset = self.subset(&rows);
            let candidates = self.schema.candidate_attributes();
            let tables = ProbabilityTables::compute(&subset, &candidates);
            criterion.evaluate(&subset, AttributeIndex::new(attribute), &tables)
        }
    }

    fn weather() -> Fixture {
        Fixture::new(
            &[AttributeKind::Continuous, AttributeKind::Discrete],
            &[&["25", "red", "yes"], &["30", "blue", "no"], &["26", "red", "yes"]],
        )
    }

    #[test]
    fn discrete_certainty_of_perfect_split() {
        // red: |2/3 - 1/3| + |0 - 1/3|; blue: |0 - 1/6| + |1/3 - 1/6|.
        let eval = weather().evaluate(Criterion::Certainty, 1).unwrap();
        assert!((eval.score.value() - 1.0).abs() < 1e-12);
        assert_eq!(eval.threshold, None);
    }

    #[test]
    fn discrete_entropy_and_gini_of_perfect_split_are_zero() {
        let fixture = weather();
        let entropy = fixture.evaluate(Criterion::Entropy, 1).unwrap();
        let gini = fixture.evaluate(Criterion::Gini, 1).unwrap();
        assert!(entropy.score.value().abs() < 1e-12);
        assert!(gini.score.value().abs() < 1e-12);
    }

    #[test]
    fn continuous_split_lands_between_classes() {
        let fixture = weather();
        for criterion in [Criterion::Certainty, Criterion::Entropy, Criterion::Gini] {
            let eval = fixture.evaluate(criterion, 0).unwrap();
            assert_eq!(eval.threshold, Some(28.0), "{criterion}");
        }
        let entropy = fixture.evaluate(Criterion::Entropy, 0).unwrap();
        assert!(entropy.score.value().abs() < 1e-12);
    }

    #[test]
    fn constant_continuous_attribute_is_unusable() {
        let fixture = Fixture::new(
            &[AttributeKind::Continuous],
            &[&["5", "yes"], &["5", "no"], &["5", "yes"]],
        );
        for criterion in [Criterion::Certainty, Criterion::Entropy, Criterion::Gini] {
            assert!(fixture.evaluate(criterion, 0).is_none(), "{criterion}");
        }
    }

    #[test]
    fn zero_certainty_is_unusable() {
        // Every value holds one row of each class: joint equals expectation.
        let fixture = Fixture::new(
            &[AttributeKind::Discrete],
            &[&["a", "yes"], &["a", "no"], &["b", "yes"], &["b", "no"]],
        );
        assert!(fixture.evaluate(Criterion::Certainty, 0).is_none());
        let entropy = fixture.evaluate(Criterion::Entropy, 0).unwrap();
        assert!((entropy.score.value() - std::f64::consts::LN_2).abs() < 1e-12);
        let gini = fixture.evaluate(Criterion::Gini, 0).unwrap();
        assert!((gini.score.value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn absent_values_do_not_poison_entropy() {
        let fixture = Fixture::new(
            &[AttributeKind::Discrete],
            &[&["a", "yes"], &["b", "no"], &["c", "no"]],
        );
        // Rows 0 and 1 only: value "c" is absent from the subset.
        let rows = [0, 1];
        let subset = fixture.subset(&rows);
        let tables = ProbabilityTables::compute(&subset, &fixture.schema.candidate_attributes());
        let eval = Criterion::Entropy
            .evaluate(&subset, AttributeIndex::new(0), &tables)
            .unwrap();
        assert!(eval.score.value().is_finite());
        assert!(eval.score.value().abs() < 1e-12);
    }

    #[test]
    fn entropy_uses_strict_lower_side() {
        assert_eq!(Criterion::Entropy.lower_side(), LowerSide::Strict);
        assert_eq!(Criterion::Gini.lower_side(), LowerSide::Inclusive);
        assert_eq!(Criterion::Certainty.lower_side(), LowerSide::Inclusive);
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("c".parse::<Criterion>().unwrap(), Criterion::Certainty);
        assert_eq!("Entropy".parse::<Criterion>().unwrap(), Criterion::Entropy);
        assert_eq!("g".parse::<Criterion>().unwrap(), Criterion::Gini);
        assert!("x".parse::<Criterion>().is_err());
        assert_eq!(Criterion::Gini.to_string(), "gini");
        assert_eq!(Criterion::default(), Criterion::Certainty);
    }

    #[test]
    fn score_display() {
        assert_eq!(Score::new(0.5).to_string(), "0.500000");
    }
}
