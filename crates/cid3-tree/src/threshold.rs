//! Boundary-point threshold search for continuous attributes.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

/// Which side a reading equal to the threshold falls on while scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LowerSide {
    /// `value <= threshold` counts as below.
    Inclusive,
    /// `value < threshold` counts as below.
    Strict,
}

impl LowerSide {
    fn is_below(self, value: f64, threshold: f64) -> bool {
        match self {
            LowerSide::Inclusive => value <= threshold,
            LowerSide::Strict => value < threshold,
        }
    }
}

/// Midpoints between adjacent distinct readings that sit on a class boundary.
///
/// A midpoint is proposed when the two readings were first seen with
/// different classes, or when either reading occurs with more than one class.
/// `readings` yields `(value, class)` pairs.
pub(crate) fn boundary_thresholds(readings: impl IntoIterator<Item = (f64, usize)>) -> Vec<f64> {
    // value -> (first class seen, still single-class)
    let mut seen: BTreeMap<OrderedFloat<f64>, (usize, bool)> = BTreeMap::new();
    for (value, class) in readings {
        seen.entry(OrderedFloat(value))
            .and_modify(|entry| {
                if entry.0 != class {
                    entry.1 = false;
                }
            })
            .or_insert((class, true));
    }

    let mut thresholds = Vec::new();
    let mut iter = seen.into_iter();
    let Some((mut prev_value, mut prev)) = iter.next() else {
        return thresholds;
    };
    for (value, current) in iter {
        if current.0 != prev.0 || !current.1 || !prev.1 {
            thresholds.push((prev_value.into_inner() + value.into_inner()) / 2.0);
        }
        prev_value = value;
        prev = current;
    }
    thresholds
}

/// Keep only the one or two candidates at the middle of the list.
///
/// Odd length keeps the middle element; even length keeps the element at
/// `len / 2` followed by the one before it.
pub(crate) fn central_thresholds(thresholds: &[f64]) -> Vec<f64> {
    let n = thresholds.len();
    match n {
        0 => Vec::new(),
        1 => vec![thresholds[0]],
        _ if n % 2 != 0 => vec![thresholds[n / 2]],
        _ => vec![thresholds[n / 2], thresholds[n / 2 - 1]],
    }
}

/// Row and per-class counts on each side of one threshold.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SideCounts {
    pub(crate) threshold: f64,
    pub(crate) below: usize,
    pub(crate) above: usize,
    pub(crate) class_below: Vec<usize>,
    pub(crate) class_above: Vec<usize>,
}

/// Count, in a single pass, how rows fall around every threshold.
pub(crate) fn count_sides(
    readings: impl IntoIterator<Item = (f64, usize)>,
    thresholds: &[f64],
    n_classes: usize,
    side: LowerSide,
) -> Vec<SideCounts> {
    let mut counts: Vec<SideCounts> = thresholds
        .iter()
        .map(|&threshold| SideCounts {
            threshold,
            below: 0,
            above: 0,
            class_below: vec![0; n_classes],
            class_above: vec![0; n_classes],
        })
        .collect();
    for (value, class) in readings {
        for c in &mut counts {
            if side.is_below(value, c.threshold) {
                c.below += 1;
                c.class_below[class] += 1;
            } else {
                c.above += 1;
                c.class_above[class] += 1;
            }
        }
    }
    counts
}
