//! Export of a fitted tree as nested condition → result rules.

use std::fmt;

use crate::domain::{Domains, Value};
use crate::error::TreeError;
use crate::node::{Branch, NodeIndex};
use crate::schema::Schema;
use crate::tree::DecisionTree;

/// Condition on the edge that leads into a [`RuleNode`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTest {
    /// The attribute equals this value.
    Equals(String),
    /// The attribute is at most this threshold.
    AtMost(f64),
    /// The attribute is above this threshold.
    Above(f64),
}

impl RuleTest {
    fn matches(&self, raw: &str) -> bool {
        match self {
            RuleTest::Equals(value) => value == raw,
            RuleTest::AtMost(threshold) => raw.parse::<f64>().is_ok_and(|x| x <= *threshold),
            RuleTest::Above(threshold) => raw.parse::<f64>().is_ok_and(|x| x > *threshold),
        }
    }
}

impl fmt::Display for RuleTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleTest::Equals(value) => f.write_str(value),
            RuleTest::AtMost(t) => write!(f, "<= {t}"),
            RuleTest::Above(t) => write!(f, "> {t}"),
        }
    }
}

/// One node of the rule structure.
///
/// `attribute` and `value` describe the edge from the parent and are absent
/// on the root. Only leaves carry results.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuleNode {
    /// Attribute tested on the incoming edge.
    pub attribute: Option<String>,
    /// Condition on the incoming edge.
    pub value: Option<RuleTest>,
    /// Child rules, in split order.
    pub children: Vec<RuleNode>,
    /// Class labels predicted at a leaf.
    pub results: Vec<String>,
}

/// A whole tree as nested rules.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuleTree {
    /// The root rule.
    pub root: RuleNode,
}

impl RuleTree {
    /// Convert `tree` into rules, decoding values and class labels.
    ///
    /// Empty leaves carry their parent's majority label, matching inference.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownClass`] if a majority class has no label.
    pub fn from_tree(tree: &DecisionTree, schema: &Schema, domains: &Domains) -> Result<Self, TreeError> {
        let root = Converter {
            tree,
            schema,
            domains,
        }
        .convert(tree.root(), None)?;
        Ok(Self { root })
    }

    /// Follow `conditions` (attribute name, raw value) to a leaf and return
    /// its results.
    ///
    /// Empty when an attribute on the path has no condition or no branch
    /// matches.
    #[must_use]
    pub fn query(&self, conditions: &[(&str, &str)]) -> Vec<String> {
        let mut current = &self.root;
        while !current.children.is_empty() {
            let next = current.children.iter().find(|child| {
                let (Some(attribute), Some(test)) = (&child.attribute, &child.value) else {
                    return false;
                };
                conditions
                    .iter()
                    .find(|(name, _)| name == attribute)
                    .is_some_and(|(_, raw)| test.matches(raw))
            });
            match next {
                Some(child) => current = child,
                None => return Vec::new(),
            }
        }
        current.results.clone()
    }

    /// Number of leaves.
    #[must_use]
    pub fn n_rules(&self) -> usize {
        fn leaves(node: &RuleNode) -> usize {
            if node.children.is_empty() {
                1
            } else {
                node.children.iter().map(leaves).sum()
            }
        }
        leaves(&self.root)
    }
}

struct Converter<'a> {
    tree: &'a DecisionTree,
    schema: &'a Schema,
    domains: &'a Domains,
}

impl Converter<'_> {
    fn convert(&self, index: NodeIndex, attribute: Option<String>) -> Result<RuleNode, TreeError> {
        let node = self.tree.node(index);
        let value = match node.branch() {
            Branch::Root => None,
            Branch::Value(code) => {
                let split_attribute = node
                    .parent()
                    .and_then(|p| self.tree.node(p).split())
                    .map(|s| s.attribute());
                split_attribute
                    .and_then(|a| self.domains.get(a).decode(code))
                    .map(|v| RuleTest::Equals(v.to_string()))
            }
            Branch::AtMost(t) => Some(RuleTest::AtMost(t)),
            Branch::Above(t) => Some(RuleTest::Above(t)),
        };

        let Some(split) = node.split() else {
            let class = match node.parent() {
                Some(parent) if node.is_empty() => self.tree.node(parent).majority_class(),
                _ => node.majority_class(),
            };
            return Ok(RuleNode {
                attribute,
                value,
                children: Vec::new(),
                results: vec![self.label(class)?],
            });
        };

        let child_attribute = self.schema.attribute(split.attribute()).name().to_string();
        let children = split
            .children()
            .iter()
            .map(|&child| self.convert(child, Some(child_attribute.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RuleNode {
            attribute,
            value,
            children,
            results: Vec::new(),
        })
    }

    fn label(&self, class: usize) -> Result<String, TreeError> {
        self.domains
            .get(self.schema.class_index())
            .decode(class)
            .map(Value::to_string)
            .ok_or(TreeError::UnknownClass { code: class })
    }
}
