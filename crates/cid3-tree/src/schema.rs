use std::fmt;

use crate::error::TreeError;

/// Zero-based attribute column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct AttributeIndex(usize);

impl AttributeIndex {
    /// Create a new attribute index from a zero-based column position.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AttributeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an attribute participates in induction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AttributeKind {
    /// Symbolic values; splits produce one child per value.
    Discrete,
    /// Numeric values; splits produce two children around a threshold.
    Continuous,
    /// Read and encoded, never used for splitting.
    Ignore,
}

/// A named attribute column.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
}

impl Attribute {
    /// Create a new attribute.
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Return the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the attribute kind.
    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }
}

/// Ordered attribute columns. The last column is always the discrete class.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Schema {
    attributes: Vec<Attribute>,
}

impl Schema {
    /// Name given to the appended class attribute.
    pub const CLASS_NAME: &'static str = "Class";

    /// Build a schema from the declared attributes, appending the class column.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NoAttributes`] if `declared` is empty.
    pub fn new(declared: Vec<Attribute>) -> Result<Self, TreeError> {
        if declared.is_empty() {
            return Err(TreeError::NoAttributes);
        }
        let mut attributes = declared;
        attributes.push(Attribute::new(Self::CLASS_NAME, AttributeKind::Discrete));
        Ok(Self { attributes })
    }

    /// Number of attributes including the class.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Always `false`: a schema holds at least one attribute and the class.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Return all attributes in column order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Return the attribute at `index`.
    #[must_use]
    pub fn attribute(&self, index: AttributeIndex) -> &Attribute {
        &self.attributes[index.index()]
    }

    /// Return the kind of the attribute at `index`.
    #[must_use]
    pub fn kind(&self, index: AttributeIndex) -> AttributeKind {
        self.attributes[index.index()].kind
    }

    /// Index of the class attribute.
    #[must_use]
    pub fn class_index(&self) -> AttributeIndex {
        AttributeIndex::new(self.attributes.len() - 1)
    }

    /// Find an attribute by name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<AttributeIndex> {
        self.attributes
            .iter()
            .position(|a| a.name == name)
            .map(AttributeIndex::new)
    }

    /// Attributes that may be chosen to decompose a node: neither ignored nor the class.
    #[must_use]
    pub fn candidate_attributes(&self) -> Vec<AttributeIndex> {
        let class = self.class_index();
        (0..self.attributes.len())
            .map(AttributeIndex::new)
            .filter(|&i| i != class && self.kind(i) != AttributeKind::Ignore)
            .collect()
    }
}
