//! Two-way symbol tables mapping raw attribute values to dense codes.

use std::collections::HashMap;
use std::fmt;

use ordered_float::OrderedFloat;

use crate::error::TreeError;
use crate::schema::{AttributeIndex, AttributeKind, Schema};

/// Text that marks a missing field in every attribute kind.
pub const MISSING_MARKER: &str = "?";

/// A raw attribute value as read from a data file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Value {
    /// The reserved missing marker, until imputation rebinds it.
    Missing,
    /// Text of a discrete or ignored attribute.
    Symbol(String),
    /// Reading of a continuous attribute.
    Number(OrderedFloat<f64>),
}

impl Value {
    /// Wrap a float as a continuous value.
    #[must_use]
    pub fn number(value: f64) -> Self {
        Value::Number(OrderedFloat(value))
    }

    /// Parse a raw field according to the attribute kind.
    ///
    /// Continuous fields accept `?` and `NaN` as missing; other kinds accept `?`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidNumber`] if a continuous field does not parse as `f64`.
    pub fn parse(raw: &str, kind: AttributeKind, attribute: &str) -> Result<Self, TreeError> {
        match kind {
            AttributeKind::Continuous => {
                if raw == MISSING_MARKER || raw == "NaN" {
                    return Ok(Value::Missing);
                }
                raw.parse::<f64>()
                    .map(Value::number)
                    .map_err(|_| TreeError::InvalidNumber {
                        attribute: attribute.to_string(),
                        raw: raw.to_string(),
                    })
            }
            AttributeKind::Discrete | AttributeKind::Ignore => {
                if raw == MISSING_MARKER {
                    Ok(Value::Missing)
                } else {
                    Ok(Value::Symbol(raw.to_string()))
                }
            }
        }
    }

    /// Return the numeric reading, if this is a continuous value.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.into_inner()),
            _ => None,
        }
    }

    /// Return `true` for the missing marker.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => f.write_str(MISSING_MARKER),
            Value::Symbol(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n.into_inner()),
        }
    }
}

/// Symbol table for one attribute.
///
/// Codes are handed out sequentially on first sight and never reassigned.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Domain {
    values: Vec<Value>,
    codes: HashMap<Value, usize>,
}

impl Domain {
    /// Return the code for `value`, allocating the next one if unseen.
    pub fn encode(&mut self, value: Value) -> usize {
        if let Some(&code) = self.codes.get(&value) {
            return code;
        }
        let code = self.values.len();
        self.values.push(value.clone());
        self.codes.insert(value, code);
        code
    }

    /// Look up the code of `value` without allocating.
    #[must_use]
    pub fn code_of(&self, value: &Value) -> Option<usize> {
        self.codes.get(value).copied()
    }

    /// Return the value currently bound to `code`.
    #[must_use]
    pub fn decode(&self, code: usize) -> Option<&Value> {
        self.values.get(code)
    }

    /// Number of codes handed out so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return `true` if no value has been encoded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Code of the missing marker, while it is still unbound.
    #[must_use]
    pub fn missing_code(&self) -> Option<usize> {
        self.code_of(&Value::Missing)
    }

    /// Bind the missing marker's code to `value` in place.
    ///
    /// Rows already holding the code decode to `value` from now on. The
    /// marker leaves the reverse table; an existing code for `value` keeps
    /// its reverse entry so later encodes stay stable.
    pub(crate) fn rebind_missing(&mut self, value: Value) -> Option<usize> {
        let code = self.codes.remove(&Value::Missing)?;
        self.values[code] = value.clone();
        self.codes.entry(value).or_insert(code);
        Some(code)
    }
}

/// One [`Domain`] per schema attribute, shared by every row of a model.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Domains {
    domains: Vec<Domain>,
}

impl Domains {
    /// Create empty symbol tables for every attribute of `schema`.
    #[must_use]
    pub fn new(schema: &Schema) -> Self {
        Self {
            domains: vec![Domain::default(); schema.len()],
        }
    }

    /// Return the table of `attribute`.
    #[must_use]
    pub fn get(&self, attribute: AttributeIndex) -> &Domain {
        &self.domains[attribute.index()]
    }

    /// Return the mutable table of `attribute`.
    pub fn get_mut(&mut self, attribute: AttributeIndex) -> &mut Domain {
        &mut self.domains[attribute.index()]
    }

    /// Encode `value` under `attribute`.
    pub fn encode(&mut self, attribute: AttributeIndex, value: Value) -> usize {
        self.domains[attribute.index()].encode(value)
    }

    /// Decode a continuous code to its numeric reading.
    #[must_use]
    pub fn number(&self, attribute: AttributeIndex, code: usize) -> Option<f64> {
        self.domains[attribute.index()]
            .decode(code)
            .and_then(Value::as_number)
    }

    /// Number of distinct values of `attribute`.
    #[must_use]
    pub fn size(&self, attribute: AttributeIndex) -> usize {
        self.domains[attribute.index()].len()
    }
}
