//! Query filters, kept as closed variant sets and encoded to the service's
//! JSON grammar on demand.
//!
//! Two families: [`Where`] scopes by metadata fields, [`WhereDocument`] by
//! document content. Encoding is fallible for [`Where`] — an unsupported
//! comparison value is reported before any request is built.

use serde_json::{Value, json};

use crate::error::{Error, Result};

/// Comparison operators for metadata field filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
}

impl Operator {
    fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::In => "$in",
            Operator::Nin => "$nin",
        }
    }
}

/// Metadata filter: a single field comparison, or a boolean combination of
/// sub-filters nested to any depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    /// Encodes as `{"<field>": {"<operator>": <value>}}`.
    Field {
        name: String,
        operator: Operator,
        value: Value,
    },
    /// Encodes as `{"$and": [...]}`.
    And(Vec<Where>),
    /// Encodes as `{"$or": [...]}`.
    Or(Vec<Where>),
}

impl Where {
    /// Shorthand for a single field comparison.
    pub fn field(name: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Where::Field {
            name: name.into(),
            operator,
            value: value.into(),
        }
    }

    /// Encodes the filter for the wire. Fails without producing output when
    /// any comparison value is not a string, int or float.
    pub fn to_value(&self) -> Result<Value> {
        match self {
            Where::Field {
                name,
                operator,
                value,
            } => {
                comparable(value)?;
                Ok(json!({ name.as_str(): { operator.as_str(): value } }))
            }
            Where::And(children) => {
                let encoded = encode_children(children)?;
                Ok(json!({ "$and": encoded }))
            }
            Where::Or(children) => {
                let encoded = encode_children(children)?;
                Ok(json!({ "$or": encoded }))
            }
        }
    }
}

fn encode_children(children: &[Where]) -> Result<Vec<Value>> {
    children.iter().map(Where::to_value).collect()
}

/// Comparison values must be a string, int or float; every other kind is
/// rejected by name.
fn comparable(value: &Value) -> Result<()> {
    match value {
        Value::String(_) | Value::Number(_) => Ok(()),
        Value::Bool(_) => Err(Error::UnsupportedFilterValue("bool")),
        Value::Null => Err(Error::UnsupportedFilterValue("null")),
        Value::Array(_) => Err(Error::UnsupportedFilterValue("array")),
        Value::Object(_) => Err(Error::UnsupportedFilterValue("object")),
    }
}

/// Document-content filter: substring containment or its negation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhereDocument {
    /// Encodes as `{"$contains": <text>}`.
    Contains(String),
    /// Encodes as `{"$not_contains": <text>}`.
    NotContains(String),
}

impl WhereDocument {
    pub fn to_value(&self) -> Value {
        match self {
            WhereDocument::Contains(text) => json!({ "$contains": text }),
            WhereDocument::NotContains(text) => json!({ "$not_contains": text }),
        }
    }
}
