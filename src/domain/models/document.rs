//! Document-store shapes shared by the read and write ports.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A JSON document as returned by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document id within its collection
    pub id: String,
    /// JSON body
    pub data: Map<String, Value>,
}

impl Document {
    /// Build a document from an id and body.
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self { id: id.into(), data }
    }

    /// String field lookup.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

/// Address of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Collection name
    pub collection: String,
    /// Document id
    pub id: String,
}

impl DocumentRef {
    /// Address `id` in `collection`.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Comparison applied by a query predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Equal
    Eq,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Field is an array containing the value
    ArrayContains,
}

impl FilterOp {
    /// SQL comparison operator for scalar ops.
    pub const fn sql_operator(self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("="),
            Self::Lt => Some("<"),
            Self::Lte => Some("<="),
            Self::Gt => Some(">"),
            Self::Gte => Some(">="),
            Self::ArrayContains => None,
        }
    }
}

/// One field comparison in a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Top-level field name
    pub field: String,
    /// Comparison to apply
    pub op: FilterOp,
    /// Right-hand operand
    pub value: Value,
}

impl Predicate {
    /// Compare `field` to `value` with `op`.
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Equality predicate.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }
}

/// Sort order for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Top-level field to sort by
    pub field: String,
    /// Largest first when set
    pub descending: bool,
}

/// Query against one collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentQuery {
    /// Collection queried
    pub collection: String,
    /// Predicates, all of which must hold
    pub predicates: Vec<Predicate>,
    /// Optional sort
    pub order_by: Option<OrderBy>,
    /// Maximum documents returned
    pub limit: Option<u32>,
}

impl DocumentQuery {
    /// Unfiltered query over `name`.
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            ..Default::default()
        }
    }

    /// Add a predicate.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Sort by `field`.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            descending,
        });
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `doc` satisfies every predicate. Used by in-memory stores.
    pub fn matches(&self, doc: &Document) -> bool {
        self.predicates.iter().all(|p| predicate_matches(p, doc))
    }
}

fn predicate_matches(predicate: &Predicate, doc: &Document) -> bool {
    let Some(field) = doc.data.get(&predicate.field) else {
        return false;
    };

    if predicate.op == FilterOp::ArrayContains {
        return field
            .as_array()
            .is_some_and(|items| items.contains(&predicate.value));
    }

    match (field, &predicate.value) {
        (Value::Number(a), Value::Number(b)) => {
            let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) else {
                return false;
            };
            compare(predicate.op, a.partial_cmp(&b))
        }
        (Value::String(a), Value::String(b)) => compare(predicate.op, Some(a.cmp(b))),
        (a, b) if predicate.op == FilterOp::Eq => a == b,
        _ => false,
    }
}

fn compare(op: FilterOp, ordering: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering::{Equal, Greater, Less};
    match (op, ordering) {
        (FilterOp::Eq, Some(Equal))
        | (FilterOp::Lt, Some(Less))
        | (FilterOp::Lte, Some(Less | Equal))
        | (FilterOp::Gt, Some(Greater))
        | (FilterOp::Gte, Some(Greater | Equal)) => true,
        _ => false,
    }
}
