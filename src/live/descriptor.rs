//! Declarative query descriptors
//!
//! A [`QueryDescriptor`] records a chain of store calls
//! (`collection("users").where_field(..).limit(5)`) without touching the
//! store. Each call returns a new descriptor; the old one stays valid and
//! shares its calls with the new one.
//!
//! Descriptors are compared by value, so a descriptor rebuilt on every
//! evaluation pass is recognised as the same query.

use crate::error::LiveError;
use crate::store::{Direction, FilterOp, Value};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// `collection(path)`
    Collection(String),
    /// `doc(path)`
    Doc(String),
    /// `where(field, op, value)`
    Where {
        /// Field path
        field: String,
        /// Comparison operator
        op: FilterOp,
        /// Operand
        value: Value,
    },
    /// `orderBy(field, direction)`
    OrderBy {
        /// Field path
        field: String,
        /// Sort direction
        direction: Direction,
    },
    /// `limit(n)`
    Limit(u32),
    /// `_(..)`: kept in the call list, skipped on replay
    Noop(Vec<Value>),
}

impl Operation {
    /// Name of the placeholder operation
    pub const NOOP: &'static str = "_";

    /// Operation name as it appears in a call list
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Collection(_) => "collection",
            Operation::Doc(_) => "doc",
            Operation::Where { .. } => "where",
            Operation::OrderBy { .. } => "orderBy",
            Operation::Limit(_) => "limit",
            Operation::Noop(_) => Self::NOOP,
        }
    }

    /// Arguments as JSON values
    pub fn args(&self) -> Vec<Value> {
        match self {
            Operation::Collection(path) | Operation::Doc(path) => vec![Value::from(path.as_str())],
            Operation::Where { field, op, value } => vec![
                Value::from(field.as_str()),
                Value::from(op.as_str()),
                value.clone(),
            ],
            Operation::OrderBy { field, direction } => {
                vec![Value::from(field.as_str()), Value::from(direction.as_str())]
            }
            Operation::Limit(limit) => vec![Value::from(*limit)],
            Operation::Noop(args) => args.clone(),
        }
    }

    /// Build an operation from its name and raw arguments
    ///
    /// This is the dispatch table from call names to store methods. Unknown
    /// names are rejected rather than forwarded.
    pub fn from_call(name: &str, args: Vec<Value>) -> Result<Self, LiveError> {
        match name {
            "collection" => Ok(Operation::Collection(single_string(name, args)?)),
            "doc" => Ok(Operation::Doc(single_string(name, args)?)),
            "where" => {
                let [field, op, value]: [Value; 3] = args.try_into().map_err(|args: Vec<_>| {
                    LiveError::invalid_arguments(name, format!("expected 3 arguments, got {}", args.len()))
                })?;
                let field = string_arg(name, field, "field path")?;
                let op = string_arg(name, op, "operator")?
                    .parse::<FilterOp>()
                    .map_err(|reason| LiveError::invalid_arguments(name, reason))?;
                Ok(Operation::Where { field, op, value })
            }
            "orderBy" => {
                let mut args = args.into_iter();
                let field = match args.next() {
                    Some(field) => string_arg(name, field, "field path")?,
                    None => return Err(LiveError::invalid_arguments(name, "missing field path")),
                };
                let direction = match args.next() {
                    None | Some(Value::Null) => Direction::default(),
                    Some(direction) => string_arg(name, direction, "direction")?
                        .parse::<Direction>()
                        .map_err(|reason| LiveError::invalid_arguments(name, reason))?,
                };
                if args.next().is_some() {
                    return Err(LiveError::invalid_arguments(name, "too many arguments"));
                }
                Ok(Operation::OrderBy { field, direction })
            }
            "limit" => {
                let [limit]: [Value; 1] = args.try_into().map_err(|args: Vec<_>| {
                    LiveError::invalid_arguments(name, format!("expected 1 argument, got {}", args.len()))
                })?;
                limit
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .map(Operation::Limit)
                    .ok_or_else(|| {
                        LiveError::invalid_arguments(name, format!("expected a non-negative integer, got {}", limit))
                    })
            }
            Self::NOOP => Ok(Operation::Noop(args)),
            other => Err(LiveError::UnknownOperation(other.to_string())),
        }
    }

    /// Mode this operation switches the descriptor to, if any
    pub fn switches_mode(&self) -> Option<QueryMode> {
        match self {
            Operation::Doc(_) => Some(QueryMode::Document),
            Operation::Collection(_) => Some(QueryMode::Collection),
            _ => None,
        }
    }
}

fn string_arg(operation: &str, value: Value, what: &str) -> Result<String, LiveError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(LiveError::invalid_arguments(
            operation,
            format!("{} must be a string, got {}", what, other),
        )),
    }
}

fn single_string(operation: &str, args: Vec<Value>) -> Result<String, LiveError> {
    let [path]: [Value; 1] = args.try_into().map_err(|args: Vec<_>| {
        LiveError::invalid_arguments(operation, format!("expected 1 argument, got {}", args.len()))
    })?;
    string_arg(operation, path, "path")
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        for (i, arg) in self.args().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

/// Whether a descriptor targets one document or a set of documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryMode {
    /// Single document; data is one record or nothing
    Document,
    /// Collection or query; data is an ordered list of records
    #[default]
    Collection,
}

struct CallNode {
    operation: Operation,
    parent: Option<Arc<CallNode>>,
}

impl Drop for CallNode {
    // Unlink iteratively; the default recursive drop overflows the stack on long chains
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            parent = match Arc::into_inner(node) {
                Some(mut node) => node.parent.take(),
                // Still referenced by another descriptor
                None => None,
            };
        }
    }
}

/// Immutable, persistent list of store calls
///
/// # Example
/// ```
/// use firestore_live::{fire_query, Direction, FilterOp, QueryMode};
/// use serde_json::json;
///
/// let users = fire_query().collection("users");
/// let admins = users
///     .where_field("role", FilterOp::Equal, json!("admin"))
///     .order_by("name", Direction::Asc)
///     .limit(5);
///
/// assert_eq!(users.len(), 1);
/// assert_eq!(admins.len(), 4);
/// assert_eq!(admins.mode(), QueryMode::Collection);
/// assert_eq!(users.doc("alice").mode(), QueryMode::Document);
/// ```
#[derive(Clone, Default)]
pub struct QueryDescriptor {
    tail: Option<Arc<CallNode>>,
    len: usize,
    mode: QueryMode,
}

/// Start an empty descriptor in collection mode
pub fn fire_query() -> QueryDescriptor {
    QueryDescriptor::new()
}

impl QueryDescriptor {
    /// Empty descriptor in collection mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `operation`, returning the extended descriptor
    pub fn call(&self, operation: Operation) -> Self {
        let mode = operation.switches_mode().unwrap_or(self.mode);
        Self {
            tail: Some(Arc::new(CallNode {
                operation,
                parent: self.tail.clone(),
            })),
            len: self.len + 1,
            mode,
        }
    }

    /// Append a call given by name and raw arguments
    pub fn call_named(&self, name: &str, args: Vec<Value>) -> Result<Self, LiveError> {
        Ok(self.call(Operation::from_call(name, args)?))
    }

    /// Append `collection(path)`
    pub fn collection(&self, path: impl Into<String>) -> Self {
        self.call(Operation::Collection(path.into()))
    }

    /// Append `doc(path)`
    pub fn doc(&self, path: impl Into<String>) -> Self {
        self.call(Operation::Doc(path.into()))
    }

    /// Append `where(field, op, value)`
    pub fn where_field(&self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.call(Operation::Where {
            field: field.into(),
            op,
            value: value.into(),
        })
    }

    /// Append `orderBy(field, direction)`
    pub fn order_by(&self, field: impl Into<String>, direction: Direction) -> Self {
        self.call(Operation::OrderBy {
            field: field.into(),
            direction,
        })
    }

    /// Append `limit(n)`
    pub fn limit(&self, limit: u32) -> Self {
        self.call(Operation::Limit(limit))
    }

    /// Append a placeholder step
    ///
    /// Lets a step be switched off without restructuring the chain:
    /// `.noop(args)` in place of `.order_by(..)`.
    pub fn noop(&self, args: Vec<Value>) -> Self {
        self.call(Operation::Noop(args))
    }

    /// Calls in the order they were made
    pub fn operations(&self) -> Vec<&Operation> {
        let mut calls = Vec::with_capacity(self.len);
        let mut node = self.tail.as_deref();
        while let Some(current) = node {
            calls.push(&current.operation);
            node = current.parent.as_deref();
        }
        calls.reverse();
        calls
    }

    /// Number of recorded calls
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no call was recorded
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current target mode
    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    /// Whether the descriptor targets a single document
    pub fn is_document(&self) -> bool {
        self.mode == QueryMode::Document
    }
}

impl PartialEq for QueryDescriptor {
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len || self.mode != other.mode {
            return false;
        }
        let (mut a, mut b) = (self.tail.as_ref(), other.tail.as_ref());
        loop {
            match (a, b) {
                (None, None) => return true,
                (Some(x), Some(y)) => {
                    // Shared prefix from here on
                    if Arc::ptr_eq(x, y) {
                        return true;
                    }
                    if x.operation != y.operation {
                        return false;
                    }
                    a = x.parent.as_ref();
                    b = y.parent.as_ref();
                }
                _ => return false,
            }
        }
    }
}

impl Eq for QueryDescriptor {}

impl fmt::Debug for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryDescriptor")
            .field("mode", &self.mode)
            .field("calls", &self.operations())
            .finish()
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("<empty>");
        }
        for (i, operation) in self.operations().into_iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", operation)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct CallRepr {
    op: String,
    #[serde(default)]
    args: Vec<Value>,
}

#[derive(Serialize, Deserialize)]
struct DescriptorRepr {
    // Output only; the mode is always derived from the calls
    #[serde(default)]
    document: bool,
    calls: Vec<CallRepr>,
}

impl Serialize for QueryDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DescriptorRepr {
            document: self.is_document(),
            calls: self
                .operations()
                .into_iter()
                .map(|operation| CallRepr {
                    op: operation.name().to_string(),
                    args: operation.args(),
                })
                .collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QueryDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = DescriptorRepr::deserialize(deserializer)?;
        repr.calls
            .into_iter()
            .try_fold(QueryDescriptor::new(), |descriptor, call| {
                descriptor.call_named(&call.op, call.args)
            })
            .map_err(de::Error::custom)
    }
}
