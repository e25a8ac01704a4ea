//! Collection component
//!
//! Props mirror what a collection listener needs: a path, an optional sort
//! string (`"name:asc,age:desc"`), an optional filter (one clause or a list of
//! clauses) and an optional limit.

use super::render::{QueryComponent, QueryProps};
use crate::error::LiveError;
use crate::live::{fire_query, QueryDescriptor};
use crate::store::{Direction, FilterOp, Value};

/// Render-prop component listening to a collection
pub type FirestoreCollection<S> = QueryComponent<S, CollectionProps>;

/// One `where` clause
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    /// Field path
    pub field: String,
    /// Comparison operator
    pub op: FilterOp,
    /// Operand
    pub value: Value,
}

impl FilterClause {
    /// Clause `field op value`
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    fn from_triple(value: &Value) -> Result<Self, LiveError> {
        let invalid = |reason: &str| LiveError::invalid_arguments("filter", reason);
        let items = value
            .as_array()
            .filter(|items| items.len() == 3)
            .ok_or_else(|| invalid("expected [field, op, value]"))?;
        let field = items[0]
            .as_str()
            .ok_or_else(|| invalid("field path must be a string"))?;
        let op = items[1]
            .as_str()
            .ok_or_else(|| invalid("operator must be a string"))?
            .parse::<FilterOp>()
            .map_err(|reason| LiveError::invalid_arguments("filter", reason))?;
        Ok(Self::new(field, op, items[2].clone()))
    }
}

/// Filter prop: a single clause or several, all of which must match
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `["name", "==", "Mike"]`
    Single(FilterClause),
    /// `[["firstName", "==", "Mike"], ["lastName", "==", "Smith"]]`
    Compound(Vec<FilterClause>),
}

impl Filter {
    /// Parse the JSON form of a filter
    ///
    /// A list whose first element is itself a list is a compound filter.
    pub fn from_value(value: &Value) -> Result<Self, LiveError> {
        match value.as_array() {
            Some(items) if items.first().map_or(false, Value::is_array) => items
                .iter()
                .map(FilterClause::from_triple)
                .collect::<Result<Vec<_>, _>>()
                .map(Filter::Compound),
            _ => FilterClause::from_triple(value).map(Filter::Single),
        }
    }

    /// Clauses in application order
    pub fn clauses(&self) -> &[FilterClause] {
        match self {
            Filter::Single(clause) => std::slice::from_ref(clause),
            Filter::Compound(clauses) => clauses,
        }
    }
}

/// Parse a sort prop: comma-separated `field[:direction]` items
pub fn parse_sort(sort: &str) -> Result<Vec<(String, Direction)>, LiveError> {
    sort.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (field, direction) = match item.split_once(':') {
                Some((field, direction)) => (field.trim(), direction.trim().parse::<Direction>()),
                None => (item, Ok(Direction::default())),
            };
            if field.is_empty() {
                return Err(LiveError::invalid_arguments("sort", format!("missing field in '{}'", item)));
            }
            let direction = direction.map_err(|reason| LiveError::invalid_arguments("sort", reason))?;
            Ok((field.to_string(), direction))
        })
        .collect()
}

/// Props of [`FirestoreCollection`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionProps {
    /// Collection path
    pub path: String,
    /// Orderings, applied in sequence
    pub sort: Vec<(String, Direction)>,
    /// Where clauses
    pub filter: Option<Filter>,
    /// Maximum number of documents
    pub limit: Option<u32>,
}

impl CollectionProps {
    /// Props for the whole collection at `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the sort from its string form
    pub fn with_sort(mut self, sort: &str) -> Result<Self, LiveError> {
        self.sort = parse_sort(sort)?;
        Ok(self)
    }

    /// Set the filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the limit
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl QueryProps for CollectionProps {
    fn descriptor(&self) -> QueryDescriptor {
        let mut query = fire_query().collection(self.path.as_str());
        for clause in self.filter.iter().flat_map(Filter::clauses) {
            query = query.where_field(clause.field.as_str(), clause.op, clause.value.clone());
        }
        for (field, direction) in &self.sort {
            query = query.order_by(field.as_str(), *direction);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}
