//! Field values, filter operators and sort directions
//!
//! Field values are plain JSON (`serde_json::Value`); stores translate them
//! into their own representation when a query is replayed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Field value type used in filters and document payloads
pub use serde_json::Value;

/// Filter operators accepted by `where`
///
/// Spelled the way Firestore clients spell them (`"=="`, `"array-contains"`, ...),
/// both for parsing and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    /// field == value
    #[serde(rename = "==")]
    Equal,

    /// field != value
    #[serde(rename = "!=")]
    NotEqual,

    /// field < value
    #[serde(rename = "<")]
    LessThan,

    /// field <= value
    #[serde(rename = "<=")]
    LessThanOrEqual,

    /// field > value
    #[serde(rename = ">")]
    GreaterThan,

    /// field >= value
    #[serde(rename = ">=")]
    GreaterThanOrEqual,

    /// field array contains value
    #[serde(rename = "array-contains")]
    ArrayContains,

    /// field array contains any value from list
    #[serde(rename = "array-contains-any")]
    ArrayContainsAny,

    /// field value is in list
    #[serde(rename = "in")]
    In,

    /// field value is not in list
    #[serde(rename = "not-in")]
    NotIn,
}

impl FilterOp {
    /// Operator as written in a `where` call
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Equal => "==",
            FilterOp::NotEqual => "!=",
            FilterOp::LessThan => "<",
            FilterOp::LessThanOrEqual => "<=",
            FilterOp::GreaterThan => ">",
            FilterOp::GreaterThanOrEqual => ">=",
            FilterOp::ArrayContains => "array-contains",
            FilterOp::ArrayContainsAny => "array-contains-any",
            FilterOp::In => "in",
            FilterOp::NotIn => "not-in",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(FilterOp::Equal),
            "!=" => Ok(FilterOp::NotEqual),
            "<" => Ok(FilterOp::LessThan),
            "<=" => Ok(FilterOp::LessThanOrEqual),
            ">" => Ok(FilterOp::GreaterThan),
            ">=" => Ok(FilterOp::GreaterThanOrEqual),
            "array-contains" => Ok(FilterOp::ArrayContains),
            "array-contains-any" => Ok(FilterOp::ArrayContainsAny),
            "in" => Ok(FilterOp::In),
            "not-in" => Ok(FilterOp::NotIn),
            other => Err(format!("unsupported filter operator '{}'", other)),
        }
    }
}

/// Sort direction for `orderBy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

impl Direction {
    /// Direction as written in an `orderBy` call
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Asc),
            "desc" | "descending" => Ok(Direction::Desc),
            other => Err(format!("unsupported sort direction '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_op_parse_and_display() {
        for op in [
            FilterOp::Equal,
            FilterOp::NotEqual,
            FilterOp::LessThan,
            FilterOp::LessThanOrEqual,
            FilterOp::GreaterThan,
            FilterOp::GreaterThanOrEqual,
            FilterOp::ArrayContains,
            FilterOp::ArrayContainsAny,
            FilterOp::In,
            FilterOp::NotIn,
        ] {
            assert_eq!(op.as_str().parse::<FilterOp>(), Ok(op));
        }
        assert!("===".parse::<FilterOp>().is_err());
    }

    #[test]
    fn test_filter_op_serde_uses_symbols() {
        let json = serde_json::to_string(&FilterOp::ArrayContains).unwrap();
        assert_eq!(json, "\"array-contains\"");
        let op: FilterOp = serde_json::from_str("\">=\"").unwrap();
        assert_eq!(op, FilterOp::GreaterThanOrEqual);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("desc".parse::<Direction>(), Ok(Direction::Desc));
        assert_eq!("ASC".parse::<Direction>(), Ok(Direction::Asc));
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::default(), Direction::Asc);
    }
}
