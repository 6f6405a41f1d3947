use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A typed scalar. Equality is by tag and payload; two `Null`s are equal to
/// each other for set-membership purposes (see [`Value::eq`]).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Real(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn partial_cmp_ordered(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Real(b)) => (*a as f64).partial_cmp(b),
            (Value::Real(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// A column's declared type. A value is *admissible for* a type iff its tag
/// matches or it is `Null`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Real,
    String,
    Boolean,
}

impl DataType {
    pub fn parse(token: &str) -> EngineResult<DataType> {
        match token.to_uppercase().as_str() {
            "INTEGER" | "INT" => Ok(DataType::Integer),
            "REAL" | "FLOAT" | "DOUBLE" => Ok(DataType::Real),
            "STRING" | "TEXT" | "VARCHAR" => Ok(DataType::String),
            "BOOLEAN" | "BOOL" => Ok(DataType::Boolean),
            other => Err(EngineError::ParseError(format!("unknown data type '{other}'"))),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::String => "STRING",
            DataType::Boolean => "BOOLEAN",
        };
        write!(f, "{}", name)
    }
}

pub fn type_of(value: &Value) -> Option<DataType> {
    match value {
        Value::Integer(_) => Some(DataType::Integer),
        Value::Real(_) => Some(DataType::Real),
        Value::String(_) => Some(DataType::String),
        Value::Boolean(_) => Some(DataType::Boolean),
        Value::Null => None,
    }
}

/// A value is admissible for a type if it is `Null` or its tag matches.
/// No implicit coercion between `Integer` and `Real` happens here; widening
/// an `Integer` literal into a `Real` column is handled at the call site
/// (see [`crate::table::Column::insert_value`]) by checking the column's
/// declared type rather than by loosening this predicate.
pub fn validate(data_type: DataType, value: &Value) -> bool {
    match value {
        Value::Null => true,
        _ => type_of(value) == Some(data_type),
    }
}

/// Parse a literal token from a column-definition or condition grammar.
/// Recognizes decimal integers, decimal reals (`.` present), single- or
/// double-quoted strings, `true`/`false`, and `NULL`/`null`.
pub fn parse_literal(text: &str) -> EngineResult<Value> {
    let trimmed = text.trim();

    if trimmed.eq_ignore_ascii_case("null") {
        return Ok(Value::Null);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Ok(Value::Boolean(true));
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Ok(Value::Boolean(false));
    }

    if (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        || (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
    {
        return Ok(Value::String(trimmed[1..trimmed.len() - 1].to_string()));
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(Value::Integer(i));
    }

    if trimmed.contains('.') {
        if let Ok(r) = trimmed.parse::<f64>() {
            return Ok(Value::Real(r));
        }
    }

    Err(EngineError::ParseError(format!(
        "could not parse literal '{}'",
        text
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers_reals_strings_booleans_and_null() {
        assert_eq!(parse_literal("42").unwrap(), Value::Integer(42));
        assert_eq!(parse_literal("-3").unwrap(), Value::Integer(-3));
        assert_eq!(parse_literal("3.14").unwrap(), Value::Real(3.14));
        assert_eq!(
            parse_literal("'Alice'").unwrap(),
            Value::String("Alice".into())
        );
        assert_eq!(
            parse_literal("\"Bob\"").unwrap(),
            Value::String("Bob".into())
        );
        assert_eq!(parse_literal("true").unwrap(), Value::Boolean(true));
        assert_eq!(parse_literal("NULL").unwrap(), Value::Null);
    }

    #[test]
    fn null_is_admissible_for_every_type() {
        assert!(validate(DataType::Integer, &Value::Null));
        assert!(validate(DataType::String, &Value::Null));
    }

    #[test]
    fn mismatched_tag_is_not_admissible() {
        assert!(!validate(DataType::Integer, &Value::String("x".into())));
        assert!(!validate(DataType::Real, &Value::Integer(1)));
    }

    #[test]
    fn two_nulls_are_equal_for_set_membership() {
        assert_eq!(Value::Null, Value::Null);
    }
}
