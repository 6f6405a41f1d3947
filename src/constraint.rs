use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::condition::{Condition, RowView};
use crate::error::{EngineError, EngineResult};
use crate::value::Value;

/// The kind of predicate a constraint enforces, independent of its name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ConstraintKind {
    NotNull,
    Unique,
    PrimaryKey,
    ForeignKey { parent_table: String },
    Check { expression: String, condition: Condition },
}

impl ConstraintKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ConstraintKind::NotNull => "not_null",
            ConstraintKind::Unique => "unique",
            ConstraintKind::PrimaryKey => "primary_key",
            ConstraintKind::ForeignKey { .. } => "foreign_key",
            ConstraintKind::Check { .. } => "check",
        }
    }
}

/// A named predicate attached to a column. Default naming is
/// `<columnName>_<kind>_constraint`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn new(column_name: &str, kind: ConstraintKind) -> Constraint {
        let name = format!("{}_{}_constraint", column_name, kind.tag());
        Constraint { name, kind }
    }

    pub fn named(name: impl Into<String>, kind: ConstraintKind) -> Constraint {
        Constraint {
            name: name.into(),
            kind,
        }
    }
}

/// A read-only view of the rest of the database a constraint may need to
/// consult (foreign-key parent lookups).
pub trait ForeignKeyResolver {
    /// Returns true iff `value` appears in `parent_table`'s primary key
    /// column.
    fn primary_key_contains(&self, parent_table: &str, value: &Value) -> EngineResult<bool>;
}

/// Evaluate every constraint on a column against a candidate value, in the
/// order specified in spec §4.2: NOT NULL, type admissibility (checked by
/// the caller before this runs), UNIQUE/PRIMARY KEY, FOREIGN KEY, CHECK.
pub fn validate_candidate(
    column_name: &str,
    constraints: &[Constraint],
    candidate: &Value,
    existing_values: &[Value],
    resolver: &dyn ForeignKeyResolver,
) -> EngineResult<()> {
    for constraint in constraints {
        match &constraint.kind {
            ConstraintKind::NotNull => {
                if candidate.is_null() {
                    return Err(violation(constraint, column_name));
                }
            }
            ConstraintKind::PrimaryKey => {
                if candidate.is_null() {
                    return Err(violation(constraint, column_name));
                }
                if existing_values.iter().any(|v| v == candidate) {
                    return Err(violation(constraint, column_name));
                }
            }
            ConstraintKind::Unique => {
                // Two Nulls violate UNIQUE (spec §9 open question, resolved "yes").
                if existing_values.iter().any(|v| v == candidate) {
                    return Err(violation(constraint, column_name));
                }
            }
            ConstraintKind::ForeignKey { parent_table } => {
                if candidate.is_null() {
                    continue;
                }
                if !resolver.primary_key_contains(parent_table, candidate)? {
                    return Err(violation(constraint, column_name));
                }
            }
            ConstraintKind::Check { condition, .. } => {
                let mut row: RowView = HashMap::new();
                row.insert(column_name, candidate);
                if !condition.eval(&row) {
                    return Err(violation(constraint, column_name));
                }
            }
        }
    }
    Ok(())
}

fn violation(constraint: &Constraint, column: &str) -> EngineError {
    EngineError::ConstraintViolation {
        constraint: constraint.name.clone(),
        column: column.to_string(),
    }
}

/// Selects constraints to drop: either every constraint of a given kind, or
/// one constraint by its exact name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ConstraintSelector {
    Kind(String),
    Name(String),
}

pub fn select_constraints_to_drop(constraints: &[Constraint], selector: &ConstraintSelector) -> Vec<String> {
    match selector {
        ConstraintSelector::Kind(kind) => constraints
            .iter()
            .filter(|c| c.kind.tag() == kind)
            .map(|c| c.name.clone())
            .collect(),
        ConstraintSelector::Name(name) => constraints
            .iter()
            .filter(|c| &c.name == name)
            .map(|c| c.name.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoParents;
    impl ForeignKeyResolver for NoParents {
        fn primary_key_contains(&self, _parent_table: &str, _value: &Value) -> EngineResult<bool> {
            Ok(true)
        }
    }

    #[test]
    fn default_constraint_name_follows_convention() {
        let c = Constraint::new("age", ConstraintKind::NotNull);
        assert_eq!(c.name, "age_not_null_constraint");
    }

    #[test]
    fn not_null_rejects_null() {
        let constraints = vec![Constraint::new("age", ConstraintKind::NotNull)];
        let err = validate_candidate("age", &constraints, &Value::Null, &[], &NoParents).unwrap_err();
        assert!(matches!(err, EngineError::ConstraintViolation { .. }));
    }

    #[test]
    fn unique_rejects_duplicate_including_duplicate_nulls() {
        let constraints = vec![Constraint::new("name", ConstraintKind::Unique)];
        let existing = vec![Value::Null];
        let err = validate_candidate("name", &constraints, &Value::Null, &existing, &NoParents).unwrap_err();
        assert!(matches!(err, EngineError::ConstraintViolation { .. }));
    }

    #[test]
    fn check_rejects_failing_predicate() {
        let condition = Condition::parse("age >= 18").unwrap();
        let constraints = vec![Constraint::named(
            "age_check_constraint",
            ConstraintKind::Check {
                expression: "age >= 18".into(),
                condition,
            },
        )];
        let err = validate_candidate("age", &constraints, &Value::Integer(15), &[], &NoParents).unwrap_err();
        match err {
            EngineError::ConstraintViolation { constraint, .. } => {
                assert_eq!(constraint, "age_check_constraint")
            }
            _ => panic!("expected constraint violation"),
        }
    }
}
