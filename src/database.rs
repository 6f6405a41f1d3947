use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::condition::Condition;
use crate::constraint::{ConstraintKind, ConstraintSelector, ForeignKeyResolver};
use crate::error::{EngineError, EngineResult};
use crate::response::Response;
use crate::table::Table;
use crate::value::{parse_literal, DataType, Value};

/// The database lifecycle state machine (spec §3). Mutating operations are
/// valid only in `Created` or `InWork`, and transition `Created` -> `InWork`
/// on first successful mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseState {
    Idle,
    Reset,
    Created,
    InWork,
    Closed,
}

impl std::fmt::Display for DatabaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DatabaseState::Idle => "IDLE",
            DatabaseState::Reset => "RESET",
            DatabaseState::Created => "CREATED",
            DatabaseState::InWork => "IN_WORK",
            DatabaseState::Closed => "CLOSED",
        };
        write!(f, "{}", name)
    }
}

/// A named collection of tables plus a lifecycle state and on-disk path.
/// Tables are kept sorted by name for deterministic enumeration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    pub file_path: PathBuf,
    pub tables: BTreeMap<String, Table>,
    pub state: DatabaseState,
}

/// A parsed `IDENT IDENT (CONSTRAINT_SPEC)*` column definition, per the
/// grammar in spec §4.4.
pub struct ParsedColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ConstraintKind>,
}

impl Database {
    pub fn new(name: impl Into<String>, file_path: PathBuf) -> Database {
        Database {
            name: name.into(),
            file_path,
            tables: BTreeMap::new(),
            state: DatabaseState::Created,
        }
    }

    /// The placeholder database a freshly constructed [`crate::engine::Engine`]
    /// holds before any `CREATE DATABASE` or `OPEN` (spec §3: `IDLE`).
    pub fn idle() -> Database {
        Database {
            name: String::new(),
            file_path: PathBuf::new(),
            tables: BTreeMap::new(),
            state: DatabaseState::Idle,
        }
    }

    /// Checks the state gate without transitioning it. `CREATED -> IN_WORK`
    /// only happens once the mutation itself has actually succeeded (spec
    /// §3); each mutating operation below sets `state` itself on its own
    /// success path rather than here, so a failed first mutation leaves the
    /// database exactly as it was (spec §8 atomicity).
    fn guard_mutable(&self) -> EngineResult<()> {
        match self.state {
            DatabaseState::Created | DatabaseState::InWork => Ok(()),
            other => Err(EngineError::InvalidState(other.to_string())),
        }
    }

    fn guard_readable(&self) -> EngineResult<()> {
        match self.state {
            DatabaseState::Created | DatabaseState::InWork => Ok(()),
            other => Err(EngineError::InvalidState(other.to_string())),
        }
    }

    pub fn table(&self, name: &str) -> EngineResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| EngineError::NotFound(format!("table '{}'", name)))
    }

    pub fn table_mut(&mut self, name: &str) -> EngineResult<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| EngineError::NotFound(format!("table '{}'", name)))
    }

    pub fn create_table(&mut self, name: &str, column_defs: &[String]) -> EngineResult<()> {
        self.guard_mutable()?;
        if name.trim().is_empty() {
            return Err(EngineError::InvalidName(name.to_string()));
        }
        if self.tables.contains_key(name) {
            return Err(EngineError::AlreadyExists(format!("table '{}'", name)));
        }

        let parsed: Vec<ParsedColumnDef> = column_defs
            .iter()
            .map(|d| parse_column_def(d))
            .collect::<EngineResult<_>>()?;

        let mut table = Table::new();
        for def in parsed {
            table.create_column(&def.name, def.data_type, def.constraints)?;
        }

        self.tables.insert(name.to_string(), table);
        self.state = DatabaseState::InWork;
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> EngineResult<()> {
        self.guard_mutable()?;
        self.tables
            .remove(name)
            .ok_or_else(|| EngineError::NotFound(format!("table '{}'", name)))?;
        self.state = DatabaseState::InWork;
        Ok(())
    }

    pub fn rename_table(&mut self, old_name: &str, new_name: &str) -> EngineResult<()> {
        self.guard_mutable()?;
        if !self.tables.contains_key(old_name) {
            return Err(EngineError::NotFound(format!("table '{}'", old_name)));
        }
        if self.tables.contains_key(new_name) {
            return Err(EngineError::AlreadyExists(format!("table '{}'", new_name)));
        }
        let table = self.tables.remove(old_name).unwrap();
        self.tables.insert(new_name.to_string(), table);
        self.state = DatabaseState::InWork;
        Ok(())
    }

    /// Applies the four optional phases in order: add new columns, modify
    /// existing ones, drop columns, drop constraints. Within a phase, any
    /// failure aborts the whole ALTER; no partial schema change is applied.
    pub fn alter_table(
        &mut self,
        table_name: &str,
        new_columns: Option<&[String]>,
        modified_columns: Option<&[(String, DataType)]>,
        dropped_columns: Option<&[String]>,
        dropped_constraints: Option<&[(String, ConstraintSelector)]>,
    ) -> EngineResult<()> {
        self.guard_mutable()?;

        // Work on a scratch copy so a mid-phase failure leaves the real
        // table untouched (spec §4.4: "failures abort the whole alter").
        let mut scratch = self.table(table_name)?.clone();

        if let Some(cols) = new_columns {
            for spec in cols {
                let def = parse_column_def(spec)?;
                scratch.create_column(&def.name, def.data_type, def.constraints)?;
            }
        }

        if let Some(mods) = modified_columns {
            for (name, new_type) in mods {
                scratch.modify_column_type(name, *new_type)?;
            }
        }

        if let Some(drops) = dropped_columns {
            for name in drops {
                scratch.drop_column(name)?;
            }
        }

        if let Some(drops) = dropped_constraints {
            for (column_name, selector) in drops {
                scratch.drop_constraint(column_name, selector.clone())?;
            }
        }

        *self.table_mut(table_name)? = scratch;
        self.state = DatabaseState::InWork;
        Ok(())
    }

    pub fn insert(
        &mut self,
        table_name: &str,
        columns: &[String],
        values: &[Value],
    ) -> EngineResult<()> {
        self.guard_mutable()?;
        if !self.tables.contains_key(table_name) {
            return Err(EngineError::NotFound(format!("table '{}'", table_name)));
        }
        let resolver = DatabaseResolver { db: self };
        // SAFETY-FREE WORKAROUND: Rust forbids borrowing `self` both mutably
        // (for the table) and immutably (for the resolver) at once, so the
        // resolver snapshots the tables it needs before the mutable borrow.
        let resolver = resolver.materialize();
        let table = self.tables.get_mut(table_name).unwrap();
        table.insert(columns, values, &resolver)?;
        self.state = DatabaseState::InWork;
        Ok(())
    }

    pub fn update(
        &mut self,
        table_name: &str,
        assignments: &[(String, Value)],
        condition: Option<&Condition>,
    ) -> EngineResult<usize> {
        self.guard_mutable()?;
        if !self.tables.contains_key(table_name) {
            return Err(EngineError::NotFound(format!("table '{}'", table_name)));
        }
        let resolver = DatabaseResolver { db: self }.materialize();
        let table = self.tables.get_mut(table_name).unwrap();
        let updated = table.update(assignments, condition, &resolver)?;
        self.state = DatabaseState::InWork;
        Ok(updated)
    }

    pub fn delete(&mut self, table_name: &str, condition: Option<&Condition>) -> EngineResult<usize> {
        self.guard_mutable()?;
        let table = self.table_mut(table_name)?;
        let removed = table.delete(condition)?;
        self.state = DatabaseState::InWork;
        Ok(removed)
    }

    pub fn select(
        &self,
        table_name: &str,
        columns: Option<&[String]>,
        condition: Option<&Condition>,
    ) -> EngineResult<Response> {
        self.guard_readable()?;
        self.table(table_name)?.select(columns, condition)
    }

    /// Replaces all tables with those of `other`, by value.
    pub fn restore(&mut self, other: &Database) {
        self.name = other.name.clone();
        self.file_path = other.file_path.clone();
        self.tables = other.tables.clone();
        self.state = other.state;
    }

    pub fn reset(&mut self) {
        self.state = DatabaseState::Closed;
    }
}

/// Snapshot of the columns a foreign-key check needs, captured up front so
/// it can be consulted while a specific table is mutably borrowed.
struct DatabaseResolver<'a> {
    db: &'a Database,
}

struct MaterializedResolver {
    primary_keys: BTreeMap<String, Vec<Value>>,
}

impl<'a> DatabaseResolver<'a> {
    fn materialize(&self) -> MaterializedResolver {
        let mut primary_keys = BTreeMap::new();
        for (name, table) in &self.db.tables {
            if let Some(pk) = table.primary_key_column() {
                primary_keys.insert(name.clone(), table.columns[pk].body.clone());
            }
        }
        MaterializedResolver { primary_keys }
    }
}

impl ForeignKeyResolver for MaterializedResolver {
    fn primary_key_contains(&self, parent_table: &str, value: &Value) -> EngineResult<bool> {
        let values = self
            .primary_keys
            .get(parent_table)
            .ok_or_else(|| EngineError::NotFound(format!("table '{}'", parent_table)))?;
        Ok(values.iter().any(|v| v == value))
    }
}

/// Tokenizes a column definition, treating multi-word keywords
/// (`NOT NULL`, `PRIMARY KEY`, `FOREIGN KEY`, `REFERENCES`, `CHECK(...)`,
/// `DEFAULT`) as atomic per spec §4.4.
pub fn parse_column_def(def: &str) -> EngineResult<ParsedColumnDef> {
    let (head, check_expr) = split_off_check(def)?;
    let tokens: Vec<&str> = head.split_whitespace().collect();

    if tokens.len() < 2 {
        return Err(EngineError::ParseError(format!(
            "malformed column definition '{}'",
            def
        )));
    }

    let name = tokens[0].to_string();
    let data_type = DataType::parse(tokens[1])?;
    let mut constraints = Vec::new();

    let mut i = 2;
    while i < tokens.len() {
        let word = tokens[i].to_uppercase();
        match word.as_str() {
            "NOT" if tokens.get(i + 1).map(|t| t.eq_ignore_ascii_case("NULL")) == Some(true) => {
                constraints.push(ConstraintKind::NotNull);
                i += 2;
            }
            "PRIMARY" if tokens.get(i + 1).map(|t| t.eq_ignore_ascii_case("KEY")) == Some(true) => {
                constraints.push(ConstraintKind::PrimaryKey);
                i += 2;
            }
            "UNIQUE" => {
                constraints.push(ConstraintKind::Unique);
                i += 1;
            }
            "FOREIGN"
                if tokens.get(i + 1).map(|t| t.eq_ignore_ascii_case("KEY")) == Some(true)
                    && tokens.get(i + 2).map(|t| t.eq_ignore_ascii_case("REFERENCES")) == Some(true) =>
            {
                let parent = tokens.get(i + 3).ok_or_else(|| {
                    EngineError::ParseError(format!("expected table after REFERENCES in '{}'", def))
                })?;
                constraints.push(ConstraintKind::ForeignKey {
                    parent_table: parent.to_string(),
                });
                i += 4;
            }
            "DEFAULT" => {
                // DEFAULT <literal> is accepted by the grammar but the
                // kernel does not yet backfill existing rows with it; the
                // literal is parsed only to validate syntax.
                let literal = tokens.get(i + 1).ok_or_else(|| {
                    EngineError::ParseError(format!("expected literal after DEFAULT in '{}'", def))
                })?;
                parse_literal(literal)?;
                i += 2;
            }
            "CHECK" => {
                // Handled via `check_expr`, already extracted.
                i += 1;
            }
            other => {
                return Err(EngineError::ParseError(format!(
                    "unrecognized constraint token '{}' in '{}'",
                    other, def
                )))
            }
        }
    }

    if let Some(expr) = check_expr {
        let condition = Condition::parse(&expr)?;
        constraints.push(ConstraintKind::Check {
            expression: expr,
            condition,
        });
    }

    Ok(ParsedColumnDef {
        name,
        data_type,
        constraints,
    })
}

/// `CHECK(...)` is written without interior whitespace splitting by
/// tokenization above, so it is extracted as one atomic span before the
/// rest of the definition is split on whitespace.
fn split_off_check(def: &str) -> EngineResult<(String, Option<String>)> {
    if let Some(start) = def.find("CHECK(").or_else(|| def.find("check(")) {
        let after = &def[start + "CHECK(".len()..];
        let end = after
            .find(')')
            .ok_or_else(|| EngineError::ParseError(format!("unterminated CHECK( in '{}'", def)))?;
        let expr = after[..end].to_string();
        let head = format!("{}{}", &def[..start], &after[end + 1..]);
        Ok((head, Some(expr)))
    } else {
        Ok((def.to_string(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn db() -> Database {
        Database::new("test", PathBuf::from("test.db"))
    }

    #[test]
    fn create_table_parses_column_defs() {
        let mut database = db();
        database
            .create_table(
                "employees",
                &[
                    "id INTEGER PRIMARY KEY".to_string(),
                    "name STRING UNIQUE".to_string(),
                    "age INTEGER NOT NULL CHECK(age >= 18)".to_string(),
                ],
            )
            .unwrap();

        assert!(database.tables.contains_key("employees"));
        let table = database.table("employees").unwrap();
        assert_eq!(table.columns.len(), 3);
    }

    #[test]
    fn state_transitions_to_in_work_on_first_mutation() {
        let mut database = db();
        database
            .create_table("t", &["id INTEGER".to_string()])
            .unwrap();
        assert_eq!(database.state, DatabaseState::InWork);
    }

    #[test]
    fn mutating_a_closed_database_fails() {
        let mut database = db();
        database.reset();
        let err = database.create_table("t", &["id INTEGER".to_string()]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
    }

    #[test]
    fn a_failed_first_mutation_leaves_state_created() {
        let mut database = db();
        let err = database
            .create_table("t", &["id NOT_A_TYPE".to_string()])
            .unwrap_err();
        assert!(matches!(err, EngineError::ParseError(_)));
        assert_eq!(database.state, DatabaseState::Created);
    }

    #[test]
    fn alter_add_modify_drop_is_all_or_nothing() {
        let mut database = db();
        database
            .create_table("t", &["id INTEGER".to_string()])
            .unwrap();

        // Dropping a column that doesn't exist should abort the whole alter,
        // leaving the new column phase un-applied too.
        let err = database
            .alter_table(
                "t",
                Some(&["name STRING".to_string()]),
                None,
                Some(&["missing".to_string()]),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));

        let table = database.table("t").unwrap();
        assert!(!table.columns.contains_key("name"));
    }

    #[test]
    fn foreign_key_checks_parent_primary_key() {
        let mut database = db();
        database
            .create_table("departments", &["id INTEGER PRIMARY KEY".to_string()])
            .unwrap();
        database
            .create_table(
                "employees",
                &["dept_id INTEGER FOREIGN KEY REFERENCES departments".to_string()],
            )
            .unwrap();

        database
            .insert("departments", &["id".to_string()], &[Value::Integer(1)])
            .unwrap();

        let err = database
            .insert("employees", &["dept_id".to_string()], &[Value::Integer(99)])
            .unwrap_err();
        assert!(matches!(err, EngineError::ConstraintViolation { .. }));

        database
            .insert("employees", &["dept_id".to_string()], &[Value::Integer(1)])
            .unwrap();
    }
}
