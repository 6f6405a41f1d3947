use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::condition::{Condition, RowView};
use crate::constraint::{
    select_constraints_to_drop, validate_candidate, Constraint, ConstraintKind,
    ConstraintSelector, ForeignKeyResolver,
};
use crate::error::{EngineError, EngineResult};
use crate::response::Response;
use crate::value::{validate, DataType, Value};

/// A typed, constrained sequence of values. Invariant: every `body[i]` is
/// admissible for `data_type` and satisfies every attached constraint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Column {
    pub data_type: DataType,
    pub constraints: Vec<Constraint>,
    pub body: Vec<Value>,
}

impl Column {
    pub fn new(data_type: DataType) -> Column {
        Column {
            data_type,
            constraints: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn constraint_by_kind_tag(&self, tag: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.kind.tag() == tag)
    }
}

/// Ordered column mapping with a common row count, identified positionally.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Table {
    pub columns: IndexMap<String, Column>,
    pub row_count: usize,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    pub fn new() -> Table {
        Table {
            columns: IndexMap::new(),
            row_count: 0,
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    pub fn create_column(
        &mut self,
        name: &str,
        data_type: DataType,
        constraints: Vec<ConstraintKind>,
    ) -> EngineResult<()> {
        if name.trim().is_empty() {
            return Err(EngineError::InvalidName(name.to_string()));
        }
        if self.columns.contains_key(name) {
            return Err(EngineError::AlreadyExists(format!("column '{}'", name)));
        }

        let mut column = Column::new(data_type);
        column.body = vec![Value::Null; self.row_count];
        for kind in constraints {
            column.constraints.push(Constraint::new(name, kind));
        }

        self.columns.insert(name.to_string(), column);
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) -> EngineResult<()> {
        self.columns
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::NotFound(format!("column '{}'", name)))
    }

    pub fn drop_constraint(&mut self, column_name: &str, selector: ConstraintSelector) -> EngineResult<()> {
        let column = self
            .columns
            .get_mut(column_name)
            .ok_or_else(|| EngineError::NotFound(format!("column '{}'", column_name)))?;

        let to_drop = select_constraints_to_drop(&column.constraints, &selector);
        if to_drop.is_empty() {
            return Err(EngineError::NotFound(format!(
                "constraint on column '{}'",
                column_name
            )));
        }
        column.constraints.retain(|c| !to_drop.contains(&c.name));
        Ok(())
    }

    /// Changes a column's type only when every existing value remains
    /// admissible under the new type (spec §4.3, §9 resolves the coercion
    /// ambiguity in favor of failing rather than silently widening).
    pub fn modify_column_type(&mut self, name: &str, new_type: DataType) -> EngineResult<()> {
        let column = self
            .columns
            .get_mut(name)
            .ok_or_else(|| EngineError::NotFound(format!("column '{}'", name)))?;

        if !column.body.iter().all(|v| validate(new_type, v)) {
            return Err(EngineError::TypeMismatch(format!(
                "column '{}' has values incompatible with {}",
                name, new_type
            )));
        }
        column.data_type = new_type;
        Ok(())
    }

    pub fn rename_column(&mut self, old_name: &str, new_name: &str) -> EngineResult<()> {
        if !self.columns.contains_key(old_name) {
            return Err(EngineError::NotFound(format!("column '{}'", old_name)));
        }
        if self.columns.contains_key(new_name) {
            return Err(EngineError::AlreadyExists(format!("column '{}'", new_name)));
        }
        let index = self.columns.get_index_of(old_name).unwrap();
        let (_, column) = self.columns.shift_remove_index(index).unwrap();
        self.columns.shift_insert(index, new_name.to_string(), column);
        Ok(())
    }

    /// Validates `|columns| == |values|`, type- and constraint-checks each
    /// value, and appends the row only if every value is accepted. No
    /// partial insert on failure.
    pub fn insert(
        &mut self,
        columns: &[String],
        values: &[Value],
        resolver: &dyn ForeignKeyResolver,
    ) -> EngineResult<()> {
        if columns.len() != values.len() {
            return Err(EngineError::ParseError(
                "column list and value list must have equal length".into(),
            ));
        }
        for c in columns {
            if !self.columns.contains_key(c) {
                return Err(EngineError::NotFound(format!("column '{}'", c)));
            }
        }

        let mut candidate_row: IndexMap<String, Value> = IndexMap::new();
        for (name, column) in &self.columns {
            let value = match columns.iter().position(|c| c == name) {
                Some(idx) => values[idx].clone(),
                None => Value::Null,
            };
            if !validate(column.data_type, &value) {
                return Err(EngineError::TypeMismatch(format!(
                    "value for column '{}' does not match {}",
                    name, column.data_type
                )));
            }
            candidate_row.insert(name.clone(), value);
        }

        for (name, column) in &self.columns {
            let candidate = &candidate_row[name];
            validate_candidate(name, &column.constraints, candidate, &column.body, resolver)?;
        }

        for (name, value) in candidate_row {
            self.columns.get_mut(&name).unwrap().body.push(value);
        }
        self.row_count += 1;
        Ok(())
    }

    fn matching_indices(&self, condition: Option<&Condition>) -> Vec<usize> {
        match condition {
            None => (0..self.row_count).collect(),
            Some(cond) => (0..self.row_count)
                .filter(|&i| cond.eval(&self.row_view(i)))
                .collect(),
        }
    }

    fn row_view(&self, index: usize) -> RowView {
        self.columns
            .iter()
            .map(|(name, col)| (name.as_str(), &col.body[index]))
            .collect()
    }

    /// Rewrites assigned cells for every matching row. Constraints are
    /// re-validated against the column as it will read once every matching
    /// row has been rewritten; any violation aborts the whole update
    /// leaving the table unchanged.
    pub fn update(
        &mut self,
        assignments: &[(String, Value)],
        condition: Option<&Condition>,
        resolver: &dyn ForeignKeyResolver,
    ) -> EngineResult<usize> {
        for (name, _) in assignments {
            if !self.columns.contains_key(name) {
                return Err(EngineError::NotFound(format!("column '{}'", name)));
            }
        }

        let indices = self.matching_indices(condition);

        for (name, value) in assignments {
            let column = &self.columns[name];
            if !validate(column.data_type, value) {
                return Err(EngineError::TypeMismatch(format!(
                    "value for column '{}' does not match {}",
                    name, column.data_type
                )));
            }
        }

        // Validate against the column as it will read after every matching
        // row is rewritten, not each row against its own prior value: one
        // UPDATE assigns the same value to every matched row, so two or
        // more matches collide with each other even when neither collides
        // with an unchanged row.
        for (name, value) in assignments {
            let column = &self.columns[name];
            let mut remaining: Vec<Value> = column
                .body
                .iter()
                .enumerate()
                .filter(|(i, _)| !indices.contains(i))
                .map(|(_, v)| v.clone())
                .collect();
            if indices.len() > 1 {
                // Every matched row will hold this same value; seed one
                // occurrence so UNIQUE/PRIMARY KEY sees the collision the
                // other matched rows would otherwise hide from each other.
                remaining.push(value.clone());
            }
            validate_candidate(name, &column.constraints, value, &remaining, resolver)?;
        }

        for &i in &indices {
            for (name, value) in assignments {
                self.columns.get_mut(name).unwrap().body[i] = value.clone();
            }
        }

        Ok(indices.len())
    }

    /// Compacts rows where `condition` is true.
    pub fn delete(&mut self, condition: Option<&Condition>) -> EngineResult<usize> {
        let to_remove: Vec<usize> = self.matching_indices(condition);
        let removed = to_remove.len();

        for column in self.columns.values_mut() {
            let mut kept = Vec::with_capacity(self.row_count - removed);
            for (i, value) in column.body.drain(..).enumerate() {
                if !to_remove.contains(&i) {
                    kept.push(value);
                }
            }
            column.body = kept;
        }
        self.row_count -= removed;

        Ok(removed)
    }

    /// Projects `columns` (or all columns when `None`) for every row
    /// matching `condition` (or every row when `None`), in insertion order.
    pub fn select(&self, columns: Option<&[String]>, condition: Option<&Condition>) -> EngineResult<Response> {
        let selected: Vec<String> = match columns {
            Some(cols) => {
                for c in cols {
                    if !self.columns.contains_key(c) {
                        return Err(EngineError::NotFound(format!("column '{}'", c)));
                    }
                }
                cols.to_vec()
            }
            None => self.column_names(),
        };

        let mut response = Response::new(&selected);
        for i in self.matching_indices(condition) {
            let row: Vec<(String, Value)> = selected
                .iter()
                .map(|name| (name.clone(), self.columns[name].body[i].clone()))
                .collect();
            response.push_row(&row);
        }
        Ok(response)
    }

    pub fn primary_key_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|(_, col)| col.constraint_by_kind_tag("primary_key").is_some())
            .map(|(name, _)| name.as_str())
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

    fn sample_table() -> Table {
        let mut table = Table::new();
        table
            .create_column("id", DataType::Integer, vec![ConstraintKind::PrimaryKey])
            .unwrap();
        table
            .create_column("name", DataType::String, vec![ConstraintKind::Unique])
            .unwrap();
        table
            .create_column(
                "age",
                DataType::Integer,
                vec![
                    ConstraintKind::NotNull,
                    ConstraintKind::Check {
                        expression: "age >= 18".into(),
                        condition: Condition::parse("age >= 18").unwrap(),
                    },
                ],
            )
            .unwrap();
        table
    }

    #[test]
    fn insert_then_select_preserves_order() {
        let mut table = sample_table();
        table
            .insert(
                &["id".into(), "name".into(), "age".into()],
                &[Value::Integer(1), Value::String("John".into()), Value::Integer(30)],
                &NoParents,
            )
            .unwrap();
        table
            .insert(
                &["id".into(), "name".into(), "age".into()],
                &[Value::Integer(2), Value::String("Alice".into()), Value::Integer(25)],
                &NoParents,
            )
            .unwrap();

        let response = table.select(None, None).unwrap();
        assert_eq!(response.row_count(), 2);
        assert_eq!(response.columns["name"][0], Value::String("John".into()));
        assert_eq!(response.columns["name"][1], Value::String("Alice".into()));
    }

    #[test]
    fn check_constraint_rejects_and_leaves_table_unchanged() {
        let mut table = sample_table();
        table
            .insert(
                &["id".into(), "name".into(), "age".into()],
                &[Value::Integer(1), Value::String("John".into()), Value::Integer(30)],
                &NoParents,
            )
            .unwrap();

        let err = table
            .insert(
                &["id".into(), "name".into(), "age".into()],
                &[Value::Integer(3), Value::String("Petra".into()), Value::Integer(15)],
                &NoParents,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::ConstraintViolation { .. }));
        assert_eq!(table.row_count, 1);
    }

    #[test]
    fn update_all_or_nothing() {
        let mut table = sample_table();
        table
            .insert(
                &["id".into(), "name".into(), "age".into()],
                &[Value::Integer(1), Value::String("John".into()), Value::Integer(30)],
                &NoParents,
            )
            .unwrap();
        table
            .insert(
                &["id".into(), "name".into(), "age".into()],
                &[Value::Integer(2), Value::String("Alice".into()), Value::Integer(25)],
                &NoParents,
            )
            .unwrap();

        // Violates the CHECK constraint for every row; nothing should change.
        let err = table
            .update(&[("age".into(), Value::Integer(5))], None, &NoParents)
            .unwrap_err();
        assert!(matches!(err, EngineError::ConstraintViolation { .. }));
        let response = table.select(Some(&["age".to_string()]), None).unwrap();
        assert_eq!(response.columns["age"][0], Value::Integer(30));
        assert_eq!(response.columns["age"][1], Value::Integer(25));
    }

    #[test]
    fn update_rejects_a_value_that_collides_across_matched_rows() {
        let mut table = sample_table();
        table
            .insert(
                &["id".into(), "name".into(), "age".into()],
                &[Value::Integer(1), Value::String("John".into()), Value::Integer(30)],
                &NoParents,
            )
            .unwrap();
        table
            .insert(
                &["id".into(), "name".into(), "age".into()],
                &[Value::Integer(2), Value::String("Alice".into()), Value::Integer(25)],
                &NoParents,
            )
            .unwrap();

        // No WHERE clause: both rows match and would be assigned the same
        // `id`, which must violate the PRIMARY KEY even though neither row
        // collides with its own prior value.
        let err = table
            .update(&[("id".into(), Value::Integer(5))], None, &NoParents)
            .unwrap_err();
        assert!(matches!(err, EngineError::ConstraintViolation { .. }));
        let response = table.select(Some(&["id".to_string()]), None).unwrap();
        assert_eq!(response.columns["id"][0], Value::Integer(1));
        assert_eq!(response.columns["id"][1], Value::Integer(2));
    }

    #[test]
    fn delete_compacts_rows() {
        let mut table = sample_table();
        table
            .insert(
                &["id".into(), "name".into(), "age".into()],
                &[Value::Integer(1), Value::String("John".into()), Value::Integer(30)],
                &NoParents,
            )
            .unwrap();
        table
            .insert(
                &["id".into(), "name".into(), "age".into()],
                &[Value::Integer(2), Value::String("Alice".into()), Value::Integer(25)],
                &NoParents,
            )
            .unwrap();

        let cond = Condition::parse("id = 1").unwrap();
        let removed = table.delete(Some(&cond)).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(table.row_count, 1);
        let response = table.select(None, None).unwrap();
        assert_eq!(response.columns["name"][0], Value::String("Alice".into()));
    }
}
