use indexmap::IndexMap;

use crate::value::Value;

/// The materialized result of a SELECT: a column-named mapping of value
/// sequences, preserving insertion order of both columns and rows.
#[derive(Clone, Debug, Default)]
pub struct Response {
    pub columns: IndexMap<String, Vec<Value>>,
}

impl Response {
    pub fn new(column_names: &[String]) -> Response {
        let mut columns = IndexMap::new();
        for name in column_names {
            columns.insert(name.clone(), Vec::new());
        }
        Response { columns }
    }

    pub fn row_count(&self) -> usize {
        self.columns.values().next().map(Vec::len).unwrap_or(0)
    }

    pub fn push_row(&mut self, values: &[(String, Value)]) {
        for (name, value) in values {
            if let Some(col) = self.columns.get_mut(name) {
                col.push(value.clone());
            }
        }
    }
}
