use serde::{Deserialize, Serialize};

use crate::engine_state::EngineState;
use crate::error::EngineResult;
use crate::response::Response;
use crate::value::Value;

/// `SHOW` — non-mutating (spec §4.6). With no path, summarizes the active
/// database's tables (name, column count, row count) into
/// `state.last_response` so the existing printer can render it. With a
/// path, lists the database directories found under it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Show {
    pub path: Option<std::path::PathBuf>,
}

impl Show {
    pub fn new(path: Option<std::path::PathBuf>) -> Show {
        Show { path }
    }

    pub fn execute(&mut self, state: &mut EngineState) -> EngineResult<bool> {
        let response = match &self.path {
            Some(root) => {
                let mut response = Response::new(&["database".to_string()]);
                if let Ok(entries) = std::fs::read_dir(root) {
                    let mut names: Vec<String> = entries
                        .flatten()
                        .filter(|e| e.path().is_dir())
                        .filter_map(|e| e.file_name().into_string().ok())
                        .collect();
                    names.sort();
                    for name in names {
                        response.push_row(&[("database".to_string(), Value::String(name))]);
                    }
                }
                response
            }
            None => {
                let mut response = Response::new(&[
                    "table".to_string(),
                    "columns".to_string(),
                    "rows".to_string(),
                ]);
                for (name, table) in &state.database.tables {
                    response.push_row(&[
                        ("table".to_string(), Value::String(name.clone())),
                        (
                            "columns".to_string(),
                            Value::Integer(table.columns.len() as i64),
                        ),
                        ("rows".to_string(), Value::Integer(table.row_count as i64)),
                    ]);
                }
                response
            }
        };

        state.last_response = Some(response);
        Ok(false)
    }

    pub fn undo(&mut self, _state: &mut EngineState) -> EngineResult<()> {
        Ok(())
    }
}

/// `HELP` — non-mutating (spec §4.6). Looks up the static help catalog
/// (spec §6); content is not semantically load-bearing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Help {
    pub topic: Option<String>,
}

impl Help {
    pub fn new(topic: Option<String>) -> Help {
        Help { topic }
    }

    pub fn lookup(&self) -> anyhow::Result<&'static str> {
        let path = self
            .topic
            .as_ref()
            .map(|t| format!("commands/{}", t.to_lowercase()))
            .unwrap_or_default();
        crate::docs::get(&path)
    }

    pub fn execute(&mut self, _state: &mut EngineState) -> EngineResult<bool> {
        Ok(false)
    }

    pub fn undo(&mut self, _state: &mut EngineState) -> EngineResult<()> {
        Ok(())
    }
}
