use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::engine_state::EngineState;
use crate::error::{EngineError, EngineResult};
use crate::table::Table;
use crate::value::Value;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Insert {
    pub table_name: String,
    pub columns: Vec<String>,
    pub values: Vec<Value>,
    pre_image: Option<Table>,
}

impl Insert {
    pub fn new(table_name: String, columns: Vec<String>, values: Vec<Value>) -> Insert {
        Insert {
            table_name,
            columns,
            values,
            pre_image: None,
        }
    }

    pub fn execute(&mut self, state: &mut EngineState) -> EngineResult<bool> {
        let pre_image = state.database.table(&self.table_name)?.clone();
        state
            .database
            .insert(&self.table_name, &self.columns, &self.values)?;
        self.pre_image = Some(pre_image);
        Ok(true)
    }

    pub fn undo(&mut self, state: &mut EngineState) -> EngineResult<()> {
        let pre_image = self.pre_image.take().ok_or_else(|| {
            EngineError::NotFound(format!("no captured pre-image for table '{}'", self.table_name))
        })?;
        *state.database.table_mut(&self.table_name)? = pre_image;
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Update {
    pub table_name: String,
    pub assignments: Vec<(String, Value)>,
    pub condition: Option<Condition>,
    pre_image: Option<Table>,
}

impl Update {
    pub fn new(table_name: String, assignments: Vec<(String, Value)>, condition: Option<Condition>) -> Update {
        Update {
            table_name,
            assignments,
            condition,
            pre_image: None,
        }
    }

    pub fn execute(&mut self, state: &mut EngineState) -> EngineResult<bool> {
        let pre_image = state.database.table(&self.table_name)?.clone();
        state
            .database
            .update(&self.table_name, &self.assignments, self.condition.as_ref())?;
        self.pre_image = Some(pre_image);
        Ok(true)
    }

    pub fn undo(&mut self, state: &mut EngineState) -> EngineResult<()> {
        let pre_image = self.pre_image.take().ok_or_else(|| {
            EngineError::NotFound(format!("no captured pre-image for table '{}'", self.table_name))
        })?;
        *state.database.table_mut(&self.table_name)? = pre_image;
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Delete {
    pub table_name: String,
    pub condition: Option<Condition>,
    pre_image: Option<Table>,
}

impl Delete {
    pub fn new(table_name: String, condition: Option<Condition>) -> Delete {
        Delete {
            table_name,
            condition,
            pre_image: None,
        }
    }

    pub fn execute(&mut self, state: &mut EngineState) -> EngineResult<bool> {
        let pre_image = state.database.table(&self.table_name)?.clone();
        state.database.delete(&self.table_name, self.condition.as_ref())?;
        self.pre_image = Some(pre_image);
        Ok(true)
    }

    pub fn undo(&mut self, state: &mut EngineState) -> EngineResult<()> {
        let pre_image = self.pre_image.take().ok_or_else(|| {
            EngineError::NotFound(format!("no captured pre-image for table '{}'", self.table_name))
        })?;
        *state.database.table_mut(&self.table_name)? = pre_image;
        Ok(())
    }
}

/// Non-mutating; always returns `false` (spec §4.6). Writes its result into
/// `state.last_response` for `SHOW`/`PRINT` to pick up.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Select {
    pub table_name: String,
    pub columns: Option<Vec<String>>,
    pub condition: Option<Condition>,
}

impl Select {
    pub fn new(table_name: String, columns: Option<Vec<String>>, condition: Option<Condition>) -> Select {
        Select {
            table_name,
            columns,
            condition,
        }
    }

    pub fn execute(&mut self, state: &mut EngineState) -> EngineResult<bool> {
        let response = state.database.select(
            &self.table_name,
            self.columns.as_deref(),
            self.condition.as_ref(),
        )?;
        state.last_response = Some(response);
        Ok(false)
    }

    pub fn undo(&mut self, _state: &mut EngineState) -> EngineResult<()> {
        Ok(())
    }
}
