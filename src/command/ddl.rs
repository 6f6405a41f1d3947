use serde::{Deserialize, Serialize};

use crate::constraint::ConstraintSelector;
use crate::database::Database;
use crate::engine_state::EngineState;
use crate::error::{EngineError, EngineResult};
use crate::table::Table;
use crate::value::DataType;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateTable {
    pub table_name: String,
    pub column_defs: Vec<String>,
}

impl CreateTable {
    pub fn new(table_name: String, column_defs: Vec<String>) -> CreateTable {
        CreateTable {
            table_name,
            column_defs,
        }
    }

    pub fn execute(&mut self, state: &mut EngineState) -> EngineResult<bool> {
        state
            .database
            .create_table(&self.table_name, &self.column_defs)?;
        Ok(true)
    }

    pub fn undo(&mut self, state: &mut EngineState) -> EngineResult<()> {
        state.database.drop_table(&self.table_name)
    }
}

/// Captures the whole table by value before dropping it, so `undo` can
/// reinsert it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DropTable {
    pub table_name: String,
    pre_image: Option<Table>,
}

impl DropTable {
    pub fn new(table_name: String) -> DropTable {
        DropTable {
            table_name,
            pre_image: None,
        }
    }

    pub fn execute(&mut self, state: &mut EngineState) -> EngineResult<bool> {
        let existing = state.database.table(&self.table_name)?.clone();
        state.database.drop_table(&self.table_name)?;
        self.pre_image = Some(existing);
        Ok(true)
    }

    pub fn undo(&mut self, state: &mut EngineState) -> EngineResult<()> {
        let table = self.pre_image.take().ok_or_else(|| {
            EngineError::NotFound(format!(
                "no captured pre-image for table '{}'",
                self.table_name
            ))
        })?;
        state.database.tables.insert(self.table_name.clone(), table);
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenameTable {
    pub old_name: String,
    pub new_name: String,
}

impl RenameTable {
    pub fn new(old_name: String, new_name: String) -> RenameTable {
        RenameTable { old_name, new_name }
    }

    pub fn execute(&mut self, state: &mut EngineState) -> EngineResult<bool> {
        state.database.rename_table(&self.old_name, &self.new_name)?;
        Ok(true)
    }

    pub fn undo(&mut self, state: &mut EngineState) -> EngineResult<()> {
        state.database.rename_table(&self.new_name, &self.old_name)
    }
}

/// Each phase list is optional; presence means "apply this phase". The
/// whole table is captured
/// pre-mutation so undo restores it in one step regardless of how many
/// phases ran.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlterTable {
    pub table_name: String,
    pub new_columns: Option<Vec<String>>,
    pub modified_columns: Option<Vec<(String, DataType)>>,
    pub dropped_columns: Option<Vec<String>>,
    pub dropped_constraints: Option<Vec<(String, ConstraintSelector)>>,
    pre_image: Option<Table>,
}

impl AlterTable {
    pub fn new(
        table_name: String,
        new_columns: Option<Vec<String>>,
        modified_columns: Option<Vec<(String, DataType)>>,
        dropped_columns: Option<Vec<String>>,
        dropped_constraints: Option<Vec<(String, ConstraintSelector)>>,
    ) -> AlterTable {
        AlterTable {
            table_name,
            new_columns,
            modified_columns,
            dropped_columns,
            dropped_constraints,
            pre_image: None,
        }
    }

    pub fn execute(&mut self, state: &mut EngineState) -> EngineResult<bool> {
        let pre_image = state.database.table(&self.table_name)?.clone();
        state.database.alter_table(
            &self.table_name,
            self.new_columns.as_deref(),
            self.modified_columns.as_deref(),
            self.dropped_columns.as_deref(),
            self.dropped_constraints.as_deref(),
        )?;
        self.pre_image = Some(pre_image);
        Ok(true)
    }

    pub fn undo(&mut self, state: &mut EngineState) -> EngineResult<()> {
        let pre_image = self.pre_image.take().ok_or_else(|| {
            EngineError::NotFound(format!(
                "no captured pre-image for table '{}'",
                self.table_name
            ))
        })?;
        *state.database.table_mut(&self.table_name)? = pre_image;
        Ok(())
    }
}

/// `CREATE DATABASE` — historical: undo discards the newly created
/// database and restores whichever database (if any) was active before
/// it. Only one database is ever active in a process at a time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateDatabase {
    pub name: String,
    pub path: Option<std::path::PathBuf>,
    previous: Option<Database>,
}

impl CreateDatabase {
    pub fn new(name: String, path: Option<std::path::PathBuf>) -> CreateDatabase {
        CreateDatabase {
            name,
            path,
            previous: None,
        }
    }

    pub fn execute(&mut self, state: &mut EngineState) -> EngineResult<bool> {
        if self.name.trim().is_empty() {
            return Err(EngineError::InvalidName(self.name.clone()));
        }

        let file_path = self
            .path
            .clone()
            .unwrap_or_else(|| state.config.database_file(&self.name));

        if file_path.exists() {
            return Err(EngineError::AlreadyExists(format!(
                "database '{}'",
                self.name
            )));
        }

        self.previous = Some(state.database.clone());
        let database = Database::new(self.name.clone(), file_path.clone());
        crate::snapshot::save(&database, &file_path)?;
        state.database = database;
        Ok(true)
    }

    pub fn undo(&mut self, state: &mut EngineState) -> EngineResult<()> {
        let previous = self
            .previous
            .take()
            .ok_or_else(|| EngineError::NotFound("no previous database captured".into()))?;
        let _ = crate::snapshot::delete(&state.config.database_file(&self.name));
        state.database = previous;
        Ok(())
    }
}

/// `OPEN` — non-mutating: loads an already-persisted database snapshot
/// and makes it active. Not undoable; the prior database is simply
/// re-opened if needed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenDatabase {
    pub name: String,
    pub path: Option<std::path::PathBuf>,
}

impl OpenDatabase {
    pub fn new(name: String, path: Option<std::path::PathBuf>) -> OpenDatabase {
        OpenDatabase { name, path }
    }

    pub fn execute(&mut self, state: &mut EngineState) -> EngineResult<bool> {
        let file_path = self
            .path
            .clone()
            .unwrap_or_else(|| state.config.database_file(&self.name));
        let database = crate::snapshot::load(&file_path)?;
        state.database = database;
        Ok(false)
    }

    pub fn undo(&mut self, _state: &mut EngineState) -> EngineResult<()> {
        Ok(())
    }
}
