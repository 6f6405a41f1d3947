use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::command::{
    AlterTable, Command, CreateDatabase, CreateTable, Delete, DropTable, Help, Insert,
    OpenDatabase, RenameTable, Select, Show, Update,
};
use crate::condition::Condition;
use crate::constraint::ConstraintSelector;
use crate::database::Database;
use crate::engine_state::EngineState;
use crate::error::{EngineError, EngineResult};
use crate::history::History;
use crate::paths::EngineConfig;
use crate::printer::{self, OutputKind};
use crate::response::Response;
use crate::transaction::TransactionManager;
use crate::value::{DataType, Value};

/// The façade (spec C8), serializing all access the way `reshape`'s
/// `DbLocker` serializes access to the underlying connection: one
/// `Mutex<Inner>` guards the active database, the transaction manager and
/// the undo history together, so a caller never observes them out of step
/// with each other.
pub struct Engine {
    inner: Mutex<Inner>,
}

struct Inner {
    state: EngineState,
    transactions: TransactionManager,
    history: History,
}

impl Engine {
    /// Factory (spec §9: "callers obtain a handle from a factory rather
    /// than constructing the state machine directly"). The process starts
    /// with no active database — `IDLE` until a `CREATE DATABASE` or
    /// `OPEN`.
    pub fn new(config: EngineConfig) -> Engine {
        let snapshot_path = config.transaction_snapshot_path("idle");
        let state = EngineState::new(Database::idle(), config);
        Engine {
            inner: Mutex::new(Inner {
                state,
                transactions: TransactionManager::new(snapshot_path),
                history: History::new(),
            }),
        }
    }

    /// Runs `command` through the transaction-staging decision described on
    /// [`Command::is_table_mutation`]: staged while a transaction is active
    /// and the command mutates tables, executed immediately and pushed onto
    /// history otherwise.
    fn dispatch(&self, mut command: Command) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.transactions.is_active() && command.is_table_mutation() {
            inner.transactions.enqueue(command)
        } else {
            let historical = command.execute(&mut inner.state)?;
            if historical {
                inner.history.push(command);
            }
            Ok(())
        }
    }

    pub fn create_database(&self, name: &str, path: Option<PathBuf>) -> EngineResult<()> {
        self.dispatch(Command::CreateDatabase(CreateDatabase::new(
            name.to_string(),
            path,
        )))?;
        let mut inner = self.inner.lock().unwrap();
        inner
            .transactions
            .set_snapshot_path(inner.state.config.transaction_snapshot_path(name));
        Ok(())
    }

    pub fn open(&self, name: &str, path: Option<PathBuf>) -> EngineResult<()> {
        self.dispatch(Command::OpenDatabase(OpenDatabase::new(
            name.to_string(),
            path,
        )))?;
        let mut inner = self.inner.lock().unwrap();
        inner
            .transactions
            .set_snapshot_path(inner.state.config.transaction_snapshot_path(name));
        Ok(())
    }

    pub fn create_table(&self, table_name: &str, column_defs: Vec<String>) -> EngineResult<()> {
        self.dispatch(Command::CreateTable(CreateTable::new(
            table_name.to_string(),
            column_defs,
        )))
    }

    pub fn drop_table(&self, table_name: &str) -> EngineResult<()> {
        self.dispatch(Command::DropTable(DropTable::new(table_name.to_string())))
    }

    pub fn rename_table(&self, old_name: &str, new_name: &str) -> EngineResult<()> {
        self.dispatch(Command::RenameTable(RenameTable::new(
            old_name.to_string(),
            new_name.to_string(),
        )))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn alter_table(
        &self,
        table_name: &str,
        new_columns: Option<Vec<String>>,
        modified_columns: Option<Vec<(String, DataType)>>,
        dropped_columns: Option<Vec<String>>,
        dropped_constraints: Option<Vec<(String, ConstraintSelector)>>,
    ) -> EngineResult<()> {
        self.dispatch(Command::AlterTable(AlterTable::new(
            table_name.to_string(),
            new_columns,
            modified_columns,
            dropped_columns,
            dropped_constraints,
        )))
    }

    /// Inserts one row at a time (spec §4.3: insert is defined over a
    /// single candidate row). Each row becomes its own historical command,
    /// so a multi-row insert can be undone row by row.
    pub fn insert(
        &self,
        table_name: &str,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> EngineResult<()> {
        for row in rows {
            self.dispatch(Command::Insert(Insert::new(
                table_name.to_string(),
                columns.clone(),
                row,
            )))?;
        }
        Ok(())
    }

    pub fn update(
        &self,
        table_name: &str,
        assignments: Vec<(String, Value)>,
        condition: Option<&str>,
    ) -> EngineResult<()> {
        let condition = condition.map(Condition::parse).transpose()?;
        self.dispatch(Command::Update(Update::new(
            table_name.to_string(),
            assignments,
            condition,
        )))
    }

    pub fn delete(&self, table_name: &str, condition: Option<&str>) -> EngineResult<()> {
        let condition = condition.map(Condition::parse).transpose()?;
        self.dispatch(Command::Delete(Delete::new(table_name.to_string(), condition)))
    }

    pub fn select(
        &self,
        table_name: &str,
        columns: Option<Vec<String>>,
        condition: Option<&str>,
    ) -> EngineResult<Response> {
        let condition = condition.map(Condition::parse).transpose()?;
        self.dispatch(Command::Select(Select::new(
            table_name.to_string(),
            columns,
            condition,
        )))?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.state.last_response.clone().unwrap_or_else(|| Response::new(&[])))
    }

    pub fn show(&self, path: Option<PathBuf>) -> EngineResult<Response> {
        self.dispatch(Command::Show(Show::new(path)))?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.state.last_response.clone().unwrap_or_else(|| Response::new(&[])))
    }

    pub fn help(&self, topic: Option<String>) -> anyhow::Result<&'static str> {
        Help::new(topic).lookup()
    }

    pub fn begin(&self) -> EngineResult<()> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        inner.transactions.begin(&inner.state)
    }

    pub fn commit(&self) -> EngineResult<()> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        let executed = inner.transactions.commit(&mut inner.state)?;
        for command in executed {
            inner.history.push(command);
        }
        Ok(())
    }

    pub fn rollback(&self) -> EngineResult<()> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        inner.transactions.rollback(&mut inner.state)
    }

    pub fn undo(&self) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.history.undo(&mut inner.state)
    }

    pub fn print(&self, kind: OutputKind, path: Option<&Path>) -> EngineResult<()> {
        let inner = self.inner.lock().unwrap();
        let response = inner
            .state
            .last_response
            .as_ref()
            .ok_or_else(|| EngineError::NotFound("no response to print".into()))?;
        printer::print(response, kind, path).map_err(EngineError::from)
    }

    pub fn history_size(&self) -> usize {
        self.inner.lock().unwrap().history.size()
    }

    pub fn is_transaction_active(&self) -> bool {
        self.inner.lock().unwrap().transactions.is_active()
    }
}
