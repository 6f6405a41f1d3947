pub mod ddl;
pub mod dml;
pub mod meta;
pub mod tcl;

use serde::{Deserialize, Serialize};

use crate::engine_state::EngineState;
use crate::error::EngineResult;

pub use ddl::{AlterTable, CreateDatabase, CreateTable, DropTable, OpenDatabase, RenameTable};
pub use dml::{Delete, Insert, Select, Update};
pub use meta::{Help, Show};
pub use tcl::{Begin, Commit, Rollback};

/// The command pattern's core polymorphism (`execute`/`undo`) encoded as a
/// sum type, per the design notes: no virtual dispatch outside this enum,
/// exhaustive pattern matching at the call sites.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Command {
    CreateDatabase(CreateDatabase),
    OpenDatabase(OpenDatabase),
    CreateTable(CreateTable),
    AlterTable(AlterTable),
    DropTable(DropTable),
    RenameTable(RenameTable),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    Select(Select),
    Show(Show),
    Help(Help),
    Begin(Begin),
    Commit(Commit),
    Rollback(Rollback),
}

impl Command {
    /// Whether this is a transaction-control command. The transaction
    /// manager's `enqueue` rejects these (spec §4.7).
    pub fn is_tcl(&self) -> bool {
        matches!(
            self,
            Command::Begin(_) | Command::Commit(_) | Command::Rollback(_)
        )
    }

    /// Whether this command mutates the active database's tables — the
    /// subset [`crate::engine::Engine`] stages in the transaction manager's
    /// queue while a transaction is active. `SELECT`/`SHOW`/`HELP` and the
    /// database-switching commands (`CREATE DATABASE`/`OPEN`) run
    /// immediately even mid-transaction: they either read rather than
    /// write, or replace which database is active altogether, neither of
    /// which a staged-queue replay can meaningfully defer (see DESIGN.md).
    pub fn is_table_mutation(&self) -> bool {
        matches!(
            self,
            Command::CreateTable(_)
                | Command::AlterTable(_)
                | Command::DropTable(_)
                | Command::RenameTable(_)
                | Command::Insert(_)
                | Command::Update(_)
                | Command::Delete(_)
        )
    }

    pub fn execute(&mut self, state: &mut EngineState) -> EngineResult<bool> {
        match self {
            Command::CreateDatabase(c) => c.execute(state),
            Command::OpenDatabase(c) => c.execute(state),
            Command::CreateTable(c) => c.execute(state),
            Command::AlterTable(c) => c.execute(state),
            Command::DropTable(c) => c.execute(state),
            Command::RenameTable(c) => c.execute(state),
            Command::Insert(c) => c.execute(state),
            Command::Update(c) => c.execute(state),
            Command::Delete(c) => c.execute(state),
            Command::Select(c) => c.execute(state),
            Command::Show(c) => c.execute(state),
            Command::Help(c) => c.execute(state),
            Command::Begin(_) | Command::Commit(_) | Command::Rollback(_) => Ok(false),
        }
    }

    pub fn undo(&mut self, state: &mut EngineState) -> EngineResult<()> {
        match self {
            Command::CreateDatabase(c) => c.undo(state),
            Command::OpenDatabase(c) => c.undo(state),
            Command::CreateTable(c) => c.undo(state),
            Command::AlterTable(c) => c.undo(state),
            Command::DropTable(c) => c.undo(state),
            Command::RenameTable(c) => c.undo(state),
            Command::Insert(c) => c.undo(state),
            Command::Update(c) => c.undo(state),
            Command::Delete(c) => c.undo(state),
            Command::Select(c) => c.undo(state),
            Command::Show(c) => c.undo(state),
            Command::Help(c) => c.undo(state),
            Command::Begin(_) | Command::Commit(_) | Command::Rollback(_) => Ok(()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Command::CreateDatabase(c) => format!("CREATE DATABASE {}", c.name),
            Command::OpenDatabase(c) => format!("OPEN {}", c.name),
            Command::CreateTable(c) => format!("CREATE TABLE {}", c.table_name),
            Command::AlterTable(c) => format!("ALTER TABLE {}", c.table_name),
            Command::DropTable(c) => format!("DROP TABLE {}", c.table_name),
            Command::RenameTable(c) => format!("RENAME TABLE {} TO {}", c.old_name, c.new_name),
            Command::Insert(c) => format!("INSERT INTO {}", c.table_name),
            Command::Update(c) => format!("UPDATE {}", c.table_name),
            Command::Delete(c) => format!("DELETE FROM {}", c.table_name),
            Command::Select(c) => format!("SELECT FROM {}", c.table_name),
            Command::Show(_) => "SHOW".to_string(),
            Command::Help(_) => "HELP".to_string(),
            Command::Begin(_) => "BEGIN".to_string(),
            Command::Commit(_) => "COMMIT".to_string(),
            Command::Rollback(_) => "ROLLBACK".to_string(),
        }
    }
}
