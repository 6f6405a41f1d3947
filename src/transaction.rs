use std::collections::VecDeque;
use std::path::PathBuf;

use crate::command::Command;
use crate::engine_state::EngineState;
use crate::error::{EngineError, EngineResult};
use crate::snapshot;

/// Staging queue and snapshot-based commit/rollback (spec §4.7). Snapshots
/// are file-backed because the atomicity guarantee assumes deep-copied
/// pre-state that survives in-memory mutation — the same reasoning behind
/// `reshape`'s `DbLocker` holding an advisory lock across a whole
/// operation rather than trusting an in-memory guard alone.
pub struct TransactionManager {
    active: bool,
    snapshot_path: PathBuf,
    queue: VecDeque<Command>,
}

impl TransactionManager {
    pub fn new(snapshot_path: PathBuf) -> TransactionManager {
        TransactionManager {
            active: false,
            snapshot_path,
            queue: VecDeque::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_snapshot_path(&mut self, path: PathBuf) {
        self.snapshot_path = path;
    }

    /// Requires `!active`. Serializes the current database to
    /// `snapshot_path`, clears the queue, sets `active = true`.
    pub fn begin(&mut self, state: &EngineState) -> EngineResult<()> {
        if self.active {
            return Err(EngineError::TxAlreadyActive);
        }
        snapshot::save(&state.database, &self.snapshot_path)?;
        self.queue.clear();
        self.active = true;
        Ok(())
    }

    /// Requires `active` and that `command` is not a TCL command.
    pub fn enqueue(&mut self, command: Command) -> EngineResult<()> {
        if !self.active {
            return Err(EngineError::TxNotActive);
        }
        if command.is_tcl() {
            return Err(EngineError::TxMisuse(
                "cannot enqueue a transaction-control command".into(),
            ));
        }
        self.queue.push_back(command);
        Ok(())
    }

    /// Requires `active`. Drains the queue in order, executing each command
    /// against `database`. On any failure, implicitly rolls back and
    /// surfaces the original error. On success, deletes the snapshot file
    /// (spec §9: ownership of the snapshot path ends with the transaction)
    /// and clears `active`. Returns the commands that executed
    /// successfully and were historical, in commit order, so the caller can
    /// push them onto the command history.
    pub fn commit(&mut self, state: &mut EngineState) -> EngineResult<Vec<Command>> {
        if !self.active {
            return Err(EngineError::TxNotActive);
        }

        let mut executed = Vec::new();
        while let Some(mut command) = self.queue.pop_front() {
            match command.execute(state) {
                Ok(true) => executed.push(command),
                Ok(false) => {}
                Err(original_err) => {
                    self.rollback(state)?;
                    return Err(original_err);
                }
            }
        }

        snapshot::delete(&self.snapshot_path)?;
        self.active = false;
        Ok(executed)
    }

    /// Requires `active`. Deserializes `snapshot_path` and restores
    /// `state.database` to it, clears the queue, sets `active = false`.
    pub fn rollback(&mut self, state: &mut EngineState) -> EngineResult<()> {
        if !self.active {
            return Err(EngineError::TxNotActive);
        }
        let restored = snapshot::load(&self.snapshot_path)?;
        state.database.restore(&restored);
        snapshot::delete(&self.snapshot_path)?;
        self.queue.clear();
        self.active = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::dml::Insert;
    use crate::command::Command;
    use crate::database::Database;
    use crate::paths::EngineConfig;
    use crate::value::Value;
    use tempfile::tempdir;

    fn state() -> EngineState {
        let mut db = Database::new("t", PathBuf::from("t.db"));
        db.create_table("items", &["id INTEGER PRIMARY KEY".to_string()])
            .unwrap();
        EngineState::new(db, EngineConfig::default())
    }

    #[test]
    fn rollback_restores_pre_begin_state() {
        let dir = tempdir().unwrap();
        let mut state = state();
        let mut manager = TransactionManager::new(dir.path().join("snap.db"));

        manager.begin(&state).unwrap();
        state
            .database
            .insert("items", &["id".to_string()], &[Value::Integer(1)])
            .unwrap();
        assert_eq!(state.database.table("items").unwrap().row_count, 1);

        manager.rollback(&mut state).unwrap();
        assert_eq!(state.database.table("items").unwrap().row_count, 0);
        assert!(!manager.is_active());
    }

    #[test]
    fn commit_drains_queue_and_reports_historical_commands() {
        let dir = tempdir().unwrap();
        let mut state = state();
        let mut manager = TransactionManager::new(dir.path().join("snap.db"));

        manager.begin(&state).unwrap();
        manager
            .enqueue(Command::Insert(Insert::new(
                "items".to_string(),
                vec!["id".to_string()],
                vec![Value::Integer(1)],
            )))
            .unwrap();

        let executed = manager.commit(&mut state).unwrap();
        assert_eq!(executed.len(), 1);
        assert_eq!(state.database.table("items").unwrap().row_count, 1);
        assert!(!manager.is_active());
    }

    #[test]
    fn begin_twice_fails() {
        let dir = tempdir().unwrap();
        let state = state();
        let mut manager = TransactionManager::new(dir.path().join("snap.db"));
        manager.begin(&state).unwrap();
        assert!(matches!(manager.begin(&state), Err(EngineError::TxAlreadyActive)));
    }
}
