use crate::command::Command;
use crate::engine_state::EngineState;
use crate::error::EngineResult;

/// LIFO stack of executed historical commands supporting linear undo (spec
/// §4.8). `push` only happens for commands whose `execute` returned `true`;
/// undoing an empty history is a no-op, not an error.
#[derive(Default)]
pub struct History {
    stack: Vec<Command>,
}

impl History {
    pub fn new() -> History {
        History { stack: Vec::new() }
    }

    pub fn push(&mut self, command: Command) {
        self.stack.push(command);
    }

    pub fn size(&self) -> usize {
        self.stack.len()
    }

    /// Reverses the most recently executed historical command. A no-op
    /// when the history is empty. Error-neutral: either reverses or does
    /// nothing (spec §7).
    pub fn undo(&mut self, state: &mut EngineState) -> EngineResult<()> {
        if let Some(mut command) = self.stack.pop() {
            command.undo(state)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CreateTable, Command};
    use crate::database::Database;
    use crate::paths::EngineConfig;
    use std::path::PathBuf;

    fn state() -> EngineState {
        EngineState::new(Database::new("t", PathBuf::from("t.db")), EngineConfig::default())
    }

    #[test]
    fn undo_on_empty_history_is_a_no_op() {
        let mut history = History::new();
        let mut state = state();
        assert!(history.undo(&mut state).is_ok());
    }

    #[test]
    fn size_tracks_pushes_and_undos() {
        let mut history = History::new();
        let mut state = state();

        let mut create = Command::CreateTable(CreateTable::new(
            "users".to_string(),
            vec!["id INTEGER".to_string()],
        ));
        if create.execute(&mut state).unwrap() {
            history.push(create);
        }
        assert_eq!(history.size(), 1);

        history.undo(&mut state).unwrap();
        assert_eq!(history.size(), 0);
        assert!(!state.database.tables.contains_key("users"));
    }
}
