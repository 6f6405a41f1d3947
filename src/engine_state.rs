use crate::database::Database;
use crate::paths::EngineConfig;
use crate::response::Response;

/// Everything a [`crate::command::Command`] needs to execute or undo
/// itself: the single active database (spec §9: "a process holds exactly
/// one active Database at a time"), the injected path configuration, and
/// the last SELECT response (read by `SHOW`/`PRINT`).
pub struct EngineState {
    pub database: Database,
    pub config: EngineConfig,
    pub last_response: Option<Response>,
}

impl EngineState {
    pub fn new(database: Database, config: EngineConfig) -> EngineState {
        EngineState {
            database,
            config,
            last_response: None,
        }
    }
}
