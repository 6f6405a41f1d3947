use serde::{Deserialize, Serialize};

/// Marker structs for the transaction-control commands. They carry no
/// captured pre-image because the transaction manager's snapshot file is
/// what handles their reversibility (spec §4.6) — `execute`/`undo` here
/// never run directly; [`crate::engine::Engine`] routes `BEGIN`, `COMMIT`
/// and `ROLLBACK` straight to the [`crate::transaction::TransactionManager`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Begin;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Commit;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rollback;
