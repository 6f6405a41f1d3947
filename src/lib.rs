pub mod command;
pub mod condition;
pub mod constraint;
pub mod database;
pub mod docs;
pub mod engine;
pub mod engine_state;
pub mod error;
pub mod history;
pub mod paths;
pub mod printer;
pub mod response;
pub mod snapshot;
pub mod table;
pub mod transaction;
pub mod value;

pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use paths::EngineConfig;
