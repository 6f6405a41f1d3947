use thiserror::Error;

/// The engine's error taxonomy. Every fallible kernel operation returns one
/// of these kinds rather than panicking; `main.rs` folds them into
/// `anyhow::Error` at the process boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid state: operation not permitted while database is {0}")]
    InvalidState(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("constraint violation: {constraint} rejected value for column {column}")]
    ConstraintViolation { constraint: String, column: String },

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("transaction already active")]
    TxAlreadyActive,

    #[error("no transaction is active")]
    TxNotActive,

    #[error("transaction misuse: {0}")]
    TxMisuse(String),

    #[error("io error: {0}")]
    Io(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}

impl From<bincode::Error> for EngineError {
    fn from(err: bincode::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}
