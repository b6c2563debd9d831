//! Error types for the state container.

use thiserror::Error;

/// Main error type for store operations.
///
/// Construction errors (`InvalidModuleKey`, `DuplicateGetter`,
/// `DuplicateNamespace`, `StateNotObject`) surface from [`crate::Store::new`]
/// before any handler can run. The rest are recoverable runtime conditions.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid module key: {0:?} (keys must be non-empty and must not contain '/')")]
    InvalidModuleKey(String),

    #[error("Duplicate module key: {0}")]
    DuplicateModuleKey(String),

    #[error("Module not found at path: {0}")]
    ModuleNotFound(String),

    #[error("Duplicate getter registration: {0}")]
    DuplicateGetter(String),

    #[error("Duplicate namespace: {0}")]
    DuplicateNamespace(String),

    #[error("State at {0} is not an object, cannot graft child module state")]
    StateNotObject(String),

    #[error("Unknown getter: {0}")]
    UnknownGetter(String),

    #[error("Getter cycle detected at: {0}")]
    GetterCycle(String),

    #[error("State path unresolvable: {0}")]
    StatePath(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Action failed: {0}")]
    Action(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl StoreError {
    /// Shorthand for action handlers reporting a domain failure.
    pub fn action(msg: impl Into<String>) -> Self {
        StoreError::Action(msg.into())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
