//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`TallyError`]
//! via `#[from]`. Storage adapters box their error into
//! [`TallyError::Storage`] so this crate stays free of IO dependencies.

/// Top-level error returned by ports and services.
#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("conflict")]
    Conflict(#[from] ConflictError),

    #[error("storage error")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required name was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A command name contained something other than word characters.
    #[error("invalid command name {0:?}, expected letters, digits or underscores")]
    InvalidCommandName(String),
}

/// A record that had to exist was missing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A unique key was already taken.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {key} already exists")]
pub struct ConflictError {
    pub entity: &'static str,
    pub key: String,
}
