//! Storage-specific error type wrapping sqlx errors.

use tally_domain::error::TallyError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StorageError {
    /// The statement hit a `UNIQUE` or `PRIMARY KEY` constraint.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        self.database_error()
            .is_some_and(|err| err.is_unique_violation())
    }

    /// The statement referenced a missing parent row.
    #[must_use]
    pub fn is_foreign_key_violation(&self) -> bool {
        self.database_error()
            .is_some_and(|err| err.is_foreign_key_violation())
    }

    fn database_error(&self) -> Option<&dyn sqlx::error::DatabaseError> {
        match self {
            Self::Database(err) => err.as_database_error(),
            Self::Migration(_) => None,
        }
    }
}

impl From<StorageError> for TallyError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
