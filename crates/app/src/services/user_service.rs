//! User service: use-cases for managing users.

use tally_domain::error::{NotFoundError, TallyError};
use tally_domain::id::UserId;
use tally_domain::user::{User, UserPatch};

use crate::ports::UserRepository;

/// Application service for user registration and lookups.
pub struct UserService<R> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Create the user if it is not stored yet. Existing users are left
    /// untouched. Returns `true` when the user was created.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn ensure_user_exists(&self, user: User) -> Result<bool, TallyError> {
        if self.repo.get_by_id(user.id).await?.is_some() {
            return Ok(false);
        }
        match self.repo.add(user).await {
            Ok(_) => {
                tracing::debug!("registered new user");
                Ok(true)
            }
            // registered concurrently by another interaction
            Err(TallyError::Conflict(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::Conflict`] if the id is taken, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn register_user(&self, user: User) -> Result<User, TallyError> {
        self.repo.add(user).await
    }

    /// Patch the given fields, creating the user if needed.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, TallyError> {
        self.repo.update(id, patch).await
    }

    /// Look up a user by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::NotFound`] when no user with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, id: UserId) -> Result<User, TallyError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "User",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_users(&self) -> Result<Vec<User>, TallyError> {
        self.repo.list_all().await
    }

    /// Delete a user by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: UserId) -> Result<(), TallyError> {
        self.repo.delete(id).await
    }
}
