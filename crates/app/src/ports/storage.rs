//! Storage port: repository traits for persistence.
//!
//! Every method is one unit of work: implementations run it inside its own
//! transaction and never hold a transaction across calls.

use std::future::Future;

use tally_domain::command::Command;
use tally_domain::error::TallyError;
use tally_domain::id::{CommandId, UserId};
use tally_domain::usage::{UsageStat, UserUsage};
use tally_domain::user::{User, UserPatch};

/// CRUD contract shared by every reference table.
///
/// Records are returned as owned snapshots; changing them has no effect on
/// storage.
pub trait Repository {
    /// Primary key of the stored record.
    type Id: Copy + Send;
    /// Stored record.
    type Record: Send;

    /// Get every record.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Self::Record>, TallyError>> + Send;

    /// Get a record by its key. A missing record is `None`, not an error.
    fn get_by_id(
        &self,
        id: Self::Id,
    ) -> impl Future<Output = Result<Option<Self::Record>, TallyError>> + Send;

    /// Delete a record by its key. Deleting a missing record is a no-op.
    fn delete(&self, id: Self::Id) -> impl Future<Output = Result<(), TallyError>> + Send;
}

/// Repository for [`User`]s.
pub trait UserRepository: Repository<Id = UserId, Record = User> {
    /// Insert a new user.
    ///
    /// Fails with [`TallyError::Conflict`] if the id is taken.
    fn add(&self, user: User) -> impl Future<Output = Result<User, TallyError>> + Send;

    /// Patch the fields set in `patch`, creating the user when it does not
    /// exist yet.
    fn update(
        &self,
        id: UserId,
        patch: UserPatch,
    ) -> impl Future<Output = Result<User, TallyError>> + Send;
}

/// Repository for [`Command`]s.
pub trait CommandRepository: Repository<Id = CommandId, Record = Command> {
    /// Insert a new command.
    ///
    /// Fails with [`TallyError::Conflict`] if the id or the name is taken.
    fn add(&self, command: Command) -> impl Future<Output = Result<Command, TallyError>> + Send;

    /// Resolve a command by its exact name.
    fn get_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Command>, TallyError>> + Send;
}

/// Repository for usage counters.
pub trait UsageRepository {
    /// Add one invocation of `command_id` by `user_id`, creating the counter
    /// with `count = 1` on first use. Returns the counter after the change.
    ///
    /// Fails with [`TallyError::NotFound`] when the user or the command does
    /// not exist.
    fn increment(
        &self,
        user_id: UserId,
        command_id: CommandId,
    ) -> impl Future<Output = Result<UsageStat, TallyError>> + Send;

    /// Get the raw counters.
    fn list_stats(&self) -> impl Future<Output = Result<Vec<UsageStat>, TallyError>> + Send;

    /// Get the per-user report, ordered by user id. Users without any
    /// counter are left out.
    fn get_all(&self) -> impl Future<Output = Result<Vec<UserUsage>, TallyError>> + Send;
}
