//! Usage service: counts command invocations and reports them per user.

use tally_domain::command::{Command, parse_invocation};
use tally_domain::error::TallyError;
use tally_domain::id::{CommandId, UserId};
use tally_domain::usage::{UsageStat, UserUsage};
use tally_domain::user::User;

use crate::ports::{CommandRepository, UsageRepository, UserRepository};
use crate::services::command_service::CommandService;
use crate::services::user_service::UserService;

/// A counted invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub stat: UsageStat,
}

/// Application service tying users, commands and counters together.
pub struct UsageService<U, C, S> {
    users: UserService<U>,
    commands: CommandService<C>,
    usage: S,
}

impl<U, C, S> UsageService<U, C, S>
where
    U: UserRepository,
    C: CommandRepository,
    S: UsageRepository,
{
    /// Create a new service from the three repositories.
    pub fn new(users: U, commands: C, usage: S) -> Self {
        Self {
            users: UserService::new(users),
            commands: CommandService::new(commands),
            usage,
        }
    }

    /// Access the user use-cases.
    pub fn users(&self) -> &UserService<U> {
        &self.users
    }

    /// Access the command use-cases.
    pub fn commands(&self) -> &CommandService<C> {
        &self.commands
    }

    /// Count one invocation of `command_id` by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::NotFound`] when the user or the command is not
    /// stored, or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn increment_usage(
        &self,
        user_id: UserId,
        command_id: CommandId,
    ) -> Result<UsageStat, TallyError> {
        self.usage.increment(user_id, command_id).await
    }

    /// Build the per-user usage report.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn aggregated_report(&self) -> Result<Vec<UserUsage>, TallyError> {
        self.usage.get_all().await
    }

    /// List the raw counters.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_stats(&self) -> Result<Vec<UsageStat>, TallyError> {
        self.usage.list_stats().await
    }

    /// Record an inbound message from `user`.
    ///
    /// The message is counted only if it carries exactly one `/command`
    /// token naming a known command. The sender is registered on first
    /// contact. Returns `None` when nothing was counted.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repositories.
    #[tracing::instrument(skip(self, user, text), fields(user_id = %user.id))]
    pub async fn record_invocation(
        &self,
        user: User,
        text: &str,
    ) -> Result<Option<Invocation>, TallyError> {
        let Some(token) = parse_invocation(text) else {
            return Ok(None);
        };
        let Some(command) = self.commands.resolve_command_by_name(token).await? else {
            tracing::debug!(token, "ignoring unknown command");
            return Ok(None);
        };

        let user_id = user.id;
        self.users.ensure_user_exists(user).await?;
        let stat = self.increment_usage(user_id, command.id).await?;
        tracing::debug!(command = %command.name, count = stat.count, "invocation counted");

        Ok(Some(Invocation { command, stat }))
    }
}
