//! Command service: use-cases for the known command set.

use tally_domain::command::Command;
use tally_domain::error::TallyError;
use tally_domain::id::CommandId;

use crate::ports::CommandRepository;

/// Application service for registering and resolving commands.
pub struct CommandService<R> {
    repo: R,
}

impl<R: CommandRepository> CommandService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Register a command after validating domain invariants.
    ///
    /// A command whose id or name is already taken is left as stored and
    /// reported as `false`, so registering the same set twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, command), fields(command_name = %command.name))]
    pub async fn register_command(&self, command: Command) -> Result<bool, TallyError> {
        command.validate()?;
        match self.repo.add(command).await {
            Ok(_) => Ok(true),
            Err(TallyError::Conflict(err)) => {
                tracing::debug!(%err, "command already registered");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Register `names` with ids `1..=n` in order. Returns how many were
    /// newly created.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::Validation`] for an invalid name, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self, names))]
    pub async fn seed<I, S>(&self, names: I) -> Result<usize, TallyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut created = 0;
        for (id, name) in (1..).zip(names) {
            let command = Command::new(CommandId::new(id), name)?;
            if self.register_command(command).await? {
                created += 1;
            }
        }
        tracing::info!(created, "command set seeded");
        Ok(created)
    }

    /// Resolve a typed command token to the stored command.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_command_by_name(&self, name: &str) -> Result<Option<Command>, TallyError> {
        self.repo.get_by_name(name).await
    }

    /// List all commands.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_commands(&self) -> Result<Vec<Command>, TallyError> {
        self.repo.list_all().await
    }
}
