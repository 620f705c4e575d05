//! In-memory port implementations shared by the service tests.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tally_domain::command::Command;
use tally_domain::error::{ConflictError, NotFoundError, TallyError};
use tally_domain::id::{CommandId, UserId};
use tally_domain::usage::{UsageRow, UsageStat, UserUsage, fold_report};
use tally_domain::user::{User, UserPatch};

use crate::ports::{CommandRepository, Repository, UsageRepository, UserRepository};

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    commands: BTreeMap<CommandId, Command>,
    stats: BTreeMap<(UserId, CommandId), i64>,
}

/// Shared backing store; each accessor returns a repository over it.
#[derive(Clone, Default)]
pub(crate) struct InMemoryStore(Arc<Mutex<State>>);

impl InMemoryStore {
    pub(crate) fn users(&self) -> InMemoryUserRepo {
        InMemoryUserRepo(self.clone())
    }

    pub(crate) fn commands(&self) -> InMemoryCommandRepo {
        InMemoryCommandRepo(self.clone())
    }

    pub(crate) fn usage(&self) -> InMemoryUsageRepo {
        InMemoryUsageRepo(self.clone())
    }
}

pub(crate) struct InMemoryUserRepo(InMemoryStore);
pub(crate) struct InMemoryCommandRepo(InMemoryStore);
pub(crate) struct InMemoryUsageRepo(InMemoryStore);

impl Repository for InMemoryUserRepo {
    type Id = UserId;
    type Record = User;

    fn list_all(&self) -> impl Future<Output = Result<Vec<User>, TallyError>> + Send {
        let state = self.0.0.lock().unwrap();
        let result: Vec<User> = state.users.values().cloned().collect();
        async { Ok(result) }
    }

    fn get_by_id(&self, id: UserId) -> impl Future<Output = Result<Option<User>, TallyError>> + Send {
        let state = self.0.0.lock().unwrap();
        let result = state.users.get(&id).cloned();
        async { Ok(result) }
    }

    fn delete(&self, id: UserId) -> impl Future<Output = Result<(), TallyError>> + Send {
        let mut state = self.0.0.lock().unwrap();
        state.users.remove(&id);
        async { Ok(()) }
    }
}

impl UserRepository for InMemoryUserRepo {
    fn add(&self, user: User) -> impl Future<Output = Result<User, TallyError>> + Send {
        let mut state = self.0.0.lock().unwrap();
        let result = if state.users.contains_key(&user.id) {
            Err(ConflictError {
                entity: "User",
                key: user.id.to_string(),
            }
            .into())
        } else {
            state.users.insert(user.id, user.clone());
            Ok(user)
        };
        async { result }
    }

    fn update(
        &self,
        id: UserId,
        patch: UserPatch,
    ) -> impl Future<Output = Result<User, TallyError>> + Send {
        let mut state = self.0.0.lock().unwrap();
        let user = match state.users.get_mut(&id) {
            Some(existing) => {
                existing.apply(patch);
                existing.clone()
            }
            None => {
                let created = patch.into_user(id);
                state.users.insert(id, created.clone());
                created
            }
        };
        async { Ok(user) }
    }
}

impl Repository for InMemoryCommandRepo {
    type Id = CommandId;
    type Record = Command;

    fn list_all(&self) -> impl Future<Output = Result<Vec<Command>, TallyError>> + Send {
        let state = self.0.0.lock().unwrap();
        let result: Vec<Command> = state.commands.values().cloned().collect();
        async { Ok(result) }
    }

    fn get_by_id(
        &self,
        id: CommandId,
    ) -> impl Future<Output = Result<Option<Command>, TallyError>> + Send {
        let state = self.0.0.lock().unwrap();
        let result = state.commands.get(&id).cloned();
        async { Ok(result) }
    }

    fn delete(&self, id: CommandId) -> impl Future<Output = Result<(), TallyError>> + Send {
        let mut state = self.0.0.lock().unwrap();
        state.commands.remove(&id);
        async { Ok(()) }
    }
}

impl CommandRepository for InMemoryCommandRepo {
    fn add(&self, command: Command) -> impl Future<Output = Result<Command, TallyError>> + Send {
        let mut state = self.0.0.lock().unwrap();
        let taken = state.commands.contains_key(&command.id)
            || state.commands.values().any(|c| c.name == command.name);
        let result = if taken {
            Err(ConflictError {
                entity: "Command",
                key: command.name.clone(),
            }
            .into())
        } else {
            state.commands.insert(command.id, command.clone());
            Ok(command)
        };
        async { result }
    }

    fn get_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Command>, TallyError>> + Send {
        let state = self.0.0.lock().unwrap();
        let result = state.commands.values().find(|c| c.name == name).cloned();
        async { Ok(result) }
    }
}

impl UsageRepository for InMemoryUsageRepo {
    fn increment(
        &self,
        user_id: UserId,
        command_id: CommandId,
    ) -> impl Future<Output = Result<UsageStat, TallyError>> + Send {
        let mut state = self.0.0.lock().unwrap();
        let result = if state.users.contains_key(&user_id)
            && state.commands.contains_key(&command_id)
        {
            let count = state.stats.entry((user_id, command_id)).or_insert(0);
            *count += 1;
            Ok(UsageStat {
                user_id,
                command_id,
                count: *count,
            })
        } else {
            Err(NotFoundError {
                entity: "User or Command",
                id: format!("{user_id}/{command_id}"),
            }
            .into())
        };
        async { result }
    }

    fn list_stats(&self) -> impl Future<Output = Result<Vec<UsageStat>, TallyError>> + Send {
        let state = self.0.0.lock().unwrap();
        let result: Vec<UsageStat> = state
            .stats
            .iter()
            .map(|(&(user_id, command_id), &count)| UsageStat {
                user_id,
                command_id,
                count,
            })
            .collect();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<UserUsage>, TallyError>> + Send {
        let state = self.0.0.lock().unwrap();
        let rows: Vec<UsageRow> = state
            .stats
            .iter()
            .filter_map(|(&(user_id, command_id), &count)| {
                let user = state.users.get(&user_id)?;
                let command = state.commands.get(&command_id)?;
                Some(UsageRow {
                    user_id,
                    username: user.username.clone(),
                    command_name: command.name.clone(),
                    count,
                })
            })
            .collect();
        let result = fold_report(rows);
        async { Ok(result) }
    }
}
