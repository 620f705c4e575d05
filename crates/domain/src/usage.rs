//! Usage: per-user invocation counts and the aggregated report.

use serde::{Deserialize, Serialize};

use crate::id::{CommandId, UserId};

/// Invocation count of one command by one user.
///
/// There is at most one stat per `(user_id, command_id)` pair and `count`
/// is at least 1 once the stat exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStat {
    pub user_id: UserId,
    pub command_id: CommandId,
    pub count: i64,
}

/// One flat tuple of the usage join, ordered by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRow {
    pub user_id: UserId,
    pub username: Option<String>,
    pub command_name: String,
    pub count: i64,
}

/// Usage of a single command inside a [`UserUsage`] record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandCount {
    #[serde(rename = "cmd")]
    pub command: String,
    pub count: i64,
}

/// Aggregated report entry: every command a user invoked, with counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUsage {
    pub id: UserId,
    pub username: Option<String>,
    pub statistics: Vec<CommandCount>,
}

/// Reshape join rows ordered by `user_id` into one record per user.
///
/// This is a single linear pass: a row opens a new record unless it belongs
/// to the same user as the previous row, in which case it is appended.
/// Rows for the same user must therefore be contiguous.
pub fn fold_report(rows: impl IntoIterator<Item = UsageRow>) -> Vec<UserUsage> {
    let mut report: Vec<UserUsage> = Vec::new();
    for row in rows {
        let entry = CommandCount {
            command: row.command_name,
            count: row.count,
        };
        match report.last_mut() {
            Some(last) if last.id == row.user_id => last.statistics.push(entry),
            _ => report.push(UserUsage {
                id: row.user_id,
                username: row.username,
                statistics: vec![entry],
            }),
        }
    }
    report
}
