//! `SQLite` implementation of [`UsageRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use tally_app::ports::UsageRepository;
use tally_domain::error::{NotFoundError, TallyError};
use tally_domain::id::{CommandId, UserId};
use tally_domain::usage::{UsageRow, UsageStat, UserUsage, fold_report};

use crate::error::StorageError;
use crate::transaction::with_transaction;

/// Wrapper for converting `statistics` rows into domain [`UsageStat`].
struct StatWrapper(UsageStat);

impl<'r> FromRow<'r, SqliteRow> for StatWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let user_id: i64 = row.try_get("user_id")?;
        let command_id: i64 = row.try_get("command_id")?;
        let count: i64 = row.try_get("count")?;

        Ok(Self(UsageStat {
            user_id: UserId::new(user_id),
            command_id: CommandId::new(command_id),
            count,
        }))
    }
}

/// Wrapper for converting report join rows into domain [`UsageRow`].
struct ReportWrapper(UsageRow);

impl<'r> FromRow<'r, SqliteRow> for ReportWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let user_id: i64 = row.try_get("user_id")?;
        let username: Option<String> = row.try_get("username")?;
        let command_name: String = row.try_get("command_name")?;
        let count: i64 = row.try_get("count")?;

        Ok(Self(UsageRow {
            user_id: UserId::new(user_id),
            username,
            command_name,
            count,
        }))
    }
}

// The keyed update is the lookup: it touches the row only when the
// (user_id, command_id) pair exists, and makes the transaction a writer
// before anything is read.
const INCREMENT_EXISTING: &str = r"
    UPDATE statistics
    SET count = count + 1
    WHERE user_id = ? AND command_id = ?
    RETURNING user_id, command_id, count
";

const INSERT_FIRST: &str = r"
    INSERT INTO statistics (user_id, command_id, count)
    VALUES (?, ?, 1)
    RETURNING user_id, command_id, count
";

const SELECT_ALL: &str = "SELECT user_id, command_id, count FROM statistics ORDER BY user_id, command_id";

const SELECT_REPORT: &str = r"
    SELECT u.id AS user_id, u.username AS username, c.name AS command_name, s.count AS count
    FROM statistics s
    INNER JOIN users u ON u.id = s.user_id
    INNER JOIN commands c ON c.id = s.command_id
    ORDER BY u.id ASC, c.id ASC
";

/// `SQLite`-backed usage counter repository.
#[derive(Clone)]
pub struct SqliteUsageRepository {
    pool: SqlitePool,
}

impl SqliteUsageRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn try_increment(
        &self,
        user_id: UserId,
        command_id: CommandId,
    ) -> Result<UsageStat, StorageError> {
        with_transaction(&self.pool, move |conn| {
            Box::pin(increment_or_create(conn, user_id, command_id))
        })
        .await
    }
}

async fn increment_or_create(
    conn: &mut SqliteConnection,
    user_id: UserId,
    command_id: CommandId,
) -> Result<UsageStat, StorageError> {
    let existing: Option<StatWrapper> = sqlx::query_as(INCREMENT_EXISTING)
        .bind(user_id.get())
        .bind(command_id.get())
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(stat) = existing {
        return Ok(stat.0);
    }

    let created: StatWrapper = sqlx::query_as(INSERT_FIRST)
        .bind(user_id.get())
        .bind(command_id.get())
        .fetch_one(&mut *conn)
        .await?;
    Ok(created.0)
}

async fn select_stats(conn: &mut SqliteConnection) -> Result<Vec<UsageStat>, StorageError> {
    let rows: Vec<StatWrapper> = sqlx::query_as(SELECT_ALL).fetch_all(&mut *conn).await?;
    Ok(rows.into_iter().map(|w| w.0).collect())
}

async fn select_report(conn: &mut SqliteConnection) -> Result<Vec<UserUsage>, StorageError> {
    let rows: Vec<ReportWrapper> = sqlx::query_as(SELECT_REPORT).fetch_all(&mut *conn).await?;
    Ok(fold_report(rows.into_iter().map(|w| w.0)))
}

impl UsageRepository for SqliteUsageRepository {
    async fn increment(
        &self,
        user_id: UserId,
        command_id: CommandId,
    ) -> Result<UsageStat, TallyError> {
        let outcome = match self.try_increment(user_id, command_id).await {
            // Another transaction created the row between our lookup and
            // insert; the row exists now, so the retry takes the update path.
            Err(err) if err.is_unique_violation() => {
                tracing::debug!(%user_id, %command_id, "concurrent first use, retrying as increment");
                self.try_increment(user_id, command_id).await
            }
            other => other,
        };

        outcome.map_err(|err| {
            if err.is_foreign_key_violation() {
                TallyError::from(NotFoundError {
                    entity: "User or Command",
                    id: format!("{user_id}/{command_id}"),
                })
            } else {
                TallyError::from(err)
            }
        })
    }

    async fn list_stats(&self) -> Result<Vec<UsageStat>, TallyError> {
        let stats = with_transaction(&self.pool, |conn| Box::pin(select_stats(conn))).await?;
        Ok(stats)
    }

    async fn get_all(&self) -> Result<Vec<UserUsage>, TallyError> {
        let report = with_transaction(&self.pool, |conn| Box::pin(select_report(conn))).await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::command_repo::SqliteCommandRepository;
    use crate::pool::{Config, Database};
    use crate::user_repo::SqliteUserRepository;
    use tally_app::ports::{CommandRepository, UserRepository};
    use tally_domain::command::Command;
    use tally_domain::usage::CommandCount;
    use tally_domain::user::User;

    async fn setup_at(database_url: String) -> (Database, SqliteUsageRepository) {
        let db = Config { database_url }.build().await.unwrap();
        let repo = SqliteUsageRepository::new(db.pool().clone());
        (db, repo)
    }

    async fn setup() -> (Database, SqliteUsageRepository) {
        setup_at("sqlite::memory:".to_string()).await
    }

    async fn add_user(db: &Database, id: i64, username: &str) {
        SqliteUserRepository::new(db.pool().clone())
            .add(User::builder(UserId::new(id)).username(username).build())
            .await
            .unwrap();
    }

    async fn add_command(db: &Database, id: i64, name: &str) {
        SqliteCommandRepository::new(db.pool().clone())
            .add(Command::new(CommandId::new(id), name).unwrap())
            .await
            .unwrap();
    }

    fn entry(command: &str, count: i64) -> CommandCount {
        CommandCount {
            command: command.to_string(),
            count,
        }
    }

    #[tokio::test]
    async fn should_create_counter_with_count_one_on_first_use() {
        let (db, repo) = setup().await;
        add_user(&db, 1, "alice").await;
        add_command(&db, 1, "help").await;

        let stat = repo
            .increment(UserId::new(1), CommandId::new(1))
            .await
            .unwrap();

        assert_eq!(stat.count, 1);
    }

    #[tokio::test]
    async fn should_keep_single_row_per_pair_when_incrementing_repeatedly() {
        let (db, repo) = setup().await;
        add_user(&db, 1, "alice").await;
        add_command(&db, 1, "help").await;

        for _ in 0..5 {
            repo.increment(UserId::new(1), CommandId::new(1))
                .await
                .unwrap();
        }

        let stats = repo.list_stats().await.unwrap();
        assert_eq!(
            stats,
            vec![UsageStat {
                user_id: UserId::new(1),
                command_id: CommandId::new(1),
                count: 5,
            }]
        );
    }

    #[tokio::test]
    async fn should_report_single_user_after_three_increments() {
        let (db, repo) = setup().await;
        add_user(&db, 1, "alice").await;
        add_command(&db, 1, "help").await;

        for _ in 0..3 {
            repo.increment(UserId::new(1), CommandId::new(1))
                .await
                .unwrap();
        }

        let report = repo.get_all().await.unwrap();
        assert_eq!(
            report,
            vec![UserUsage {
                id: UserId::new(1),
                username: Some("alice".to_string()),
                statistics: vec![entry("help", 3)],
            }]
        );
    }

    #[tokio::test]
    async fn should_group_report_by_user_in_id_order() {
        let (db, repo) = setup().await;
        add_user(&db, 2, "bob").await;
        add_user(&db, 1, "alice").await;
        add_command(&db, 1, "help").await;
        add_command(&db, 2, "say").await;

        repo.increment(UserId::new(1), CommandId::new(1))
            .await
            .unwrap();
        repo.increment(UserId::new(2), CommandId::new(2))
            .await
            .unwrap();
        repo.increment(UserId::new(2), CommandId::new(1))
            .await
            .unwrap();

        let report = repo.get_all().await.unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].id, UserId::new(1));
        assert_eq!(report[0].statistics, vec![entry("help", 1)]);
        assert_eq!(report[1].id, UserId::new(2));
        assert_eq!(report[1].statistics, vec![entry("help", 1), entry("say", 1)]);
    }

    #[tokio::test]
    async fn should_leave_out_users_without_usage() {
        let (db, repo) = setup().await;
        add_user(&db, 1, "alice").await;
        add_user(&db, 2, "bob").await;
        add_command(&db, 1, "help").await;

        repo.increment(UserId::new(2), CommandId::new(1))
            .await
            .unwrap();

        let report = repo.get_all().await.unwrap();
        let ids: Vec<UserId> = report.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![UserId::new(2)]);
    }

    #[tokio::test]
    async fn should_return_empty_report_when_nothing_counted() {
        let (db, repo) = setup().await;
        add_user(&db, 1, "alice").await;

        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_when_user_unknown() {
        let (db, repo) = setup().await;
        add_command(&db, 1, "help").await;

        let result = repo.increment(UserId::new(9), CommandId::new(1)).await;

        assert!(matches!(result, Err(TallyError::NotFound(_))));
        assert!(repo.list_stats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_serialize_report_in_wire_shape() {
        let (db, repo) = setup().await;
        add_user(&db, 1, "alice").await;
        add_command(&db, 1, "help").await;
        repo.increment(UserId::new(1), CommandId::new(1))
            .await
            .unwrap();

        let json = serde_json::to_value(repo.get_all().await.unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"id": 1, "username": "alice", "statistics": [{"cmd": "help", "count": 1}]}
            ])
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_not_lose_updates_when_incrementing_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("tally.db").display());
        let (db, repo) = setup_at(url).await;
        add_user(&db, 1, "alice").await;
        add_command(&db, 1, "help").await;

        let repo = Arc::new(repo);
        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.increment(UserId::new(1), CommandId::new(1)).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stats = repo.list_stats().await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].count, 32);
    }
}
