//! `SQLite` implementation of [`CommandRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection};

use tally_app::ports::CommandRepository;
use tally_domain::command::Command;
use tally_domain::error::{ConflictError, TallyError};
use tally_domain::id::CommandId;

use crate::error::StorageError;
use crate::table::{SqliteRepository, Table};
use crate::transaction::with_transaction;

/// Wrapper for converting database rows into domain [`Command`].
struct Wrapper(Command);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;

        Ok(Self(Command {
            id: CommandId::new(id),
            name,
        }))
    }
}

const INSERT: &str = "INSERT INTO commands (id, name) VALUES (?, ?)";
const SELECT_BY_NAME: &str = "SELECT id, name FROM commands WHERE name = ?";

/// The `commands` table.
pub struct Commands;

impl Table for Commands {
    type Id = CommandId;
    type Record = Command;

    const SELECT_ALL: &'static str = "SELECT id, name FROM commands ORDER BY id";
    const SELECT_BY_ID: &'static str = "SELECT id, name FROM commands WHERE id = ?";
    const DELETE_BY_ID: &'static str = "DELETE FROM commands WHERE id = ?";

    fn decode(row: &SqliteRow) -> Result<Command, sqlx::Error> {
        Wrapper::from_row(row).map(|w| w.0)
    }
}

/// `SQLite`-backed command repository.
pub type SqliteCommandRepository = SqliteRepository<Commands>;

async fn insert(conn: &mut SqliteConnection, command: Command) -> Result<Command, StorageError> {
    sqlx::query(INSERT)
        .bind(command.id.get())
        .bind(&command.name)
        .execute(&mut *conn)
        .await?;
    Ok(command)
}

async fn select_by_name(
    conn: &mut SqliteConnection,
    name: String,
) -> Result<Option<Command>, StorageError> {
    let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_NAME)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(|w| w.0))
}

impl CommandRepository for SqliteCommandRepository {
    async fn add(&self, command: Command) -> Result<Command, TallyError> {
        let name = command.name.clone();
        with_transaction(self.pool(), move |conn| Box::pin(insert(conn, command)))
            .await
            .map_err(|err| {
                if err.is_unique_violation() {
                    TallyError::from(ConflictError {
                        entity: "Command",
                        key: name,
                    })
                } else {
                    TallyError::from(err)
                }
            })
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Command>, TallyError> {
        let name = name.to_owned();
        let command =
            with_transaction(self.pool(), move |conn| Box::pin(select_by_name(conn, name))).await?;
        Ok(command)
    }
}
