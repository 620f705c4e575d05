//! `SQLite` implementation of [`UserRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection};

use tally_app::ports::UserRepository;
use tally_domain::error::{ConflictError, TallyError};
use tally_domain::id::UserId;
use tally_domain::user::{User, UserPatch};

use crate::error::StorageError;
use crate::table::{SqliteRepository, Table};
use crate::transaction::with_transaction;

/// Wrapper for converting database rows into domain [`User`].
struct Wrapper(User);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let username: Option<String> = row.try_get("username")?;
        let first_name: Option<String> = row.try_get("first_name")?;
        let last_name: Option<String> = row.try_get("last_name")?;

        Ok(Self(User {
            id: UserId::new(id),
            username,
            first_name,
            last_name,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO users (id, username, first_name, last_name)
    VALUES (?, ?, ?, ?)
    RETURNING id, username, first_name, last_name
";

const PATCH: &str = r"
    UPDATE users
    SET username = COALESCE(?, username),
        first_name = COALESCE(?, first_name),
        last_name = COALESCE(?, last_name)
    WHERE id = ?
    RETURNING id, username, first_name, last_name
";

/// The `users` table.
pub struct Users;

impl Table for Users {
    type Id = UserId;
    type Record = User;

    const SELECT_ALL: &'static str = "SELECT id, username, first_name, last_name FROM users ORDER BY id";
    const SELECT_BY_ID: &'static str =
        "SELECT id, username, first_name, last_name FROM users WHERE id = ?";
    const DELETE_BY_ID: &'static str = "DELETE FROM users WHERE id = ?";

    fn decode(row: &SqliteRow) -> Result<User, sqlx::Error> {
        Wrapper::from_row(row).map(|w| w.0)
    }
}

/// `SQLite`-backed user repository.
pub type SqliteUserRepository = SqliteRepository<Users>;

async fn insert(conn: &mut SqliteConnection, user: User) -> Result<User, StorageError> {
    let row: Wrapper = sqlx::query_as(INSERT)
        .bind(user.id.get())
        .bind(user.username)
        .bind(user.first_name)
        .bind(user.last_name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.0)
}

async fn patch_or_insert(
    conn: &mut SqliteConnection,
    id: UserId,
    patch: UserPatch,
) -> Result<User, StorageError> {
    let patched: Option<Wrapper> = sqlx::query_as(PATCH)
        .bind(patch.username.as_deref())
        .bind(patch.first_name.as_deref())
        .bind(patch.last_name.as_deref())
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await?;

    match patched {
        Some(row) => Ok(row.0),
        None => insert(conn, patch.into_user(id)).await,
    }
}

impl UserRepository for SqliteUserRepository {
    async fn add(&self, user: User) -> Result<User, TallyError> {
        let id = user.id;
        with_transaction(self.pool(), move |conn| Box::pin(insert(conn, user)))
            .await
            .map_err(|err| {
                if err.is_unique_violation() {
                    TallyError::from(ConflictError {
                        entity: "User",
                        key: id.to_string(),
                    })
                } else {
                    TallyError::from(err)
                }
            })
    }

    async fn update(&self, id: UserId, patch: UserPatch) -> Result<User, TallyError> {
        let user =
            with_transaction(self.pool(), move |conn| Box::pin(patch_or_insert(conn, id, patch)))
                .await?;
        Ok(user)
    }
}
