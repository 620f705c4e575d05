//! Statically declared tables and the repository shared by all of them.

use std::marker::PhantomData;

use sqlx::sqlite::SqliteRow;
use sqlx::{SqliteConnection, SqlitePool};

use tally_app::ports::Repository;
use tally_domain::error::TallyError;

use crate::error::StorageError;
use crate::transaction::with_transaction;

/// Description of a table keyed by a single integer column.
///
/// Implementors supply the statements the generic [`SqliteRepository`]
/// runs and an explicit decoder from a row to the domain record.
pub trait Table: Send + Sync + 'static {
    /// Domain key of the table.
    type Id: Copy + Send + Into<i64> + 'static;
    /// Domain record stored in the table.
    type Record: Send + 'static;

    const SELECT_ALL: &'static str;
    const SELECT_BY_ID: &'static str;
    const DELETE_BY_ID: &'static str;

    /// Decode one row selected by the statements above.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] when a column is missing or has the wrong type.
    fn decode(row: &SqliteRow) -> Result<Self::Record, sqlx::Error>;
}

/// `SQLite`-backed repository over the table `T`.
pub struct SqliteRepository<T> {
    pool: SqlitePool,
    _table: PhantomData<T>,
}

impl<T: Table> SqliteRepository<T> {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _table: PhantomData,
        }
    }

    /// Borrow the connection pool, for table-specific statements.
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl<T> Clone for SqliteRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _table: PhantomData,
        }
    }
}

async fn select_all<T: Table>(conn: &mut SqliteConnection) -> Result<Vec<T::Record>, StorageError> {
    let rows = sqlx::query(T::SELECT_ALL).fetch_all(&mut *conn).await?;
    let records = rows.iter().map(T::decode).collect::<Result<_, _>>()?;
    Ok(records)
}

async fn select_by_id<T: Table>(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<T::Record>, StorageError> {
    let row = sqlx::query(T::SELECT_BY_ID)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let record = row.as_ref().map(T::decode).transpose()?;
    Ok(record)
}

async fn delete_by_id<T: Table>(conn: &mut SqliteConnection, id: i64) -> Result<(), StorageError> {
    sqlx::query(T::DELETE_BY_ID)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

impl<T: Table> Repository for SqliteRepository<T> {
    type Id = T::Id;
    type Record = T::Record;

    async fn list_all(&self) -> Result<Vec<T::Record>, TallyError> {
        let records = with_transaction(&self.pool, |conn| Box::pin(select_all::<T>(conn))).await?;
        Ok(records)
    }

    async fn get_by_id(&self, id: T::Id) -> Result<Option<T::Record>, TallyError> {
        let key: i64 = id.into();
        let record =
            with_transaction(&self.pool, move |conn| Box::pin(select_by_id::<T>(conn, key)))
                .await?;
        Ok(record)
    }

    async fn delete(&self, id: T::Id) -> Result<(), TallyError> {
        let key: i64 = id.into();
        with_transaction(&self.pool, move |conn| Box::pin(delete_by_id::<T>(conn, key))).await?;
        Ok(())
    }
}
