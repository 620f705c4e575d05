//! Scoped transactions: begin, run a body, commit or roll back.

use std::future::Future;
use std::pin::Pin;

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::StorageError;

/// Future returned by a transaction body, borrowing the transaction's
/// connection for `'c`.
pub type TxFuture<'c, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'c>>;

/// Run `body` inside a transaction on a connection taken from `pool`.
///
/// The transaction is committed when the body returns `Ok` and rolled back
/// when it returns `Err`; the body's error is handed back unchanged. The
/// connection returns to the pool on every path, and a transaction dropped
/// mid-flight (cancelled future) is rolled back by sqlx.
///
/// ```ignore
/// async fn count_users(conn: &mut SqliteConnection) -> Result<i64, StorageError> {
///     let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
///         .fetch_one(&mut *conn)
///         .await?;
///     Ok(count)
/// }
///
/// let count = with_transaction(&pool, |conn| Box::pin(count_users(conn))).await?;
/// ```
///
/// # Errors
///
/// Returns the body's error, or [`StorageError::Database`] when the
/// transaction cannot be opened or committed.
pub async fn with_transaction<T, F>(pool: &SqlitePool, body: F) -> Result<T, StorageError>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> TxFuture<'c, T> + Send,
{
    let mut tx = pool.begin().await?;

    match body(&mut *tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(%rollback_err, "failed to roll back transaction");
            }
            tracing::debug!(%err, "transaction rolled back");
            Err(err)
        }
    }
}
