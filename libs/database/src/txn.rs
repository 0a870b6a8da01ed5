//! Serializable transaction runner with bounded retry.
//!
//! Every consistency-critical write (order placement, review aggregation,
//! cart upserts) runs through [`serializable`]: the closure executes against
//! a transaction opened at `SERIALIZABLE` isolation, and serialization
//! conflicts (SQLSTATE 40001) or deadlocks retry a bounded number of times
//! before surfacing to the caller. Business errors abort the transaction
//! immediately and are never retried.

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, IsolationLevel, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Retries per logical operation, including the initial attempt.
const MAX_TXN_ATTEMPTS: u32 = 3;

/// Outcome distinguishing business failures from database failures inside a
/// transaction closure.
#[derive(Debug)]
pub enum TxnError<E> {
    /// Business rule failed. The transaction rolls back and the error is
    /// returned to the caller without retry.
    Abort(E),
    /// Database-level failure. Serialization conflicts retry; anything else
    /// propagates.
    Db(DbErr),
}

impl<E> From<DbErr> for TxnError<E> {
    fn from(e: DbErr) -> Self {
        TxnError::Db(e)
    }
}

/// Future returned by a transaction closure.
pub type TxnFuture<'c, T, E> = Pin<Box<dyn Future<Output = Result<T, TxnError<E>>> + Send + 'c>>;

/// True when the error is a transient conflict worth retrying.
pub fn is_serialization_failure(err: &DbErr) -> bool {
    let msg = err.to_string();
    msg.contains("40001")
        || msg.contains("could not serialize access")
        || msg.contains("deadlock detected")
}

/// Run `op` in a `SERIALIZABLE` transaction, retrying serialization
/// conflicts up to [`MAX_TXN_ATTEMPTS`] times with a short linear backoff.
///
/// The closure is invoked once per attempt, so any captured inputs must be
/// cheap to reuse (clone inside the closure).
pub async fn serializable<F, T, E>(db: &DatabaseConnection, op: F) -> Result<T, TxnError<E>>
where
    F: for<'c> Fn(&'c DatabaseTransaction) -> TxnFuture<'c, T, E>,
{
    let mut attempt: u32 = 1;

    loop {
        let txn = db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        match op(&txn).await {
            Ok(value) => match txn.commit().await {
                Ok(()) => return Ok(value),
                Err(e) if is_serialization_failure(&e) && attempt < MAX_TXN_ATTEMPTS => {
                    debug!(attempt, "Serialization conflict at commit, retrying");
                }
                Err(e) => return Err(TxnError::Db(e)),
            },
            Err(TxnError::Db(e)) if is_serialization_failure(&e) && attempt < MAX_TXN_ATTEMPTS => {
                let _ = txn.rollback().await;
                debug!(attempt, "Serialization conflict, retrying");
            }
            Err(err) => {
                let _ = txn.rollback().await;
                return Err(err);
            }
        }

        tokio::time::sleep(Duration::from_millis(50 * attempt as u64)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_failure_detection() {
        assert!(is_serialization_failure(&DbErr::Custom(
            "SQLSTATE 40001: could not serialize access due to concurrent update".to_string()
        )));
        assert!(is_serialization_failure(&DbErr::Custom(
            "deadlock detected".to_string()
        )));
        assert!(!is_serialization_failure(&DbErr::Custom(
            "duplicate key value violates unique constraint".to_string()
        )));
    }

    #[test]
    fn test_db_err_wraps_into_txn_error() {
        let err: TxnError<String> = DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, TxnError::Db(_)));
    }
}
