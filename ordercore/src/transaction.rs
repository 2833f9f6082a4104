use crate::errors::{OrderError, OrderResult};
use ordercore_types::StoreTransaction;
use tracing::{error, warn};

/// End a unit of work: commit when `outcome` succeeded, roll back otherwise.
///
/// The caller's error is returned unchanged when the rollback itself fails;
/// the rollback failure is only logged.
pub(crate) async fn finish<T, R>(
    tx: T,
    operation: &'static str,
    outcome: OrderResult<R>,
) -> OrderResult<R>
where
    T: StoreTransaction + Send,
{
    match outcome {
        Ok(value) => {
            if let Err(commit_error) = tx.commit().await {
                error!(
                    operation,
                    error = %commit_error,
                    "[ordercore.transaction.commit_failed] commit failed"
                );
                return Err(commit_error.into());
            }
            Ok(value)
        }
        Err(failure) => {
            match &failure {
                OrderError::Unexpected(source) => error!(
                    operation,
                    error = %source,
                    "[ordercore.transaction.aborted] unit of work failed"
                ),
                rejection => warn!(
                    operation,
                    error = %rejection,
                    "[ordercore.transaction.aborted] unit of work rejected"
                ),
            }
            if let Err(rollback_error) = tx.rollback().await {
                error!(
                    operation,
                    error = %rollback_error,
                    "[ordercore.transaction.rollback_failed] rollback failed"
                );
            }
            Err(failure)
        }
    }
}
