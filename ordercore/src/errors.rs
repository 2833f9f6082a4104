//! Error taxonomy for the order core.
//!
//! Every public operation returns [`OrderError`], a closed enum with one
//! variant per failure kind. Callers (typically an HTTP layer) map each kind to
//! their own status codes:
//!
//! - **InvalidRequest**: fix the request; resubmitting it unchanged fails again
//! - **NotFound**: a referenced product, variant or order is missing or deleted
//! - **Forbidden**: the caller does not own the vendor, product or order
//! - **Conflict**: a race was lost; resubmit the original request
//! - **Unexpected**: infrastructure failure, reported without detail
//!
//! # Example
//!
//! ```rust,ignore
//! match place_order(&store, user_id, request).await {
//!     Ok(receipt) => respond_created(receipt),
//!     Err(error) if error.is_retryable() => respond_conflict(error),
//!     Err(OrderError::Unexpected(_)) => respond_internal(),
//!     Err(error) => respond_rejected(error),
//! }
//! ```

use ordercore_types::StoreError;
use thiserror::Error;

/// Failure of an order-core operation.
///
/// All kinds are terminal for the current call and leave no partial state
/// behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The request is malformed or would produce an invalid order.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A referenced product, variant or order does not exist or is soft-deleted.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller does not own the resource being acted on.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A concurrent request won a race for stock or status.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other failure. The store error is kept as the source for logging
    /// but never rendered to the caller.
    #[error("internal error")]
    Unexpected(#[source] StoreError),
}

impl OrderError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }

    pub(crate) fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(reason.into())
    }

    pub(crate) fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub(crate) fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict(reason.into())
    }

    /// Whether resubmitting the original request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<StoreError> for OrderError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation { operation } => {
                Self::Conflict(format!("{operation} conflicted with a concurrent write"))
            }
            StoreError::Contention { operation } => {
                Self::Conflict(format!("{operation} aborted by a concurrent transaction"))
            }
            StoreError::StoreFailure { .. } | StoreError::CorruptRow { .. } => {
                Self::Unexpected(error)
            }
        }
    }
}

/// Convenience alias for results of order-core operations.
pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ordercore_types::Operation;
    use std::error::Error as _;

    #[test]
    fn unexpected_error_hides_store_detail() {
        let error = OrderError::from(StoreError::CorruptRow {
            table: "orders",
            detail: "unknown status SHIPPED".to_string(),
        });

        insta::assert_snapshot!(error.to_string(), @"internal error");
        assert!(error.source().is_some());
    }

    #[test]
    fn contention_maps_to_retryable_conflict() {
        let error = OrderError::from(StoreError::Contention {
            operation: Operation::ReserveStock,
        });

        assert!(error.is_retryable());
        insta::assert_snapshot!(
            error.to_string(),
            @"conflict: reserve_stock aborted by a concurrent transaction"
        );
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let error = OrderError::from(StoreError::UniqueViolation {
            operation: Operation::InsertVariant,
        });

        assert!(matches!(error, OrderError::Conflict(_)));
    }

    #[test]
    fn store_failure_is_not_retryable() {
        let error = OrderError::from(StoreError::StoreFailure {
            operation: Operation::CommitTransaction,
        });

        assert!(!error.is_retryable());
    }

    #[test]
    fn caller_facing_messages_are_stable() {
        insta::assert_snapshot!(
            OrderError::invalid("multi-vendor order not allowed").to_string(),
            @"invalid request: multi-vendor order not allowed"
        );
        insta::assert_snapshot!(
            OrderError::conflict("already paid").to_string(),
            @"conflict: already paid"
        );
    }
}
