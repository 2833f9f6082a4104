use crate::errors::{OrderError, OrderResult};
use crate::placement::owned_order;
use crate::transaction::finish;
use chrono::Utc;
use ordercore_types::{
    Money, OrderId, OrderStatus, OrderStore, Payment, PaymentId, PaymentMethod, PaymentStatus,
    StoreTransaction, UserId,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// A buyer reporting a successful payment for one of their orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayOrder {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub method: PaymentMethod,
}

/// Result of a settled order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub total_price: Money,
    pub payment: Payment,
}

/// Record a payment and flip the order from PENDING to PAID exactly once.
///
/// Preconditions are checked in order: the order exists, belongs to the
/// caller, and is PENDING. The status flip is conditional on the order still
/// being PENDING at write time; losing that race rolls the payment back.
///
/// # Errors
///
/// - `NotFound`: no such order
/// - `Forbidden`: the order belongs to another user
/// - `Conflict`: already paid, not payable in its current status, or the
///   status changed between the check and the write
/// - `Unexpected`: storage failure
#[instrument(
    name = "ordercore.pay_order",
    skip_all,
    fields(order_id = %request.order_id, method = %request.method)
)]
pub async fn pay_order<S>(store: &S, request: PayOrder) -> OrderResult<PaymentReceipt>
where
    S: OrderStore + Sync,
{
    let mut tx = store.begin().await?;
    let outcome = settle(&mut tx, request).await;
    let receipt = finish(tx, "pay_order", outcome).await?;

    info!(
        payment_id = %receipt.payment.id,
        amount = %receipt.payment.amount,
        "[ordercore.pay_order.settled] order paid"
    );
    Ok(receipt)
}

async fn settle<T>(tx: &mut T, request: PayOrder) -> OrderResult<PaymentReceipt>
where
    T: StoreTransaction + Send,
{
    let order = owned_order(tx, request.user_id, request.order_id).await?;
    match order.status {
        OrderStatus::Pending => {}
        OrderStatus::Paid => return Err(OrderError::conflict("already paid")),
        OrderStatus::Cancelled => {
            return Err(OrderError::conflict("cannot be paid in current status"));
        }
    }

    let payment = Payment {
        id: PaymentId::generate(),
        order_id: order.id,
        amount: order.total_price,
        method: request.method,
        status: PaymentStatus::Paid,
        created_at: Utc::now(),
    };
    tx.insert_payment(&payment).await?;

    if !tx.mark_order_paid(order.id).await? {
        warn!(
            order_id = %order.id,
            "[ordercore.pay_order.status_race] order left PENDING before settlement"
        );
        return Err(OrderError::conflict("order status changed concurrently"));
    }

    Ok(PaymentReceipt {
        order_id: order.id,
        status: OrderStatus::Paid,
        total_price: order.total_price,
        payment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordercore_memory::InMemoryOrderStore;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn missing_order_rejection_is_logged() {
        let store = InMemoryOrderStore::new();

        let result = pay_order(
            &store,
            PayOrder {
                order_id: OrderId::generate(),
                user_id: UserId::generate(),
                method: PaymentMethod::CreditCard,
            },
        )
        .await;

        assert!(matches!(result, Err(OrderError::NotFound(_))));
        assert!(logs_contain("ordercore.pay_order"));
        assert!(logs_contain("unit of work rejected"));
    }
}
