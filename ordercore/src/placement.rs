use crate::errors::{OrderError, OrderResult};
use crate::normalize::{NormalizedLine, OrderLineRequest, normalize_lines};
use crate::pricing::snapshot_prices;
use crate::reservation::reserve_lines;
use crate::transaction::finish;
use crate::validate::resolve_catalog;
use crate::vendor::single_vendor;
use chrono::Utc;
use ordercore_types::{
    Order, OrderId, OrderItem, OrderStatus, OrderStore, ShippingAddress, StoreTransaction, UserId,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// A client's request to buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub shipping: ShippingAddress,
    pub lines: Vec<OrderLineRequest>,
}

/// Turn a client request into a durable PENDING order.
///
/// Runs normalization, referential validation, the single-vendor check, the
/// price snapshot, stock reservation and order persistence inside one
/// transaction. Any failure rolls every step back, so no reservation, ledger
/// entry or order row survives a rejected request.
///
/// # Errors
///
/// - `InvalidRequest`: no lines, variant missing for a VARIANTED product,
///   multi-vendor order, absent or invalid price, non-positive total
/// - `NotFound`: unknown or soft-deleted product or variant, or a variant
///   paired with a product it does not belong to
/// - `Conflict`: insufficient stock for some line
/// - `Unexpected`: storage failure
#[instrument(
    name = "ordercore.place_order",
    skip_all,
    fields(user_id = %user_id, lines = request.lines.len())
)]
pub async fn place_order<S>(store: &S, user_id: UserId, request: PlaceOrder) -> OrderResult<Order>
where
    S: OrderStore + Sync,
{
    let lines = normalize_lines(&request.lines)?;

    let mut tx = store.begin().await?;
    let outcome = create_order(&mut tx, user_id, request.shipping, &lines).await;
    let order = finish(tx, "place_order", outcome).await?;

    info!(
        order_id = %order.id,
        vendor_id = %order.vendor_id,
        total_price = %order.total_price,
        items = order.items.len(),
        "[ordercore.place_order.created] order placed"
    );
    Ok(order)
}

async fn create_order<T>(
    tx: &mut T,
    user_id: UserId,
    shipping: ShippingAddress,
    lines: &[NormalizedLine],
) -> OrderResult<Order>
where
    T: StoreTransaction + Send,
{
    let catalog = resolve_catalog(tx, lines).await?;
    let vendor_id = single_vendor(lines, &catalog)?;
    let priced = snapshot_prices(lines, &catalog)?;

    let _ = reserve_lines(tx, lines).await?;

    let order_id = OrderId::generate();
    let order = Order {
        id: order_id,
        user_id,
        vendor_id,
        total_price: priced.total,
        status: OrderStatus::Pending,
        shipping,
        created_at: Utc::now(),
        items: priced
            .lines
            .iter()
            .map(|priced_line| OrderItem {
                order_id,
                product_id: priced_line.line.product_id(),
                variant_id: priced_line.line.variant_id(),
                quantity: priced_line.line.quantity,
                unit_price: priced_line.unit_price,
            })
            .collect(),
    };
    tx.insert_order(&order).await?;

    Ok(order)
}

/// Load an order with its items on behalf of its buyer.
///
/// # Errors
///
/// `NotFound` when the order does not exist, `Forbidden` when it belongs to
/// another user.
#[instrument(name = "ordercore.find_order", skip(store))]
pub async fn find_order<S>(store: &S, user_id: UserId, order_id: OrderId) -> OrderResult<Order>
where
    S: OrderStore + Sync,
{
    let mut tx = store.begin().await?;
    let outcome = owned_order(&mut tx, user_id, order_id).await;
    finish(tx, "find_order", outcome).await
}

/// Fetch an order and check that `user_id` owns it.
pub(crate) async fn owned_order<T>(
    tx: &mut T,
    user_id: UserId,
    order_id: OrderId,
) -> OrderResult<Order>
where
    T: StoreTransaction + Send,
{
    let order = tx
        .fetch_order(order_id)
        .await?
        .ok_or_else(|| OrderError::not_found(format!("order {order_id}")))?;
    if !order.is_owned_by(user_id) {
        return Err(OrderError::forbidden(format!(
            "order {order_id} belongs to another user"
        )));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordercore_memory::InMemoryOrderStore;
    use ordercore_types::{AddressLine, ProductId, Quantity};
    use tracing_test::traced_test;

    fn shipping() -> ShippingAddress {
        let line = |raw: &str| AddressLine::try_new(raw).expect("valid address line");
        ShippingAddress {
            address: line("1 Main Street"),
            city: line("Porto"),
            country: line("Portugal"),
            zip: line("4000-001"),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn unknown_product_is_rejected_and_logged() {
        let store = InMemoryOrderStore::new();
        let request = PlaceOrder {
            shipping: shipping(),
            lines: vec![OrderLineRequest {
                product_id: ProductId::generate(),
                variant_id: None,
                quantity: Quantity::try_new(1).expect("valid quantity"),
            }],
        };

        let result = place_order(&store, UserId::generate(), request).await;

        assert!(matches!(result, Err(OrderError::NotFound(_))));
        assert!(logs_contain("[ordercore.validate.rejected]"));
        assert!(logs_contain("[ordercore.transaction.aborted]"));
    }

    #[tokio::test]
    async fn empty_order_is_invalid() {
        let store = InMemoryOrderStore::new();
        let request = PlaceOrder {
            shipping: shipping(),
            lines: Vec::new(),
        };

        let result = place_order(&store, UserId::generate(), request).await;

        insta::assert_snapshot!(
            result.expect_err("empty order rejected").to_string(),
            @"invalid request: order must contain at least one line"
        );
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let store = InMemoryOrderStore::new();
        let order_id = OrderId::generate();

        let result = find_order(&store, UserId::generate(), order_id).await;

        assert_eq!(
            result,
            Err(OrderError::NotFound(format!("order {order_id}")))
        );
    }
}
