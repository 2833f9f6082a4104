mod common;

use chrono::Utc;
use common::{Marketplace, line, shipping};
use ordercore::{
    Money, Order, OrderError, OrderId, OrderItem, OrderStatus, OrderStore, PayOrder, Payment,
    PaymentMethod, PaymentStatus, PlaceOrder, Product, ProductId, ProductVariant, Quantity,
    StockLogEntry, StockTarget, StoreError, StoreTransaction, UserId, VariantId, Vendor, VendorId,
    find_order, pay_order, place_order,
};
use ordercore_memory::InMemoryOrderStore;
use ordercore_types::CatalogPatch;

async fn pending_order(market: &Marketplace, buyer: UserId) -> Order {
    let product = market.simple_product(250, 10).await;
    place_order(
        &market.store,
        buyer,
        PlaceOrder {
            shipping: shipping(),
            lines: vec![line(product.id, None, 2)],
        },
    )
    .await
    .expect("order placed")
}

async fn payments_of(market: &Marketplace, order_id: OrderId) -> usize {
    let mut tx = market.store.begin().await.expect("begin");
    let payments = tx.fetch_payments(order_id).await.expect("fetch payments");
    tx.rollback().await.expect("rollback");
    payments.len()
}

#[tokio::test]
async fn paying_a_pending_order_records_payment_and_flips_status() {
    // Given
    let market = Marketplace::new().await;
    let buyer = UserId::generate();
    let order = pending_order(&market, buyer).await;

    // When
    let receipt = pay_order(
        &market.store,
        PayOrder {
            order_id: order.id,
            user_id: buyer,
            method: PaymentMethod::CreditCard,
        },
    )
    .await
    .expect("payment settled");

    // Then
    assert_eq!(receipt.status, OrderStatus::Paid);
    assert_eq!(receipt.total_price, Money::new(500));
    assert_eq!(receipt.payment.amount, order.total_price);
    assert_eq!(receipt.payment.status, PaymentStatus::Paid);
    assert_eq!(receipt.payment.method, PaymentMethod::CreditCard);

    let stored = find_order(&market.store, buyer, order.id)
        .await
        .expect("order readable");
    assert_eq!(stored.status, OrderStatus::Paid);
}

#[tokio::test]
async fn second_payment_is_rejected_as_already_paid() {
    let market = Marketplace::new().await;
    let buyer = UserId::generate();
    let order = pending_order(&market, buyer).await;
    let request = PayOrder {
        order_id: order.id,
        user_id: buyer,
        method: PaymentMethod::Wallet,
    };
    let _ = pay_order(&market.store, request).await.expect("first payment");

    let second = pay_order(&market.store, request).await;

    assert_eq!(second, Err(OrderError::Conflict("already paid".to_string())));
    assert_eq!(payments_of(&market, order.id).await, 1);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let market = Marketplace::new().await;

    let result = pay_order(
        &market.store,
        PayOrder {
            order_id: OrderId::generate(),
            user_id: UserId::generate(),
            method: PaymentMethod::BankTransfer,
        },
    )
    .await;

    assert!(matches!(result, Err(OrderError::NotFound(_))));
}

#[tokio::test]
async fn paying_someone_elses_order_is_forbidden() {
    let market = Marketplace::new().await;
    let order = pending_order(&market, UserId::generate()).await;

    let result = pay_order(
        &market.store,
        PayOrder {
            order_id: order.id,
            user_id: UserId::generate(),
            method: PaymentMethod::DebitCard,
        },
    )
    .await;

    assert!(matches!(result, Err(OrderError::Forbidden(_))));
    assert_eq!(payments_of(&market, order.id).await, 0);
}

#[tokio::test]
async fn cancelled_order_cannot_be_paid() {
    // Given: an order cancelled by a process outside the core
    let market = Marketplace::new().await;
    let buyer = UserId::generate();
    let order_id = OrderId::generate();
    let cancelled = Order {
        id: order_id,
        user_id: buyer,
        vendor_id: VendorId::generate(),
        total_price: Money::new(100),
        status: OrderStatus::Cancelled,
        shipping: shipping(),
        created_at: Utc::now(),
        items: vec![OrderItem {
            order_id,
            product_id: ProductId::generate(),
            variant_id: None,
            quantity: Quantity::try_new(1).expect("valid quantity"),
            unit_price: Money::new(100),
        }],
    };
    let mut tx = market.store.begin().await.expect("begin");
    tx.insert_order(&cancelled).await.expect("insert order");
    tx.commit().await.expect("commit");

    // When
    let result = pay_order(
        &market.store,
        PayOrder {
            order_id,
            user_id: buyer,
            method: PaymentMethod::CashOnDelivery,
        },
    )
    .await;

    // Then
    assert_eq!(
        result,
        Err(OrderError::Conflict("cannot be paid in current status".to_string()))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_payments_settle_exactly_once() {
    let market = Marketplace::new().await;
    let buyer = UserId::generate();
    let order = pending_order(&market, buyer).await;

    let attempts = (0..8).map(|_| {
        let store = market.store.clone();
        let request = PayOrder {
            order_id: order.id,
            user_id: buyer,
            method: PaymentMethod::CreditCard,
        };
        tokio::spawn(async move { pay_order(&store, request).await })
    });
    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task completed"))
        .collect();

    let settled = results.iter().filter(|result| result.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|result| matches!(result, Err(OrderError::Conflict(_))))
        .count();
    assert_eq!((settled, conflicts), (1, 7));
    assert_eq!(payments_of(&market, order.id).await, 1);
}

/// Store whose transactions apply the PENDING to PAID flip but then report
/// that no row matched, as if another settlement committed first.
struct LostStatusRace {
    inner: InMemoryOrderStore,
}

struct LostStatusRaceTransaction<T> {
    inner: T,
}

impl OrderStore for LostStatusRace {
    type Transaction = LostStatusRaceTransaction<<InMemoryOrderStore as OrderStore>::Transaction>;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        Ok(LostStatusRaceTransaction {
            inner: self.inner.begin().await?,
        })
    }
}

impl<T> StoreTransaction for LostStatusRaceTransaction<T>
where
    T: StoreTransaction + Send,
{
    async fn fetch_vendor_by_user(&mut self, user_id: UserId) -> Result<Option<Vendor>, StoreError> {
        self.inner.fetch_vendor_by_user(user_id).await
    }

    async fn insert_vendor(&mut self, vendor: &Vendor) -> Result<(), StoreError> {
        self.inner.insert_vendor(vendor).await
    }

    async fn fetch_products(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<Vec<Product>, StoreError> {
        self.inner.fetch_products(product_ids).await
    }

    async fn fetch_variants(
        &mut self,
        variant_ids: &[VariantId],
    ) -> Result<Vec<ProductVariant>, StoreError> {
        self.inner.fetch_variants(variant_ids).await
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        self.inner.insert_product(product).await
    }

    async fn insert_variant(&mut self, variant: &ProductVariant) -> Result<(), StoreError> {
        self.inner.insert_variant(variant).await
    }

    async fn apply_patch(&mut self, patch: &CatalogPatch) -> Result<bool, StoreError> {
        self.inner.apply_patch(patch).await
    }

    async fn reserve_stock(
        &mut self,
        target: StockTarget,
        quantity: Quantity,
    ) -> Result<bool, StoreError> {
        self.inner.reserve_stock(target, quantity).await
    }

    async fn increase_stock(
        &mut self,
        target: StockTarget,
        quantity: Quantity,
    ) -> Result<bool, StoreError> {
        self.inner.increase_stock(target, quantity).await
    }

    async fn compare_and_set_stock(
        &mut self,
        target: StockTarget,
        expected: u32,
        new: u32,
    ) -> Result<bool, StoreError> {
        self.inner.compare_and_set_stock(target, expected, new).await
    }

    async fn append_stock_log(&mut self, entry: &StockLogEntry) -> Result<(), StoreError> {
        self.inner.append_stock_log(entry).await
    }

    async fn fetch_stock_log(
        &mut self,
        product_id: ProductId,
    ) -> Result<Vec<StockLogEntry>, StoreError> {
        self.inner.fetch_stock_log(product_id).await
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        self.inner.insert_order(order).await
    }

    async fn fetch_order(&mut self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        self.inner.fetch_order(order_id).await
    }

    async fn mark_order_paid(&mut self, order_id: OrderId) -> Result<bool, StoreError> {
        let _ = self.inner.mark_order_paid(order_id).await?;
        Ok(false)
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        self.inner.insert_payment(payment).await
    }

    async fn fetch_payments(&mut self, order_id: OrderId) -> Result<Vec<Payment>, StoreError> {
        self.inner.fetch_payments(order_id).await
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.inner.rollback().await
    }
}

#[tokio::test]
async fn status_flip_miss_is_a_conflict_and_discards_the_payment() {
    // Given: a PENDING order and a store where the conditional flip loses
    let market = Marketplace::new().await;
    let buyer = UserId::generate();
    let order = pending_order(&market, buyer).await;
    let racing = LostStatusRace {
        inner: market.store.clone(),
    };

    // When
    let result = pay_order(
        &racing,
        PayOrder {
            order_id: order.id,
            user_id: buyer,
            method: PaymentMethod::CreditCard,
        },
    )
    .await;

    // Then: nothing from the settlement attempt survives
    assert_eq!(
        result,
        Err(OrderError::Conflict(
            "order status changed concurrently".to_string()
        ))
    );
    assert_eq!(payments_of(&market, order.id).await, 0);
    let stored = find_order(&market.store, buyer, order.id)
        .await
        .expect("order readable");
    assert_eq!(stored.status, OrderStatus::Pending);
}
