//! Behavioral contract every [`OrderStore`] backend must honor.
//!
//! Each scenario is a plain async function taking a store factory, so it can
//! be driven by hand. [`order_store_contract_tests!`] expands them into one
//! `#[tokio::test]` per scenario for a given backend.
//!
//! Scenarios only look at rows they created themselves, so they can share a
//! database with other tests running in parallel.

use crate::fixtures::{CatalogFixture, order_line, register_vendor, shipping_address};
use ordercore::{
    Money, Order, OrderError, OrderStatus, OrderStore, PayOrder, PaymentMethod, PlaceOrder,
    ProductUpdate, Quantity, StockDirection, StockTarget, StoreError, StoreTransaction, UserId,
    find_order, pay_order, place_order, update_product,
};
use std::fmt;

#[derive(Debug)]
pub struct ContractTestFailure {
    scenario: &'static str,
    detail: String,
}

impl ContractTestFailure {
    fn new(scenario: &'static str, detail: impl Into<String>) -> Self {
        Self {
            scenario,
            detail: detail.into(),
        }
    }

    fn order_error(scenario: &'static str, step: &'static str, error: &OrderError) -> Self {
        Self::new(scenario, format!("{step} returned unexpected error: {error:?}"))
    }

    fn store_error(scenario: &'static str, step: &'static str, error: &StoreError) -> Self {
        Self::new(scenario, format!("{step} store call failed: {error}"))
    }

    fn assertion(scenario: &'static str, detail: impl Into<String>) -> Self {
        Self::new(scenario, detail)
    }
}

impl fmt::Display for ContractTestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.scenario, self.detail)
    }
}

impl std::error::Error for ContractTestFailure {}

pub type ContractTestResult = Result<(), ContractTestFailure>;

fn step<T>(
    scenario: &'static str,
    name: &'static str,
    result: Result<T, OrderError>,
) -> Result<T, ContractTestFailure> {
    result.map_err(|error| ContractTestFailure::order_error(scenario, name, &error))
}

fn store_step<T>(
    scenario: &'static str,
    name: &'static str,
    result: Result<T, StoreError>,
) -> Result<T, ContractTestFailure> {
    result.map_err(|error| ContractTestFailure::store_error(scenario, name, &error))
}

fn expect_eq<T>(scenario: &'static str, what: &str, actual: T, expected: T) -> ContractTestResult
where
    T: PartialEq + fmt::Debug,
{
    if actual == expected {
        Ok(())
    } else {
        Err(ContractTestFailure::assertion(
            scenario,
            format!("{what}: expected {expected:?}, got {actual:?}"),
        ))
    }
}

fn expect_rejection<T: fmt::Debug>(
    scenario: &'static str,
    what: &str,
    result: &Result<T, OrderError>,
    matches: impl Fn(&OrderError) -> bool,
) -> ContractTestResult {
    match result {
        Err(error) if matches(error) => Ok(()),
        other => Err(ContractTestFailure::assertion(
            scenario,
            format!("{what}: unexpected outcome {other:?}"),
        )),
    }
}

async fn buy<S>(
    scenario: &'static str,
    store: &S,
    buyer: UserId,
    lines: Vec<ordercore::OrderLineRequest>,
) -> Result<Order, ContractTestFailure>
where
    S: OrderStore + Sync,
{
    step(
        scenario,
        "place_order",
        place_order(
            store,
            buyer,
            PlaceOrder {
                shipping: shipping_address(),
                lines,
            },
        )
        .await,
    )
}

/// Product P (SIMPLE, stock 10, price 100); ordering 4 leaves 6, totals 400
/// and writes exactly one OUT entry of 4.
pub async fn test_simple_order_reservation<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "simple_order_reservation";

    let fixture = step(SCENARIO, "fixture", CatalogFixture::new(make_store()).await)?;
    let product = step(SCENARIO, "seed product", fixture.simple_product(100, 10).await)?;

    let order = buy(
        SCENARIO,
        fixture.store(),
        UserId::generate(),
        vec![order_line(product.id, None, 4)],
    )
    .await?;

    expect_eq(SCENARIO, "order total", order.total_price, Money::new(400))?;
    expect_eq(SCENARIO, "order status", order.status, OrderStatus::Pending)?;
    let stock = step(SCENARIO, "read stock", fixture.product_stock(product.id).await)?;
    expect_eq(SCENARIO, "remaining stock", stock, Some(6))?;

    let outbound: Vec<u32> = step(SCENARIO, "read ledger", fixture.stock_log(product.id).await)?
        .into_iter()
        .filter(|entry| entry.direction == StockDirection::Out)
        .map(|entry| entry.quantity.get())
        .collect();
    expect_eq(SCENARIO, "outbound ledger entries", outbound, vec![4])?;

    // Timestamps may lose precision in storage; compare everything else.
    let stored = step(SCENARIO, "read order", fixture.order(order.id).await)?;
    let summary = |order: &Order| {
        (
            order.id,
            order.user_id,
            order.vendor_id,
            order.total_price,
            order.status,
            order.shipping.clone(),
            order.items.clone(),
        )
    };
    expect_eq(
        SCENARIO,
        "persisted order",
        stored.as_ref().map(summary),
        Some(summary(&order)),
    )
}

/// Concurrent orders against one counter never reserve more than its stock.
pub async fn test_no_oversell<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Clone + Send + Sync + 'static,
{
    const SCENARIO: &str = "no_oversell";
    const STOCK: u32 = 10;
    const ATTEMPTS: usize = 16;

    let fixture = step(SCENARIO, "fixture", CatalogFixture::new(make_store()).await)?;
    let product = step(SCENARIO, "seed product", fixture.simple_product(100, STOCK).await)?;

    let attempts = (0..ATTEMPTS).map(|attempt| {
        let store = fixture.store().clone();
        let units = u32::try_from(attempt % 3 + 1).unwrap_or(1);
        tokio::spawn(async move {
            let outcome = place_order(
                &store,
                UserId::generate(),
                PlaceOrder {
                    shipping: shipping_address(),
                    lines: vec![order_line(product.id, None, units)],
                },
            )
            .await;
            (units, outcome)
        })
    });

    let mut reserved = 0;
    for joined in futures::future::join_all(attempts).await {
        let (units, outcome) = joined.map_err(|error| {
            ContractTestFailure::assertion(SCENARIO, format!("order task panicked: {error}"))
        })?;
        match outcome {
            Ok(_) => reserved += units,
            Err(OrderError::Conflict(_)) => {}
            Err(error) => return Err(ContractTestFailure::order_error(SCENARIO, "place_order", &error)),
        }
    }

    if reserved > STOCK {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("reserved {reserved} units from a stock of {STOCK}"),
        ));
    }
    let stock = step(SCENARIO, "read stock", fixture.product_stock(product.id).await)?;
    expect_eq(SCENARIO, "remaining stock", stock, Some(STOCK - reserved))
}

/// Stock 6, two concurrent orders for 4: exactly one wins, the other is a
/// Conflict, and 2 units remain.
pub async fn test_concurrent_orders_single_winner<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Clone + Send + Sync + 'static,
{
    const SCENARIO: &str = "concurrent_orders_single_winner";

    let fixture = step(SCENARIO, "fixture", CatalogFixture::new(make_store()).await)?;
    let product = step(SCENARIO, "seed product", fixture.simple_product(100, 6).await)?;

    let attempts = (0..2).map(|_| {
        let store = fixture.store().clone();
        tokio::spawn(async move {
            place_order(
                &store,
                UserId::generate(),
                PlaceOrder {
                    shipping: shipping_address(),
                    lines: vec![order_line(product.id, None, 4)],
                },
            )
            .await
        })
    });

    let mut winners = 0;
    let mut conflicts = 0;
    for joined in futures::future::join_all(attempts).await {
        match joined {
            Ok(Ok(_)) => winners += 1,
            Ok(Err(OrderError::Conflict(_))) => conflicts += 1,
            other => {
                return Err(ContractTestFailure::assertion(
                    SCENARIO,
                    format!("unexpected outcome {other:?}"),
                ));
            }
        }
    }

    expect_eq(SCENARIO, "winners and conflicts", (winners, conflicts), (1, 1))?;
    let stock = step(SCENARIO, "read stock", fixture.product_stock(product.id).await)?;
    expect_eq(SCENARIO, "remaining stock", stock, Some(2))
}

/// A failing line leaves every counter, ledger and order table untouched.
pub async fn test_reservation_atomicity<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "reservation_atomicity";

    let fixture = step(SCENARIO, "fixture", CatalogFixture::new(make_store()).await)?;
    let plenty = step(SCENARIO, "seed product", fixture.simple_product(100, 10).await)?;
    let shirt = step(SCENARIO, "seed product", fixture.varianted_product(300).await)?;
    let scarce = step(SCENARIO, "seed variant", fixture.variant(shirt.id, "Red", None, 1).await)?;
    let ledger_before = step(SCENARIO, "read ledger", fixture.stock_log(plenty.id).await)?.len();

    let result = place_order(
        fixture.store(),
        UserId::generate(),
        PlaceOrder {
            shipping: shipping_address(),
            lines: vec![
                order_line(plenty.id, None, 5),
                order_line(shirt.id, Some(scarce.id), 2),
            ],
        },
    )
    .await;

    expect_rejection(SCENARIO, "short line", &result, |error| {
        matches!(error, OrderError::Conflict(_))
    })?;
    let plenty_stock = step(SCENARIO, "read stock", fixture.product_stock(plenty.id).await)?;
    expect_eq(SCENARIO, "untouched product stock", plenty_stock, Some(10))?;
    let scarce_stock = step(SCENARIO, "read stock", fixture.variant_stock(scarce.id).await)?;
    expect_eq(SCENARIO, "untouched variant stock", scarce_stock, Some(1))?;
    let ledger_after = step(SCENARIO, "read ledger", fixture.stock_log(plenty.id).await)?.len();
    expect_eq(SCENARIO, "ledger entries", ledger_after, ledger_before)
}

/// Requesting a pair twice with 2 and 3 units is the same as once with 5.
pub async fn test_normalization_merges_lines<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "normalization_merges_lines";

    let fixture = step(SCENARIO, "fixture", CatalogFixture::new(make_store()).await)?;
    let product = step(SCENARIO, "seed product", fixture.simple_product(100, 10).await)?;

    let order = buy(
        SCENARIO,
        fixture.store(),
        UserId::generate(),
        vec![order_line(product.id, None, 2), order_line(product.id, None, 3)],
    )
    .await?;

    let quantities: Vec<Quantity> = order.items.iter().map(|item| item.quantity).collect();
    expect_eq(
        SCENARIO,
        "item quantities",
        quantities,
        vec![Quantity::try_new(5).expect("five is a valid quantity")],
    )?;
    let outbound = step(SCENARIO, "read ledger", fixture.stock_log(product.id).await)?
        .into_iter()
        .filter(|entry| entry.direction == StockDirection::Out)
        .count();
    expect_eq(SCENARIO, "outbound ledger entries", outbound, 1)
}

/// Raising the base price after ordering leaves recorded item prices alone.
pub async fn test_price_immutability<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "price_immutability";

    let fixture = step(SCENARIO, "fixture", CatalogFixture::new(make_store()).await)?;
    let product = step(SCENARIO, "seed product", fixture.simple_product(100, 10).await)?;
    let buyer = UserId::generate();
    let order = buy(
        SCENARIO,
        fixture.store(),
        buyer,
        vec![order_line(product.id, None, 1)],
    )
    .await?;

    let _ = step(
        SCENARIO,
        "update_product",
        update_product(
            fixture.store(),
            fixture.vendor_user(),
            product.id,
            ProductUpdate::BasePrice(Money::new(5_000)),
        )
        .await,
    )?;

    let stored = step(SCENARIO, "find_order", find_order(fixture.store(), buyer, order.id).await)?;
    let prices: Vec<Money> = stored.items.iter().map(|item| item.unit_price).collect();
    expect_eq(SCENARIO, "snapshot prices", prices, vec![Money::new(100)])?;
    expect_eq(SCENARIO, "order total", stored.total_price, Money::new(100))
}

/// A variant paired with a product it does not belong to is NotFound and
/// touches no stock.
pub async fn test_variant_cross_reference<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "variant_cross_reference";

    let fixture = step(SCENARIO, "fixture", CatalogFixture::new(make_store()).await)?;
    let owner = step(SCENARIO, "seed product", fixture.varianted_product(300).await)?;
    let variant = step(SCENARIO, "seed variant", fixture.variant(owner.id, "Red", None, 5).await)?;
    let other = step(SCENARIO, "seed product", fixture.varianted_product(300).await)?;

    let result = place_order(
        fixture.store(),
        UserId::generate(),
        PlaceOrder {
            shipping: shipping_address(),
            lines: vec![order_line(other.id, Some(variant.id), 1)],
        },
    )
    .await;

    expect_rejection(SCENARIO, "mismatched variant", &result, |error| {
        matches!(error, OrderError::NotFound(_))
    })?;
    let stock = step(SCENARIO, "read stock", fixture.variant_stock(variant.id).await)?;
    expect_eq(SCENARIO, "variant stock", stock, Some(5))
}

/// Lines from two vendors are rejected before any stock moves.
pub async fn test_single_vendor<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Clone + Send + Sync + 'static,
{
    const SCENARIO: &str = "single_vendor";

    let store = make_store();
    let first = step(SCENARIO, "fixture", CatalogFixture::new(store.clone()).await)?;
    let second = step(SCENARIO, "fixture", CatalogFixture::new(store.clone()).await)?;
    let ours = step(SCENARIO, "seed product", first.simple_product(100, 10).await)?;
    let theirs = step(SCENARIO, "seed product", second.simple_product(100, 10).await)?;

    let result = place_order(
        &store,
        UserId::generate(),
        PlaceOrder {
            shipping: shipping_address(),
            lines: vec![order_line(ours.id, None, 1), order_line(theirs.id, None, 1)],
        },
    )
    .await;

    expect_rejection(SCENARIO, "multi-vendor order", &result, |error| {
        *error == OrderError::InvalidRequest("multi-vendor order not allowed".to_string())
    })?;
    let ours_stock = step(SCENARIO, "read stock", first.product_stock(ours.id).await)?;
    let theirs_stock = step(SCENARIO, "read stock", second.product_stock(theirs.id).await)?;
    expect_eq(SCENARIO, "stocks", (ours_stock, theirs_stock), (Some(10), Some(10)))
}

/// A zero total is rejected as "total must be positive".
pub async fn test_non_positive_total<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "non_positive_total";

    let fixture = step(SCENARIO, "fixture", CatalogFixture::new(make_store()).await)?;
    let free = step(SCENARIO, "seed product", fixture.simple_product(0, 10).await)?;

    let result = place_order(
        fixture.store(),
        UserId::generate(),
        PlaceOrder {
            shipping: shipping_address(),
            lines: vec![order_line(free.id, None, 2)],
        },
    )
    .await;

    expect_rejection(SCENARIO, "free order", &result, |error| {
        *error == OrderError::InvalidRequest("total must be positive".to_string())
    })?;
    let stock = step(SCENARIO, "read stock", fixture.product_stock(free.id).await)?;
    expect_eq(SCENARIO, "stock", stock, Some(10))
}

/// Paying a PENDING order succeeds once; paying it again is "already paid".
pub async fn test_payment_settles_once<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "payment_settles_once";

    let fixture = step(SCENARIO, "fixture", CatalogFixture::new(make_store()).await)?;
    let product = step(SCENARIO, "seed product", fixture.simple_product(150, 10).await)?;
    let buyer = UserId::generate();
    let order = buy(
        SCENARIO,
        fixture.store(),
        buyer,
        vec![order_line(product.id, None, 2)],
    )
    .await?;
    let request = PayOrder {
        order_id: order.id,
        user_id: buyer,
        method: PaymentMethod::BankTransfer,
    };

    let receipt = step(SCENARIO, "pay_order", pay_order(fixture.store(), request).await)?;
    expect_eq(SCENARIO, "receipt status", receipt.status, OrderStatus::Paid)?;
    expect_eq(SCENARIO, "payment amount", receipt.payment.amount, Money::new(300))?;

    let again = pay_order(fixture.store(), request).await;
    expect_rejection(SCENARIO, "second payment", &again, |error| {
        *error == OrderError::Conflict("already paid".to_string())
    })?;

    let stranger = pay_order(
        fixture.store(),
        PayOrder {
            user_id: UserId::generate(),
            ..request
        },
    )
    .await;
    expect_rejection(SCENARIO, "stranger payment", &stranger, |error| {
        matches!(error, OrderError::Forbidden(_))
    })?;

    let payments = step(SCENARIO, "read payments", fixture.payments(order.id).await)?;
    expect_eq(SCENARIO, "payment rows", payments.len(), 1)?;
    let stored = step(SCENARIO, "read order", fixture.order(order.id).await)?;
    expect_eq(
        SCENARIO,
        "order status",
        stored.map(|order| order.status),
        Some(OrderStatus::Paid),
    )
}

/// Concurrent payments on one PENDING order produce one payment and one
/// status flip; every loser gets Conflict.
pub async fn test_concurrent_payment_exactly_once<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Clone + Send + Sync + 'static,
{
    const SCENARIO: &str = "concurrent_payment_exactly_once";
    const ATTEMPTS: usize = 6;

    let fixture = step(SCENARIO, "fixture", CatalogFixture::new(make_store()).await)?;
    let product = step(SCENARIO, "seed product", fixture.simple_product(150, 10).await)?;
    let buyer = UserId::generate();
    let order = buy(
        SCENARIO,
        fixture.store(),
        buyer,
        vec![order_line(product.id, None, 1)],
    )
    .await?;

    let attempts = (0..ATTEMPTS).map(|_| {
        let store = fixture.store().clone();
        let request = PayOrder {
            order_id: order.id,
            user_id: buyer,
            method: PaymentMethod::CreditCard,
        };
        tokio::spawn(async move { pay_order(&store, request).await })
    });

    let mut settled = 0;
    for joined in futures::future::join_all(attempts).await {
        match joined {
            Ok(Ok(_)) => settled += 1,
            Ok(Err(OrderError::Conflict(_))) => {}
            other => {
                return Err(ContractTestFailure::assertion(
                    SCENARIO,
                    format!("unexpected outcome {other:?}"),
                ));
            }
        }
    }

    expect_eq(SCENARIO, "successful settlements", settled, 1)?;
    let payments = step(SCENARIO, "read payments", fixture.payments(order.id).await)?;
    expect_eq(SCENARIO, "payment rows", payments.len(), 1)
}

/// Writes made through a rolled back or dropped transaction are invisible,
/// and conditional primitives report misses as `false`.
pub async fn test_transaction_contract<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "transaction_contract";

    let fixture = step(SCENARIO, "fixture", CatalogFixture::new(make_store()).await)?;
    let product = step(SCENARIO, "seed product", fixture.simple_product(100, 3).await)?;
    let target = StockTarget::Product(product.id);
    let two = Quantity::try_new(2).expect("two is a valid quantity");

    let mut tx = store_step(SCENARIO, "begin", fixture.store().begin().await)?;
    let first = store_step(SCENARIO, "reserve_stock", tx.reserve_stock(target, two).await)?;
    let second = store_step(SCENARIO, "reserve_stock", tx.reserve_stock(target, two).await)?;
    store_step(SCENARIO, "rollback", tx.rollback().await)?;
    expect_eq(SCENARIO, "conditional reservations", (first, second), (true, false))?;
    let stock = step(SCENARIO, "read stock", fixture.product_stock(product.id).await)?;
    expect_eq(SCENARIO, "stock after rollback", stock, Some(3))?;

    {
        let mut tx = store_step(SCENARIO, "begin", fixture.store().begin().await)?;
        let raised = store_step(SCENARIO, "increase_stock", tx.increase_stock(target, two).await)?;
        expect_eq(SCENARIO, "increase applied", raised, true)?;
    }
    let stock = step(SCENARIO, "read stock", fixture.product_stock(product.id).await)?;
    expect_eq(SCENARIO, "stock after drop", stock, Some(3))?;

    let mut tx = store_step(SCENARIO, "begin", fixture.store().begin().await)?;
    let stale = store_step(
        SCENARIO,
        "compare_and_set_stock",
        tx.compare_and_set_stock(target, 2, 9).await,
    )?;
    let missing = store_step(
        SCENARIO,
        "mark_order_paid",
        tx.mark_order_paid(ordercore::OrderId::generate()).await,
    )?;
    store_step(SCENARIO, "commit", tx.commit().await)?;
    expect_eq(SCENARIO, "stale compare-and-set", stale, false)?;
    expect_eq(SCENARIO, "missing order flip", missing, false)
}

/// A soft-deleted vendor and unknown users cannot manage catalog rows.
pub async fn test_vendor_visibility<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "vendor_visibility";

    let store = make_store();
    let vendor_user = step(SCENARIO, "register vendor", register_vendor(&store).await)?;
    let mut tx = store_step(SCENARIO, "begin", store.begin().await)?;
    let vendor = store_step(SCENARIO, "fetch_vendor", tx.fetch_vendor_by_user(vendor_user).await)?;
    let unknown = store_step(
        SCENARIO,
        "fetch_vendor",
        tx.fetch_vendor_by_user(UserId::generate()).await,
    )?;
    store_step(SCENARIO, "commit", tx.commit().await)?;

    expect_eq(
        SCENARIO,
        "registered vendor",
        vendor.map(|vendor| (vendor.user_id, vendor.is_active())),
        Some((vendor_user, true)),
    )?;
    expect_eq(SCENARIO, "unknown user", unknown, None)
}

/// Expand every contract scenario into a `#[tokio::test]` for one backend.
///
/// Attributes placed before `suite` are copied onto each generated test, e.g.
/// `#[ignore = "requires Docker"]` for container-backed stores.
#[macro_export]
macro_rules! order_store_contract_tests {
    ($(#[$attr:meta])* suite = $suite:ident, make_store = $make_store:expr $(,)?) => {
        mod $suite {
            use $crate::contract::{
                test_concurrent_orders_single_winner, test_concurrent_payment_exactly_once,
                test_no_oversell, test_non_positive_total, test_normalization_merges_lines,
                test_payment_settles_once, test_price_immutability, test_reservation_atomicity,
                test_simple_order_reservation, test_single_vendor, test_transaction_contract,
                test_variant_cross_reference, test_vendor_visibility,
            };

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn simple_order_reservation_contract() {
                test_simple_order_reservation($make_store)
                    .await
                    .expect("order store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn no_oversell_contract() {
                test_no_oversell($make_store)
                    .await
                    .expect("order store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn concurrent_orders_single_winner_contract() {
                test_concurrent_orders_single_winner($make_store)
                    .await
                    .expect("order store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn reservation_atomicity_contract() {
                test_reservation_atomicity($make_store)
                    .await
                    .expect("order store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn normalization_merges_lines_contract() {
                test_normalization_merges_lines($make_store)
                    .await
                    .expect("order store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn price_immutability_contract() {
                test_price_immutability($make_store)
                    .await
                    .expect("order store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn variant_cross_reference_contract() {
                test_variant_cross_reference($make_store)
                    .await
                    .expect("order store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn single_vendor_contract() {
                test_single_vendor($make_store)
                    .await
                    .expect("order store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn non_positive_total_contract() {
                test_non_positive_total($make_store)
                    .await
                    .expect("order store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn payment_settles_once_contract() {
                test_payment_settles_once($make_store)
                    .await
                    .expect("order store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn concurrent_payment_exactly_once_contract() {
                test_concurrent_payment_exactly_once($make_store)
                    .await
                    .expect("order store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn transaction_contract() {
                test_transaction_contract($make_store)
                    .await
                    .expect("order store contract failed");
            }

            #[tokio::test(flavor = "multi_thread")]
            $(#[$attr])*
            async fn vendor_visibility_contract() {
                test_vendor_visibility($make_store)
                    .await
                    .expect("order store contract failed");
            }
        }
    };
}

pub use order_store_contract_tests;
