//! PostgreSQL-specific behavior not covered by the backend contract suite:
//! constraint mapping, row decoding and pool handling.

mod common;

use chrono::Utc;
use common::{make_store, shared_postgres};
use ordercore::{
    Money, NewVariant, OrderError, OrderStore, Payment, PaymentId, PaymentMethod, PaymentStatus,
    PayOrder, PlaceOrder, StoreError, StoreTransaction, UserId, Vendor, VendorId, add_variant,
    pay_order, place_order,
};
use ordercore_postgres::{PostgresConfig, PostgresStore};
use ordercore_testing::{CatalogFixture, color_attributes, order_line, shipping_address};
use sqlx::postgres::PgPoolOptions;

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Docker"]
async fn second_vendor_for_same_user_is_a_unique_violation() {
    // Given: a user who already has a vendor account
    let store = make_store();
    let user_id = UserId::generate();
    let vendor = |id| Vendor {
        id,
        user_id,
        deleted_at: None,
    };
    let mut tx = store.begin().await.expect("begin");
    tx.insert_vendor(&vendor(VendorId::generate()))
        .await
        .expect("first vendor");
    tx.commit().await.expect("commit");

    // When: a second vendor row is inserted for the same user
    let mut tx = store.begin().await.expect("begin");
    let result = tx.insert_vendor(&vendor(VendorId::generate())).await;
    tx.rollback().await.expect("rollback");

    // Then: the 23505 error surfaces as a unique violation
    assert!(matches!(result, Err(StoreError::UniqueViolation { .. })));
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Docker"]
async fn duplicate_variant_attributes_surface_as_conflict() {
    // Given: a VARIANTED product with a red variant
    let fixture = CatalogFixture::new(make_store()).await.expect("fixture");
    let shirt = fixture.varianted_product(2_000).await.expect("product");
    let _ = fixture.variant(shirt.id, "Red", None, 3).await.expect("variant");

    // When: the vendor adds a second red variant
    let result = add_variant(
        fixture.store(),
        fixture.vendor_user(),
        shirt.id,
        NewVariant {
            attributes: color_attributes("Red"),
            price: None,
            stock: 1,
        },
    )
    .await;

    // Then: the unique (product_id, name, value) constraint becomes a Conflict
    assert!(matches!(result, Err(OrderError::Conflict(_))));
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Docker"]
async fn unknown_payment_method_text_is_a_corrupt_row() {
    // Given: a placed order and a payment row written by something else
    let fixture = CatalogFixture::new(make_store()).await.expect("fixture");
    let product = fixture.simple_product(500, 4).await.expect("product");
    let buyer = UserId::generate();
    let order = place_order(
        fixture.store(),
        buyer,
        PlaceOrder {
            shipping: shipping_address(),
            lines: vec![order_line(product.id, None, 1)],
        },
    )
    .await
    .expect("order placed");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&shared_postgres().connection_string)
        .await
        .expect("should connect to test database");
    let _ = sqlx::query(
        "INSERT INTO payments (id, order_id, amount, method, status) \
         VALUES ($1, $2, 500, 'BARTER', 'PAID')",
    )
    .bind(*PaymentId::generate().as_ref())
    .bind(*order.id.as_ref())
    .execute(&pool)
    .await
    .expect("raw insert");

    // When: the payments are read back through the store
    let result = fixture.payments(order.id).await;

    // Then: the undecodable row is reported, not silently dropped
    assert!(matches!(
        result,
        Err(OrderError::Unexpected(StoreError::CorruptRow {
            table: "payments",
            ..
        }))
    ));
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Docker"]
async fn payments_round_trip_through_the_store() {
    // Given: a paid order
    let fixture = CatalogFixture::new(make_store()).await.expect("fixture");
    let product = fixture.simple_product(1_250, 4).await.expect("product");
    let buyer = UserId::generate();
    let order = place_order(
        fixture.store(),
        buyer,
        PlaceOrder {
            shipping: shipping_address(),
            lines: vec![order_line(product.id, None, 2)],
        },
    )
    .await
    .expect("order placed");
    let receipt = pay_order(
        fixture.store(),
        PayOrder {
            order_id: order.id,
            user_id: buyer,
            method: PaymentMethod::Wallet,
        },
    )
    .await
    .expect("paid");

    // When: payments are fetched
    let payments: Vec<Payment> = fixture.payments(order.id).await.expect("payments");

    // Then: the stored row matches the receipt apart from timestamp precision
    assert_eq!(payments.len(), 1);
    let stored = &payments[0];
    assert_eq!(stored.id, receipt.payment.id);
    assert_eq!(stored.amount, Money::new(2_500));
    assert_eq!(stored.method, PaymentMethod::Wallet);
    assert_eq!(stored.status, PaymentStatus::Paid);
    assert!(stored.created_at <= Utc::now());
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires Docker"]
async fn store_built_from_pool_answers_ping() {
    let config = PostgresConfig::default();
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(config.acquire_timeout)
        .connect(&shared_postgres().connection_string)
        .await
        .expect("should connect to test database");

    let store = PostgresStore::from_pool(pool);

    store.ping().await.expect("ping");
}
