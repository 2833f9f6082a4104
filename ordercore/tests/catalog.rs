mod common;

use common::{Marketplace, attributes, register_vendor};
use ordercore::{
    Money, NewProduct, NewVariant, OrderError, ProductKind, ProductName, ProductUpdate, Quantity,
    StockChange, StockDirection, UserId, VariantUpdate, add_variant, create_product,
    stock_history, update_product, update_variant,
};

fn restock(units: u32) -> StockChange {
    StockChange::Restock(Quantity::try_new(units).expect("valid quantity"))
}

#[tokio::test]
async fn non_vendor_cannot_create_products() {
    let market = Marketplace::new().await;

    let result = create_product(
        &market.store,
        UserId::generate(),
        NewProduct {
            name: ProductName::try_new("Kettle").expect("valid name"),
            description: String::new(),
            kind: ProductKind::Simple,
            base_price: Money::new(100),
            stock: 1,
        },
    )
    .await;

    assert!(matches!(result, Err(OrderError::Forbidden(_))));
}

#[tokio::test]
async fn initial_stock_is_logged_as_inbound() {
    let market = Marketplace::new().await;
    let product = market.simple_product(100, 7).await;

    let history = stock_history(&market.store, market.vendor_user, product.id)
        .await
        .expect("history readable");

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].direction, StockDirection::In);
    assert_eq!(history[0].quantity.get(), 7);
}

#[tokio::test]
async fn restock_raises_stock_and_logs_inbound_entry() {
    let market = Marketplace::new().await;
    let product = market.simple_product(100, 2).await;

    let updated = update_product(
        &market.store,
        market.vendor_user,
        product.id,
        ProductUpdate::Stock(restock(5)),
    )
    .await
    .expect("restocked");

    assert_eq!(updated.stock, 7);
    let history = stock_history(&market.store, market.vendor_user, product.id)
        .await
        .expect("history readable");
    let last = history.last().expect("entry recorded");
    assert_eq!((last.direction, last.quantity.get()), (StockDirection::In, 5));
}

#[tokio::test]
async fn manual_stock_level_logs_the_delta() {
    let market = Marketplace::new().await;
    let product = market.simple_product(100, 10).await;

    let lowered = update_product(
        &market.store,
        market.vendor_user,
        product.id,
        ProductUpdate::Stock(StockChange::Set(4)),
    )
    .await
    .expect("stock set");
    let unchanged = update_product(
        &market.store,
        market.vendor_user,
        product.id,
        ProductUpdate::Stock(StockChange::Set(4)),
    )
    .await
    .expect("stock set");

    assert_eq!((lowered.stock, unchanged.stock), (4, 4));
    let history = stock_history(&market.store, market.vendor_user, product.id)
        .await
        .expect("history readable");
    let movements: Vec<(StockDirection, u32)> = history
        .iter()
        .map(|entry| (entry.direction, entry.quantity.get()))
        .collect();
    assert_eq!(
        movements,
        vec![(StockDirection::In, 10), (StockDirection::Out, 6)]
    );
}

#[tokio::test]
async fn other_vendors_cannot_edit_or_read_history() {
    let market = Marketplace::new().await;
    let product = market.simple_product(100, 10).await;
    let rival = register_vendor(&market.store).await;

    let edit = update_product(
        &market.store,
        rival,
        product.id,
        ProductUpdate::BasePrice(Money::new(1)),
    )
    .await;
    let history = stock_history(&market.store, rival, product.id).await;

    assert!(matches!(edit, Err(OrderError::Forbidden(_))));
    assert!(matches!(history, Err(OrderError::Forbidden(_))));
}

#[tokio::test]
async fn negative_base_price_is_invalid() {
    let market = Marketplace::new().await;
    let product = market.simple_product(100, 10).await;

    let result = update_product(
        &market.store,
        market.vendor_user,
        product.id,
        ProductUpdate::BasePrice(Money::new(-1)),
    )
    .await;

    assert!(matches!(result, Err(OrderError::InvalidRequest(_))));
}

#[tokio::test]
async fn varianted_product_stock_cannot_be_set_directly() {
    let market = Marketplace::new().await;
    let shirt = market.varianted_product(1_000).await;

    let result = update_product(
        &market.store,
        market.vendor_user,
        shirt.id,
        ProductUpdate::Stock(restock(3)),
    )
    .await;

    assert!(matches!(result, Err(OrderError::InvalidRequest(_))));
}

#[tokio::test]
async fn variants_require_a_varianted_product() {
    let market = Marketplace::new().await;
    let lamp = market.simple_product(100, 1).await;

    let result = add_variant(
        &market.store,
        market.vendor_user,
        lamp.id,
        NewVariant {
            attributes: attributes("Color", "Red"),
            price: None,
            stock: 1,
        },
    )
    .await;

    assert!(matches!(result, Err(OrderError::InvalidRequest(_))));
}

#[tokio::test]
async fn duplicate_variant_attributes_conflict() {
    let market = Marketplace::new().await;
    let shirt = market.varianted_product(1_000).await;
    let _ = market.variant(shirt.id, "Red", None, 1).await;
    let blue = market.variant(shirt.id, "Blue", None, 1).await;

    let duplicate = add_variant(
        &market.store,
        market.vendor_user,
        shirt.id,
        NewVariant {
            attributes: attributes("Color", "Red"),
            price: None,
            stock: 0,
        },
    )
    .await;
    let renamed = update_variant(
        &market.store,
        market.vendor_user,
        blue.id,
        VariantUpdate::Attributes(attributes("Color", "Red")),
    )
    .await;

    insta::assert_snapshot!(
        duplicate.expect_err("duplicate rejected").to_string(),
        @"conflict: variant Color/Red already exists"
    );
    assert!(matches!(renamed, Err(OrderError::Conflict(_))));
}

#[tokio::test]
async fn variant_price_override_can_be_cleared() {
    let market = Marketplace::new().await;
    let shirt = market.varianted_product(1_000).await;
    let red = market.variant(shirt.id, "Red", Some(1_500), 1).await;

    let cleared = update_variant(
        &market.store,
        market.vendor_user,
        red.id,
        VariantUpdate::Price(None),
    )
    .await
    .expect("price cleared");

    assert_eq!(cleared.price, None);
}

#[tokio::test]
async fn variant_restock_is_logged_against_its_product() {
    let market = Marketplace::new().await;
    let shirt = market.varianted_product(1_000).await;
    let red = market.variant(shirt.id, "Red", None, 0).await;

    let restocked = update_variant(
        &market.store,
        market.vendor_user,
        red.id,
        VariantUpdate::Stock(restock(9)),
    )
    .await
    .expect("restocked");

    assert_eq!(restocked.stock, 9);
    let history = stock_history(&market.store, market.vendor_user, shirt.id)
        .await
        .expect("history readable");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].variant_id, Some(red.id));
}

#[tokio::test]
async fn deleted_variant_cannot_be_updated_again() {
    let market = Marketplace::new().await;
    let shirt = market.varianted_product(1_000).await;
    let red = market.variant(shirt.id, "Red", None, 1).await;

    let deleted = update_variant(
        &market.store,
        market.vendor_user,
        red.id,
        VariantUpdate::Delete,
    )
    .await
    .expect("deleted");
    let again = update_variant(
        &market.store,
        market.vendor_user,
        red.id,
        VariantUpdate::Delete,
    )
    .await;

    assert!(deleted.deleted_at.is_some());
    assert!(matches!(again, Err(OrderError::NotFound(_))));
}

#[tokio::test]
async fn restock_beyond_stock_range_is_invalid() {
    let market = Marketplace::new().await;
    let product = market.simple_product(100, u32::MAX - 1).await;

    let result = update_product(
        &market.store,
        market.vendor_user,
        product.id,
        ProductUpdate::Stock(restock(2)),
    )
    .await;

    assert!(matches!(result, Err(OrderError::InvalidRequest(_))));
}
