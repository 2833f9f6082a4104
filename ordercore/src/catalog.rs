//! Vendor-facing catalog maintenance.
//!
//! This is the restock and manual-edit path for stock counters. Like order
//! placement it never writes a counter from application memory: restocks use
//! the conditional increment and manual levels use compare-and-set against the
//! value just read. Every counter change appends a ledger entry in the same
//! transaction.

use crate::errors::{OrderError, OrderResult};
use crate::ledger::{movement_between, record_movement};
use crate::transaction::finish;
use chrono::Utc;
use ordercore_types::{
    CatalogPatch, Money, Operation, OrderStore, Product, ProductId, ProductKind, ProductName,
    ProductUpdate, ProductVariant, Quantity, StockChange, StockDirection, StockLogEntry,
    StockTarget, StoreError, StoreTransaction, UserId, VariantAttributes, VariantId,
    VariantUpdate, Vendor,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// A product to add to the caller's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: ProductName,
    pub description: String,
    pub kind: ProductKind,
    pub base_price: Money,
    /// Initial stock. Must be zero for VARIANTED products.
    pub stock: u32,
}

/// A variant to add to one of the caller's VARIANTED products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVariant {
    pub attributes: VariantAttributes,
    pub price: Option<Money>,
    pub stock: u32,
}

#[instrument(name = "ordercore.create_product", skip_all, fields(user_id = %user_id))]
pub async fn create_product<S>(store: &S, user_id: UserId, new: NewProduct) -> OrderResult<Product>
where
    S: OrderStore + Sync,
{
    let mut tx = store.begin().await?;
    let outcome = insert_product(&mut tx, user_id, new).await;
    let product = finish(tx, "create_product", outcome).await?;

    info!(
        product_id = %product.id,
        kind = %product.kind,
        "[ordercore.catalog.product_created] product created"
    );
    Ok(product)
}

async fn insert_product<T>(tx: &mut T, user_id: UserId, new: NewProduct) -> OrderResult<Product>
where
    T: StoreTransaction + Send,
{
    let vendor = active_vendor(tx, user_id).await?;
    ensure_price(new.base_price)?;
    if new.kind == ProductKind::Varianted && new.stock > 0 {
        return Err(OrderError::invalid(
            "stock of a VARIANTED product lives on its variants",
        ));
    }

    let product = Product {
        id: ProductId::generate(),
        vendor_id: vendor.id,
        name: new.name,
        description: new.description,
        kind: new.kind,
        base_price: Some(new.base_price),
        stock: new.stock,
        created_at: Utc::now(),
        deleted_at: None,
    };
    tx.insert_product(&product).await?;
    log_initial_stock(tx, StockTarget::Product(product.id), product.stock).await?;

    Ok(product)
}

#[instrument(
    name = "ordercore.add_variant",
    skip_all,
    fields(user_id = %user_id, product_id = %product_id)
)]
pub async fn add_variant<S>(
    store: &S,
    user_id: UserId,
    product_id: ProductId,
    new: NewVariant,
) -> OrderResult<ProductVariant>
where
    S: OrderStore + Sync,
{
    let mut tx = store.begin().await?;
    let outcome = insert_variant(&mut tx, user_id, product_id, new).await;
    let variant = finish(tx, "add_variant", outcome).await?;

    info!(variant_id = %variant.id, "[ordercore.catalog.variant_created] variant created");
    Ok(variant)
}

async fn insert_variant<T>(
    tx: &mut T,
    user_id: UserId,
    product_id: ProductId,
    new: NewVariant,
) -> OrderResult<ProductVariant>
where
    T: StoreTransaction + Send,
{
    let vendor = active_vendor(tx, user_id).await?;
    let product = owned_product(tx, &vendor, product_id).await?;
    if !product.is_varianted() {
        return Err(OrderError::invalid(format!(
            "product {product_id} is not VARIANTED"
        )));
    }
    if let Some(price) = new.price {
        ensure_price(price)?;
    }

    let variant = ProductVariant {
        id: VariantId::generate(),
        product_id,
        attributes: new.attributes,
        stock: new.stock,
        price: new.price,
        created_at: Utc::now(),
        deleted_at: None,
    };
    tx.insert_variant(&variant)
        .await
        .map_err(|error| duplicate_attributes(error, &variant.attributes))?;
    log_initial_stock(
        tx,
        StockTarget::Variant {
            product_id,
            variant_id: variant.id,
        },
        variant.stock,
    )
    .await?;

    Ok(variant)
}

/// Apply one update intent to a product owned by the caller.
///
/// # Errors
///
/// - `Forbidden`: caller is not an active vendor or does not own the product
/// - `NotFound`: product missing or soft-deleted
/// - `InvalidRequest`: negative price, or a stock change on a VARIANTED product
/// - `Conflict`: a manual stock level raced with another stock change
#[instrument(name = "ordercore.update_product", skip(store, update))]
pub async fn update_product<S>(
    store: &S,
    user_id: UserId,
    product_id: ProductId,
    update: ProductUpdate,
) -> OrderResult<Product>
where
    S: OrderStore + Sync,
{
    let mut tx = store.begin().await?;
    let outcome = apply_product_update(&mut tx, user_id, product_id, update).await;
    finish(tx, "update_product", outcome).await
}

async fn apply_product_update<T>(
    tx: &mut T,
    user_id: UserId,
    product_id: ProductId,
    update: ProductUpdate,
) -> OrderResult<Product>
where
    T: StoreTransaction + Send,
{
    let vendor = active_vendor(tx, user_id).await?;
    let product = owned_product(tx, &vendor, product_id).await?;

    let patch = match update {
        ProductUpdate::Details { name, description } => CatalogPatch::ProductDetails {
            product_id,
            name,
            description,
        },
        ProductUpdate::BasePrice(base_price) => {
            ensure_price(base_price)?;
            CatalogPatch::ProductPrice {
                product_id,
                base_price,
            }
        }
        ProductUpdate::Stock(change) => {
            if product.is_varianted() {
                return Err(OrderError::invalid(
                    "stock of a VARIANTED product lives on its variants",
                ));
            }
            apply_stock_change(tx, StockTarget::Product(product_id), product.stock, change)
                .await?;
            return fetch_product(tx, product_id).await;
        }
        ProductUpdate::Delete => CatalogPatch::ProductDeleted {
            product_id,
            deleted_at: Utc::now(),
        },
    };

    if !tx.apply_patch(&patch).await? {
        return Err(OrderError::not_found(format!("product {product_id}")));
    }
    fetch_product(tx, product_id).await
}

/// Apply one update intent to a variant of a product owned by the caller.
///
/// # Errors
///
/// Same kinds as [`update_product`]; renaming a variant onto an attribute
/// pair already used by a sibling is `Conflict`.
#[instrument(name = "ordercore.update_variant", skip(store, update))]
pub async fn update_variant<S>(
    store: &S,
    user_id: UserId,
    variant_id: VariantId,
    update: VariantUpdate,
) -> OrderResult<ProductVariant>
where
    S: OrderStore + Sync,
{
    let mut tx = store.begin().await?;
    let outcome = apply_variant_update(&mut tx, user_id, variant_id, update).await;
    finish(tx, "update_variant", outcome).await
}

async fn apply_variant_update<T>(
    tx: &mut T,
    user_id: UserId,
    variant_id: VariantId,
    update: VariantUpdate,
) -> OrderResult<ProductVariant>
where
    T: StoreTransaction + Send,
{
    let vendor = active_vendor(tx, user_id).await?;
    let variant = active_variant(tx, variant_id).await?;
    let _ = owned_product(tx, &vendor, variant.product_id).await?;

    let patch = match update {
        VariantUpdate::Attributes(attributes) => {
            let patch = CatalogPatch::VariantAttributes {
                variant_id,
                attributes: attributes.clone(),
            };
            let applied = tx
                .apply_patch(&patch)
                .await
                .map_err(|error| duplicate_attributes(error, &attributes))?;
            if !applied {
                return Err(OrderError::not_found(format!("variant {variant_id}")));
            }
            return fetch_variant(tx, variant_id).await;
        }
        VariantUpdate::Price(price) => {
            if let Some(price) = price {
                ensure_price(price)?;
            }
            CatalogPatch::VariantPrice { variant_id, price }
        }
        VariantUpdate::Stock(change) => {
            let target = StockTarget::Variant {
                product_id: variant.product_id,
                variant_id,
            };
            apply_stock_change(tx, target, variant.stock, change).await?;
            return fetch_variant(tx, variant_id).await;
        }
        VariantUpdate::Delete => CatalogPatch::VariantDeleted {
            variant_id,
            deleted_at: Utc::now(),
        },
    };

    if !tx.apply_patch(&patch).await? {
        return Err(OrderError::not_found(format!("variant {variant_id}")));
    }
    fetch_variant(tx, variant_id).await
}

/// Ledger entries for one of the caller's products and all its variants,
/// oldest first. Soft-deleted products keep their history.
#[instrument(name = "ordercore.stock_history", skip(store))]
pub async fn stock_history<S>(
    store: &S,
    user_id: UserId,
    product_id: ProductId,
) -> OrderResult<Vec<StockLogEntry>>
where
    S: OrderStore + Sync,
{
    let mut tx = store.begin().await?;
    let outcome = read_stock_history(&mut tx, user_id, product_id).await;
    finish(tx, "stock_history", outcome).await
}

async fn read_stock_history<T>(
    tx: &mut T,
    user_id: UserId,
    product_id: ProductId,
) -> OrderResult<Vec<StockLogEntry>>
where
    T: StoreTransaction + Send,
{
    let vendor = active_vendor(tx, user_id).await?;
    let product = fetch_product(tx, product_id).await?;
    if product.vendor_id != vendor.id {
        return Err(not_owner(product_id));
    }

    let mut entries = tx.fetch_stock_log(product_id).await?;
    entries.sort_by_key(|entry| entry.created_at);
    Ok(entries)
}

/// Move a counter to the level `change` asks for, conditionally, and log it.
async fn apply_stock_change<T>(
    tx: &mut T,
    target: StockTarget,
    current: u32,
    change: StockChange,
) -> OrderResult<()>
where
    T: StoreTransaction + Send,
{
    match change {
        StockChange::Restock(quantity) => {
            if current.checked_add(quantity.get()).is_none() {
                return Err(OrderError::invalid(format!(
                    "restocking {target} by {quantity} exceeds the stock range"
                )));
            }
            if !tx.increase_stock(target, quantity).await? {
                return Err(OrderError::conflict(format!(
                    "stock of {target} changed concurrently"
                )));
            }
            let _ = record_movement(tx, target, quantity, StockDirection::In).await?;
        }
        StockChange::Set(level) => {
            let Some((quantity, direction)) = movement_between(current, level) else {
                return Ok(());
            };
            if !tx.compare_and_set_stock(target, current, level).await? {
                return Err(OrderError::conflict(format!(
                    "stock of {target} changed concurrently"
                )));
            }
            let _ = record_movement(tx, target, quantity, direction).await?;
        }
    }
    Ok(())
}

async fn log_initial_stock<T>(tx: &mut T, target: StockTarget, stock: u32) -> OrderResult<()>
where
    T: StoreTransaction + Send,
{
    if let Ok(quantity) = Quantity::try_new(stock) {
        let _ = record_movement(tx, target, quantity, StockDirection::In).await?;
    }
    Ok(())
}

async fn active_vendor<T>(tx: &mut T, user_id: UserId) -> OrderResult<Vendor>
where
    T: StoreTransaction + Send,
{
    tx.fetch_vendor_by_user(user_id)
        .await?
        .filter(Vendor::is_active)
        .ok_or_else(|| OrderError::forbidden(format!("user {user_id} is not an active vendor")))
}

async fn owned_product<T>(tx: &mut T, vendor: &Vendor, product_id: ProductId) -> OrderResult<Product>
where
    T: StoreTransaction + Send,
{
    let product = fetch_product(tx, product_id).await?;
    if !product.is_active() {
        return Err(OrderError::not_found(format!("product {product_id}")));
    }
    if product.vendor_id != vendor.id {
        return Err(not_owner(product_id));
    }
    Ok(product)
}

async fn fetch_product<T>(tx: &mut T, product_id: ProductId) -> OrderResult<Product>
where
    T: StoreTransaction + Send,
{
    tx.fetch_products(&[product_id])
        .await?
        .pop()
        .ok_or_else(|| OrderError::not_found(format!("product {product_id}")))
}

async fn active_variant<T>(tx: &mut T, variant_id: VariantId) -> OrderResult<ProductVariant>
where
    T: StoreTransaction + Send,
{
    Some(fetch_variant(tx, variant_id).await?)
        .filter(ProductVariant::is_active)
        .ok_or_else(|| OrderError::not_found(format!("variant {variant_id}")))
}

async fn fetch_variant<T>(tx: &mut T, variant_id: VariantId) -> OrderResult<ProductVariant>
where
    T: StoreTransaction + Send,
{
    tx.fetch_variants(&[variant_id])
        .await?
        .pop()
        .ok_or_else(|| OrderError::not_found(format!("variant {variant_id}")))
}

fn ensure_price(price: Money) -> OrderResult<()> {
    if price.is_negative() {
        return Err(OrderError::invalid(format!("price {price} is negative")));
    }
    Ok(())
}

fn not_owner(product_id: ProductId) -> OrderError {
    OrderError::forbidden(format!("product {product_id} belongs to another vendor"))
}

fn duplicate_attributes(error: StoreError, attributes: &VariantAttributes) -> OrderError {
    match error {
        StoreError::UniqueViolation {
            operation: Operation::InsertVariant | Operation::ApplyPatch,
        } => OrderError::conflict(format!(
            "variant {}/{} already exists",
            attributes.name, attributes.value
        )),
        other => other.into(),
    }
}
