//! In-memory adapter for the OrderCore storage contract.
//!
//! This crate provides an in-memory implementation of [`OrderStore`], useful
//! for testing and development scenarios where persistence is not required.
//!
//! # Isolation model
//!
//! A transaction holds the store's single async mutex from `begin` until
//! `commit`/`rollback`/drop, so transactions are fully serialized. Writes are
//! applied in place and recorded in an undo log; rollback replays the log in
//! reverse. Serializable execution is stronger than the read-committed minimum
//! the contract requires, which keeps this backend a faithful oracle for the
//! contract suite.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;

use ordercore_types::{
    CatalogPatch, Operation, Order, OrderId, OrderStatus, OrderStore, Payment, Product,
    ProductId, ProductVariant, Quantity, StockLogEntry, StockTarget, StoreError,
    StoreTransaction, UserId, VariantId, Vendor, VendorId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument};

#[derive(Debug, Default)]
struct Tables {
    vendors: HashMap<VendorId, Vendor>,
    products: HashMap<ProductId, Product>,
    variants: HashMap<VariantId, ProductVariant>,
    orders: HashMap<OrderId, Order>,
    payments: Vec<Payment>,
    stock_log: Vec<StockLogEntry>,
}

/// Previous state of a row touched by an open transaction.
#[derive(Debug)]
enum Undo {
    Vendor(VendorId, Option<Vendor>),
    Product(ProductId, Option<Product>),
    Variant(VariantId, Option<ProductVariant>),
    Order(OrderId, Option<Order>),
}

/// Thread-safe in-memory order store for testing.
///
/// Cloning the store shares the underlying tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryOrderStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryOrderStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        let tables = Arc::clone(&self.tables).lock_owned().await;
        let payments_mark = tables.payments.len();
        let stock_log_mark = tables.stock_log.len();

        Ok(InMemoryTransaction {
            tables,
            undo: Vec::new(),
            payments_mark,
            stock_log_mark,
            finished: false,
        })
    }
}

/// Transaction handle for [`InMemoryOrderStore`].
///
/// Dropping an unfinished transaction rolls it back.
#[derive(Debug)]
pub struct InMemoryTransaction {
    tables: OwnedMutexGuard<Tables>,
    undo: Vec<Undo>,
    payments_mark: usize,
    stock_log_mark: usize,
    finished: bool,
}

impl InMemoryTransaction {
    fn remember_product(&mut self, product_id: ProductId) {
        let previous = self.tables.products.get(&product_id).cloned();
        self.undo.push(Undo::Product(product_id, previous));
    }

    fn remember_variant(&mut self, variant_id: VariantId) {
        let previous = self.tables.variants.get(&variant_id).cloned();
        self.undo.push(Undo::Variant(variant_id, previous));
    }

    fn remember_order(&mut self, order_id: OrderId) {
        let previous = self.tables.orders.get(&order_id).cloned();
        self.undo.push(Undo::Order(order_id, previous));
    }

    /// Mutable access to the stock counter of an active target row.
    fn stock_cell(&mut self, target: StockTarget) -> Option<&mut u32> {
        match target {
            StockTarget::Product(product_id) => self
                .tables
                .products
                .get_mut(&product_id)
                .filter(|product| product.is_active())
                .map(|product| &mut product.stock),
            StockTarget::Variant {
                product_id,
                variant_id,
            } => self
                .tables
                .variants
                .get_mut(&variant_id)
                .filter(|variant| variant.is_active() && variant.belongs_to(product_id))
                .map(|variant| &mut variant.stock),
        }
    }

    fn current_stock(&mut self, target: StockTarget) -> Option<u32> {
        self.stock_cell(target).map(|stock| *stock)
    }

    fn remember_target(&mut self, target: StockTarget) {
        match target {
            StockTarget::Product(product_id) => self.remember_product(product_id),
            StockTarget::Variant { variant_id, .. } => self.remember_variant(variant_id),
        }
    }

    /// Set an active target's stock, recording the previous row for rollback.
    fn write_stock(&mut self, target: StockTarget, new: u32) -> bool {
        if self.current_stock(target).is_none() {
            return false;
        }
        self.remember_target(target);
        match self.stock_cell(target) {
            Some(stock) => {
                *stock = new;
                true
            }
            None => false,
        }
    }

    fn undo_all(&mut self) {
        while let Some(entry) = self.undo.pop() {
            match entry {
                Undo::Vendor(id, previous) => restore(&mut self.tables.vendors, id, previous),
                Undo::Product(id, previous) => restore(&mut self.tables.products, id, previous),
                Undo::Variant(id, previous) => restore(&mut self.tables.variants, id, previous),
                Undo::Order(id, previous) => restore(&mut self.tables.orders, id, previous),
            }
        }
        let payments_mark = self.payments_mark;
        let stock_log_mark = self.stock_log_mark;
        self.tables.payments.truncate(payments_mark);
        self.tables.stock_log.truncate(stock_log_mark);
    }
}

fn restore<K, V>(table: &mut HashMap<K, V>, key: K, previous: Option<V>)
where
    K: std::hash::Hash + Eq,
{
    let _ = match previous {
        Some(row) => table.insert(key, row),
        None => table.remove(&key),
    };
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.finished {
            debug!("[memory.transaction] dropped without commit, rolling back");
            self.undo_all();
        }
    }
}

impl StoreTransaction for InMemoryTransaction {
    async fn fetch_vendor_by_user(&mut self, user_id: UserId) -> Result<Option<Vendor>, StoreError> {
        Ok(self
            .tables
            .vendors
            .values()
            .find(|vendor| vendor.user_id == user_id)
            .cloned())
    }

    async fn insert_vendor(&mut self, vendor: &Vendor) -> Result<(), StoreError> {
        let duplicate = self.tables.vendors.contains_key(&vendor.id)
            || self
                .tables
                .vendors
                .values()
                .any(|existing| existing.user_id == vendor.user_id);
        if duplicate {
            return Err(StoreError::UniqueViolation {
                operation: Operation::InsertVendor,
            });
        }
        self.undo.push(Undo::Vendor(vendor.id, None));
        let _ = self.tables.vendors.insert(vendor.id, vendor.clone());
        Ok(())
    }

    async fn fetch_products(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<Vec<Product>, StoreError> {
        Ok(product_ids
            .iter()
            .filter_map(|id| self.tables.products.get(id).cloned())
            .collect())
    }

    async fn fetch_variants(
        &mut self,
        variant_ids: &[VariantId],
    ) -> Result<Vec<ProductVariant>, StoreError> {
        Ok(variant_ids
            .iter()
            .filter_map(|id| self.tables.variants.get(id).cloned())
            .collect())
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        if self.tables.products.contains_key(&product.id) {
            return Err(StoreError::UniqueViolation {
                operation: Operation::InsertProduct,
            });
        }
        self.undo.push(Undo::Product(product.id, None));
        let _ = self.tables.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn insert_variant(&mut self, variant: &ProductVariant) -> Result<(), StoreError> {
        let duplicate = self.tables.variants.contains_key(&variant.id)
            || self.tables.variants.values().any(|existing| {
                existing.product_id == variant.product_id
                    && existing.attributes == variant.attributes
            });
        if duplicate {
            return Err(StoreError::UniqueViolation {
                operation: Operation::InsertVariant,
            });
        }
        self.undo.push(Undo::Variant(variant.id, None));
        let _ = self.tables.variants.insert(variant.id, variant.clone());
        Ok(())
    }

    #[instrument(name = "memory.apply_patch", skip(self))]
    async fn apply_patch(&mut self, patch: &CatalogPatch) -> Result<bool, StoreError> {
        match patch {
            CatalogPatch::ProductDetails {
                product_id,
                name,
                description,
            } => {
                if !self.tables.products.get(product_id).is_some_and(Product::is_active) {
                    return Ok(false);
                }
                self.remember_product(*product_id);
                if let Some(product) = self.tables.products.get_mut(product_id) {
                    product.name = name.clone();
                    product.description = description.clone();
                }
            }
            CatalogPatch::ProductPrice {
                product_id,
                base_price,
            } => {
                if !self.tables.products.get(product_id).is_some_and(Product::is_active) {
                    return Ok(false);
                }
                self.remember_product(*product_id);
                if let Some(product) = self.tables.products.get_mut(product_id) {
                    product.base_price = Some(*base_price);
                }
            }
            CatalogPatch::ProductDeleted {
                product_id,
                deleted_at,
            } => {
                if !self.tables.products.get(product_id).is_some_and(Product::is_active) {
                    return Ok(false);
                }
                self.remember_product(*product_id);
                if let Some(product) = self.tables.products.get_mut(product_id) {
                    product.deleted_at = Some(*deleted_at);
                }
            }
            CatalogPatch::VariantAttributes {
                variant_id,
                attributes,
            } => {
                let Some(product_id) = self
                    .tables
                    .variants
                    .get(variant_id)
                    .filter(|variant| variant.is_active())
                    .map(|variant| variant.product_id)
                else {
                    return Ok(false);
                };
                let taken = self.tables.variants.values().any(|other| {
                    other.id != *variant_id
                        && other.product_id == product_id
                        && other.attributes == *attributes
                });
                if taken {
                    return Err(StoreError::UniqueViolation {
                        operation: Operation::ApplyPatch,
                    });
                }
                self.remember_variant(*variant_id);
                if let Some(variant) = self.tables.variants.get_mut(variant_id) {
                    variant.attributes = attributes.clone();
                }
            }
            CatalogPatch::VariantPrice { variant_id, price } => {
                if !self
                    .tables
                    .variants
                    .get(variant_id)
                    .is_some_and(ProductVariant::is_active)
                {
                    return Ok(false);
                }
                self.remember_variant(*variant_id);
                if let Some(variant) = self.tables.variants.get_mut(variant_id) {
                    variant.price = *price;
                }
            }
            CatalogPatch::VariantDeleted {
                variant_id,
                deleted_at,
            } => {
                if !self
                    .tables
                    .variants
                    .get(variant_id)
                    .is_some_and(ProductVariant::is_active)
                {
                    return Ok(false);
                }
                self.remember_variant(*variant_id);
                if let Some(variant) = self.tables.variants.get_mut(variant_id) {
                    variant.deleted_at = Some(*deleted_at);
                }
            }
        }
        Ok(true)
    }

    #[instrument(name = "memory.reserve_stock", skip(self), fields(stock_target = %target))]
    async fn reserve_stock(
        &mut self,
        target: StockTarget,
        quantity: Quantity,
    ) -> Result<bool, StoreError> {
        let remaining = self
            .current_stock(target)
            .and_then(|stock| stock.checked_sub(quantity.get()));
        Ok(match remaining {
            Some(remaining) => self.write_stock(target, remaining),
            None => false,
        })
    }

    #[instrument(name = "memory.increase_stock", skip(self), fields(stock_target = %target))]
    async fn increase_stock(
        &mut self,
        target: StockTarget,
        quantity: Quantity,
    ) -> Result<bool, StoreError> {
        let raised = self
            .current_stock(target)
            .and_then(|stock| stock.checked_add(quantity.get()));
        Ok(match raised {
            Some(raised) => self.write_stock(target, raised),
            None => false,
        })
    }

    #[instrument(name = "memory.compare_and_set_stock", skip(self), fields(stock_target = %target))]
    async fn compare_and_set_stock(
        &mut self,
        target: StockTarget,
        expected: u32,
        new: u32,
    ) -> Result<bool, StoreError> {
        if self.current_stock(target) != Some(expected) {
            return Ok(false);
        }
        Ok(self.write_stock(target, new))
    }

    async fn append_stock_log(&mut self, entry: &StockLogEntry) -> Result<(), StoreError> {
        self.tables.stock_log.push(entry.clone());
        Ok(())
    }

    async fn fetch_stock_log(
        &mut self,
        product_id: ProductId,
    ) -> Result<Vec<StockLogEntry>, StoreError> {
        Ok(self
            .tables
            .stock_log
            .iter()
            .filter(|entry| entry.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        if self.tables.orders.contains_key(&order.id) {
            return Err(StoreError::UniqueViolation {
                operation: Operation::InsertOrder,
            });
        }
        self.undo.push(Undo::Order(order.id, None));
        let _ = self.tables.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn fetch_order(&mut self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.tables.orders.get(&order_id).cloned())
    }

    #[instrument(name = "memory.mark_order_paid", skip(self))]
    async fn mark_order_paid(&mut self, order_id: OrderId) -> Result<bool, StoreError> {
        let pending = self
            .tables
            .orders
            .get(&order_id)
            .is_some_and(|order| order.status == OrderStatus::Pending);
        if !pending {
            return Ok(false);
        }
        self.remember_order(order_id);
        if let Some(order) = self.tables.orders.get_mut(&order_id) {
            order.status = OrderStatus::Paid;
        }
        Ok(true)
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        if self.tables.payments.iter().any(|existing| existing.id == payment.id) {
            return Err(StoreError::UniqueViolation {
                operation: Operation::InsertPayment,
            });
        }
        self.tables.payments.push(payment.clone());
        Ok(())
    }

    async fn fetch_payments(&mut self, order_id: OrderId) -> Result<Vec<Payment>, StoreError> {
        Ok(self
            .tables
            .payments
            .iter()
            .filter(|payment| payment.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        debug!(
            touched_rows = self.undo.len(),
            "[memory.commit] committing transaction"
        );
        self.undo.clear();
        self.finished = true;
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), StoreError> {
        debug!(
            touched_rows = self.undo.len(),
            "[memory.rollback] rolling back transaction"
        );
        self.undo_all();
        self.finished = true;
        Ok(())
    }
}
