use ordercore_types::{
    CatalogPatch, Operation, Order, OrderId, Payment, Product, ProductId, ProductVariant, Quantity,
    StockLogEntry, StockTarget, StoreError, StoreTransaction, UserId, VariantId, Vendor,
};
use sqlx::postgres::PgQueryResult;
use sqlx::{Postgres, Transaction, query};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::map_sqlx_error;
use crate::rows::{self, PRODUCT_COLUMNS, VARIANT_COLUMNS};

/// Largest value a stock column may hold.
const STOCK_CEILING: i64 = 4_294_967_295;

/// An open database transaction.
///
/// Dropping it without [`commit`](StoreTransaction::commit) rolls back when the
/// connection returns to the pool.
#[derive(Debug)]
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PostgresTransaction {
    pub(crate) fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

fn touched(result: &PgQueryResult) -> bool {
    result.rows_affected() == 1
}

fn ids<T: AsRef<Uuid>>(values: &[T]) -> Vec<Uuid> {
    values.iter().map(|value| *value.as_ref()).collect()
}

impl StoreTransaction for PostgresTransaction {
    #[instrument(name = "postgres.fetch_vendor_by_user", skip(self))]
    async fn fetch_vendor_by_user(&mut self, user_id: UserId) -> Result<Option<Vendor>, StoreError> {
        let row = query("SELECT id, user_id, deleted_at FROM vendors WHERE user_id = $1")
            .bind(*user_id.as_ref())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|error| map_sqlx_error(error, Operation::FetchVendor))?;
        row.as_ref().map(rows::vendor).transpose()
    }

    #[instrument(name = "postgres.insert_vendor", skip_all, fields(vendor_id = %vendor.id))]
    async fn insert_vendor(&mut self, vendor: &Vendor) -> Result<(), StoreError> {
        let _ = query("INSERT INTO vendors (id, user_id, deleted_at) VALUES ($1, $2, $3)")
            .bind(*vendor.id.as_ref())
            .bind(*vendor.user_id.as_ref())
            .bind(vendor.deleted_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|error| map_sqlx_error(error, Operation::InsertVendor))?;
        Ok(())
    }

    #[instrument(name = "postgres.fetch_products", skip_all, fields(count = product_ids.len()))]
    async fn fetch_products(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<Vec<Product>, StoreError> {
        let statement = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)");
        let found = query(&statement)
            .bind(ids(product_ids))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|error| map_sqlx_error(error, Operation::FetchProducts))?;
        found.iter().map(rows::product).collect()
    }

    #[instrument(name = "postgres.fetch_variants", skip_all, fields(count = variant_ids.len()))]
    async fn fetch_variants(
        &mut self,
        variant_ids: &[VariantId],
    ) -> Result<Vec<ProductVariant>, StoreError> {
        let statement = format!("SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = ANY($1)");
        let found = query(&statement)
            .bind(ids(variant_ids))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|error| map_sqlx_error(error, Operation::FetchVariants))?;
        found.iter().map(rows::variant).collect()
    }

    #[instrument(name = "postgres.insert_product", skip_all, fields(product_id = %product.id))]
    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        let _ = query(
            "INSERT INTO products \
             (id, vendor_id, name, description, kind, base_price, stock, created_at, deleted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(*product.id.as_ref())
        .bind(*product.vendor_id.as_ref())
        .bind(product.name.as_ref())
        .bind(&product.description)
        .bind(product.kind.as_str())
        .bind(product.base_price.map(|price| price.minor_units()))
        .bind(i64::from(product.stock))
        .bind(product.created_at)
        .bind(product.deleted_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::InsertProduct))?;
        Ok(())
    }

    #[instrument(name = "postgres.insert_variant", skip_all, fields(variant_id = %variant.id))]
    async fn insert_variant(&mut self, variant: &ProductVariant) -> Result<(), StoreError> {
        let _ = query(
            "INSERT INTO product_variants \
             (id, product_id, name, value, stock, price, created_at, deleted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(*variant.id.as_ref())
        .bind(*variant.product_id.as_ref())
        .bind(variant.attributes.name.as_ref())
        .bind(variant.attributes.value.as_ref())
        .bind(i64::from(variant.stock))
        .bind(variant.price.map(|price| price.minor_units()))
        .bind(variant.created_at)
        .bind(variant.deleted_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::InsertVariant))?;
        Ok(())
    }

    #[instrument(name = "postgres.apply_patch", skip(self))]
    async fn apply_patch(&mut self, patch: &CatalogPatch) -> Result<bool, StoreError> {
        let result = match patch {
            CatalogPatch::ProductDetails {
                product_id,
                name,
                description,
            } => {
                query(
                    "UPDATE products SET name = $2, description = $3 \
                     WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(*product_id.as_ref())
                .bind(name.as_ref())
                .bind(description)
                .execute(&mut *self.tx)
                .await
            }
            CatalogPatch::ProductPrice {
                product_id,
                base_price,
            } => {
                query("UPDATE products SET base_price = $2 WHERE id = $1 AND deleted_at IS NULL")
                    .bind(*product_id.as_ref())
                    .bind(base_price.minor_units())
                    .execute(&mut *self.tx)
                    .await
            }
            CatalogPatch::ProductDeleted {
                product_id,
                deleted_at,
            } => {
                query("UPDATE products SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
                    .bind(*product_id.as_ref())
                    .bind(*deleted_at)
                    .execute(&mut *self.tx)
                    .await
            }
            CatalogPatch::VariantAttributes {
                variant_id,
                attributes,
            } => {
                query(
                    "UPDATE product_variants SET name = $2, value = $3 \
                     WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(*variant_id.as_ref())
                .bind(attributes.name.as_ref())
                .bind(attributes.value.as_ref())
                .execute(&mut *self.tx)
                .await
            }
            CatalogPatch::VariantPrice { variant_id, price } => {
                query(
                    "UPDATE product_variants SET price = $2 WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(*variant_id.as_ref())
                .bind(price.map(|price| price.minor_units()))
                .execute(&mut *self.tx)
                .await
            }
            CatalogPatch::VariantDeleted {
                variant_id,
                deleted_at,
            } => {
                query(
                    "UPDATE product_variants SET deleted_at = $2 \
                     WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(*variant_id.as_ref())
                .bind(*deleted_at)
                .execute(&mut *self.tx)
                .await
            }
        }
        .map_err(|error| map_sqlx_error(error, Operation::ApplyPatch))?;
        Ok(touched(&result))
    }

    #[instrument(name = "postgres.reserve_stock", skip(self), fields(stock_target = %target))]
    async fn reserve_stock(
        &mut self,
        target: StockTarget,
        quantity: Quantity,
    ) -> Result<bool, StoreError> {
        let units = i64::from(quantity.get());
        let result = match target {
            StockTarget::Product(product_id) => {
                query(
                    "UPDATE products SET stock = stock - $2 \
                     WHERE id = $1 AND deleted_at IS NULL AND stock >= $2",
                )
                .bind(*product_id.as_ref())
                .bind(units)
                .execute(&mut *self.tx)
                .await
            }
            StockTarget::Variant {
                product_id,
                variant_id,
            } => {
                query(
                    "UPDATE product_variants SET stock = stock - $3 \
                     WHERE id = $1 AND product_id = $2 AND deleted_at IS NULL AND stock >= $3",
                )
                .bind(*variant_id.as_ref())
                .bind(*product_id.as_ref())
                .bind(units)
                .execute(&mut *self.tx)
                .await
            }
        }
        .map_err(|error| map_sqlx_error(error, Operation::ReserveStock))?;

        let reserved = touched(&result);
        debug!(reserved, "[postgres.reserve_stock] conditional decrement evaluated");
        Ok(reserved)
    }

    #[instrument(name = "postgres.increase_stock", skip(self), fields(stock_target = %target))]
    async fn increase_stock(
        &mut self,
        target: StockTarget,
        quantity: Quantity,
    ) -> Result<bool, StoreError> {
        let units = i64::from(quantity.get());
        let result = match target {
            StockTarget::Product(product_id) => {
                query(
                    "UPDATE products SET stock = stock + $2 \
                     WHERE id = $1 AND deleted_at IS NULL AND stock + $2 <= $3",
                )
                .bind(*product_id.as_ref())
                .bind(units)
                .bind(STOCK_CEILING)
                .execute(&mut *self.tx)
                .await
            }
            StockTarget::Variant {
                product_id,
                variant_id,
            } => {
                query(
                    "UPDATE product_variants SET stock = stock + $3 \
                     WHERE id = $1 AND product_id = $2 AND deleted_at IS NULL \
                     AND stock + $3 <= $4",
                )
                .bind(*variant_id.as_ref())
                .bind(*product_id.as_ref())
                .bind(units)
                .bind(STOCK_CEILING)
                .execute(&mut *self.tx)
                .await
            }
        }
        .map_err(|error| map_sqlx_error(error, Operation::IncreaseStock))?;
        Ok(touched(&result))
    }

    #[instrument(name = "postgres.compare_and_set_stock", skip(self), fields(stock_target = %target))]
    async fn compare_and_set_stock(
        &mut self,
        target: StockTarget,
        expected: u32,
        new: u32,
    ) -> Result<bool, StoreError> {
        let result = match target {
            StockTarget::Product(product_id) => {
                query(
                    "UPDATE products SET stock = $3 \
                     WHERE id = $1 AND deleted_at IS NULL AND stock = $2",
                )
                .bind(*product_id.as_ref())
                .bind(i64::from(expected))
                .bind(i64::from(new))
                .execute(&mut *self.tx)
                .await
            }
            StockTarget::Variant {
                product_id,
                variant_id,
            } => {
                query(
                    "UPDATE product_variants SET stock = $4 \
                     WHERE id = $1 AND product_id = $2 AND deleted_at IS NULL AND stock = $3",
                )
                .bind(*variant_id.as_ref())
                .bind(*product_id.as_ref())
                .bind(i64::from(expected))
                .bind(i64::from(new))
                .execute(&mut *self.tx)
                .await
            }
        }
        .map_err(|error| map_sqlx_error(error, Operation::SetStock))?;
        Ok(touched(&result))
    }

    async fn append_stock_log(&mut self, entry: &StockLogEntry) -> Result<(), StoreError> {
        let _ = query(
            "INSERT INTO stock_log (id, product_id, variant_id, quantity, direction, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*entry.id.as_ref())
        .bind(*entry.product_id.as_ref())
        .bind(entry.variant_id.map(|id| *id.as_ref()))
        .bind(i64::from(entry.quantity.get()))
        .bind(entry.direction.as_str())
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::AppendStockLog))?;
        Ok(())
    }

    #[instrument(name = "postgres.fetch_stock_log", skip(self))]
    async fn fetch_stock_log(
        &mut self,
        product_id: ProductId,
    ) -> Result<Vec<StockLogEntry>, StoreError> {
        let found = query(
            "SELECT id, product_id, variant_id, quantity, direction, created_at \
             FROM stock_log WHERE product_id = $1 ORDER BY created_at, id",
        )
        .bind(*product_id.as_ref())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::FetchStockLog))?;
        found.iter().map(rows::stock_log_entry).collect()
    }

    #[instrument(
        name = "postgres.insert_order",
        skip_all,
        fields(order_id = %order.id, items = order.items.len())
    )]
    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        let _ = query(
            "INSERT INTO orders \
             (id, user_id, vendor_id, total_price, status, \
              shipping_address, shipping_city, shipping_country, shipping_zip, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(*order.id.as_ref())
        .bind(*order.user_id.as_ref())
        .bind(*order.vendor_id.as_ref())
        .bind(order.total_price.minor_units())
        .bind(order.status.as_str())
        .bind(order.shipping.address.as_ref())
        .bind(order.shipping.city.as_ref())
        .bind(order.shipping.country.as_ref())
        .bind(order.shipping.zip.as_ref())
        .bind(order.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::InsertOrder))?;

        for (line_no, item) in (1_i32..).zip(&order.items) {
            let _ = query(
                "INSERT INTO order_items \
                 (order_id, line_no, product_id, variant_id, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(*order.id.as_ref())
            .bind(line_no)
            .bind(*item.product_id.as_ref())
            .bind(item.variant_id.map(|id| *id.as_ref()))
            .bind(i64::from(item.quantity.get()))
            .bind(item.unit_price.minor_units())
            .execute(&mut *self.tx)
            .await
            .map_err(|error| map_sqlx_error(error, Operation::InsertOrder))?;
        }
        Ok(())
    }

    #[instrument(name = "postgres.fetch_order", skip(self))]
    async fn fetch_order(&mut self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let header = query(
            "SELECT id, user_id, vendor_id, total_price, status, shipping_address, \
             shipping_city, shipping_country, shipping_zip, created_at \
             FROM orders WHERE id = $1",
        )
        .bind(*order_id.as_ref())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::FetchOrder))?;
        let Some(header) = header.as_ref().map(rows::order_header).transpose()? else {
            return Ok(None);
        };

        let items = query(
            "SELECT order_id, product_id, variant_id, quantity, unit_price \
             FROM order_items WHERE order_id = $1 ORDER BY line_no",
        )
        .bind(*order_id.as_ref())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::FetchOrder))?
        .iter()
        .map(rows::order_item)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Order {
            id: header.id,
            user_id: header.user_id,
            vendor_id: header.vendor_id,
            total_price: header.total_price,
            status: header.status,
            shipping: header.shipping,
            created_at: header.created_at,
            items,
        }))
    }

    #[instrument(name = "postgres.mark_order_paid", skip(self))]
    async fn mark_order_paid(&mut self, order_id: OrderId) -> Result<bool, StoreError> {
        let result = query("UPDATE orders SET status = 'PAID' WHERE id = $1 AND status = 'PENDING'")
            .bind(*order_id.as_ref())
            .execute(&mut *self.tx)
            .await
            .map_err(|error| map_sqlx_error(error, Operation::MarkOrderPaid))?;
        Ok(touched(&result))
    }

    #[instrument(name = "postgres.insert_payment", skip_all, fields(payment_id = %payment.id))]
    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        let _ = query(
            "INSERT INTO payments (id, order_id, amount, method, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*payment.id.as_ref())
        .bind(*payment.order_id.as_ref())
        .bind(payment.amount.minor_units())
        .bind(payment.method.as_str())
        .bind(payment.status.as_str())
        .bind(payment.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::InsertPayment))?;
        Ok(())
    }

    #[instrument(name = "postgres.fetch_payments", skip(self))]
    async fn fetch_payments(&mut self, order_id: OrderId) -> Result<Vec<Payment>, StoreError> {
        let found = query(
            "SELECT id, order_id, amount, method, status, created_at \
             FROM payments WHERE order_id = $1 ORDER BY created_at, id",
        )
        .bind(*order_id.as_ref())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::FetchPayments))?;
        found.iter().map(rows::payment).collect()
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|error| map_sqlx_error(error, Operation::CommitTransaction))
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|error| map_sqlx_error(error, Operation::RollbackTransaction))
    }
}
