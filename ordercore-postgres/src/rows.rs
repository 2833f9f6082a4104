//! Mapping between PostgreSQL rows and domain types.
//!
//! Anything the database returns that the domain types reject (unknown enum
//! text, out-of-range counters, blank names) is reported as
//! [`StoreError::CorruptRow`] naming the table it came from.

use chrono::{DateTime, Utc};
use ordercore_types::{
    AddressLine, AttributeLabel, Money, OrderId, OrderItem, OrderStatus, Payment, PaymentId,
    PaymentMethod, PaymentStatus, Product, ProductId, ProductKind, ProductName, ProductVariant,
    Quantity, ShippingAddress, StockDirection, StockLogEntry, StockLogEntryId, StoreError, UserId,
    VariantAttributes, VariantId, Vendor, VendorId,
};
use sqlx::postgres::PgRow;
use sqlx::{Decode, Postgres, Row, Type};
use uuid::Uuid;

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, vendor_id, name, description, kind, base_price, stock, created_at, deleted_at";

pub(crate) const VARIANT_COLUMNS: &str =
    "id, product_id, name, value, stock, price, created_at, deleted_at";

fn column<'r, T>(row: &'r PgRow, table: &'static str, name: &str) -> Result<T, StoreError>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get(name).map_err(|error| StoreError::CorruptRow {
        table,
        detail: format!("column {name}: {error}"),
    })
}

fn corrupt(table: &'static str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::CorruptRow {
        table,
        detail: detail.to_string(),
    }
}

/// Stock and quantity columns are `BIGINT` bounded to the `u32` range.
fn counter(row: &PgRow, table: &'static str, name: &str) -> Result<u32, StoreError> {
    let raw: i64 = column(row, table, name)?;
    u32::try_from(raw).map_err(|_| corrupt(table, format!("{name} out of range: {raw}")))
}

fn quantity(row: &PgRow, table: &'static str) -> Result<Quantity, StoreError> {
    let raw = counter(row, table, "quantity")?;
    Quantity::try_new(raw).map_err(|error| corrupt(table, error))
}

fn money(row: &PgRow, table: &'static str, name: &str) -> Result<Option<Money>, StoreError> {
    let raw: Option<i64> = column(row, table, name)?;
    Ok(raw.map(Money::new))
}

fn label(raw: String, table: &'static str) -> Result<AttributeLabel, StoreError> {
    AttributeLabel::try_new(raw).map_err(|error| corrupt(table, error))
}

fn address_line(row: &PgRow, name: &str) -> Result<AddressLine, StoreError> {
    let raw: String = column(row, "orders", name)?;
    AddressLine::try_new(raw).map_err(|error| corrupt("orders", error))
}

pub(crate) fn vendor(row: &PgRow) -> Result<Vendor, StoreError> {
    const TABLE: &str = "vendors";
    Ok(Vendor {
        id: VendorId::new(column::<Uuid>(row, TABLE, "id")?),
        user_id: UserId::new(column::<Uuid>(row, TABLE, "user_id")?),
        deleted_at: column(row, TABLE, "deleted_at")?,
    })
}

pub(crate) fn product(row: &PgRow) -> Result<Product, StoreError> {
    const TABLE: &str = "products";
    let kind: String = column(row, TABLE, "kind")?;
    let name: String = column(row, TABLE, "name")?;

    Ok(Product {
        id: ProductId::new(column::<Uuid>(row, TABLE, "id")?),
        vendor_id: VendorId::new(column::<Uuid>(row, TABLE, "vendor_id")?),
        name: ProductName::try_new(name).map_err(|error| corrupt(TABLE, error))?,
        description: column(row, TABLE, "description")?,
        kind: ProductKind::parse(&kind)
            .ok_or_else(|| corrupt(TABLE, format!("unknown kind {kind}")))?,
        base_price: money(row, TABLE, "base_price")?,
        stock: counter(row, TABLE, "stock")?,
        created_at: column(row, TABLE, "created_at")?,
        deleted_at: column(row, TABLE, "deleted_at")?,
    })
}

pub(crate) fn variant(row: &PgRow) -> Result<ProductVariant, StoreError> {
    const TABLE: &str = "product_variants";
    Ok(ProductVariant {
        id: VariantId::new(column::<Uuid>(row, TABLE, "id")?),
        product_id: ProductId::new(column::<Uuid>(row, TABLE, "product_id")?),
        attributes: VariantAttributes {
            name: label(column(row, TABLE, "name")?, TABLE)?,
            value: label(column(row, TABLE, "value")?, TABLE)?,
        },
        stock: counter(row, TABLE, "stock")?,
        price: money(row, TABLE, "price")?,
        created_at: column(row, TABLE, "created_at")?,
        deleted_at: column(row, TABLE, "deleted_at")?,
    })
}

/// Order header columns, without items.
pub(crate) struct OrderHeader {
    pub(crate) id: OrderId,
    pub(crate) user_id: UserId,
    pub(crate) vendor_id: VendorId,
    pub(crate) total_price: Money,
    pub(crate) status: OrderStatus,
    pub(crate) shipping: ShippingAddress,
    pub(crate) created_at: DateTime<Utc>,
}

pub(crate) fn order_header(row: &PgRow) -> Result<OrderHeader, StoreError> {
    const TABLE: &str = "orders";
    let status: String = column(row, TABLE, "status")?;

    Ok(OrderHeader {
        id: OrderId::new(column::<Uuid>(row, TABLE, "id")?),
        user_id: UserId::new(column::<Uuid>(row, TABLE, "user_id")?),
        vendor_id: VendorId::new(column::<Uuid>(row, TABLE, "vendor_id")?),
        total_price: Money::new(column(row, TABLE, "total_price")?),
        status: OrderStatus::parse(&status)
            .ok_or_else(|| corrupt(TABLE, format!("unknown status {status}")))?,
        shipping: ShippingAddress {
            address: address_line(row, "shipping_address")?,
            city: address_line(row, "shipping_city")?,
            country: address_line(row, "shipping_country")?,
            zip: address_line(row, "shipping_zip")?,
        },
        created_at: column(row, TABLE, "created_at")?,
    })
}

pub(crate) fn order_item(row: &PgRow) -> Result<OrderItem, StoreError> {
    const TABLE: &str = "order_items";
    let variant_id: Option<Uuid> = column(row, TABLE, "variant_id")?;
    let unit_price: i64 = column(row, TABLE, "unit_price")?;

    Ok(OrderItem {
        order_id: OrderId::new(column::<Uuid>(row, TABLE, "order_id")?),
        product_id: ProductId::new(column::<Uuid>(row, TABLE, "product_id")?),
        variant_id: variant_id.map(VariantId::new),
        quantity: quantity(row, TABLE)?,
        unit_price: Money::new(unit_price),
    })
}

pub(crate) fn payment(row: &PgRow) -> Result<Payment, StoreError> {
    const TABLE: &str = "payments";
    let method: String = column(row, TABLE, "method")?;
    let status: String = column(row, TABLE, "status")?;

    Ok(Payment {
        id: PaymentId::new(column::<Uuid>(row, TABLE, "id")?),
        order_id: OrderId::new(column::<Uuid>(row, TABLE, "order_id")?),
        amount: Money::new(column(row, TABLE, "amount")?),
        method: PaymentMethod::parse(&method)
            .ok_or_else(|| corrupt(TABLE, format!("unknown method {method}")))?,
        status: PaymentStatus::parse(&status)
            .ok_or_else(|| corrupt(TABLE, format!("unknown status {status}")))?,
        created_at: column(row, TABLE, "created_at")?,
    })
}

pub(crate) fn stock_log_entry(row: &PgRow) -> Result<StockLogEntry, StoreError> {
    const TABLE: &str = "stock_log";
    let variant_id: Option<Uuid> = column(row, TABLE, "variant_id")?;
    let direction: String = column(row, TABLE, "direction")?;

    Ok(StockLogEntry {
        id: StockLogEntryId::new(column::<Uuid>(row, TABLE, "id")?),
        product_id: ProductId::new(column::<Uuid>(row, TABLE, "product_id")?),
        variant_id: variant_id.map(VariantId::new),
        quantity: quantity(row, TABLE)?,
        direction: StockDirection::parse(&direction)
            .ok_or_else(|| corrupt(TABLE, format!("unknown direction {direction}")))?,
        created_at: column(row, TABLE, "created_at")?,
    })
}
