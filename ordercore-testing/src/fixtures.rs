//! Catalog fixtures shared by the contract suite and backend tests.
//!
//! Everything is created through the public operations of `ordercore`, so a
//! fixture exercises the same paths production code does. Only the vendor row
//! is written directly, since vendor accounts belong to the identity provider.

use ordercore::{
    AddressLine, AttributeLabel, Money, NewProduct, NewVariant, Order, OrderError, OrderId,
    OrderLineRequest, OrderStore, OrderResult, Payment, Product, ProductId, ProductKind,
    ProductName, ProductVariant, Quantity, ShippingAddress, StockLogEntry, StoreTransaction,
    UserId, VariantAttributes, VariantId, Vendor, VendorId, add_variant, create_product,
};

/// A store with one registered, active vendor.
#[derive(Debug, Clone)]
pub struct CatalogFixture<S> {
    store: S,
    vendor_user: UserId,
    vendor_id: VendorId,
}

impl<S> CatalogFixture<S>
where
    S: OrderStore + Sync,
{
    /// Register a fresh vendor in `store`.
    pub async fn new(store: S) -> OrderResult<Self> {
        let vendor_user = register_vendor(&store).await?;
        let vendor_id = {
            let mut tx = store.begin().await?;
            let vendor = tx.fetch_vendor_by_user(vendor_user).await?;
            tx.commit().await?;
            vendor
                .map(|vendor| vendor.id)
                .ok_or_else(|| OrderError::NotFound(format!("vendor for user {vendor_user}")))?
        };

        Ok(Self {
            store,
            vendor_user,
            vendor_id,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn vendor_user(&self) -> UserId {
        self.vendor_user
    }

    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    pub async fn simple_product(&self, base_price: i64, stock: u32) -> OrderResult<Product> {
        self.product(ProductKind::Simple, base_price, stock).await
    }

    pub async fn varianted_product(&self, base_price: i64) -> OrderResult<Product> {
        self.product(ProductKind::Varianted, base_price, 0).await
    }

    async fn product(&self, kind: ProductKind, base_price: i64, stock: u32) -> OrderResult<Product> {
        let name = match kind {
            ProductKind::Simple => "Contract Lamp",
            ProductKind::Varianted => "Contract Shirt",
        };
        create_product(
            &self.store,
            self.vendor_user,
            NewProduct {
                name: ProductName::try_new(name).expect("fixture names are valid"),
                description: String::new(),
                kind,
                base_price: Money::new(base_price),
                stock,
            },
        )
        .await
    }

    /// Add a `Color` variant to one of this vendor's VARIANTED products.
    pub async fn variant(
        &self,
        product_id: ProductId,
        color: &str,
        price: Option<i64>,
        stock: u32,
    ) -> OrderResult<ProductVariant> {
        add_variant(
            &self.store,
            self.vendor_user,
            product_id,
            NewVariant {
                attributes: color_attributes(color),
                price: price.map(Money::new),
                stock,
            },
        )
        .await
    }

    pub async fn product_stock(&self, product_id: ProductId) -> OrderResult<Option<u32>> {
        let mut tx = self.store.begin().await?;
        let products = tx.fetch_products(&[product_id]).await?;
        tx.rollback().await?;
        Ok(products.first().map(|product| product.stock))
    }

    pub async fn variant_stock(&self, variant_id: VariantId) -> OrderResult<Option<u32>> {
        let mut tx = self.store.begin().await?;
        let variants = tx.fetch_variants(&[variant_id]).await?;
        tx.rollback().await?;
        Ok(variants.first().map(|variant| variant.stock))
    }

    pub async fn stock_log(&self, product_id: ProductId) -> OrderResult<Vec<StockLogEntry>> {
        let mut tx = self.store.begin().await?;
        let entries = tx.fetch_stock_log(product_id).await?;
        tx.rollback().await?;
        Ok(entries)
    }

    pub async fn order(&self, order_id: OrderId) -> OrderResult<Option<Order>> {
        let mut tx = self.store.begin().await?;
        let order = tx.fetch_order(order_id).await?;
        tx.rollback().await?;
        Ok(order)
    }

    pub async fn payments(&self, order_id: OrderId) -> OrderResult<Vec<Payment>> {
        let mut tx = self.store.begin().await?;
        let payments = tx.fetch_payments(order_id).await?;
        tx.rollback().await?;
        Ok(payments)
    }
}

/// Insert an active vendor account for a new user and return that user.
pub async fn register_vendor<S>(store: &S) -> OrderResult<UserId>
where
    S: OrderStore + Sync,
{
    let user_id = UserId::generate();
    let mut tx = store.begin().await?;
    tx.insert_vendor(&Vendor {
        id: VendorId::generate(),
        user_id,
        deleted_at: None,
    })
    .await?;
    tx.commit().await?;
    Ok(user_id)
}

pub fn color_attributes(color: &str) -> VariantAttributes {
    VariantAttributes {
        name: AttributeLabel::try_new("Color").expect("fixture labels are valid"),
        value: AttributeLabel::try_new(color).expect("fixture labels are valid"),
    }
}

pub fn shipping_address() -> ShippingAddress {
    let line = |raw: &str| AddressLine::try_new(raw).expect("fixture address lines are valid");
    ShippingAddress {
        address: line("221B Baker Street"),
        city: line("London"),
        country: line("United Kingdom"),
        zip: line("NW1 6XE"),
    }
}

/// An order line for `units` (at least one) of a product or variant.
pub fn order_line(
    product_id: ProductId,
    variant_id: Option<VariantId>,
    units: u32,
) -> OrderLineRequest {
    OrderLineRequest {
        product_id,
        variant_id,
        quantity: Quantity::try_new(units).expect("order lines need at least one unit"),
    }
}
