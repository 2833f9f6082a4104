use ordercore::{
    AddressLine, AttributeLabel, Money, NewProduct, NewVariant, OrderLineRequest, OrderStore,
    Product, ProductId, ProductKind, ProductName, ProductVariant, Quantity, ShippingAddress,
    StoreTransaction, UserId, VariantAttributes, VariantId, Vendor, VendorId, add_variant,
    create_product,
};
use ordercore_memory::InMemoryOrderStore;

/// A memory store with one registered vendor.
pub struct Marketplace {
    pub store: InMemoryOrderStore,
    pub vendor_user: UserId,
}

impl Marketplace {
    pub async fn new() -> Self {
        let store = InMemoryOrderStore::new();
        let vendor_user = register_vendor(&store).await;
        Self { store, vendor_user }
    }

    pub async fn simple_product(&self, base_price: i64, stock: u32) -> Product {
        self.simple_product_for(self.vendor_user, base_price, stock).await
    }

    pub async fn simple_product_for(
        &self,
        vendor_user: UserId,
        base_price: i64,
        stock: u32,
    ) -> Product {
        create_product(
            &self.store,
            vendor_user,
            NewProduct {
                name: ProductName::try_new("Desk Lamp").expect("valid name"),
                description: "Brass desk lamp".to_string(),
                kind: ProductKind::Simple,
                base_price: Money::new(base_price),
                stock,
            },
        )
        .await
        .expect("product created")
    }

    pub async fn varianted_product(&self, base_price: i64) -> Product {
        create_product(
            &self.store,
            self.vendor_user,
            NewProduct {
                name: ProductName::try_new("T-Shirt").expect("valid name"),
                description: String::new(),
                kind: ProductKind::Varianted,
                base_price: Money::new(base_price),
                stock: 0,
            },
        )
        .await
        .expect("product created")
    }

    pub async fn variant(
        &self,
        product_id: ProductId,
        color: &str,
        price: Option<i64>,
        stock: u32,
    ) -> ProductVariant {
        add_variant(
            &self.store,
            self.vendor_user,
            product_id,
            NewVariant {
                attributes: attributes("Color", color),
                price: price.map(Money::new),
                stock,
            },
        )
        .await
        .expect("variant created")
    }

    pub async fn product_stock(&self, product_id: ProductId) -> u32 {
        let mut tx = self.store.begin().await.expect("begin");
        let products = tx.fetch_products(&[product_id]).await.expect("fetch products");
        tx.rollback().await.expect("rollback");
        products.first().map(|product| product.stock).expect("product exists")
    }

    pub async fn variant_stock(&self, variant_id: VariantId) -> u32 {
        let mut tx = self.store.begin().await.expect("begin");
        let variants = tx.fetch_variants(&[variant_id]).await.expect("fetch variants");
        tx.rollback().await.expect("rollback");
        variants.first().map(|variant| variant.stock).expect("variant exists")
    }
}

pub async fn register_vendor(store: &InMemoryOrderStore) -> UserId {
    let user_id = UserId::generate();
    let mut tx = store.begin().await.expect("begin");
    tx.insert_vendor(&Vendor {
        id: VendorId::generate(),
        user_id,
        deleted_at: None,
    })
    .await
    .expect("vendor inserted");
    tx.commit().await.expect("commit");
    user_id
}

pub fn attributes(name: &str, value: &str) -> VariantAttributes {
    VariantAttributes {
        name: AttributeLabel::try_new(name).expect("valid label"),
        value: AttributeLabel::try_new(value).expect("valid label"),
    }
}

pub fn shipping() -> ShippingAddress {
    ShippingAddress {
        address: AddressLine::try_new("12 Harbour Street").expect("valid line"),
        city: AddressLine::try_new("Lisbon").expect("valid line"),
        country: AddressLine::try_new("Portugal").expect("valid line"),
        zip: AddressLine::try_new("1100-001").expect("valid line"),
    }
}

pub fn line(product_id: ProductId, variant_id: Option<VariantId>, units: u32) -> OrderLineRequest {
    OrderLineRequest {
        product_id,
        variant_id,
        quantity: Quantity::try_new(units).expect("valid quantity"),
    }
}
