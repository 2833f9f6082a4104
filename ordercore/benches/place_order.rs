//! Order placement throughput against the in-memory store.

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ordercore::{
    AddressLine, Money, NewProduct, OrderLineRequest, OrderStore, PlaceOrder, ProductId,
    ProductKind, ProductName, Quantity, ShippingAddress, StoreTransaction, UserId, Vendor,
    VendorId, create_product, place_order,
};
use ordercore_memory::InMemoryOrderStore;
use std::hint::black_box;
use tokio::runtime::Runtime;

fn shipping() -> ShippingAddress {
    let line = |raw: &str| AddressLine::try_new(raw).unwrap();
    ShippingAddress {
        address: line("1 Bench Street"),
        city: line("Benchville"),
        country: line("Nowhere"),
        zip: line("00000"),
    }
}

async fn seeded_store(products: usize) -> (InMemoryOrderStore, Vec<ProductId>) {
    let store = InMemoryOrderStore::new();
    let vendor_user = UserId::generate();
    let mut tx = store.begin().await.unwrap();
    tx.insert_vendor(&Vendor {
        id: VendorId::generate(),
        user_id: vendor_user,
        deleted_at: None,
    })
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let mut ids = Vec::with_capacity(products);
    for index in 0..products {
        let product = create_product(
            &store,
            vendor_user,
            NewProduct {
                name: ProductName::try_new(format!("Bench item {index}")).unwrap(),
                description: String::new(),
                kind: ProductKind::Simple,
                base_price: Money::new(1_000),
                stock: u32::MAX,
            },
        )
        .await
        .unwrap();
        ids.push(product.id);
    }
    (store, ids)
}

fn bench_place_order(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("place_order");

    for line_count in [1usize, 5, 20] {
        let (store, products) = rt.block_on(seeded_store(line_count));
        let lines: Vec<OrderLineRequest> = products
            .iter()
            .map(|product_id| OrderLineRequest {
                product_id: *product_id,
                variant_id: None,
                quantity: Quantity::try_new(1).unwrap(),
            })
            .collect();

        group.throughput(Throughput::Elements(line_count as u64));
        group.bench_with_input(
            BenchmarkId::new("lines", line_count),
            &lines,
            |b, lines| {
                b.to_async(&rt).iter(|| async {
                    let order = place_order(
                        &store,
                        UserId::generate(),
                        PlaceOrder {
                            shipping: shipping(),
                            lines: lines.clone(),
                        },
                    )
                    .await
                    .unwrap();
                    black_box(order);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_place_order);
criterion_main!(benches);
