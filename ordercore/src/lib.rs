#![forbid(
    dead_code,
    invalid_value,
    overflowing_literals,
    unconditional_recursion,
    unreachable_pub,
    unused_allocation,
    unsafe_code
)]
#![deny(
    bad_style,
    clippy::allow_attributes,
    deprecated,
    meta_variable_misuse,
    non_ascii_idents,
    non_camel_case_types,
    non_snake_case,
    non_upper_case_globals,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_code,
    unused_assignments,
    unused_attributes,
    unused_extern_crates,
    unused_imports,
    unused_must_use,
    unused_mut,
    unused_parens,
    unused_results,
    unused_variables
)]

//! # OrderCore
//!
//! Order placement with atomic inventory reservation and exactly-once payment
//! settlement for a multi-vendor marketplace.
//!
//! A client request flows through a fixed pipeline, all inside one storage
//! transaction:
//!
//! 1. **Normalize**: merge duplicate `(product, variant)` lines ([`normalize_lines`])
//! 2. **Validate**: batch-fetch and cross-check catalog rows ([`resolve_catalog`])
//! 3. **Single vendor**: reject orders spanning vendors ([`single_vendor`])
//! 4. **Price snapshot**: freeze unit prices and the total ([`snapshot_prices`])
//! 5. **Reserve**: conditional stock decrements in key order ([`reserve_lines`])
//! 6. **Persist**: write the PENDING order with its items
//!
//! Settlement ([`pay_order`]) is a separate, later transaction that flips an
//! order from PENDING to PAID exactly once.
//!
//! Storage is pluggable through [`OrderStore`]. Use `ordercore-memory` for
//! tests and `ordercore-postgres` in production.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ordercore::{OrderLineRequest, PlaceOrder, Quantity, place_order, pay_order, PayOrder};
//!
//! let order = place_order(&store, buyer, PlaceOrder {
//!     shipping,
//!     lines: vec![OrderLineRequest {
//!         product_id,
//!         variant_id: None,
//!         quantity: Quantity::try_new(2)?,
//!     }],
//! })
//! .await?;
//!
//! let receipt = pay_order(&store, PayOrder {
//!     order_id: order.id,
//!     user_id: buyer,
//!     method: PaymentMethod::CreditCard,
//! })
//! .await?;
//! ```

mod catalog;
mod errors;
mod ledger;
mod normalize;
mod payment;
mod placement;
mod pricing;
mod reservation;
mod transaction;
mod validate;
mod vendor;

pub use catalog::{
    NewProduct, NewVariant, add_variant, create_product, stock_history, update_product,
    update_variant,
};
pub use errors::{OrderError, OrderResult};
pub use normalize::{LineKey, NormalizedLine, OrderLineRequest, normalize_lines};
pub use payment::{PayOrder, PaymentReceipt, pay_order};
pub use placement::{PlaceOrder, find_order, place_order};
pub use pricing::{PricedLine, PricedOrder, snapshot_prices};
pub use reservation::{reservation_order, reserve_lines};
pub use validate::{ResolvedCatalog, resolve_catalog};
pub use vendor::single_vendor;

// Re-export the shared vocabulary so callers need a single dependency.
pub use ordercore_types::{
    AddressLine, AttributeLabel, Money, Order, OrderId, OrderItem, OrderStatus, OrderStore,
    Payment, PaymentId, PaymentMethod, PaymentStatus, Product, ProductId, ProductKind,
    ProductName, ProductUpdate, ProductVariant, Quantity, ShippingAddress, StockChange,
    StockDirection, StockLogEntry, StockTarget, StoreError, StoreTransaction, UserId,
    VariantAttributes, VariantId, VariantUpdate, Vendor, VendorId,
};
