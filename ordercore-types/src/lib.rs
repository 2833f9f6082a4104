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

//! Shared vocabulary types and the storage contract for OrderCore.
//!
//! This crate provides the foundational types shared between the `ordercore`
//! crate, which implements order placement and payment settlement, and the
//! storage adapters (`ordercore-memory`, `ordercore-postgres`). Keeping them
//! here lets adapters depend on the contract without depending on the core
//! logic.
//!
//! # Overview
//!
//! This crate contains:
//! - Identifiers: `UserId`, `VendorId`, `ProductId`, `VariantId`, `OrderId`, `PaymentId`, `StockLogEntryId`
//! - Values: `Money` (minor units), `Quantity` (at least one)
//! - Catalog: `Vendor`, `Product`, `ProductVariant`, `StockTarget`, update intents
//! - Orders: `Order`, `OrderItem`, `OrderStatus`, `ShippingAddress`, `Payment`
//! - Ledger: `StockLogEntry`, `StockDirection`
//! - Storage contract: `OrderStore`, `StoreTransaction`, `StoreError`, `Operation`

mod catalog;
mod ids;
mod ledger;
mod money;
mod order;
mod store;
mod validation;

pub use catalog::{
    AttributeLabel, AttributeLabelError, CatalogPatch, Product, ProductKind, ProductName,
    ProductNameError, ProductUpdate, ProductVariant, StockChange, StockTarget, VariantAttributes,
    VariantUpdate, Vendor,
};
pub use ids::{OrderId, PaymentId, ProductId, StockLogEntryId, UserId, VariantId, VendorId};
pub use ledger::{StockDirection, StockLogEntry};
pub use money::{Money, Quantity, QuantityError};
pub use order::{
    AddressLine, AddressLineError, Order, OrderItem, OrderStatus, Payment, PaymentMethod,
    PaymentStatus, ShippingAddress,
};
pub use store::{OrderStore, Operation, StoreError, StoreTransaction};
