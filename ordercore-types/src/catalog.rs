use crate::ids::{ProductId, UserId, VariantId, VendorId};
use crate::money::{Money, Quantity};
use crate::validation::no_control_characters;
use chrono::{DateTime, Utc};
use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display name of a product.
///
/// Trimmed, non-empty, at most 255 characters and free of control characters.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255, predicate = no_control_characters),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct ProductName(String);

/// One half of a variant's distinguishing attribute pair, e.g. `Color` or `Red`.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 100, predicate = no_control_characters),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct AttributeLabel(String);

/// Name/value pair distinguishing a variant from its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantAttributes {
    pub name: AttributeLabel,
    pub value: AttributeLabel,
}

/// How a product is sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    /// Sold directly; the product's own stock is authoritative.
    Simple,
    /// Sold only through variants; the product's own stock stays zero.
    Varianted,
}

impl ProductKind {
    /// Storage representation used by SQL backends.
    pub fn as_str(self) -> &'static str {
        match self {
            ProductKind::Simple => "SIMPLE",
            ProductKind::Varianted => "VARIANTED",
        }
    }

    /// Parse the storage representation produced by [`ProductKind::as_str`].
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "SIMPLE" => Some(ProductKind::Simple),
            "VARIANTED" => Some(ProductKind::Varianted),
            _ => None,
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A seller account as seen by the order core.
///
/// The identity provider owns vendor accounts; the core only needs the mapping
/// from an authenticated user to a vendor and whether that vendor is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub user_id: UserId,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Vendor {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A catalog product owned by exactly one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub vendor_id: VendorId,
    pub name: ProductName,
    pub description: String,
    pub kind: ProductKind,
    /// `None` only when catalog data is incomplete; such a product is not orderable.
    pub base_price: Option<Money>,
    /// Meaningful only for [`ProductKind::Simple`].
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Visibility predicate: soft-deleted products are invisible to ordering.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn is_varianted(&self) -> bool {
        self.kind == ProductKind::Varianted
    }
}

/// A purchasable option of a VARIANTED product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub attributes: VariantAttributes,
    pub stock: u32,
    /// Overrides the product's base price when present.
    pub price: Option<Money>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProductVariant {
    /// Visibility predicate: soft-deleted variants are invisible to ordering.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn belongs_to(&self, product_id: ProductId) -> bool {
        self.product_id == product_id
    }
}

/// The stock counter a mutation applies to.
///
/// Variant targets carry their product id so ledger entries and conditional
/// updates can cross-check ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockTarget {
    Product(ProductId),
    Variant {
        product_id: ProductId,
        variant_id: VariantId,
    },
}

impl StockTarget {
    pub fn product_id(self) -> ProductId {
        match self {
            StockTarget::Product(product_id) | StockTarget::Variant { product_id, .. } => {
                product_id
            }
        }
    }

    pub fn variant_id(self) -> Option<VariantId> {
        match self {
            StockTarget::Product(_) => None,
            StockTarget::Variant { variant_id, .. } => Some(variant_id),
        }
    }
}

impl fmt::Display for StockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockTarget::Product(product_id) => write!(f, "product {product_id}"),
            StockTarget::Variant {
                product_id,
                variant_id,
            } => write!(f, "variant {variant_id} of product {product_id}"),
        }
    }
}

/// Stock mutation requested through catalog management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockChange {
    /// Add units on top of the current stock.
    Restock(Quantity),
    /// Replace the current stock with an absolute level.
    Set(u32),
}

/// Every mutation a vendor may apply to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductUpdate {
    Details {
        name: ProductName,
        description: String,
    },
    BasePrice(Money),
    Stock(StockChange),
    Delete,
}

/// Every mutation a vendor may apply to a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariantUpdate {
    Attributes(VariantAttributes),
    /// `None` clears the override so the product base price applies again.
    Price(Option<Money>),
    Stock(StockChange),
    Delete,
}

/// Non-counter catalog edits handed to the storage layer.
///
/// Stock counters are never patched; they move only through the conditional
/// primitives on [`crate::StoreTransaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogPatch {
    ProductDetails {
        product_id: ProductId,
        name: ProductName,
        description: String,
    },
    ProductPrice {
        product_id: ProductId,
        base_price: Money,
    },
    ProductDeleted {
        product_id: ProductId,
        deleted_at: DateTime<Utc>,
    },
    VariantAttributes {
        variant_id: VariantId,
        attributes: VariantAttributes,
    },
    VariantPrice {
        variant_id: VariantId,
        price: Option<Money>,
    },
    VariantDeleted {
        variant_id: VariantId,
        deleted_at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_name_is_trimmed() {
        let name = ProductName::try_new("  Desk Lamp  ").expect("valid name");

        assert_eq!(name.as_ref(), "Desk Lamp");
    }

    #[test]
    fn product_name_rejects_blank_input() {
        assert!(ProductName::try_new("   ").is_err());
    }

    #[test]
    fn attribute_label_rejects_control_characters() {
        assert!(AttributeLabel::try_new("Re\nd").is_err());
    }

    #[test]
    fn product_kind_round_trips_through_storage_representation() {
        for kind in [ProductKind::Simple, ProductKind::Varianted] {
            assert_eq!(ProductKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ProductKind::parse("BUNDLE"), None);
    }

    #[test]
    fn stock_target_exposes_owning_product() {
        let product_id = ProductId::generate();
        let variant_id = VariantId::generate();
        let target = StockTarget::Variant {
            product_id,
            variant_id,
        };

        assert_eq!(target.product_id(), product_id);
        assert_eq!(target.variant_id(), Some(variant_id));
        assert_eq!(StockTarget::Product(product_id).variant_id(), None);
    }
}
