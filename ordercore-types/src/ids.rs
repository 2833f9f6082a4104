//! Identifier domain types.
//!
//! Every persisted entity is keyed by a UUID wrapped in its own nutype, so a
//! variant id can never be passed where a product id is expected. Ids minted by
//! this crate use UUIDv7, which keeps rows roughly insertion-ordered in storage.

use nutype::nutype;
use uuid::Uuid;

/// Identifier of an authenticated user, supplied by the identity provider.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRef,
    Display,
    Serialize,
    Deserialize
))]
pub struct UserId(Uuid);

/// Identifier of a vendor (seller) account.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRef,
    Display,
    Serialize,
    Deserialize
))]
pub struct VendorId(Uuid);

/// Identifier of a catalog product.
///
/// Products are ordered by id when the reservation engine sorts order lines,
/// so `Ord` here is load-bearing.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRef,
    Display,
    Serialize,
    Deserialize
))]
pub struct ProductId(Uuid);

/// Identifier of a purchasable variant of a VARIANTED product.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRef,
    Display,
    Serialize,
    Deserialize
))]
pub struct VariantId(Uuid);

/// Identifier of an order.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRef,
    Display,
    Serialize,
    Deserialize
))]
pub struct OrderId(Uuid);

/// Identifier of a recorded payment.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRef,
    Display,
    Serialize,
    Deserialize
))]
pub struct PaymentId(Uuid);

/// Identifier of a stock ledger entry.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRef,
    Display,
    Serialize,
    Deserialize
))]
pub struct StockLogEntryId(Uuid);

impl UserId {
    /// Mint a fresh time-ordered user id.
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

impl VendorId {
    /// Mint a fresh time-ordered vendor id.
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

impl ProductId {
    /// Mint a fresh time-ordered product id.
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

impl VariantId {
    /// Mint a fresh time-ordered variant id.
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

impl OrderId {
    /// Mint a fresh time-ordered order id.
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

impl PaymentId {
    /// Mint a fresh time-ordered payment id.
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

impl StockLogEntryId {
    /// Mint a fresh time-ordered ledger entry id.
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let first = ProductId::generate();
        let second = ProductId::generate();

        assert_ne!(first, second);
    }

    #[test]
    fn product_ids_order_by_underlying_uuid() {
        let low = ProductId::new(Uuid::from_u128(1));
        let high = ProductId::new(Uuid::from_u128(2));

        assert!(low < high);
    }

    #[test]
    fn ids_display_as_hyphenated_uuid() {
        let raw = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        let order_id = OrderId::new(raw);

        assert_eq!(order_id.to_string(), "01234567-89ab-cdef-0123-456789abcdef");
    }
}
