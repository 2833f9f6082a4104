use crate::catalog::{CatalogPatch, Product, ProductVariant, StockTarget, Vendor};
use crate::ids::{OrderId, ProductId, UserId, VariantId};
use crate::ledger::StockLogEntry;
use crate::money::Quantity;
use crate::order::{Order, Payment};
use std::fmt;
use std::future::Future;

/// Trait defining the contract for order store implementations.
///
/// A store hands out transactions. Everything the order core does inside one
/// call (validation reads, stock reservations, ledger writes, order inserts)
/// runs against the same [`StoreTransaction`] and becomes visible to other
/// transactions only on [`StoreTransaction::commit`].
///
/// The trait hides how backends achieve atomicity (PostgreSQL uses ACID
/// transactions, the in-memory store uses an undo log under a mutex). Callers
/// rely only on:
///
/// - all-or-nothing commit of every write made through a transaction,
/// - conditional counter and status updates that are evaluated atomically
///   against the latest committed value,
/// - at least read-committed visibility for reads.
///
/// Implementations include:
/// - `ordercore-postgres`: Production PostgreSQL backend
/// - `ordercore-memory`: In-memory backend for testing
pub trait OrderStore {
    /// Transaction handle produced by [`OrderStore::begin`].
    type Transaction: StoreTransaction + Send;

    /// Open a new transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, StoreError>> + Send;
}

/// Explicit transaction context passed to every step of an atomic unit.
///
/// Conditional primitives (`reserve_stock`, `increase_stock`,
/// `compare_and_set_stock`, `mark_order_paid`, `apply_patch`) report whether a
/// row was affected. They return `Ok(false)`, never an error, when the
/// predicate fails or the target row is missing or soft-deleted; callers decide
/// what a miss means.
///
/// Dropping a transaction without calling [`commit`](Self::commit) rolls it
/// back.
pub trait StoreTransaction {
    /// Resolve the vendor account linked to an authenticated user.
    fn fetch_vendor_by_user(
        &mut self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<Vendor>, StoreError>> + Send;

    fn insert_vendor(
        &mut self,
        vendor: &Vendor,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Batch-fetch products by id in one round trip.
    ///
    /// Soft-deleted rows are returned; visibility is decided by the caller via
    /// [`Product::is_active`]. Missing ids are simply absent from the result.
    fn fetch_products(
        &mut self,
        product_ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<Product>, StoreError>> + Send;

    /// Batch-fetch variants by id in one round trip. Same semantics as
    /// [`fetch_products`](Self::fetch_products).
    fn fetch_variants(
        &mut self,
        variant_ids: &[VariantId],
    ) -> impl Future<Output = Result<Vec<ProductVariant>, StoreError>> + Send;

    fn insert_product(
        &mut self,
        product: &Product,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Insert a variant. A second variant with the same attribute pair on the
    /// same product fails with [`StoreError::UniqueViolation`].
    fn insert_variant(
        &mut self,
        variant: &ProductVariant,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Apply a non-counter catalog edit to an active row.
    fn apply_patch(
        &mut self,
        patch: &CatalogPatch,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Decrement stock by `quantity` only if current stock is at least
    /// `quantity`. Evaluated as a single atomic conditional update.
    fn reserve_stock(
        &mut self,
        target: StockTarget,
        quantity: Quantity,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Increment stock by `quantity` on an active row.
    fn increase_stock(
        &mut self,
        target: StockTarget,
        quantity: Quantity,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Replace stock with `new` only if it still equals `expected`.
    fn compare_and_set_stock(
        &mut self,
        target: StockTarget,
        expected: u32,
        new: u32,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Append a ledger entry. Entries are never updated or deleted.
    fn append_stock_log(
        &mut self,
        entry: &StockLogEntry,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Ledger entries for a product and all its variants, oldest first.
    fn fetch_stock_log(
        &mut self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Vec<StockLogEntry>, StoreError>> + Send;

    /// Insert an order header together with all of its items.
    fn insert_order(
        &mut self,
        order: &Order,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Load an order header with its items.
    fn fetch_order(
        &mut self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, StoreError>> + Send;

    /// Flip the order status to PAID only if it is still PENDING.
    fn mark_order_paid(
        &mut self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn insert_payment(
        &mut self,
        payment: &Payment,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Payments recorded against an order, oldest first.
    fn fetch_payments(
        &mut self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Vec<Payment>, StoreError>> + Send;

    /// Make every write of this transaction visible atomically.
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send
    where
        Self: Sized;

    /// Discard every write of this transaction.
    fn rollback(self) -> impl Future<Output = Result<(), StoreError>> + Send
    where
        Self: Sized;
}

/// Identifies the store operation that failed.
///
/// Used by [`StoreError`] to provide strongly-typed identification of which
/// primitive encountered a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    BeginTransaction,
    FetchVendor,
    InsertVendor,
    FetchProducts,
    FetchVariants,
    InsertProduct,
    InsertVariant,
    ApplyPatch,
    ReserveStock,
    IncreaseStock,
    SetStock,
    AppendStockLog,
    FetchStockLog,
    InsertOrder,
    FetchOrder,
    MarkOrderPaid,
    InsertPayment,
    FetchPayments,
    CommitTransaction,
    RollbackTransaction,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::BeginTransaction => "begin_transaction",
            Operation::FetchVendor => "fetch_vendor",
            Operation::InsertVendor => "insert_vendor",
            Operation::FetchProducts => "fetch_products",
            Operation::FetchVariants => "fetch_variants",
            Operation::InsertProduct => "insert_product",
            Operation::InsertVariant => "insert_variant",
            Operation::ApplyPatch => "apply_patch",
            Operation::ReserveStock => "reserve_stock",
            Operation::IncreaseStock => "increase_stock",
            Operation::SetStock => "set_stock",
            Operation::AppendStockLog => "append_stock_log",
            Operation::FetchStockLog => "fetch_stock_log",
            Operation::InsertOrder => "insert_order",
            Operation::FetchOrder => "fetch_order",
            Operation::MarkOrderPaid => "mark_order_paid",
            Operation::InsertPayment => "insert_payment",
            Operation::FetchPayments => "fetch_payments",
            Operation::CommitTransaction => "commit_transaction",
            Operation::RollbackTransaction => "rollback_transaction",
        };
        f.write_str(name)
    }
}

/// Error type returned by store operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Infrastructure failure surfaced by the backing store (e.g. connection drops).
    #[error("{operation} operation failed")]
    StoreFailure { operation: Operation },

    /// A uniqueness constraint rejected the write.
    #[error("{operation} violated a uniqueness constraint")]
    UniqueViolation { operation: Operation },

    /// The backend aborted the transaction because of a concurrent one
    /// (serialization failure, deadlock victim).
    #[error("{operation} aborted by a concurrent transaction")]
    Contention { operation: Operation },

    /// A stored row could not be mapped back into a domain type.
    #[error("corrupt {table} row: {detail}")]
    CorruptRow { table: &'static str, detail: String },
}

/// Blanket implementation allowing the store trait to work with references.
///
/// This enables passing both owned and borrowed stores to the core operations.
impl<T: OrderStore + Sync> OrderStore for &T {
    type Transaction = T::Transaction;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        (*self).begin().await
    }
}
