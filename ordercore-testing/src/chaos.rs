use std::sync::Mutex;

use nutype::nutype;
use ordercore_types::{
    CatalogPatch, Operation, Order, OrderId, OrderStore, Payment, Product, ProductId,
    ProductVariant, Quantity, StockLogEntry, StockTarget, StoreError, StoreTransaction, UserId,
    VariantId, Vendor,
};
use rand::{Rng, SeedableRng, random, rngs::StdRng};
use tracing::warn;

/// Probability value for chaos engineering injection rates.
///
/// Probability represents a value in the range [0.0, 1.0] where 0.0 means
/// never inject failures and 1.0 means always inject failures.
///
/// # Examples
///
/// ```ignore
/// use ordercore_testing::chaos::Probability;
///
/// let never = Probability::try_new(0.0).unwrap();
/// let always = Probability::try_new(1.0).unwrap();
///
/// assert!(Probability::try_new(1.5).is_err());
/// ```
#[nutype(
    validate(greater_or_equal = 0.0, less_or_equal = 1.0),
    derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, Into)
)]
pub struct Probability(f32);

/// Fault rates applied when a chaos transaction commits.
#[derive(Debug, Clone)]
pub struct ChaosConfig {
    deterministic_seed: Option<u64>,
    failure_probability: Probability,
    contention_probability: Probability,
}

impl ChaosConfig {
    pub fn deterministic() -> Self {
        Self {
            deterministic_seed: Some(0),
            ..Self::default()
        }
    }

    /// Chance that a commit fails with [`StoreError::StoreFailure`].
    pub fn with_failure_probability(mut self, probability: f32) -> Self {
        self.failure_probability = Probability::try_new(probability.clamp(0.0, 1.0))
            .expect("clamped value is always valid");
        self
    }

    /// Chance that a commit is aborted with [`StoreError::Contention`].
    pub fn with_contention_probability(mut self, probability: f32) -> Self {
        self.contention_probability = Probability::try_new(probability.clamp(0.0, 1.0))
            .expect("clamped value is always valid");
        self
    }
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            deterministic_seed: None,
            failure_probability: Probability::try_new(0.0).expect("0.0 is valid probability"),
            contention_probability: Probability::try_new(0.0).expect("0.0 is valid probability"),
        }
    }
}

pub trait ChaosStoreExt: Sized {
    fn with_chaos(self, config: ChaosConfig) -> ChaosStore<Self>;
}

/// Wraps an [`OrderStore`] and makes some commits fail after the inner
/// transaction has been rolled back.
///
/// Core operations must surface these faults without leaving partial writes.
pub struct ChaosStore<S> {
    store: S,
    config: ChaosConfig,
    rng: Mutex<StdRng>,
}

impl<S> ChaosStore<S> {
    pub fn new(store: S, config: ChaosConfig) -> Self {
        let rng = match config.deterministic_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(random()),
        };

        Self {
            store,
            config,
            rng: Mutex::new(rng),
        }
    }

    fn should_inject(&self, probability: Probability) -> bool {
        let prob_f32: f32 = probability.into();

        if prob_f32 <= 0.0 {
            return false;
        }

        if prob_f32 >= 1.0 {
            return true;
        }

        let mut rng = self
            .rng
            .lock()
            .expect("chaos RNG mutex should not be poisoned");

        rng.random_bool(f64::from(prob_f32))
    }

    fn planned_commit_fault(&self) -> Option<StoreError> {
        let operation = Operation::CommitTransaction;
        if self.should_inject(self.config.contention_probability) {
            return Some(StoreError::Contention { operation });
        }
        if self.should_inject(self.config.failure_probability) {
            return Some(StoreError::StoreFailure { operation });
        }
        None
    }
}

impl<S> OrderStore for ChaosStore<S>
where
    S: OrderStore + Sync,
{
    type Transaction = ChaosTransaction<S::Transaction>;

    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        let fail_commit = self.planned_commit_fault();
        let inner = self.store.begin().await?;
        Ok(ChaosTransaction { inner, fail_commit })
    }
}

impl<S> ChaosStoreExt for S
where
    S: OrderStore + Sync,
{
    fn with_chaos(self, config: ChaosConfig) -> ChaosStore<Self> {
        ChaosStore::new(self, config)
    }
}

/// Transaction handed out by [`ChaosStore`]. Every primitive passes through;
/// only `commit` can be sabotaged.
pub struct ChaosTransaction<T> {
    inner: T,
    fail_commit: Option<StoreError>,
}

impl<T> StoreTransaction for ChaosTransaction<T>
where
    T: StoreTransaction + Send,
{
    async fn fetch_vendor_by_user(&mut self, user_id: UserId) -> Result<Option<Vendor>, StoreError> {
        self.inner.fetch_vendor_by_user(user_id).await
    }

    async fn insert_vendor(&mut self, vendor: &Vendor) -> Result<(), StoreError> {
        self.inner.insert_vendor(vendor).await
    }

    async fn fetch_products(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<Vec<Product>, StoreError> {
        self.inner.fetch_products(product_ids).await
    }

    async fn fetch_variants(
        &mut self,
        variant_ids: &[VariantId],
    ) -> Result<Vec<ProductVariant>, StoreError> {
        self.inner.fetch_variants(variant_ids).await
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        self.inner.insert_product(product).await
    }

    async fn insert_variant(&mut self, variant: &ProductVariant) -> Result<(), StoreError> {
        self.inner.insert_variant(variant).await
    }

    async fn apply_patch(&mut self, patch: &CatalogPatch) -> Result<bool, StoreError> {
        self.inner.apply_patch(patch).await
    }

    async fn reserve_stock(
        &mut self,
        target: StockTarget,
        quantity: Quantity,
    ) -> Result<bool, StoreError> {
        self.inner.reserve_stock(target, quantity).await
    }

    async fn increase_stock(
        &mut self,
        target: StockTarget,
        quantity: Quantity,
    ) -> Result<bool, StoreError> {
        self.inner.increase_stock(target, quantity).await
    }

    async fn compare_and_set_stock(
        &mut self,
        target: StockTarget,
        expected: u32,
        new: u32,
    ) -> Result<bool, StoreError> {
        self.inner.compare_and_set_stock(target, expected, new).await
    }

    async fn append_stock_log(&mut self, entry: &StockLogEntry) -> Result<(), StoreError> {
        self.inner.append_stock_log(entry).await
    }

    async fn fetch_stock_log(
        &mut self,
        product_id: ProductId,
    ) -> Result<Vec<StockLogEntry>, StoreError> {
        self.inner.fetch_stock_log(product_id).await
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        self.inner.insert_order(order).await
    }

    async fn fetch_order(&mut self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        self.inner.fetch_order(order_id).await
    }

    async fn mark_order_paid(&mut self, order_id: OrderId) -> Result<bool, StoreError> {
        self.inner.mark_order_paid(order_id).await
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        self.inner.insert_payment(payment).await
    }

    async fn fetch_payments(&mut self, order_id: OrderId) -> Result<Vec<Payment>, StoreError> {
        self.inner.fetch_payments(order_id).await
    }

    async fn commit(self) -> Result<(), StoreError> {
        match self.fail_commit {
            Some(fault) => {
                warn!(fault = %fault, "[chaos.commit] injecting commit fault");
                self.inner.rollback().await?;
                Err(fault)
            }
            None => self.inner.commit().await,
        }
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.inner.rollback().await
    }
}
