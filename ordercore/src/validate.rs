use crate::errors::{OrderError, OrderResult};
use crate::normalize::NormalizedLine;
use ordercore_types::{Product, ProductId, ProductVariant, StoreTransaction, VariantId};
use std::collections::HashMap;
use tracing::{instrument, warn};

/// Active catalog rows referenced by an order, keyed by id.
///
/// Soft-deleted rows are dropped on construction, so every lookup that
/// succeeds returns a visible row.
#[derive(Debug, Clone, Default)]
pub struct ResolvedCatalog {
    products: HashMap<ProductId, Product>,
    variants: HashMap<VariantId, ProductVariant>,
}

impl ResolvedCatalog {
    pub fn from_rows(products: Vec<Product>, variants: Vec<ProductVariant>) -> Self {
        Self {
            products: products
                .into_iter()
                .filter(Product::is_active)
                .map(|product| (product.id, product))
                .collect(),
            variants: variants
                .into_iter()
                .filter(ProductVariant::is_active)
                .map(|variant| (variant.id, variant))
                .collect(),
        }
    }

    pub fn product(&self, product_id: ProductId) -> OrderResult<&Product> {
        self.products
            .get(&product_id)
            .ok_or_else(|| OrderError::not_found(format!("product {product_id}")))
    }

    pub fn variant(&self, variant_id: VariantId) -> OrderResult<&ProductVariant> {
        self.variants
            .get(&variant_id)
            .ok_or_else(|| OrderError::not_found(format!("variant {variant_id}")))
    }

    /// Check that a line references visible rows that belong together.
    ///
    /// A variant must belong to the product named on the same line, and only
    /// VARIANTED products have variants. A VARIANTED product cannot be ordered
    /// without naming one of its variants.
    pub fn check_line(&self, line: &NormalizedLine) -> OrderResult<()> {
        let product = self.product(line.product_id())?;

        match line.variant_id() {
            Some(variant_id) => {
                let variant = self.variant(variant_id)?;
                if !variant.belongs_to(product.id) || !product.is_varianted() {
                    return Err(OrderError::not_found(format!(
                        "variant {variant_id} does not belong to product {}",
                        product.id
                    )));
                }
            }
            None if product.is_varianted() => {
                return Err(OrderError::invalid(format!(
                    "variant required for product {}",
                    product.id
                )));
            }
            None => {}
        }

        Ok(())
    }
}

/// Batch-fetch every product and variant the lines reference and check each
/// line against them.
///
/// Issues at most one product fetch and one variant fetch regardless of line
/// count. Fails fast on the first violating line.
#[instrument(name = "ordercore.resolve_catalog", skip_all, fields(lines = lines.len()))]
pub async fn resolve_catalog<T>(tx: &mut T, lines: &[NormalizedLine]) -> OrderResult<ResolvedCatalog>
where
    T: StoreTransaction + Send,
{
    let product_ids = unique(lines.iter().map(NormalizedLine::product_id));
    let variant_ids = unique(lines.iter().filter_map(NormalizedLine::variant_id));

    let products = tx.fetch_products(&product_ids).await?;
    let variants = if variant_ids.is_empty() {
        Vec::new()
    } else {
        tx.fetch_variants(&variant_ids).await?
    };

    let catalog = ResolvedCatalog::from_rows(products, variants);
    for line in lines {
        if let Err(error) = catalog.check_line(line) {
            warn!(line = %line.key, %error, "[ordercore.validate.rejected] order line rejected");
            return Err(error);
        }
    }

    Ok(catalog)
}

fn unique<I, T>(ids: I) -> Vec<T>
where
    I: Iterator<Item = T>,
    T: Copy + Ord,
{
    let mut ids: Vec<T> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
