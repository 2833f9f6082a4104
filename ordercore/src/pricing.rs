use crate::errors::{OrderError, OrderResult};
use crate::normalize::NormalizedLine;
use crate::validate::ResolvedCatalog;
use ordercore_types::Money;
use tracing::warn;

/// A normalized line with its unit price frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub line: NormalizedLine,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Price snapshot of a whole order, taken once at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

/// Freeze the unit price of every line and compute the order total.
///
/// The unit price is the variant's override when the line names a variant that
/// has one, otherwise the product's base price.
///
/// # Errors
///
/// `InvalidRequest` when a resolved price is absent or negative, when a line
/// total or the order total overflows, or when the total is not positive.
pub fn snapshot_prices(
    lines: &[NormalizedLine],
    catalog: &ResolvedCatalog,
) -> OrderResult<PricedOrder> {
    let mut priced = Vec::with_capacity(lines.len());
    let mut total = Money::zero();

    for line in lines {
        let unit_price = unit_price_of(line, catalog)?;
        let line_total = unit_price
            .checked_times(line.quantity)
            .ok_or_else(|| OrderError::invalid(format!("line total for {} overflows", line.key)))?;
        total = total
            .checked_add(line_total)
            .ok_or_else(|| OrderError::invalid("order total overflows"))?;
        priced.push(PricedLine {
            line: *line,
            unit_price,
            line_total,
        });
    }

    if !total.is_positive() {
        warn!(total = %total, "[ordercore.pricing.non_positive_total] order total rejected");
        return Err(OrderError::invalid("total must be positive"));
    }

    Ok(PricedOrder {
        lines: priced,
        total,
    })
}

fn unit_price_of(line: &NormalizedLine, catalog: &ResolvedCatalog) -> OrderResult<Money> {
    let product = catalog.product(line.product_id())?;
    let override_price = match line.variant_id() {
        Some(variant_id) => catalog.variant(variant_id)?.price,
        None => None,
    };

    let price = override_price
        .or(product.base_price)
        .ok_or_else(|| OrderError::invalid(format!("price missing for {}", line.key)))?;
    if price.is_negative() {
        return Err(OrderError::invalid(format!("price invalid for {}", line.key)));
    }

    Ok(price)
}
